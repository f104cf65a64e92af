//! Pure reductions over fetched payloads: live scores, captaincy and bench
//! contributions, and the final rankings.

use crate::fpl::{LiveResponse, Pick};
use crate::{BenchDetail, CaptainRow, ManagerStats};
use std::collections::{BTreeMap, HashMap};

/// Element ID → points scored in one gameweek.
pub type LiveScores = HashMap<u32, i32>;

/// First squad position on the bench.
pub const BENCH_START: u8 = 12;
pub const BENCH_DETAIL_LIMIT: usize = 3;

pub fn live_scores(raw: &LiveResponse) -> LiveScores {
    raw.elements
        .iter()
        .map(|el| (el.id, el.stats.total_points))
        .collect()
}

/// The captain's element and multiplied score, if a captain is flagged and
/// the gameweek has live data. An element missing from the live data scores 0.
pub fn captain_pick(picks: &[Pick], live: Option<&LiveScores>) -> Option<(u32, i32)> {
    let captain = picks.iter().find(|p| p.is_captain)?;
    let live = live?;
    let base = live.get(&captain.element).copied().unwrap_or(0);
    let multiplier = i32::try_from(captain.multiplier).unwrap_or(i32::MAX);
    Some((captain.element, base.saturating_mul(multiplier)))
}

/// Captain points for one snapshot; 0 when there is nothing to score.
pub fn process_captain_picks(picks: &[Pick], live: Option<&LiveScores>) -> i32 {
    captain_pick(picks, live).map_or(0, |(_, points)| points)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptainChoice {
    pub count: u32,
    pub points: i32,
}

/// Running captaincy totals for one manager.
#[derive(Debug, Clone, Default)]
pub struct CaptainAccumulator {
    pub total_captain_points: i32,
    /// Snapshots processed, whether or not the captain scored.
    pub gw_count: u32,
    pub captain_choices: BTreeMap<u32, CaptainChoice>,
}

impl CaptainAccumulator {
    pub fn record(&mut self, picks: &[Pick], live: Option<&LiveScores>) {
        let Some((element, points)) = captain_pick(picks, live) else {
            return;
        };
        self.total_captain_points = self.total_captain_points.saturating_add(points);
        self.gw_count = self.gw_count.saturating_add(1);
        let choice = self.captain_choices.entry(element).or_default();
        choice.count = choice.count.saturating_add(1);
        choice.points = choice.points.saturating_add(points);
    }

    pub fn average(&self) -> f64 {
        if self.gw_count == 0 {
            return 0.0;
        }
        let avg = f64::from(self.total_captain_points) / f64::from(self.gw_count);
        (avg * 10.0).round() / 10.0
    }
}

/// `"<name> (<count>x)"` for the most-picked captain, `"-"` if none.
/// Ties go to the lowest element ID.
pub fn find_most_captained(
    choices: &BTreeMap<u32, CaptainChoice>,
    names: &HashMap<u32, String>,
) -> String {
    let mut best: Option<(u32, u32)> = None;
    for (&element, choice) in choices {
        if choice.count > best.map_or(0, |(_, count)| count) {
            best = Some((element, choice.count));
        }
    }
    match best {
        Some((element, count)) => {
            let name = names.get(&element).map(String::as_str).unwrap_or("Unknown");
            format!("{name} ({count}x)")
        }
        None => "-".to_string(),
    }
}

/// Bench picks that scored in gameweek `gw`, in squad order.
pub fn bench_contributions(picks: &[Pick], live: &LiveScores, gw: u32) -> Vec<BenchDetail> {
    picks
        .iter()
        .filter(|p| p.position >= BENCH_START)
        .filter_map(|p| {
            let points = live.get(&p.element).copied().unwrap_or(0);
            (points > 0).then_some(BenchDetail { element: p.element, points, gw })
        })
        .collect()
}

/// Highest scorers first, earlier entries winning ties, capped at three.
pub fn top_bench(mut details: Vec<BenchDetail>) -> Vec<BenchDetail> {
    details.sort_by(|a, b| b.points.cmp(&a.points));
    details.truncate(BENCH_DETAIL_LIMIT);
    details
}

/// Stable descending sort by `key`; equal keys keep input order.
pub fn rank_desc<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Vec<&T> {
    let mut ranked: Vec<&T> = items.iter().collect();
    ranked.sort_by(|a, b| key(b).cmp(&key(a)));
    ranked
}

/// Captain table, highest total first. Managers without an accumulator get
/// a zero row.
pub fn captain_rankings(
    managers: &[ManagerStats],
    accumulators: &HashMap<u64, CaptainAccumulator>,
    names: &HashMap<u32, String>,
) -> Vec<CaptainRow> {
    let empty = CaptainAccumulator::default();
    let mut rows: Vec<CaptainRow> = managers
        .iter()
        .map(|m| {
            let acc = accumulators.get(&m.entry).unwrap_or(&empty);
            CaptainRow {
                entry: m.entry,
                player_name: m.player_name.clone(),
                total_captain_points: acc.total_captain_points,
                gw_count: acc.gw_count,
                avg_captain_points: acc.average(),
                most_captained: find_most_captained(&acc.captain_choices, names),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total_captain_points.cmp(&a.total_captain_points));
    rows
}
