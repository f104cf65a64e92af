pub mod batch;
pub mod cache;
pub mod client;
pub mod fpl;
pub mod pipeline;
pub mod stats;

use crate::fpl::{ChipPlay, GameweekRecord, HistoryResponse, StandingsEntry};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Domain types rendered by the presentation layer
// ---------------------------------------------------------------------------

/// One manager's season, derived from their standings row and history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerStats {
    pub entry: u64,
    pub player_name: String,
    pub entry_name: String,
    pub total: i32,
    pub history: Vec<GameweekRecord>,
    pub chips: Vec<ChipPlay>,
    pub total_bench_points: i32,
    pub total_hits_cost: i32,
    pub total_transfers: i32,
}

impl ManagerStats {
    /// A missing history (fetch failed) yields an empty season with zero totals.
    pub fn from_history(standing: &StandingsEntry, history: Option<HistoryResponse>) -> Self {
        let HistoryResponse { current, chips } = history.unwrap_or_default();
        Self {
            entry: standing.entry,
            player_name: standing.player_name.clone(),
            entry_name: standing.entry_name.clone(),
            total: standing.total,
            total_bench_points: current.iter().map(|gw| gw.points_on_bench).sum(),
            total_hits_cost: current.iter().map(|gw| gw.event_transfers_cost).sum(),
            total_transfers: current.iter().map(|gw| gw.event_transfers).sum(),
            history: current,
            chips,
        }
    }
}

/// Phase-one result: every standings entry with its history, in standings order.
#[derive(Debug, Clone, Default)]
pub struct LeagueStats {
    pub managers: Vec<ManagerStats>,
    pub player_names: HashMap<u32, String>,
    pub current_event: Option<u32>,
}

impl LeagueStats {
    /// Gameweeks present in the first manager that has any history.
    pub fn completed_events(&self) -> Vec<u32> {
        self.managers
            .iter()
            .find(|m| !m.history.is_empty())
            .map(|m| m.history.iter().map(|h| h.event).collect())
            .unwrap_or_default()
    }

    pub fn bench_ranking(&self) -> Vec<&ManagerStats> {
        stats::rank_desc(&self.managers, |m| m.total_bench_points)
    }

    pub fn hits_ranking(&self) -> Vec<&ManagerStats> {
        stats::rank_desc(&self.managers, |m| m.total_hits_cost)
    }

    /// Cumulative points per gameweek for each manager with history.
    pub fn chart_series(&self) -> Vec<PointsSeries> {
        self.managers
            .iter()
            .filter(|m| !m.history.is_empty())
            .map(|m| PointsSeries {
                entry: m.entry,
                label: m.player_name.clone(),
                points: m.history.iter().map(|h| (h.event, h.total_points)).collect(),
            })
            .collect()
    }

    pub fn player_name(&self, element: u32) -> &str {
        self.player_names
            .get(&element)
            .map(String::as_str)
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointsSeries {
    pub entry: u64,
    pub label: String,
    /// (gameweek, total points after that gameweek)
    pub points: Vec<(u32, i32)>,
}

/// A bench player who scored in a given gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchDetail {
    pub element: u32,
    pub points: i32,
    pub gw: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainRow {
    pub entry: u64,
    pub player_name: String,
    pub total_captain_points: i32,
    pub gw_count: u32,
    /// Rounded to one decimal.
    pub avg_captain_points: f64,
    /// `"<name> (<n>x)"`, or `"-"` without captain data.
    pub most_captained: String,
}

/// Phase-two result.
#[derive(Debug, Clone, Default)]
pub struct CaptainStats {
    /// Sorted by total captain points, highest first.
    pub rankings: Vec<CaptainRow>,
    /// Top three scoring bench contributions per manager.
    pub bench_details: HashMap<u64, Vec<BenchDetail>>,
}

/// Everything a completed run produces.
#[derive(Debug, Clone, Default)]
pub struct LeagueReport {
    pub league: LeagueStats,
    pub captains: CaptainStats,
}
