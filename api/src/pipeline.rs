//! Three-phase league aggregation: histories, then live gameweek scores,
//! then per-gameweek picks. State snapshots are streamed to the caller as
//! each phase progresses.

use crate::batch::BatchScheduler;
use crate::client::{ApiError, ApiResult, BOOTSTRAP_PATH, FplApi, player_names};
use crate::fpl::{
    BootstrapResponse, HistoryResponse, LiveResponse, PicksResponse, StandingsEntry, current_event,
};
use crate::stats::{self, CaptainAccumulator, LiveScores};
use crate::{BenchDetail, CaptainStats, LeagueReport, LeagueStats, ManagerStats};
use futures_util::future::join;
use log::{debug, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// What the presentation layer sees of a run, in emission order.
#[derive(Debug, Clone)]
pub enum PipelineState {
    Idle,
    Phase1Loading { percent: u8, label: String },
    /// Histories are in: chart, bench and hits tables can render.
    Phase1Ready(LeagueStats),
    Phase2Loading { percent: u8, label: String },
    /// Captaincy rankings and bench details are in.
    Phase2Ready(CaptainStats),
    Error(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub history_concurrency: usize,
    pub live_concurrency: usize,
    pub picks_concurrency: usize,
    pub max_retries: u32,
    pub chunk_pause: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_concurrency: 5,
            live_concurrency: 10,
            picks_concurrency: 5,
            max_retries: 2,
            chunk_pause: Duration::from_millis(200),
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(4),
        }
    }
}

impl PipelineConfig {
    fn scheduler(&self, concurrency: usize) -> BatchScheduler {
        BatchScheduler::new(concurrency)
            .with_retries(self.max_retries)
            .with_pause(self.chunk_pause)
            .with_backoff(self.backoff_base, self.backoff_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Histories,
    Live,
    Picks,
}

impl Phase {
    /// Share of the overall bar, as [start, end) percent.
    fn range(self) -> (u8, u8) {
        match self {
            Phase::Histories => (0, 30),
            Phase::Live => (30, 50),
            Phase::Picks => (50, 100),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Phase::Histories => "Fetching manager histories",
            Phase::Live => "Fetching gameweek scores",
            Phase::Picks => "Fetching captain picks",
        }
    }
}

/// Folds per-phase done/total into one non-decreasing percentage.
struct Progress<'a> {
    updates: &'a UnboundedSender<PipelineState>,
    percent: u8,
}

impl<'a> Progress<'a> {
    fn new(updates: &'a UnboundedSender<PipelineState>) -> Self {
        Self { updates, percent: 0 }
    }

    fn report(&mut self, phase: Phase, done: usize, total: usize) {
        let (start, end) = phase.range();
        let fraction = if total == 0 { 1.0 } else { done as f64 / total as f64 };
        let raw = f64::from(start) + fraction.min(1.0) * f64::from(end - start);
        self.percent = self.percent.max(raw.round() as u8);

        let label = format!("{} ({done}/{total})", phase.label());
        let percent = self.percent;
        let state = match phase {
            Phase::Histories => PipelineState::Phase1Loading { percent, label },
            Phase::Live | Phase::Picks => PipelineState::Phase2Loading { percent, label },
        };
        let _ = self.updates.send(state);
    }
}

/// Runs the aggregation against a shared [`FplApi`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    api: FplApi,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(api: FplApi) -> Self {
        Self { api, config: PipelineConfig::default() }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api(&self) -> &FplApi {
        &self.api
    }

    /// Aggregate `standings`. `player_names` seeds the element-name mapping
    /// (bootstrap names are merged over it). Fails only when no manager
    /// history could be fetched at all; that failure is also emitted as
    /// [`PipelineState::Error`].
    pub async fn run(
        &self,
        standings: &[StandingsEntry],
        player_names: Option<&HashMap<u32, String>>,
        updates: &UnboundedSender<PipelineState>,
    ) -> ApiResult<LeagueReport> {
        let mut progress = Progress::new(updates);
        progress.report(Phase::Histories, 0, standings.len());

        let league = match self.fetch_histories(standings, player_names, &mut progress).await {
            Ok(league) => league,
            Err(e) => {
                let _ = updates.send(PipelineState::Error(e.to_string()));
                return Err(e);
            }
        };
        let _ = updates.send(PipelineState::Phase1Ready(league.clone()));

        let completed = league.completed_events();
        let captains = if completed.is_empty() {
            debug!("no completed gameweeks; skipping live scores and picks");
            CaptainStats {
                rankings: stats::captain_rankings(&league.managers, &HashMap::new(), &league.player_names),
                bench_details: HashMap::new(),
            }
        } else {
            let live = self.fetch_live(&completed, league.current_event, &mut progress).await;
            self.fetch_captaincy(&league, &completed, &live, &mut progress).await
        };
        let _ = updates.send(PipelineState::Phase2Ready(captains.clone()));

        Ok(LeagueReport { league, captains })
    }

    /// Phase one. Bootstrap and histories are fetched side by side.
    async fn fetch_histories(
        &self,
        standings: &[StandingsEntry],
        seed_names: Option<&HashMap<u32, String>>,
        progress: &mut Progress<'_>,
    ) -> ApiResult<LeagueStats> {
        let scheduler = self.config.scheduler(self.config.history_concurrency);
        let bootstrap_paths = [BOOTSTRAP_PATH.to_string()];
        let history_paths: Vec<String> = standings
            .iter()
            .map(|s| format!("entry/{}/history", s.entry))
            .collect();

        let (bootstrap, histories) = join(
            scheduler.run::<BootstrapResponse, _>(&self.api, &bootstrap_paths, None, |_, _| {}),
            scheduler.run::<HistoryResponse, _>(&self.api, &history_paths, None, |done, total| {
                progress.report(Phase::Histories, done, total)
            }),
        )
        .await;

        let bootstrap = match bootstrap.into_iter().next().flatten() {
            Some(b) => Some(b),
            None => match self.api.fetch_bootstrap().await {
                Ok(b) => Some(b),
                Err(e) => {
                    warn!("bootstrap unavailable, player names and current gameweek unknown: {e}");
                    None
                }
            },
        };

        if histories.iter().all(Option::is_none) {
            return Err(ApiError::NoData);
        }

        let missing = histories.iter().filter(|h| h.is_none()).count();
        if missing > 0 {
            warn!("{missing} of {} manager histories unavailable", histories.len());
        }

        let mut names = seed_names.cloned().unwrap_or_default();
        let mut current = None;
        if let Some(b) = &bootstrap {
            names.extend(player_names(b));
            current = current_event(&b.events);
        }

        let managers = standings
            .iter()
            .zip(histories)
            .map(|(s, h)| ManagerStats::from_history(s, h))
            .collect();

        Ok(LeagueStats { managers, player_names: names, current_event: current })
    }

    /// Phase two. Missing gameweeks are simply absent from the map.
    async fn fetch_live(
        &self,
        events: &[u32],
        current: Option<u32>,
        progress: &mut Progress<'_>,
    ) -> HashMap<u32, LiveScores> {
        let paths: Vec<String> = events.iter().map(|gw| format!("event/{gw}/live")).collect();
        let results = self
            .config
            .scheduler(self.config.live_concurrency)
            .run::<LiveResponse, _>(&self.api, &paths, current, |done, total| {
                progress.report(Phase::Live, done, total)
            })
            .await;

        events
            .iter()
            .zip(results)
            .filter_map(|(&gw, raw)| raw.map(|r| (gw, stats::live_scores(&r))))
            .collect()
    }

    /// Phase three plus the final reduction.
    async fn fetch_captaincy(
        &self,
        league: &LeagueStats,
        events: &[u32],
        live: &HashMap<u32, LiveScores>,
        progress: &mut Progress<'_>,
    ) -> CaptainStats {
        let pairs: Vec<(u64, u32)> = league
            .managers
            .iter()
            .flat_map(|m| events.iter().map(move |&gw| (m.entry, gw)))
            .collect();
        let paths: Vec<String> = pairs
            .iter()
            .map(|(id, gw)| format!("entry/{id}/event/{gw}/picks"))
            .collect();

        let snapshots = self
            .config
            .scheduler(self.config.picks_concurrency)
            .run::<PicksResponse, _>(&self.api, &paths, league.current_event, |done, total| {
                progress.report(Phase::Picks, done, total)
            })
            .await;

        let mut accumulators: HashMap<u64, CaptainAccumulator> = league
            .managers
            .iter()
            .map(|m| (m.entry, CaptainAccumulator::default()))
            .collect();
        let mut bench: HashMap<u64, Vec<BenchDetail>> = HashMap::new();

        for (&(entry, gw), snapshot) in pairs.iter().zip(snapshots) {
            let Some(snapshot) = snapshot else {
                continue;
            };
            let scores = live.get(&gw);
            accumulators
                .entry(entry)
                .or_default()
                .record(&snapshot.picks, scores);
            if let Some(scores) = scores {
                bench
                    .entry(entry)
                    .or_default()
                    .extend(stats::bench_contributions(&snapshot.picks, scores, gw));
            }
        }

        let bench_details = bench
            .into_iter()
            .map(|(entry, details)| (entry, stats::top_bench(details)))
            .collect();

        CaptainStats {
            rankings: stats::captain_rankings(&league.managers, &accumulators, &league.player_names),
            bench_details,
        }
    }
}
