use crate::app::MenuItem;
use chrono::Local;
use fpl_api::fpl::StandingsEntry;
use fpl_api::pipeline::PipelineState;
use fpl_api::{CaptainStats, LeagueStats};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// League standings state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeagueState {
    pub league_id: Option<String>,
    pub standings: Vec<StandingsEntry>,
    /// Element ID → web name, filled in the background after standings load.
    pub player_names: HashMap<u32, String>,
    pub loaded_at: Option<String>,
}

impl LeagueState {
    pub fn load(&mut self, league_id: String, standings: Vec<StandingsEntry>) {
        self.league_id = Some(league_id);
        self.standings = standings;
        self.loaded_at = Some(Local::now().format("%H:%M").to_string());
    }

    pub fn is_loaded(&self) -> bool {
        !self.standings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregation state, driven by pipeline snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StatsState {
    pub running: bool,
    pub percent: u8,
    pub label: String,
    pub league: Option<LeagueStats>,
    pub captains: Option<CaptainStats>,
    pub error: Option<String>,
    /// Cache size after the last finished run.
    pub cached_paths: usize,
}

impl StatsState {
    pub fn start(&mut self) {
        *self = Self { running: true, cached_paths: self.cached_paths, ..Self::default() };
    }

    pub fn apply(&mut self, state: PipelineState) {
        match state {
            PipelineState::Idle => self.reset(None),
            PipelineState::Phase1Loading { percent, label }
            | PipelineState::Phase2Loading { percent, label } => {
                self.running = true;
                self.percent = self.percent.max(percent);
                self.label = label;
            }
            PipelineState::Phase1Ready(league) => self.league = Some(league),
            PipelineState::Phase2Ready(captains) => {
                self.captains = Some(captains);
                self.running = false;
                self.percent = 100;
                self.label.clear();
            }
            PipelineState::Error(message) => self.reset(Some(message)),
        }
    }

    pub fn finish(&mut self, cached_paths: usize) {
        self.running = false;
        self.cached_paths = cached_paths;
    }

    fn reset(&mut self, error: Option<String>) {
        *self = Self { error, cached_paths: self.cached_paths, ..Self::default() };
    }
}

// ---------------------------------------------------------------------------
// League ID input
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InputState {
    pub editing: bool,
    pub input: String,
}

impl InputState {
    pub fn begin(&mut self, current: Option<&str>) {
        self.editing = true;
        self.input = current.unwrap_or_default().to_string();
    }

    pub fn cancel(&mut self) {
        self.editing = false;
        self.input.clear();
    }

    /// Trimmed input, or `None` if blank. Leaves edit mode either way.
    pub fn submit(&mut self) -> Option<String> {
        self.editing = false;
        let value = self.input.trim().to_string();
        self.input.clear();
        (!value.is_empty()).then_some(value)
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub league: LeagueState,
    pub stats: StatsState,
    pub input: InputState,
    /// Row offset for the active tab's tables.
    pub scroll_offset: u16,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
