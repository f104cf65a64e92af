use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::NetworkRequest;
use fpl_api::fpl::StandingsEntry;
use fpl_api::pipeline::PipelineState;
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Standings,
    Chart,
    BenchHits,
    Captains,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new() -> Self {
        Self::with_settings(AppSettings::load())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let app = Self { state: AppState::new(), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_standings_loaded(&mut self, league_id: String, standings: Vec<StandingsEntry>) {
        self.state.last_error = None;
        self.state.league.load(league_id, standings);
        self.state.stats = Default::default();
        self.state.scroll_offset = 0;
    }

    pub fn on_player_names_loaded(&mut self, names: HashMap<u32, String>) {
        self.state.league.player_names.extend(names);
    }

    pub fn on_pipeline_state(&mut self, state: PipelineState) {
        if let PipelineState::Error(message) = &state {
            self.state.last_error = Some(message.clone());
        }
        self.state.stats.apply(state);
    }

    pub fn on_pipeline_finished(&mut self, cached_paths: usize) {
        self.state.stats.finish(cached_paths);
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
    }

    /// Request for a stats run over the loaded standings, unless one is
    /// already running or there is nothing to aggregate.
    pub fn start_stats(&mut self) -> Option<NetworkRequest> {
        if self.state.stats.running {
            return None;
        }
        if !self.state.league.is_loaded() {
            self.state.last_error = Some("Load a league before fetching stats".to_string());
            return None;
        }
        self.state.last_error = None;
        self.state.stats.start();
        Some(NetworkRequest::RunPipeline {
            standings: self.state.league.standings.clone(),
            player_names: self.state.league.player_names.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // League ID input
    // -----------------------------------------------------------------------

    pub fn begin_league_input(&mut self) {
        let current = self.state.league.league_id.clone();
        self.state.input.begin(current.as_deref());
    }

    pub fn cancel_league_input(&mut self) {
        self.state.input.cancel();
    }

    pub fn push_input_char(&mut self, c: char) {
        self.state.input.input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.state.input.input.pop();
    }

    pub fn submit_league_input(&mut self) -> Option<NetworkRequest> {
        let league_id = self.state.input.submit()?;
        self.state.last_error = None;
        Some(NetworkRequest::LoadStandings { league_id })
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.state.scroll_offset = 0;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn scroll_down(&mut self) {
        let max = self.row_count().saturating_sub(1) as u16;
        self.state.scroll_offset = (self.state.scroll_offset + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.state.scroll_offset = self.state.scroll_offset.saturating_sub(1);
    }

    fn row_count(&self) -> usize {
        match self.state.active_tab {
            MenuItem::Standings => self.state.league.standings.len(),
            MenuItem::BenchHits => {
                self.state.stats.league.as_ref().map_or(0, |l| l.managers.len())
            }
            MenuItem::Captains => {
                self.state.stats.captains.as_ref().map_or(0, |c| c.rankings.len())
            }
            MenuItem::Chart | MenuItem::Help => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::with_settings(AppSettings::default())
    }

    fn standings() -> Vec<StandingsEntry> {
        vec![
            StandingsEntry { entry: 1, player_name: "A".into(), entry_name: "A XI".into(), total: 10 },
            StandingsEntry { entry: 2, player_name: "B".into(), entry_name: "B XI".into(), total: 9 },
        ]
    }

    #[test]
    fn start_stats_needs_standings() {
        let mut app = app();
        assert!(app.start_stats().is_none());
        assert!(app.state.last_error.is_some());

        app.on_standings_loaded("12176".into(), standings());
        app.on_player_names_loaded(HashMap::from([(100, "Salah".to_string())]));
        match app.start_stats() {
            Some(NetworkRequest::RunPipeline { standings, player_names }) => {
                assert_eq!(standings.len(), 2);
                assert_eq!(player_names.get(&100).map(String::as_str), Some("Salah"));
            }
            other => panic!("unexpected request: {other:?}"),
        }
        assert!(app.state.stats.running);
        assert!(app.start_stats().is_none());
    }

    #[test]
    fn pipeline_error_surfaces_and_allows_restart() {
        let mut app = app();
        app.on_standings_loaded("12176".into(), standings());
        assert!(app.start_stats().is_some());

        app.on_pipeline_state(PipelineState::Error("could not fetch any manager data".into()));
        app.on_pipeline_finished(3);
        assert_eq!(app.state.last_error.as_deref(), Some("could not fetch any manager data"));
        assert_eq!(app.state.stats.cached_paths, 3);
        assert!(app.start_stats().is_some());
    }

    #[test]
    fn league_input_submits_trimmed_id() {
        let mut app = app();
        app.begin_league_input();
        for c in " 314 ".chars() {
            app.push_input_char(c);
        }
        match app.submit_league_input() {
            Some(NetworkRequest::LoadStandings { league_id }) => assert_eq!(league_id, "314"),
            other => panic!("unexpected request: {other:?}"),
        }
        assert!(!app.state.input.editing);
    }

    #[test]
    fn scroll_is_clamped_to_rows() {
        let mut app = app();
        app.on_standings_loaded("12176".into(), standings());
        for _ in 0..5 {
            app.scroll_down();
        }
        assert_eq!(app.state.scroll_offset, 1);
        app.update_tab(MenuItem::Chart);
        assert_eq!(app.state.scroll_offset, 0);
    }
}
