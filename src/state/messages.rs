use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use fpl_api::fpl::StandingsEntry;
use fpl_api::pipeline::PipelineState;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadStandings { league_id: String },
    /// Background name lookup; feeds the pipeline's pre-resolved mapping.
    LoadPlayerNames,
    RunPipeline {
        standings: Vec<StandingsEntry>,
        player_names: HashMap<u32, String>,
    },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    StandingsLoaded { league_id: String, standings: Vec<StandingsEntry> },
    PlayerNamesLoaded { names: HashMap<u32, String> },
    /// One snapshot from a running aggregation.
    Pipeline(PipelineState),
    PipelineFinished { succeeded: bool, cached_paths: usize },
    Error { message: String },
}

impl NetworkResponse {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            NetworkResponse::Error { .. } | NetworkResponse::PipelineFinished { succeeded: false, .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
