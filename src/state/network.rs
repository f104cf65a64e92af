use crate::state::messages::{NetworkRequest, NetworkResponse};
use fpl_api::client::{ApiError, FplApi};
use fpl_api::fpl::StandingsEntry;
use fpl_api::pipeline::{Pipeline, PipelineState};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns the API client (and with it the session's fetch cache). Requests are
/// handled one at a time.
pub struct NetworkWorker {
    pipeline: Pipeline,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        api: FplApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(api),
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let result = match request {
                NetworkRequest::LoadStandings { league_id } => {
                    self.handle_load_standings(league_id).await
                }
                NetworkRequest::LoadPlayerNames => self.handle_load_player_names().await,
                NetworkRequest::RunPipeline { standings, player_names } => {
                    self.handle_run_pipeline(standings, player_names).await
                }
            };

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                message: err.to_string(),
            });

            debug!("network request complete");
            self.stop_loading_animation(!response.is_error()).await;

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_standings(&self, league_id: String) -> Result<NetworkResponse, ApiError> {
        debug!("loading standings for league {league_id}");
        match self.pipeline.api().fetch_standings(&league_id).await {
            Ok(standings) => Ok(NetworkResponse::StandingsLoaded { league_id, standings }),
            Err(ApiError::Validation(msg)) => Ok(NetworkResponse::Error { message: msg }),
            Err(e) => {
                warn!("standings fetch failed: {e}");
                Ok(NetworkResponse::Error {
                    message: "Failed to load standings. Check the league ID and try again.".into(),
                })
            }
        }
    }

    async fn handle_load_player_names(&self) -> Result<NetworkResponse, ApiError> {
        let names = match self.pipeline.api().fetch_player_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!("bootstrap fetch failed: {e}");
                HashMap::new()
            }
        };
        Ok(NetworkResponse::PlayerNamesLoaded { names })
    }

    /// Runs the pipeline while forwarding each state snapshot to the UI.
    async fn handle_run_pipeline(
        &self,
        standings: Vec<StandingsEntry>,
        player_names: HashMap<u32, String>,
    ) -> Result<NetworkResponse, ApiError> {
        let (state_tx, mut state_rx) = mpsc::unbounded_channel::<PipelineState>();
        let responses = self.responses.clone();

        let forward = async move {
            while let Some(state) = state_rx.recv().await {
                if responses.send(NetworkResponse::Pipeline(state)).await.is_err() {
                    break;
                }
            }
        };
        let run = async move {
            let names = (!player_names.is_empty()).then_some(&player_names);
            let result = self.pipeline.run(&standings, names, &state_tx).await;
            drop(state_tx);
            result
        };

        let (result, ()) = tokio::join!(run, forward);
        let cached_paths = self.pipeline.api().cache().len();
        if let Err(e) = &result {
            warn!("league stats failed: {e}");
        }
        Ok(NetworkResponse::PipelineFinished { succeeded: result.is_ok(), cached_paths })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
