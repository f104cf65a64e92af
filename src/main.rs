mod app;
mod components;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use fpl_api::client::{FplApi, validate_league_id};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let league_arg = match parse_cli_args() {
        CliAction::Exit => return Ok(()),
        CliAction::Run(league) => league,
    };

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    tui_logger::init_logger(log::LevelFilter::Error)?;
    tui_logger::set_default_level(log::LevelFilter::Error);

    let mut app = App::new();
    if let Some(league_id) = league_arg {
        app.settings.league_id = Some(league_id);
    }
    let api = FplApi::new().with_transports(app.settings.transports.clone());
    info!("transports: {:?}", api.transports());
    let app = Arc::new(Mutex::new(app));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(api, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Load the configured league on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();

    Ok(())
}

enum CliAction {
    Run(Option<String>),
    Exit,
}

fn parse_cli_args() -> CliAction {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return CliAction::Run(None);
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            CliAction::Exit
        }
        "-V" | "--version" => {
            println!("fpltui {}", env!("CARGO_PKG_VERSION"));
            CliAction::Exit
        }
        league => match validate_league_id(league) {
            Ok(id) => CliAction::Run(Some(id.to_string())),
            Err(_) => {
                eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
                std::process::exit(2);
            }
        },
    }
}

fn usage_text() -> &'static str {
    "fpltui - Fantasy Premier League mini-league stats

Usage:
  fpltui [LEAGUE_ID]
  fpltui --help
  fpltui --version

Environment:
  FPLTUI_LEAGUE      League ID loaded on startup
  FPLTUI_GATEWAY     Comma-separated gateway base URLs, tried before the upstream
  FPLTUI_UPSTREAM    FPL base URL (default https://fantasy.premierleague.com)
  FPLTUI_NO_DIRECT   Set to 1 to only use gateways
  FPLTUI_LOG         Log level (error, warn, info, debug, trace)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            else => break,
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let league_id = app.lock().await.settings.league_id.clone();
            if let Some(league_id) = league_id {
                let _ = network_requests
                    .send(NetworkRequest::LoadStandings { league_id })
                    .await;
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::StandingsLoaded { league_id, standings } => {
            info!("league {league_id}: {} managers", standings.len());
            let mut guard = app.lock().await;
            guard.on_standings_loaded(league_id, standings);
            let need_names = guard.state.league.player_names.is_empty();
            drop(guard);
            if need_names {
                let _ = network_requests.send(NetworkRequest::LoadPlayerNames).await;
            }
        }
        NetworkResponse::PlayerNamesLoaded { names } => {
            let mut guard = app.lock().await;
            guard.on_player_names_loaded(names);
        }
        NetworkResponse::Pipeline(state) => {
            let mut guard = app.lock().await;
            guard.on_pipeline_state(state);
        }
        NetworkResponse::PipelineFinished { succeeded, cached_paths } => {
            info!("stats run finished (ok: {succeeded}, {cached_paths} cached paths)");
            let mut guard = app.lock().await;
            guard.on_pipeline_finished(cached_paths);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    true
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
