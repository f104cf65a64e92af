use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if guard.state.input.editing {
        let request = match (key_event.code, key_event.modifiers) {
            (Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
            (KeyCode::Enter, _) => guard.submit_league_input(),
            (KeyCode::Esc, _) => {
                guard.cancel_league_input();
                None
            }
            (KeyCode::Backspace, _) => {
                guard.pop_input_char();
                None
            }
            (Char(c), _) => {
                guard.push_input_char(c);
                None
            }
            _ => None,
        };
        drop(guard);
        if let Some(request) = request {
            let _ = network_requests.send(request).await;
        }
        return;
    }

    let request = match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => {
            guard.update_tab(MenuItem::Standings);
            None
        }
        (_, Char('2'), _) => {
            guard.update_tab(MenuItem::Chart);
            None
        }
        (_, Char('3'), _) => {
            guard.update_tab(MenuItem::BenchHits);
            None
        }
        (_, Char('4'), _) => {
            guard.update_tab(MenuItem::Captains);
            None
        }
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
            None
        }
        (MenuItem::Help, KeyCode::Esc, _) => {
            guard.exit_help();
            None
        }

        // League input and stats
        (_, Char('e'), _) | (MenuItem::Standings, KeyCode::Enter, _) => {
            guard.begin_league_input();
            None
        }
        (_, Char('s'), _) => guard.start_stats(),

        // Scrolling
        (_, Char('j') | KeyCode::Down, _) => {
            guard.scroll_down();
            None
        }
        (_, Char('k') | KeyCode::Up, _) => {
            guard.scroll_up();
            None
        }

        // Global
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    };

    drop(guard);
    if let Some(request) = request {
        let _ = network_requests.send(request).await;
    }
}
