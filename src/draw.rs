use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::points_chart::PointsChart;
use crate::components::progress::ProgressBar;
use crate::components::stats_table::StatsTable;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use fpl_api::{CaptainStats, LeagueStats, ManagerStats};

static TABS: &[&str; 4] = &["Standings", "Chart", "Bench & Hits", "Captains"];

const HELP_TEXT: &str = "\
 1  Standings        e / Enter  edit league ID
 2  Chart            s          fetch league stats
 3  Bench & Hits     j / k      scroll
 4  Captains         \"          toggle log pane
 ?  Help             f          full screen
 Esc  back           q          quit

Stats load in two steps. Histories arrive first and fill the chart and the
bench and hits tables. Captain rankings and bench details follow once every
finished gameweek's picks are in. Finished gameweeks are cached for the
session, so a second run only refetches what can still change.";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Chart => draw_chart(f, layout.main, app),
            MenuItem::BenchHits => draw_bench_hits(f, layout.main, app),
            MenuItem::Captains => draw_captains(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Standings => 0,
        MenuItem::Chart => 1,
        MenuItem::BenchHits => 2,
        MenuItem::Captains => 3,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = Vec::new();

    match app.state.league.league_id.as_deref() {
        Some(id) => spans.push(Span::styled(format!(" League {id}"), dim)),
        None => spans.push(Span::styled(" No league", dim)),
    }
    if let Some(at) = app.state.league.loaded_at.as_deref() {
        spans.push(Span::styled(format!(" | loaded {at}"), dim));
    }
    if let Some(gw) = app.state.stats.league.as_ref().and_then(|l| l.current_event) {
        spans.push(Span::styled(format!(" | GW{gw}"), dim));
    }
    if app.state.stats.cached_paths > 0 {
        spans.push(Span::styled(format!(" | {} cached", app.state.stats.cached_paths), dim));
    }
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(format!(" | {err}"), Style::default().fg(Color::Red)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.state.league.league_id.as_deref() {
        Some(id) => format!(" League {id} "),
        None => " Standings ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [input_area, legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)])
            .areas(inner);

    let input_line = if app.state.input.editing {
        Line::from(vec![
            Span::raw("League ID: "),
            Span::styled(
                format!("{}_", app.state.input.input),
                Style::default().fg(Color::Yellow),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Keys: e=league ID  s=fetch stats  j/k=scroll  ?=help  q=quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(input_line), input_area);

    if app.state.input.editing {
        f.render_widget(
            Paragraph::new("Enter=load  Esc=cancel").style(Style::default().fg(Color::DarkGray)),
            legend,
        );
    }

    if !app.state.league.is_loaded() {
        let msg = match app.state.last_error.as_deref() {
            Some(err) => err.to_string(),
            None if app.state.league.league_id.is_some() => "Loading standings...".to_string(),
            None => "Press e to enter a league ID".to_string(),
        };
        draw_message(f, content, &msg);
        return;
    }

    let rows = app
        .state
        .league
        .standings
        .iter()
        .map(|s| (s.player_name.clone(), vec![s.entry_name.clone(), s.total.to_string()]))
        .collect();
    f.render_widget(
        StatsTable::new(&["Team", "Total"], rows).scroll(app.state.scroll_offset),
        content,
    );
}

/// Draws the progress bar on the first row while a run is active and
/// returns what is left for content.
fn draw_progress(f: &mut Frame, area: Rect, app: &App) -> Rect {
    if !app.state.stats.running {
        return area;
    }
    let [bar, rest] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    f.render_widget(
        ProgressBar { percent: app.state.stats.percent, label: &app.state.stats.label },
        bar,
    );
    rest
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Total Points by Gameweek ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let content = draw_progress(f, inner, app);

    let Some(league) = app.state.stats.league.as_ref() else {
        draw_message(f, content, &stats_placeholder(app));
        return;
    };
    let series = league.chart_series();
    if series.is_empty() {
        draw_message(f, content, "No gameweek history yet");
        return;
    }
    f.render_widget(PointsChart { series: &series }, content);
}

fn draw_bench_hits(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Bench & Hits ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let content = draw_progress(f, inner, app);

    let Some(league) = app.state.stats.league.as_ref() else {
        draw_message(f, content, &stats_placeholder(app));
        return;
    };
    let captains = app.state.stats.captains.as_ref();
    let scroll = app.state.scroll_offset;

    let [bench_area, hits_area] = if content.width >= 120 {
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(content)
    } else {
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(content)
    };

    let bench_rows = league
        .bench_ranking()
        .into_iter()
        .map(|m| {
            (
                m.player_name.clone(),
                vec![
                    m.total_bench_points.to_string(),
                    m.total.to_string(),
                    bench_summary(league, captains, m),
                ],
            )
        })
        .collect();
    f.render_widget(
        StatsTable::new(&["Bench Points", "Total Points", "Top Bench"], bench_rows)
            .scroll(scroll)
            .block(titled(" Bench Points Wasted ")),
        bench_area,
    );

    let hits_rows = league
        .hits_ranking()
        .into_iter()
        .map(|m| {
            (
                m.player_name.clone(),
                vec![m.total_transfers.to_string(), m.total_hits_cost.to_string(), chips_summary(m)],
            )
        })
        .collect();
    f.render_widget(
        StatsTable::new(&["Transfers", "Hits Cost", "Chips"], hits_rows)
            .scroll(scroll)
            .block(titled(" Transfer Hits & Activity ")),
        hits_area,
    );
}

fn draw_captains(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Captain Performance ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let content = draw_progress(f, inner, app);

    let Some(captains) = app.state.stats.captains.as_ref() else {
        let msg = if app.state.stats.running {
            "Loading captain stats...".to_string()
        } else {
            stats_placeholder(app)
        };
        draw_message(f, content, &msg);
        return;
    };

    let rows = captains
        .rankings
        .iter()
        .map(|r| {
            (
                r.player_name.clone(),
                vec![
                    r.total_captain_points.to_string(),
                    format!("{:.1}", r.avg_captain_points),
                    r.most_captained.clone(),
                ],
            )
        })
        .collect();
    f.render_widget(
        StatsTable::new(&["Captain Points", "Avg/GW", "Most Captained"], rows)
            .scroll(app.state.scroll_offset),
        content,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(HELP_TEXT).wrap(Wrap { trim: false }), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let logger = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logger, area);
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::TOP)
        .title(title)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
}

fn draw_message(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn stats_placeholder(app: &App) -> String {
    if app.state.stats.running {
        return "Fetching manager histories...".to_string();
    }
    if let Some(err) = app.state.stats.error.as_deref() {
        return format!("{err}\nPress s to try again");
    }
    if app.state.league.is_loaded() {
        "Press s to fetch league stats".to_string()
    } else {
        "Load a league first (press e)".to_string()
    }
}

/// `"Salah 8 (GW4), Saka 6 (GW2)"`; empty until captain data is in.
fn bench_summary(league: &LeagueStats, captains: Option<&CaptainStats>, m: &ManagerStats) -> String {
    let Some(details) = captains.and_then(|c| c.bench_details.get(&m.entry)) else {
        return String::new();
    };
    details
        .iter()
        .map(|d| format!("{} {} (GW{})", league.player_name(d.element), d.points, d.gw))
        .collect::<Vec<_>>()
        .join(", ")
}

fn chips_summary(m: &ManagerStats) -> String {
    m.chips
        .iter()
        .map(|c| format!("{} GW{}", c.name, c.event))
        .collect::<Vec<_>>()
        .join(", ")
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpl_api::BenchDetail;
    use fpl_api::fpl::ChipPlay;
    use std::collections::HashMap;

    #[test]
    fn bench_summary_resolves_names() {
        let league = LeagueStats {
            player_names: HashMap::from([(100, "Salah".to_string())]),
            ..Default::default()
        };
        let m = ManagerStats { entry: 7, ..Default::default() };
        assert_eq!(bench_summary(&league, None, &m), "");

        let captains = CaptainStats {
            bench_details: HashMap::from([(
                7,
                vec![
                    BenchDetail { element: 100, points: 8, gw: 4 },
                    BenchDetail { element: 999, points: 2, gw: 1 },
                ],
            )]),
            ..Default::default()
        };
        assert_eq!(
            bench_summary(&league, Some(&captains), &m),
            "Salah 8 (GW4), Unknown 2 (GW1)"
        );
    }

    #[test]
    fn chips_list_name_and_gameweek() {
        let m = ManagerStats {
            chips: vec![
                ChipPlay { name: "wildcard".into(), event: 3 },
                ChipPlay { name: "bboost".into(), event: 9 },
            ],
            ..Default::default()
        };
        assert_eq!(chips_summary(&m), "wildcard GW3, bboost GW9");
    }
}
