mod clipboard;
mod help;
mod state;

use crate::cli::{build_controller, Cli};
use crate::model::{AnalysisState, WorkflowEvent};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Terminal,
};
use state::{Focus, KeyAction, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    match args.log_file.clone().or_else(crate::logging::default_log_file) {
        Some(path) => {
            if let Err(e) = crate::logging::init_file(args.debug, &path) {
                eprintln!("Logging disabled: {e:#}");
            }
        }
        None => eprintln!("Logging disabled: no data directory available"),
    }

    // Unbounded channels keep the UI thread from ever waiting on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller = Arc::new(build_controller(&args)?.with_events(event_tx.clone()));
    let _ = cmd_tx.send(UiCommand::LoadLogs);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller reaches it through events.
    let mut state = UiState::default();
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                dirty = true;
                match state.on_key(k) {
                    KeyAction::None => {}
                    KeyAction::Command(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("controller stopped unexpectedly"));
                        }
                    }
                    KeyAction::Copy(text) => {
                        state.info = match clipboard::copy_to_clipboard(&text) {
                            Ok(()) => "Copied to clipboard".into(),
                            Err(e) => format!("Copy failed: {e:#}"),
                        };
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
            }
            Ok(Event::Paste(text)) => {
                state.on_paste(&text);
                dirty = true;
            }
            Ok(Event::Resize(..)) => dirty = true,
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title.to_string())
}

fn error_line(msg: &str) -> Line<'static> {
    Line::from(Span::styled(
        msg.to_string(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),      // Title
                Constraint::Percentage(55), // Ingest + analysis
                Constraint::Min(5),         // Stored logs
                Constraint::Length(1),      // Status
            ]
            .as_ref(),
        )
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            "AI Log Intelligence",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  ingest logs, detect patterns, get suggested fixes"),
    ]);
    f.render_widget(Paragraph::new(title), rows[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(rows[1]);

    draw_ingest(top[0], f, state);
    draw_analysis(top[1], f, state);
    draw_logs(rows[2], f, state);
    draw_status(rows[3], f, state);

    if state.show_help {
        help::draw_help(area, f);
    }
}

fn draw_ingest(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(area);

    let cursor = |focus: Focus| if state.focus == focus { "▏" } else { "" };

    let service = Paragraph::new(format!("{}{}", state.service_name, cursor(Focus::Service)))
        .block(panel_block("Service Name", state.focus == Focus::Service));
    f.render_widget(service, parts[0]);

    // Keep the tail of the text visible while typing.
    let text = format!("{}{}", state.raw_text, cursor(Focus::RawText));
    let offset = tail_scroll(&text, parts[1].height.saturating_sub(2));
    let raw = Paragraph::new(text)
        .block(panel_block("1. Paste Log Lines", state.focus == Focus::RawText))
        .scroll((offset, 0));
    f.render_widget(raw, parts[1]);

    let status = if state.ingest.pending {
        Line::from(Span::styled(
            "Ingesting…",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(err) = state.ingest.error.as_deref() {
        error_line(err)
    } else {
        Line::from(Span::styled(
            "Ctrl-S ingest  Ctrl-L clear",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(status), parts[2]);
}

/// Scroll offset that keeps the last `visible` lines of `text` on screen.
fn tail_scroll(text: &str, visible: u16) -> u16 {
    let lines = u16::try_from(text.split('\n').count()).unwrap_or(u16::MAX);
    lines.saturating_sub(visible)
}

fn analysis_lines(analysis: &AnalysisState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if analysis.pending {
        lines.push(Line::from(Span::styled(
            "Analyzing…",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(err) = analysis.error.as_deref() {
        lines.push(error_line(err));
    }

    let Some(result) = analysis.data.as_ref() else {
        lines.push(Line::from(Span::styled(
            "Press Ctrl-A to see clusters, explanations, and suggested fixes.",
            Style::default().fg(Color::DarkGray),
        )));
        return lines;
    };

    let label = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
    lines.push(Line::from(Span::styled("Overall Summary", label)));
    lines.push(Line::from(result.overall_summary.clone()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Error / Issue Clusters", label)));
    if result.clusters.is_empty() {
        lines.push(Line::from("None reported."));
    }
    for c in &result.clusters {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                c.pattern.clone(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  count: "),
            Span::styled(c.count.to_string(), Style::default().fg(Color::Cyan)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Explanation: ", label),
            Span::raw(c.explanation.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Suggested Fix: ", label),
            Span::raw(c.suggested_fix.clone()),
        ]));
    }
    lines
}

fn draw_analysis(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let p = Paragraph::new(analysis_lines(&state.analysis))
        .block(panel_block(
            "2. Analysis (Ctrl-A)",
            state.focus == Focus::Analysis,
        ))
        .wrap(Wrap { trim: false })
        .scroll((state.analysis_scroll, 0));
    f.render_widget(p, area);
}

fn draw_logs(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = match state.last_refreshed.as_deref() {
        Some(at) => format!(
            "3. Stored Logs ({}, refreshed {at})",
            state.logs.data.len()
        ),
        None => format!("3. Stored Logs ({})", state.logs.data.len()),
    };
    let block = panel_block(&title, state.focus == Focus::Table);

    if state.logs.data.is_empty() {
        let mut lines = Vec::new();
        if let Some(err) = state.logs.error.as_deref() {
            lines.push(error_line(err));
        }
        lines.push(Line::from(Span::styled(
            "No logs stored yet. Ingest some logs above.",
            Style::default().fg(Color::DarkGray),
        )));
        f.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let (table_area, error_area) = if state.logs.error.is_some() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
            .split(area);
        (split[0], Some(split[1]))
    } else {
        (area, None)
    };

    let level_style = |level: &str| match level.to_ascii_uppercase().as_str() {
        "ERROR" | "FATAL" => Style::default().fg(Color::Red),
        "WARN" | "WARNING" => Style::default().fg(Color::Yellow),
        "DEBUG" | "TRACE" => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::Green),
    };

    let rows: Vec<Row> = state
        .logs
        .data
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.id.to_string()),
                Cell::from(e.timestamp.clone()),
                Cell::from(Span::styled(e.level.clone(), level_style(&e.level))),
                Cell::from(e.service_name.clone()),
                Cell::from(e.message.clone()),
            ])
        })
        .collect();

    let header = Row::new(vec!["ID", "Timestamp", "Level", "Service", "Message"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(20),
            Constraint::Length(7),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    if state.focus == Focus::Table {
        table_state.select(Some(state.table_selected));
    }
    f.render_stateful_widget(table, table_area, &mut table_state);

    if let (Some(err), Some(err_area)) = (state.logs.error.as_deref(), error_area) {
        f.render_widget(Paragraph::new(error_line(err)), err_area);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = Line::from(vec![
        Span::styled(
            " Tab",
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(" focus  "),
        Span::styled("Ctrl-R", Style::default().fg(Color::Magenta)),
        Span::raw(" reload  "),
        Span::styled("F1", Style::default().fg(Color::Magenta)),
        Span::raw(" help  "),
        Span::styled("Esc", Style::default().fg(Color::Magenta)),
        Span::raw(" quit  "),
        Span::styled(state.info.clone(), Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, Cluster};

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn tail_scroll_saturates_on_huge_pastes() {
        assert_eq!(tail_scroll("a\nb", 10), 0);
        assert_eq!(tail_scroll("a\nb\nc\nd", 2), 2);
        let huge = "x\n".repeat(70_000);
        assert_eq!(tail_scroll(&huge, 10), u16::MAX - 10);
    }

    #[test]
    fn analysis_hint_when_empty() {
        let lines = text_of(&analysis_lines(&AnalysisState::default()));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Press Ctrl-A"));
    }

    #[test]
    fn stale_analysis_shown_with_pending_and_error() {
        let state = AnalysisState {
            data: Some(AnalysisResult {
                overall_summary: "3 issues".into(),
                clusters: vec![Cluster {
                    pattern: "DB timeout".into(),
                    count: 3,
                    explanation: "slow".into(),
                    suggested_fix: "index".into(),
                }],
            }),
            pending: true,
            error: Some("Error analyzing logs.".into()),
        };
        let lines = text_of(&analysis_lines(&state));
        assert_eq!(lines[0], "Analyzing…");
        assert_eq!(lines[1], "Error analyzing logs.");
        assert!(lines.contains(&"3 issues".to_string()));
        assert!(lines.contains(&"DB timeout  count: 3".to_string()));
        assert!(lines.contains(&"Suggested Fix: index".to_string()));
    }
}
