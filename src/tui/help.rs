use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &str)] = &[
    ("Tab / S-Tab", "Move focus between panels"),
    ("Ctrl-S", "Ingest the pasted lines"),
    ("Ctrl-A", "Analyze all stored logs"),
    ("Ctrl-R", "Reload stored logs"),
    ("Ctrl-L", "Clear the log text box"),
    ("Ctrl-Y", "Copy selected entry or analysis"),
    ("Up / Down", "Scroll analysis or move table selection"),
    ("F1", "Toggle this help"),
    ("Esc / Ctrl-C", "Quit"),
];

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(area.height)),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width.min(area.width)),
            Constraint::Fill(1),
        ])
        .split(vert[1])[1]
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    for (key, what) in KEYBINDS {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{key:<14}"), Style::default().fg(Color::Magenta)),
            Span::raw(*what),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ingesting clears the previous analysis; press Ctrl-A again afterwards.",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "Press any key to close.",
        Style::default().fg(Color::DarkGray),
    )));

    let popup = centered(area, 76, lines.len() as u16 + 2);
    f.render_widget(Clear, popup);
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, popup);
}
