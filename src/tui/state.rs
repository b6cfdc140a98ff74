use crate::cli::DEFAULT_SERVICE_NAME;
use crate::model::{AnalysisState, IngestState, LogsState, WorkflowEvent};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Sample shown on first launch so a single keypress demonstrates the whole flow.
const SAMPLE_LOGS: &str = "2025-12-05 10:15:30 ERROR OrderService - Failed to connect to database\n\
2025-12-05 10:16:00 INFO OrderService - Retrying database connection\n\
2025-12-05 10:16:30 ERROR OrderService - Timeout occurred while querying orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Service,
    RawText,
    Analysis,
    Table,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Service => Focus::RawText,
            Focus::RawText => Focus::Analysis,
            Focus::Analysis => Focus::Table,
            Focus::Table => Focus::Service,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Service => Focus::Table,
            Focus::RawText => Focus::Service,
            Focus::Analysis => Focus::RawText,
            Focus::Table => Focus::Analysis,
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Command(UiCommand),
    Copy(String),
    Quit,
}

pub struct UiState {
    pub focus: Focus,
    pub show_help: bool,
    pub info: String,

    // Ingest form
    pub service_name: String,
    pub raw_text: String,

    // Mirrors of the controller slices, replaced wholesale on every event
    pub logs: LogsState,
    pub ingest: IngestState,
    pub analysis: AnalysisState,

    pub table_selected: usize,
    pub analysis_scroll: u16,
    pub last_refreshed: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::RawText,
            show_help: false,
            info: String::new(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            raw_text: SAMPLE_LOGS.to_string(),
            logs: LogsState::default(),
            ingest: IngestState::default(),
            analysis: AnalysisState::default(),
            table_selected: 0,
            analysis_scroll: 0,
            last_refreshed: None,
        }
    }
}

fn clock_now() -> String {
    let fmt = time::macros::format_description!("[hour]:[minute]:[second]");
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .format(&fmt)
        .unwrap_or_else(|_| "now".into())
}

impl UiState {
    pub fn apply_event(&mut self, ev: WorkflowEvent) {
        match ev {
            WorkflowEvent::Logs(logs) => {
                // A load that starts after a failure first publishes the list with the error
                // cleared; only a completed fetch counts as a refresh.
                let error_cleared_only = self.logs.error.is_some()
                    && logs.error.is_none()
                    && logs.data == self.logs.data;
                let refreshed = logs.error.is_none() && logs.data != self.logs.data;
                self.logs = logs;
                if self.logs.error.is_none() && !error_cleared_only {
                    self.last_refreshed = Some(clock_now());
                }
                if refreshed {
                    self.info = format!("Loaded {} log entries", self.logs.data.len());
                }
                self.table_selected = self
                    .table_selected
                    .min(self.logs.data.len().saturating_sub(1));
            }
            WorkflowEvent::Ingest(ingest) => {
                if self.ingest.pending && !ingest.pending && ingest.error.is_none() {
                    self.info = "Logs ingested".into();
                }
                self.ingest = ingest;
            }
            WorkflowEvent::Analysis(analysis) => {
                if analysis.data != self.analysis.data {
                    self.analysis_scroll = 0;
                }
                self.analysis = analysis;
            }
            WorkflowEvent::Info(msg) => self.info = msg,
        }
    }

    fn request_ingest(&mut self) -> KeyAction {
        if self.ingest.pending {
            self.info = "Ingestion already in progress…".into();
            return KeyAction::None;
        }
        KeyAction::Command(UiCommand::Ingest {
            service_name: self.service_name.clone(),
            raw_text: self.raw_text.clone(),
        })
    }

    fn request_analysis(&mut self) -> KeyAction {
        if self.analysis.pending {
            self.info = "Analysis already in progress…".into();
            return KeyAction::None;
        }
        KeyAction::Command(UiCommand::Analyze)
    }

    /// Text copied by Ctrl-Y: the selected entry in the table, otherwise the analysis summary.
    fn copy_target(&self) -> Option<String> {
        if self.focus == Focus::Table {
            return self.logs.data.get(self.table_selected).map(|e| {
                e.raw_line
                    .clone()
                    .unwrap_or_else(|| format!("{} {} {}", e.timestamp, e.level, e.message))
            });
        }
        self.analysis.data.as_ref().map(|a| {
            crate::text_summary::build_analysis_summary(a)
                .lines
                .join("\n")
        })
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyAction {
        if self.show_help {
            self.show_help = false;
            return KeyAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match (ctrl, key.code) {
            (true, KeyCode::Char('c')) | (_, KeyCode::Esc) => KeyAction::Quit,
            (_, KeyCode::F(1)) => {
                self.show_help = true;
                KeyAction::None
            }
            (true, KeyCode::Char('s')) => self.request_ingest(),
            (true, KeyCode::Char('a')) => self.request_analysis(),
            (true, KeyCode::Char('r')) => {
                self.info = "Refreshing…".into();
                KeyAction::Command(UiCommand::LoadLogs)
            }
            (true, KeyCode::Char('l')) => {
                self.raw_text.clear();
                self.focus = Focus::RawText;
                KeyAction::None
            }
            (true, KeyCode::Char('y')) => match self.copy_target() {
                Some(text) => KeyAction::Copy(text),
                None => {
                    self.info = "Nothing to copy".into();
                    KeyAction::None
                }
            },
            (_, KeyCode::Tab) => {
                self.focus = self.focus.next();
                KeyAction::None
            }
            (_, KeyCode::BackTab) => {
                self.focus = self.focus.prev();
                KeyAction::None
            }
            (true, _) => KeyAction::None,
            (false, code) => {
                self.edit(code);
                KeyAction::None
            }
        }
    }

    fn edit(&mut self, code: KeyCode) {
        match self.focus {
            Focus::Service => match code {
                KeyCode::Char(c) => self.service_name.push(c),
                KeyCode::Backspace => {
                    self.service_name.pop();
                }
                KeyCode::Enter | KeyCode::Down => self.focus = Focus::RawText,
                _ => {}
            },
            Focus::RawText => match code {
                KeyCode::Char(c) => self.raw_text.push(c),
                KeyCode::Enter => self.raw_text.push('\n'),
                KeyCode::Backspace => {
                    self.raw_text.pop();
                }
                _ => {}
            },
            Focus::Analysis => match code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.analysis_scroll = self.analysis_scroll.saturating_sub(1)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.analysis_scroll = self.analysis_scroll.saturating_add(1)
                }
                KeyCode::PageUp => self.analysis_scroll = self.analysis_scroll.saturating_sub(10),
                KeyCode::PageDown => {
                    self.analysis_scroll = self.analysis_scroll.saturating_add(10)
                }
                KeyCode::Home => self.analysis_scroll = 0,
                _ => {}
            },
            Focus::Table => {
                let last = self.logs.data.len().saturating_sub(1);
                self.table_selected = match code {
                    KeyCode::Up | KeyCode::Char('k') => self.table_selected.saturating_sub(1),
                    KeyCode::Down | KeyCode::Char('j') => (self.table_selected + 1).min(last),
                    KeyCode::PageUp => self.table_selected.saturating_sub(10),
                    KeyCode::PageDown => (self.table_selected + 10).min(last),
                    KeyCode::Home | KeyCode::Char('g') => 0,
                    KeyCode::End | KeyCode::Char('G') => last,
                    _ => self.table_selected,
                };
            }
        }
    }

    /// Bracketed paste: the service field takes the first line, everything else lands in the
    /// log text area.
    pub fn on_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if self.focus == Focus::Service {
            if let Some(first) = text.lines().next() {
                self.service_name.push_str(first.trim());
            }
            return;
        }
        self.focus = Focus::RawText;
        self.raw_text.push_str(&text);
    }
}
