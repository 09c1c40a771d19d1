//! Client side of the relay: a connection state machine that turns server
//! events into rendered log entries and user actions into client events.
//!
//! The browser page and `relay-cli` both follow this contract. Nothing here
//! does I/O; the caller owns the socket and the screen.

mod plan;

use chrono::DateTime;

use crate::api::types::{ChatEntry, ClientEvent, FileRecord, MessageKind, ServerEvent};

pub use plan::PlanStep;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// One item of the visible log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Message(ChatEntry),
    Download {
        filename: String,
        label: String,
        href: String,
    },
}

/// Format a file timestamp for display.
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[derive(Debug, Default)]
pub struct RelayClient {
    state: ConnectionState,
    log: Vec<Rendered>,
    plan: Vec<PlanStep>,
    cursor: usize,
}

impl RelayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn log(&self) -> &[Rendered] {
        &self.log
    }

    pub fn plan(&self) -> &[PlanStep] {
        &self.plan
    }

    /// Entries appended since the last call.
    pub fn take_new(&mut self) -> &[Rendered] {
        let start = self.cursor;
        self.cursor = self.log.len();
        &self.log[start..]
    }

    pub fn on_connect(&mut self) {
        self.state = ConnectionState::Connected;
        self.push_message("Connected to server", MessageKind::System);
    }

    pub fn on_disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.push_message("Disconnected from server", MessageKind::Error);
    }

    /// Dispatch one server event.
    pub fn on_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Message(entry) => self.on_message(entry),
            ServerEvent::Error(payload) => {
                self.push_message(format!("Error: {}", payload), MessageKind::Error)
            }
            ServerEvent::FileUpdate(record) => self.on_file_update(record),
        }
    }

    /// Decode and dispatch one text frame. Undecodable frames are shown as errors.
    pub fn on_frame(&mut self, frame: &str) {
        match serde_json::from_str::<ServerEvent>(frame) {
            Ok(event) => self.on_event(event),
            Err(e) => {
                self.push_message(format!("Error: unreadable frame: {}", e), MessageKind::Error)
            }
        }
    }

    fn on_message(&mut self, entry: ChatEntry) {
        if entry.kind == MessageKind::Assistant {
            let steps = PlanStep::parse_list(&entry.text);
            if !steps.is_empty() {
                self.plan = steps;
            }
        }
        self.log.push(Rendered::Message(entry));
    }

    fn on_file_update(&mut self, record: FileRecord) {
        let label = format!("{} ({})", record.filename, format_timestamp(record.timestamp));
        let href = format!("/download/{}", urlencoding::encode(&record.filename));
        self.log.push(Rendered::Download {
            filename: record.filename,
            label,
            href,
        });
    }

    /// Submit typed input.
    ///
    /// Returns the event to send, or `None` when the input is blank or the
    /// client is disconnected. A returned event has also been echoed.
    pub fn submit(&mut self, input: &str) -> Option<ClientEvent> {
        let text = input.trim();
        if text.is_empty() || !self.can_submit() {
            return None;
        }
        self.push_message(text, MessageKind::User);
        Some(ClientEvent::user_input(text))
    }

    /// Flip the checked flag of step `index` (0-based). Returns the new flag.
    pub fn toggle_step(&mut self, index: usize) -> Option<bool> {
        let step = self.plan.get_mut(index)?;
        step.checked = !step.checked;
        Some(step.checked)
    }

    pub fn set_plan(&mut self, steps: Vec<PlanStep>) {
        self.plan = steps;
    }

    /// One event per checked step, in plan order.
    pub fn execute_plan(&mut self) -> Vec<ClientEvent> {
        let texts: Vec<String> = self
            .plan
            .iter()
            .filter(|s| s.checked)
            .map(|s| s.text.clone())
            .collect();
        texts.iter().filter_map(|t| self.submit(t)).collect()
    }

    fn push_message(&mut self, text: impl Into<String>, kind: MessageKind) {
        self.log.push(Rendered::Message(ChatEntry {
            text: text.into(),
            kind,
        }));
    }
}
