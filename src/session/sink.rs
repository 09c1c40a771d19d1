use tokio::sync::mpsc;

use crate::api::types::{FileRecord, MessageKind, ServerEvent};

/// Outbound half of one connection.
///
/// Clones all feed the same socket, so anything holding one (the session,
/// a file producer) emits to that connection only.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Queue an event. Returns `false` once the connection is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn message(&self, text: impl Into<String>, kind: MessageKind) -> bool {
        self.send(ServerEvent::message(text, kind))
    }

    pub fn error(&self, text: impl Into<String>) -> bool {
        self.send(ServerEvent::Error(text.into()))
    }

    /// Announce a downloadable file.
    pub fn file_update(&self, record: FileRecord) -> bool {
        self.send(ServerEvent::FileUpdate(record))
    }
}
