use parking_lot::Mutex;

/// Sink for the construction-lifecycle and duplicate-registration messages
/// the core emits. The core performs no I/O of its own.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink forwarding to the `tracing` ecosystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(target: "modelkit", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "modelkit", "{message}");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// In-memory sink that records every message, for assertions in tests.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.entries.lock().push((LogLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.entries
            .lock()
            .push((LogLevel::Error, message.to_string()));
    }
}
