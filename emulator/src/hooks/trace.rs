use std::sync::{Arc, Mutex, PoisonError};

/// Receives diagnostics emitted by the machine, like fault reports and malformed-instruction
/// warnings.
pub trait TraceSink: Send {
    fn trace(&mut self, message: &str);
}

/// Forwards diagnostics to `tracing`, under the `chip8_emulator::trace` target.
///
/// Nothing is printed unless the embedding application installs a subscriber enabling it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&mut self, message: &str) {
        tracing::warn!(target: "chip8_emulator::trace", "{}", message);
    }
}

/// Keeps every diagnostic in memory.
///
/// Clones share the same log, so a handle can be kept while the machine owns the sink.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Messages recorded so far, oldest first
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TraceSink for RecordingSink {
    fn trace(&mut self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}
