pub mod message;
pub mod names;

use message::Messages;

/// The seam between the passes and whatever is driving the compilation
/// (a CLI, a language server, a test harness). Passes hand their
/// accumulated messages over through this instead of printing anything
/// themselves.
pub trait Driver {
    fn report(&mut self, messages: Messages);
}

/// A driver which just keeps every message it is given. Mostly useful
/// for tests and tools that want to inspect diagnostics directly.
#[derive(Debug, Default)]
pub struct CollectingDriver {
    pub messages: Messages,
}

impl CollectingDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for CollectingDriver {
    fn report(&mut self, messages: Messages) {
        self.messages.merge(messages);
    }
}
