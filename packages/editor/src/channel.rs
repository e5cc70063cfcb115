//! Configuration-changed notifications
//!
//! The session owns a small publish/subscribe channel. Each subscriber gets
//! its own unbounded queue, so notifications arrive in emission order and a
//! slow consumer never blocks the editor.

use dashcraft_config::ElementConfig;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Emitted whenever the session accepts a new configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChanged {
    pub config: ElementConfig,
    /// Validation errors, joined
    pub error: Option<String>,
    /// Whether the visual editor can represent `config`
    pub form_available: bool,
}

#[derive(Debug, Default)]
pub struct ConfigChannel {
    subscribers: Vec<UnboundedSender<ConfigChanged>>,
}

impl ConfigChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<ConfigChanged> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber; dropped receivers are forgotten
    pub fn emit(&mut self, event: ConfigChanged) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
