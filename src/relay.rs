//! Chat relay state shared with the browser extension.
//!
//! The extension pushes its current chat history and polls for messages
//! queued by the companion client. Polling drains the queue.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

#[derive(Debug)]
pub struct ChatRelay {
    history: RwLock<Value>,
    queue: Mutex<Vec<Value>>,
}

impl ChatRelay {
    pub fn new() -> Self {
        Self {
            history: RwLock::new(Value::Array(Vec::new())),
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Replace the stored chat history.
    pub fn set_chat(&self, chat: Value) {
        *self.history.write() = chat;
    }

    /// The last stored chat history (an empty array until set).
    pub fn chat(&self) -> Value {
        self.history.read().clone()
    }

    /// Queue a message for the extension. Returns the queue length.
    pub fn enqueue(&self, message: Value) -> usize {
        let mut queue = self.queue.lock();
        queue.push(message);
        queue.len()
    }

    /// Take every queued message, leaving the queue empty.
    pub fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.queue.lock())
    }
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self::new()
    }
}
