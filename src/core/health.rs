use std::collections::VecDeque;
use std::time::Instant;

use super::types::WsConnectionStats;

const MAX_RECENT_ERRORS: usize = 100;
const MAX_ERROR_TEXT_BYTES: usize = 1024;

#[derive(Debug, Clone)]
struct ErrorRec {
    _timestamp: Instant,
    context: String,
    error: String,
}

fn truncate_string(s: &str) -> String {
    if s.len() <= MAX_ERROR_TEXT_BYTES {
        return s.to_string();
    }

    let mut end = MAX_ERROR_TEXT_BYTES;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Per-channel counters owned by the channel actor.
#[derive(Debug)]
pub struct WsHealthMonitor {
    connection_started: Instant,
    last_message_received: Instant,
    message_count: u64,
    decode_error_count: u64,
    error_count: u64,
    reconnect_count: u64,
    recent_errors: VecDeque<ErrorRec>,
}

impl Default for WsHealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl WsHealthMonitor {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            connection_started: now,
            last_message_received: now,
            message_count: 0,
            decode_error_count: 0,
            error_count: 0,
            reconnect_count: 0,
            recent_errors: VecDeque::with_capacity(MAX_RECENT_ERRORS),
        }
    }

    /// Called on every successful open.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.connection_started = now;
        self.last_message_received = now;
    }

    pub fn record_message(&mut self) {
        self.last_message_received = Instant::now();
        self.message_count = self.message_count.saturating_add(1);
    }

    pub fn record_decode_error(&mut self, error: &str) {
        self.decode_error_count = self.decode_error_count.saturating_add(1);
        self.record_error("decode", error);
    }

    pub fn record_error(&mut self, context: &str, error: &str) {
        self.error_count = self.error_count.saturating_add(1);
        if self.recent_errors.len() == MAX_RECENT_ERRORS {
            self.recent_errors.pop_front();
        }
        self.recent_errors.push_back(ErrorRec {
            _timestamp: Instant::now(),
            context: truncate_string(context),
            error: truncate_string(error),
        });
    }

    pub fn increment_reconnect(&mut self) {
        self.reconnect_count = self.reconnect_count.saturating_add(1);
    }

    /// Most recent error as `context: error`.
    pub fn last_error(&self) -> Option<String> {
        self.recent_errors
            .back()
            .map(|rec| format!("{}: {}", rec.context, rec.error))
    }

    pub fn get_stats(&self) -> WsConnectionStats {
        WsConnectionStats {
            uptime: self.connection_started.elapsed(),
            messages: self.message_count,
            decode_errors: self.decode_error_count,
            errors: self.error_count,
            reconnects: self.reconnect_count,
            last_message_age: self.last_message_received.elapsed(),
            recent_errors: self.recent_errors.len(),
        }
    }

    #[cfg(test)]
    fn last_message_age(&self) -> std::time::Duration {
        self.last_message_received.elapsed()
    }
}
