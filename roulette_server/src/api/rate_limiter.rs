//! Per-connection limits on inbound WebSocket messages.
//!
//! Each connection gets a short burst window and a longer sustained window.
//! A message must fit in both to be forwarded to the table.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Which window refused a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limited {
    Burst,
    Sustained,
}

impl Limited {
    pub fn label(self) -> &'static str {
        match self {
            Limited::Burst => "burst",
            Limited::Sustained => "sustained",
        }
    }

    /// Text sent back to the client
    pub fn message(self) -> &'static str {
        match self {
            Limited::Burst => "Rate limit exceeded. Please slow down.",
            Limited::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Sliding window over recent message timestamps
#[derive(Debug)]
struct Window {
    timestamps: VecDeque<Instant>,
    max_messages: usize,
    span: Duration,
}

impl Window {
    fn new(max_messages: usize, span: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_messages),
            max_messages,
            span,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&ts) = self.timestamps.front() {
            if now.duration_since(ts) >= self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.timestamps.len() >= self.max_messages
    }
}

/// Burst plus sustained limiter for one connection
#[derive(Debug)]
pub struct MessageLimiter {
    burst: Window,
    sustained: Window,
}

impl Default for MessageLimiter {
    /// 10 messages per second and 100 per minute
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1), 100, Duration::from_secs(60))
    }
}

impl MessageLimiter {
    pub fn new(
        burst: usize,
        burst_span: Duration,
        sustained: usize,
        sustained_span: Duration,
    ) -> Self {
        Self {
            burst: Window::new(burst, burst_span),
            sustained: Window::new(sustained, sustained_span),
        }
    }

    /// Admit a message arriving now
    pub fn check(&mut self) -> Result<(), Limited> {
        self.check_at(Instant::now())
    }

    /// Admit a message arriving at `now`. Refused messages are not counted.
    pub fn check_at(&mut self, now: Instant) -> Result<(), Limited> {
        self.burst.evict(now);
        self.sustained.evict(now);

        if self.burst.is_full() {
            return Err(Limited::Burst);
        }
        if self.sustained.is_full() {
            return Err(Limited::Sustained);
        }

        self.burst.timestamps.push_back(now);
        self.sustained.timestamps.push_back(now);
        Ok(())
    }
}
