//! Line-safe logging for background work.
//!
//! The audio worker must not write to stdout while the REPL owns the input
//! line. Messages are published to subscribers instead; the REPL forwards them
//! through rustyline's external printer. With nobody listening, warnings and
//! errors go to stderr and info is dropped.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub text: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.text)
    }
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
static SUBSCRIBERS: Lazy<Mutex<Vec<(usize, Sender<LogMessage>)>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Receives every message published after it was created.
///
/// Dropping this value unsubscribes it.
pub struct Subscription {
    id: usize,
    rx: Receiver<LogMessage>,
}

impl Subscription {
    pub fn drain(&self) -> Vec<LogMessage> {
        self.rx.try_iter().collect()
    }

    /// Waits up to `timeout` for the next message.
    pub fn next_timeout(&self, timeout: Duration) -> Option<LogMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(m) => Some(m),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut subs) = SUBSCRIBERS.lock() {
            subs.retain(|(id, _)| *id != self.id);
        }
    }
}

pub fn subscribe() -> Subscription {
    let (tx, rx) = mpsc::channel();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut subs) = SUBSCRIBERS.lock() {
        subs.push((id, tx));
    }
    Subscription { id, rx }
}

pub fn info(msg: impl Into<String>) {
    publish(Level::Info, msg.into());
}

pub fn warn(msg: impl Into<String>) {
    publish(Level::Warn, msg.into());
}

pub fn error(msg: impl Into<String>) {
    publish(Level::Error, msg.into());
}

fn publish(level: Level, text: String) {
    let message = LogMessage { level, text };

    let Ok(mut subs) = SUBSCRIBERS.lock() else {
        eprintln!("{}", message);
        return;
    };
    if subs.is_empty() {
        if message.level != Level::Info {
            eprintln!("{}", message);
        }
        return;
    }

    subs.retain(|(_, tx)| tx.send(message.clone()).is_ok());
}
