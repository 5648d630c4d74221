use std::fmt;

use chrono::{DateTime, Local};
use crossbeam_channel::{Receiver, Sender};

const TIMESTAMP_FORMAT: &str = "[%Y/%m/%d %H:%M:%S]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "Debug"),
            LogLevel::Info => write!(f, "Info"),
            LogLevel::Warning => write!(f, "Warning"),
            LogLevel::Error => write!(f, "Error"),
        }
    }
}

/// One operator-facing status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Formats the entry with the time it was consumed, not produced.
    pub fn render(&self, at: DateTime<Local>) -> String {
        format!("{} {}", at.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Multi-producer status channel shared by every worker.
///
/// Each message is mirrored to the `log` facade and forwarded over an
/// unbounded channel, so emitting never blocks. Messages are dropped silently
/// once the consumer is gone.
#[derive(Clone)]
pub struct EventLog {
    tx: Sender<LogEntry>,
}

impl EventLog {
    pub fn channel() -> (Self, Receiver<LogEntry>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => log::debug!("{message}"),
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warning => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
        }
        let _ = self.tx.send(LogEntry { level, message });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_messages_arrive_in_order() {
        let (log, rx) = EventLog::channel();
        log.info("Info: first");
        log.warn("Warning: second");
        log.error("Error: third");

        let entries: Vec<LogEntry> = rx.try_iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].message, "Warning: second");
        assert_eq!(entries[2].level, LogLevel::Error);
    }

    #[test]
    fn test_clones_share_the_consumer() {
        let (log, rx) = EventLog::channel();
        let producer = log.clone();
        std::thread::spawn(move || producer.debug("from thread"))
            .join()
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().message, "from thread");
    }

    #[test]
    fn test_emit_after_consumer_dropped_is_silent() {
        let (log, rx) = EventLog::channel();
        drop(rx);
        log.info("nobody listening");
    }

    #[test]
    fn test_render_prefixes_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let entry = LogEntry {
            level: LogLevel::Info,
            message: "Info: camera ready".into(),
        };
        assert_eq!(entry.render(at), "[2024/03/09 07:05:02] Info: camera ready");
    }
}
