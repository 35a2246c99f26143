//! Persisted log stream.
//!
//! [`LogSinkLayer`] turns every tracing event at or above the configured
//! severity into a [`LogEntry`] and queues it without blocking. The
//! [`LogSink`] thread drains the queue into one file per UTC day:
//!
//! ```text
//! [2024-01-01 12:00:00.000]{INFO}|hwmc::motion::controller|Ant 3: Elevation acquired
//! ```
//!
//! FATAL has no tracing level of its own; it is an `error!` event carrying
//! `fatal = true`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flume::{Receiver, RecvTimeoutError, Sender};
use hwmc_common::config::Severity;
use hwmc_common::consts::LOG_FILE_EXTENSION;
use hwmc_common::shutdown::Shutdown;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::storage::DailyFile;

const MODULE: &str = module_path!();

const IDLE_WAIT: Duration = Duration::from_millis(100);

/// One persisted log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub severity: Severity,
    pub module: String,
    pub message: String,
}

impl LogEntry {
    /// Entry stamped now.
    pub fn now(severity: Severity, module: &str, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            severity,
            module: module.to_string(),
            message: message.into(),
        }
    }

    /// Encode as a newline-terminated line.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]{{{}}}|{}|{}",
            self.at.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.severity,
            self.module,
            self.message
        )
    }
}

/// Severity of a tracing event.
pub fn severity_of(level: &Level, fatal: bool) -> Severity {
    match *level {
        Level::ERROR if fatal => Severity::Fatal,
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warn,
        Level::INFO => Severity::Info,
        Level::DEBUG => Severity::Debug,
        Level::TRACE => Severity::All,
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    fields: String,
    fatal: bool,
}

impl EntryVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        self.fields.push_str(name);
        self.fields.push('=');
        self.fields.push_str(&value.to_string());
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for EntryVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "fatal" {
            self.fatal = value;
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

/// Tracing layer feeding the log sink queue.
pub struct LogSinkLayer {
    tx: Sender<LogEntry>,
    min: Severity,
}

impl LogSinkLayer {
    /// Create the layer and the queue the [`LogSink`] drains.
    pub fn channel(min: Severity) -> (Self, Receiver<LogEntry>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx, min }, rx)
    }
}

impl<S> Layer<S> for LogSinkLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Cheap pre-check: FATAL can only come from ERROR.
        if severity_of(metadata.level(), true) < self.min {
            return;
        }
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);
        let severity = severity_of(metadata.level(), visitor.fatal);
        if severity < self.min {
            return;
        }
        let module = metadata.module_path().unwrap_or_else(|| metadata.target());
        // The sink may already be gone during shutdown.
        let _ = self.tx.send(LogEntry {
            at: Utc::now(),
            severity,
            module: module.to_string(),
            message: visitor.finish(),
        });
    }
}

/// Log file writer thread.
pub struct LogSink {
    rx: Receiver<LogEntry>,
    file: DailyFile,
}

impl LogSink {
    /// Open today's log file. Failure here is fatal to startup.
    pub fn open(prefix: &Path, rx: Receiver<LogEntry>) -> std::io::Result<Self> {
        let now = Utc::now();
        let mut file = DailyFile::open(prefix, LOG_FILE_EXTENSION, now.date_naive())?;
        file.write_line(&LogEntry::now(Severity::Info, MODULE, "Starting logging").to_line())?;
        Ok(Self { rx, file })
    }

    /// Path of the current log file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn write(&mut self, entry: &LogEntry) {
        self.roll_to(entry.at);
        // Nowhere left to report a failed write.
        let _ = self.file.write_line(&entry.to_line());
    }

    fn roll_to(&mut self, at: DateTime<Utc>) {
        if let Ok(true) = self.file.roll_to(at.date_naive()) {
            let _ = self
                .file
                .write_line(&LogEntry::now(Severity::Info, MODULE, "Starting logging").to_line());
        }
    }

    /// Drain entries until `shutdown` is triggered, then write the closing
    /// line.
    pub fn run(mut self, shutdown: &Shutdown) {
        loop {
            match self.rx.recv_timeout(IDLE_WAIT) {
                Ok(entry) => {
                    self.write(&entry);
                    while let Ok(entry) = self.rx.try_recv() {
                        self.write(&entry);
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.roll_to(Utc::now()),
                Err(RecvTimeoutError::Disconnected) => break,
            }
            let _ = self.file.flush();
            if shutdown.is_triggered() {
                break;
            }
        }
        while let Ok(entry) = self.rx.try_recv() {
            self.write(&entry);
        }
        let _ = self
            .file
            .write_line(&LogEntry::now(Severity::Info, MODULE, "Stopping logging").to_line());
        let _ = self.file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;
    use tracing::{debug, error, info, warn};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn line_format() {
        let entry = LogEntry {
            at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            severity: Severity::Warn,
            module: "hwmc::bus".to_string(),
            message: "queue deep".to_string(),
        };
        assert_eq!(
            entry.to_line(),
            "[2024-01-01 12:00:00.000]{WARN}|hwmc::bus|queue deep\n"
        );
    }

    #[test]
    fn level_mapping() {
        assert_eq!(severity_of(&Level::TRACE, false), Severity::All);
        assert_eq!(severity_of(&Level::DEBUG, false), Severity::Debug);
        assert_eq!(severity_of(&Level::ERROR, false), Severity::Error);
        assert_eq!(severity_of(&Level::ERROR, true), Severity::Fatal);
        assert_eq!(severity_of(&Level::WARN, true), Severity::Warn);
    }

    #[test]
    fn layer_filters_and_captures() {
        let (layer, rx) = LogSinkLayer::channel(Severity::Info);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            debug!("hidden");
            info!("Ant {}: Stopping", 3);
            warn!(depth = 12, "deep");
            error!(fatal = true, "no antennas");
        });

        let entries: Vec<LogEntry> = rx.try_iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].severity, Severity::Info);
        assert_eq!(entries[0].message, "Ant 3: Stopping");
        assert_eq!(entries[0].module, module_path!());
        assert_eq!(entries[1].message, "deep depth=12");
        assert_eq!(entries[2].severity, Severity::Fatal);
        assert_eq!(entries[2].message, "no antennas");
    }

    #[test]
    fn sink_writes_framed_file() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = flume::unbounded();
        let sink = LogSink::open(&dir.path().join("log-"), rx).unwrap();
        let path = sink.path().to_path_buf();

        tx.send(LogEntry::now(Severity::Error, "hwmc::test", "boom"))
            .unwrap();
        let shutdown = Shutdown::new();
        shutdown.trigger();
        sink.run(&shutdown);

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("{INFO}|hwmc::logging|Starting logging"));
        assert!(lines[1].ends_with("{ERROR}|hwmc::test|boom"));
        assert!(lines[2].ends_with("{INFO}|hwmc::logging|Stopping logging"));
    }
}
