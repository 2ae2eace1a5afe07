//! Per-run log collection.
//!
//! Every line a run reports goes through an [`AccountLogger`], which forwards
//! it to `tracing` for the console and records it in the shared [`RunLog`].
//! At the end of the run the notification body is built from the `RunLog`
//! and the log is erased.
//!
//! The `RunLog` keeps two views of the same stream:
//! - `lines`: the message text, one entry per line, optionally mirrored to a
//!   file on disk;
//! - `events`: a structured replay of `{channel, level, parts}`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
    /// Plain report output with no severity.
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    pub channel: String,
    pub level: LogLevel,
    pub parts: Vec<String>,
}

impl LogEvent {
    pub fn message(&self) -> String {
        self.parts.concat()
    }
}

#[derive(Debug, Default)]
struct Inner {
    lines: Vec<String>,
    events: Vec<LogEvent>,
}

// ---------------------------------------------------------------------------
// RunLog
// ---------------------------------------------------------------------------

/// Cloneable handle to one run's log. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    inner: Arc<Mutex<Inner>>,
    file: Option<PathBuf>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every line to `path` as well as keeping it in memory.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::default(),
            file: Some(path.into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn logger(&self, channel: impl Into<String>) -> AccountLogger {
        AccountLogger {
            log: self.clone(),
            channel: channel.into(),
            context: None,
        }
    }

    pub fn append(&self, event: LogEvent) {
        let line = event.message();
        if let Some(path) = &self.file {
            if let Err(e) = append_line(path, &line) {
                tracing::warn!(path = %path.display(), error = %e, "failed to persist log line");
            }
        }
        let mut inner = self.lock();
        inner.lines.push(line);
        inner.events.push(event);
    }

    /// Full log text, one newline-terminated line per entry.
    pub fn read_all(&self) -> String {
        self.lock()
            .lines
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }

    pub fn replay(&self) -> Vec<LogEvent> {
        self.lock().events.clone()
    }

    /// Each event's parts concatenated, events separated by a markdown line break.
    pub fn render_replay(&self) -> String {
        self.lock()
            .events
            .iter()
            .map(LogEvent::message)
            .collect::<Vec<_>>()
            .join("  \n")
    }

    /// Drop the structured replay.
    pub fn erase(&self) {
        self.lock().events.clear();
    }

    /// Drop the line buffer and truncate the mirror file.
    pub fn clean(&self) -> std::io::Result<()> {
        self.lock().lines.clear();
        if let Some(path) = &self.file {
            if path.exists() {
                std::fs::File::create(path)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.lock();
        inner.lines.is_empty() && inner.events.is_empty()
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")
}

// ---------------------------------------------------------------------------
// AccountLogger
// ---------------------------------------------------------------------------

/// A named logger writing into a [`RunLog`].
#[derive(Debug, Clone)]
pub struct AccountLogger {
    log: RunLog,
    channel: String,
    context: Option<String>,
}

impl AccountLogger {
    /// Attach a context tag, shown in console output.
    pub fn with_context(mut self, tag: impl Into<String>) -> Self {
        self.context = Some(tag.into());
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message.into());
    }

    pub fn log(&self, message: impl Into<String>) {
        self.emit(LogLevel::Log, message.into());
    }

    fn emit(&self, level: LogLevel, message: String) {
        let context = self.context.as_deref().unwrap_or("");
        match level {
            LogLevel::Error => {
                tracing::error!(account = %self.channel, context, "{message}")
            }
            LogLevel::Info | LogLevel::Log => {
                tracing::info!(account = %self.channel, context, "{message}")
            }
        }
        self.log.append(LogEvent {
            channel: self.channel.clone(),
            level,
            parts: vec![message],
        });
    }
}

/// Replace the characters in `[start, end)` with `*`.
pub fn mask(value: &str, start: usize, end: usize) -> String {
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i >= start && i < end { '*' } else { c })
        .collect()
}
