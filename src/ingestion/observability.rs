use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::IngestionError;
use crate::types::NormalizedRecord;

use super::unified::IngestionFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// User-correctable input problem (wrong extension, missing site, ...).
    Warning,
    /// Error-level event (the file could not be reduced to a record).
    Error,
    /// Critical error (typically I/O failures).
    Critical,
}

impl IngestionSeverity {
    /// Classify a pipeline error.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::Io(_) => IngestionSeverity::Critical,
            IngestionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
                _ => IngestionSeverity::Error,
            },
            IngestionError::UnsupportedFormat { .. }
            | IngestionError::MissingSite
            | IngestionError::InvalidPeriod { .. } => IngestionSeverity::Warning,
            #[cfg(feature = "excel")]
            IngestionError::Excel(_) => IngestionSeverity::Error,
            IngestionError::Decode { .. }
            | IngestionError::EmptyInput
            | IngestionError::InsufficientColumns { .. }
            | IngestionError::NoValidRows => IngestionSeverity::Error,
        }
    }
}

/// Context about one file's ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Upload file name.
    pub filename: String,
    /// Format used, if it could be determined.
    pub format: Option<IngestionFormat>,
}

/// Stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Rows parsed from the upload.
    pub rows_read: usize,
    /// Rows that contributed to the averages.
    pub rows_used: usize,
}

impl IngestionStats {
    /// Rows dropped for a missing or non-numeric value.
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_used
    }
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a file was reduced to a record.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats, _record: &NormalizedRecord) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats, record: &NormalizedRecord) {
        for o in &self.observers {
            o.on_success(ctx, stats, record);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits ingestion events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats, record: &NormalizedRecord) {
        tracing::info!(
            file = %ctx.filename,
            format = ?ctx.format,
            rows_used = stats.rows_used,
            rows_dropped = stats.rows_dropped(),
            site = record.site(),
            date = %record.date(),
            period = %record.period(),
            "ingested"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        match severity {
            IngestionSeverity::Info => {
                tracing::info!(file = %ctx.filename, format = ?ctx.format, %error, "ingest failed")
            }
            IngestionSeverity::Warning => {
                tracing::warn!(file = %ctx.filename, format = ?ctx.format, %error, "ingest failed")
            }
            IngestionSeverity::Error | IngestionSeverity::Critical => {
                tracing::error!(file = %ctx.filename, format = ?ctx.format, ?severity, %error, "ingest failed")
            }
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            alert = true,
            file = %ctx.filename,
            format = ?ctx.format,
            ?severity,
            %error,
            "ingest alert"
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Append events to `path`, creating the file on first write.
    ///
    /// A log file that cannot be opened or written never fails ingestion; the problem is
    /// reported with `tracing::warn!` instead.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(error) = written {
            tracing::warn!(path = %self.path.display(), %error, "could not append to ingestion log");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats, record: &NormalizedRecord) {
        self.append_line(&format!(
            "{} ok format={:?} file={} rows_used={} rows_dropped={} site={} date={} period={}",
            timestamp(),
            ctx.format,
            ctx.filename,
            stats.rows_used,
            stats.rows_dropped(),
            record.site(),
            record.date(),
            record.period()
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} file={} err={}",
            timestamp(),
            severity,
            ctx.format,
            ctx.filename,
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} file={} err={}",
            timestamp(),
            severity,
            ctx.format,
            ctx.filename,
            error
        ));
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
