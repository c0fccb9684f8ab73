//! Progress notifications for long-running analyses.
//!
//! Notifications are best-effort: a sink that drops them has no effect on
//! resolution. The [`ProgressNotifier`] only looks at the clock at row
//! boundaries and never blocks row processing.
//!
//! There is no timer. While the row source is still waiting for its first
//! row (a slow catalog query, say) nothing is emitted after the start
//! notification, however long the wait.

use std::fmt;
use std::time::{Duration, Instant};

/// Default interval between "in progress" notifications.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A progress message for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Receives progress notifications.
pub trait ProgressSink {
    fn notify(&self, notification: &Notification);
}

impl<F> ProgressSink for F
where
    F: Fn(&Notification),
{
    fn notify(&self, notification: &Notification) {
        self(notification)
    }
}

/// Discards all notifications.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn notify(&self, _notification: &Notification) {}
}

/// Emits start/finish notifications and throttled "in progress" updates.
pub struct ProgressNotifier<'a> {
    sink: &'a dyn ProgressSink,
    interval: Duration,
    last: Instant,
    rows: u64,
}

impl<'a> ProgressNotifier<'a> {
    pub fn new(sink: &'a dyn ProgressSink, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            last: Instant::now(),
            rows: 0,
        }
    }

    pub fn started(&mut self) {
        self.last = Instant::now();
        self.sink.notify(&Notification::info(
            "ER data model generation has been started. Please wait...",
        ));
    }

    /// Count one row; notify if the interval has elapsed since the last update.
    ///
    /// This is the only place "in progress" updates are produced.
    pub fn row(&mut self) {
        self.rows += 1;
        if self.last.elapsed() >= self.interval {
            self.last = Instant::now();
            self.sink.notify(&Notification::info(format!(
                "ER data model generation is in progress... ({} rows processed)",
                self.rows
            )));
        }
    }

    pub fn finished(&self) {
        self.sink
            .notify(&Notification::info("ER data model generation has been finished."));
    }

    pub fn failed(&self, message: &str) {
        self.sink
            .notify(&Notification::error(format!("Error occurred! {}", message)));
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_zero_interval_reports_every_row() {
        let seen = RefCell::new(Vec::new());
        let sink = |n: &Notification| seen.borrow_mut().push(n.clone());
        let mut notifier = ProgressNotifier::new(&sink, Duration::ZERO);

        notifier.started();
        notifier.row();
        notifier.row();
        notifier.finished();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert!(seen[1].message.contains("1 rows processed"));
        assert!(seen[2].message.contains("2 rows processed"));
        assert!(seen.iter().all(|n| n.severity == Severity::Info));
    }

    #[test]
    fn test_in_progress_waits_for_first_row() {
        let seen = RefCell::new(Vec::new());
        let sink = |n: &Notification| seen.borrow_mut().push(n.clone());
        let mut notifier = ProgressNotifier::new(&sink, Duration::ZERO);

        notifier.started();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(seen.borrow().len(), 1);

        notifier.row();
        assert_eq!(seen.borrow().len(), 2);
        assert!(seen.borrow()[1].message.contains("in progress"));
    }

    #[test]
    fn test_long_interval_is_quiet() {
        let seen = RefCell::new(Vec::new());
        let sink = |n: &Notification| seen.borrow_mut().push(n.clone());
        let mut notifier = ProgressNotifier::new(&sink, Duration::from_secs(3600));

        for _ in 0..100 {
            notifier.row();
        }
        notifier.failed("boom");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].severity, Severity::Error);
        assert_eq!(notifier.rows(), 100);
    }
}
