//! Recording collaborators
//!
//! In-memory stand-ins for operational mail and error tracking that keep
//! everything they receive for later assertions.

use std::sync::Mutex;

use async_trait::async_trait;

use core_kernel::{ErrorReport, ErrorReporter, Notification, Notifier, ReportKind};

/// Notifier that records notifications instead of sending mail
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// Error reporter that records reports
#[derive(Debug, Default)]
pub struct RecordingErrorReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().unwrap().clone()
    }

    /// Reports of the given kind
    pub fn of_kind(&self, kind: ReportKind) -> Vec<ErrorReport> {
        self.reports()
            .into_iter()
            .filter(|report| report.kind == kind)
            .collect()
    }
}

impl ErrorReporter for RecordingErrorReporter {
    fn report(&self, report: ErrorReport) {
        self.reports.lock().unwrap().push(report);
    }
}
