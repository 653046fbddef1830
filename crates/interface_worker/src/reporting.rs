//! Tracing-backed operational collaborators
//!
//! Error tracking and operational mail are external services. The worker
//! hands both to the log pipeline; whatever ships logs onward delivers them.

use async_trait::async_trait;
use tracing::{error, warn};

use core_kernel::{ErrorReport, ErrorReporter, Notification, Notifier};

/// Writes error reports as `error` events under the `error_tracking` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: ErrorReport) {
        error!(
            target: "error_tracking",
            kind = %report.kind,
            context = ?report.context,
            "{}",
            report.message
        );
    }
}

/// Writes notifications as `warn` events under the `notifications` target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        warn!(
            target: "notifications",
            subject = %notification.subject,
            body = %notification.body,
            "Operational notification"
        );
    }
}
