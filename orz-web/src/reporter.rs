//! Error reporting
//!
//! Answered application errors are reported according to the contract that
//! matched them: an alarm for the on-call channel and/or a regular log event.
//! Reporting is best effort. A reporter that panics is contained by
//! [`report_safely`] and the response is sent regardless.

use std::error::Error as StdError;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::Level;

/// Target alarm events are emitted on
pub const ALARM_TARGET: &str = "orz_alarm";

/// Target regular error log events are emitted on
pub const LOG_TARGET: &str = "orz_web::api";

/// One answered error to report
#[derive(Debug, Clone, Copy)]
pub struct ErrorReport<'a> {
    /// Raise an alarm
    pub alarm: bool,
    /// Emit a log event
    pub logging: bool,
    /// Internal reason, if any
    pub reason: Option<&'a str>,
    /// The error as raised by the handler
    pub cause: &'a (dyn StdError + 'static),
    /// Operation that failed, usually the handler path
    pub operation: &'a str,
    /// Severity of the log event
    pub level: Level,
}

/// Sink for answered errors
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, report: &ErrorReport<'_>);
}

/// Reporter emitting `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: &ErrorReport<'_>) {
        if !report.alarm && !report.logging {
            return;
        }
        let causes = render_chain(report.cause);
        let reason = report.reason.unwrap_or_default();
        let operation = report.operation;

        if report.alarm {
            tracing::error!(
                target: ALARM_TARGET,
                operation,
                reason,
                causes = %causes,
                "api error alarm"
            );
        }

        if report.logging {
            match report.level {
                Level::ERROR => {
                    tracing::error!(target: LOG_TARGET, operation, reason, causes = %causes, "api error")
                }
                Level::WARN => {
                    tracing::warn!(target: LOG_TARGET, operation, reason, causes = %causes, "api error")
                }
                Level::INFO => {
                    tracing::info!(target: LOG_TARGET, operation, reason, causes = %causes, "api error")
                }
                Level::DEBUG => {
                    tracing::debug!(target: LOG_TARGET, operation, reason, causes = %causes, "api error")
                }
                Level::TRACE => {
                    tracing::trace!(target: LOG_TARGET, operation, reason, causes = %causes, "api error")
                }
            }
        }
    }
}

/// Run `reporter`, swallowing any panic it raises
pub fn report_safely(reporter: &dyn ErrorReporter, report: &ErrorReport<'_>) {
    if catch_unwind(AssertUnwindSafe(|| reporter.report(report))).is_err() {
        tracing::warn!(
            operation = report.operation,
            "error reporter panicked, report dropped"
        );
    }
}

/// `outer: inner: root` rendering of an error and its sources
pub fn render_chain(error: &(dyn StdError + 'static)) -> String {
    std::iter::successors(Some(error), |e| (*e).source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
