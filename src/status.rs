//! Status reporting to whatever surface hosts the bridge.
//!
//! The engine never draws UI itself; it hands every noteworthy event to a
//! [`StatusReporter`]. A browser host would update its injected indicator,
//! the headless CLI prints a colored dot, library embedders can log.

use colored::Colorize;

/// Severity of a status update, mapped to an indicator color by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Receives human-readable status updates from the bridge.
pub trait StatusReporter: Send + Sync {
    fn report(&self, text: &str, severity: Severity);
}

/// Reporter that writes to the tracing log.
#[derive(Debug, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, text: &str, severity: Severity) {
        match severity {
            Severity::Success => tracing::info!(target: "codebridge::status", "{text}"),
            Severity::Error => tracing::error!(target: "codebridge::status", "{text}"),
        }
    }
}

/// Reporter for the headless CLI, colored like the host page indicator.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn report(&self, text: &str, severity: Severity) {
        match severity {
            Severity::Success => println!("{} {}", "●".green(), text),
            Severity::Error => eprintln!("{} {}", "●".red(), text),
        }
    }
}
