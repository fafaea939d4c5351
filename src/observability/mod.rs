//! Observability subsystem
//!
//! Structured JSON logging of compile pipeline events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on compilation
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```
//! use bqlc::observability::{log_event, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event(Event::BatchCompiled, &[("statements", "2")]);
//! Logger::set_min_severity(Severity::Warn);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Logs an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
