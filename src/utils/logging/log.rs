//! Uniform log lines for the discovery and materialization stages.

use std::time::Duration;

/// Log the start of a stage acting on `subject`
pub fn log_operation_start(operation: &str, subject: &str) {
    log::debug!("{operation} {subject}");
}

/// Log the end of a stage.
///
/// # Arguments
/// * `operation` - Past-tense verb for the stage, e.g. `"discovered"`
/// * `subject` - What the stage acted on
/// * `items` - Count of what the stage produced: descriptors for
///   discovery, rows for a collected frame
/// * `elapsed` - Optional wall time of the stage
pub fn log_operation_complete(operation: &str, subject: &str, items: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(duration) => log::debug!("{subject}: {operation} {items} in {duration:?}"),
        None => log::debug!("{subject}: {operation} {items}"),
    }
}

/// Log a recoverable problem, optionally naming where it came from
///
/// # Arguments
/// * `message` - What went wrong
/// * `origin` - Module path or object the problem came from, if known
pub fn log_warning(message: &str, origin: Option<&str>) {
    match origin {
        Some(origin) => log::warn!("{message} (from {origin})"),
        None => log::warn!("{message}"),
    }
}
