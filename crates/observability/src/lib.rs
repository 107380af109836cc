//! Logging setup for the Vuzoll binaries.

/// Install the global subscriber, format picked from `VUZOLL_LOG_FORMAT`.
///
/// Only the first call has an effect.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

pub mod tracing;
