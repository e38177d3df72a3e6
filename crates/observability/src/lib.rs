//! Process-wide logging setup shared by the binary and tests.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize structured logging from the environment.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
