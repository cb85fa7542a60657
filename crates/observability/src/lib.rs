//! Logging setup shared by the shelfwatch binary and integration tests.

/// Initialize process-wide logging, format chosen by `SHELFWATCH_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::LogFormat;
