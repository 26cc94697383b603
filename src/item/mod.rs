#[cfg(feature = "logger")]
/// This module provides a logger record handler, useful for debugging purposes.
pub mod logger;

/// This module provides the CSV row reader feeding the processing engine.
pub mod csv;
