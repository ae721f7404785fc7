//! Observability support: structured logging initialization and span macros.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
