//! Configuration module for sessiontrace.
//!
//! This module contains the parameters of a retrieval run.

pub mod session;

pub use session::{
    ConfigError, SessionConfig, DEFAULT_FILTER_FIELD, DEFAULT_LOG_GROUP, DEFAULT_LOOKBACK_HOURS,
    MAX_LOOKBACK_DAYS,
};
