//! Error types for the optimization engine.

use thiserror::Error;

/// Failure of a distance matrix provider call.
///
/// Every variant is handled the same way by callers: the whole matrix build
/// fails and the route falls back to the unoptimized order.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("matrix request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {message}")]
    Status { status: String, message: String },
    #[error("provider returned no matrix rows")]
    EmptyResponse,
    #[error("provider cannot route location {0}")]
    UnsupportedLocation(String),
    #[error("provider is not configured: {0}")]
    NotConfigured(String),
}

/// Failure to turn a provider response into cost matrices.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("provider returned no usable rows")]
    NoRows,
    #[error("provider matrix is {actual_rows}x{actual_cols}, expected {expected}x{expected}")]
    DimensionMismatch {
        expected: usize,
        actual_rows: usize,
        actual_cols: usize,
    },
}

/// Failure reported by a schedule store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("schedule store unavailable: {0}")]
    Unavailable(String),
    #[error("appointment {0} not found")]
    NotFound(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("cannot load roster appointments: {0}")]
    Store(#[from] StoreError),
    #[error("cannot start optimization workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cannot load appointment slots: {0}")]
    Store(#[from] StoreError),
    #[error("optimized order does not match the appointment set")]
    OrderMismatch,
    #[error("expected {expected} time slots, store returned {actual}")]
    MissingSlots { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
