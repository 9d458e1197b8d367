//! Error types for the SofaTracker core crate.
//!
//! None of these are fatal to the engine. Callers log them and degrade
//! (skip a target, fall back to demo data, keep the in-memory store).
//! The agent maps them onto JSON-RPC error codes where a request needs
//! an answer.

use thiserror::Error;

/// Errors surfaced to callers of the tracker's user actions.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Fetching from the upstream data source failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The operation needs an active view session and there is none.
    #[error("No player is being viewed")]
    NoActiveView,

    /// No tracked entry exists for the given entity.
    #[error("Entity not tracked: {0}")]
    NotTracked(u64),
}

/// A metric name that is not one of the alertable stats.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

/// Failures of a single upstream request.
///
/// Every variant means "no data this cycle" to the poller.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The endpoint answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    /// The data source could not be reached (DNS, connect, timeout).
    #[error("Unreachable: {0}")]
    Unreachable(String),

    /// The response body was not the JSON shape we expected.
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Errors from the persisted-state backend.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the native notification capability.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Errors from the wake-lock or background-mode bridge.
#[derive(Error, Debug)]
pub enum PowerError {
    #[error("Power bridge call failed: {0}")]
    Bridge(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        let err = FetchError::NotFound("/player/1/Pedro".into());
        assert_eq!(err.to_string(), "Not found: /player/1/Pedro");

        let err = FetchError::Status {
            status: 503,
            endpoint: "/live".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from /live");
    }

    #[test]
    fn core_error_from_fetch_error() {
        let core_err: CoreError = FetchError::Unreachable("connection refused".into()).into();
        assert_eq!(
            core_err.to_string(),
            "Fetch error: Unreachable: connection refused"
        );
    }

    #[test]
    fn persist_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PersistError = io_err.into();
        assert_eq!(err.to_string(), "I/O error: read-only");
    }

    #[test]
    fn persist_error_from_serde_error() {
        let serde_err = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        let err: PersistError = serde_err.into();
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn not_tracked_display() {
        assert_eq!(CoreError::NotTracked(42).to_string(), "Entity not tracked: 42");
        assert_eq!(CoreError::NoActiveView.to_string(), "No player is being viewed");
    }
}
