//! Result helper extensions for HTTP handlers.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::{error, warn};

/// Map errors onto HTTP status errors, logging them on the way.
pub(crate) trait ResultExt<T> {
    /// Log at `error` and answer 500.
    fn or_500(self, context: &str) -> Result<T, StatusError>;

    /// Log at `warn` and answer 401 with `brief`.
    fn or_401(self, brief: &str) -> Result<T, StatusError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Display,
{
    fn or_500(self, context: &str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(error = %source, "{context}");

            StatusError::internal_server_error()
        })
    }

    fn or_401(self, brief: &str) -> Result<T, StatusError> {
        self.map_err(|source| {
            warn!(error = %source, "{brief}");

            StatusError::unauthorized().brief(brief)
        })
    }
}
