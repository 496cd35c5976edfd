use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error type for axum handlers that return `Result<_, HandlerError>`.
///
/// Anything convertible into [`anyhow::Error`] converts with `?`. The error is logged and
/// answered with `500` and the error text.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

impl HandlerError {
    #[must_use]
    pub const fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl<E: Into<anyhow::Error>> From<E> for HandlerError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %format!("{:#}", self.0), "could not serve HTTP request");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", self.0)).into_response()
    }
}
