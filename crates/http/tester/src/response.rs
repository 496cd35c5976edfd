use crate::error::TesterError;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, header};
use serde::de::DeserializeOwned;

/// A fully collected response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub(crate) const fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION)
    }

    /// The `Set-Cookie` value, ready to be sent back as a `Cookie` header.
    ///
    /// Attributes such as `Path` or `Max-Age` are stripped.
    #[must_use]
    pub fn set_cookie(&self) -> Option<&str> {
        self.header(header::SET_COOKIE).map(|c| c.split(';').next().unwrap_or(c).trim())
    }

    /// The raw `Set-Cookie` value including its attributes.
    #[must_use]
    pub fn set_cookie_raw(&self) -> Option<&str> {
        self.header(header::SET_COOKIE)
    }

    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns [`TesterError::Json`] if the body does not decode into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TesterError> {
        serde_json::from_slice(&self.body).map_err(|e| TesterError::Json {
            source: e,
            context: Some(format!("body: {}", self.text()).into()),
        })
    }
}
