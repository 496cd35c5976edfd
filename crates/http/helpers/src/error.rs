use reqwest::StatusCode;
use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum HttpError {
    /// The server answered outside of the 2xx range.
    #[error("{url}: {}\n{body}", .status.as_u16())]
    Status { url: String, status: StatusCode, body: String },

    #[error("HTTP client error{}: {source}", format_context(.context))]
    Client { source: reqwest::Error, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl HttpError {
    /// The status of a [`HttpError::Status`] error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
