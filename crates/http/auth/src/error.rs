use axum::http::StatusCode;
use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum AuthError {
    /// Missing or rejected credentials.
    #[error("Bad Login{}", format_context(.context))]
    BadLogin { context: Option<Cow<'static, str>> },

    /// No valid session for a protected route.
    #[error("Not Authorized{}", format_context(.context))]
    NotAuthorized { context: Option<Cow<'static, str>> },

    /// The session store failed to load or save a session.
    #[error("Session store error{}: {message}", format_context(.context))]
    Store { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The login form could not be read.
    #[error("Login form error{}: {message}", format_context(.context))]
    Form { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Session encoding error{}: {source}", format_context(.context))]
    Encoding { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Invalid [`crate::AuthHandler`] settings.
    #[error("Invalid auth configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failures of the credential backend.
    #[error("Internal auth error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl AuthError {
    /// `400` for bad logins, `401` for missing authorization, `500` for everything else.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadLogin { .. } => StatusCode::BAD_REQUEST,
            Self::NotAuthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) const fn bad_login() -> Self {
        Self::BadLogin { context: None }
    }

    pub(crate) const fn not_authorized() -> Self {
        Self::NotAuthorized { context: None }
    }

    pub(crate) fn store(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Store { message: message.into(), context: None }
    }
}
