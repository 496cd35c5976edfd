use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum RenderError {
    /// A template file could not be read from the asset source.
    #[error("Asset error{}: {source}", format_context(.context))]
    Asset { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Parsing or rendering failed.
    #[error("Template error{}: {source}", format_context(.context))]
    Template { source: minijinja::Error, context: Option<Cow<'static, str>> },

    /// No leaf template was registered under the requested name.
    #[error("Could not find template{}: {message}", format_context(.context))]
    UnknownTemplate { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid renderer configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal render error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        crate::plain_error(StatusCode::INTERNAL_SERVER_ERROR, &self)
    }
}
