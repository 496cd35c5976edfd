use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum TesterError {
    #[error("Request build error{}: {source}", format_context(.context))]
    Request { source: axum::http::Error, context: Option<Cow<'static, str>> },

    #[error("Response body error{}: {source}", format_context(.context))]
    Body { source: axum::Error, context: Option<Cow<'static, str>> },

    #[error("JSON error{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
