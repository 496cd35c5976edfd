use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode, header};
use tower_http::validate_request::{ValidateRequest, ValidateRequestHeaderLayer};

/// Rejects requests whose `name` header is not exactly `want`.
#[derive(Debug, Clone)]
pub struct HeaderEquals {
    name: HeaderName,
    want: HeaderValue,
}

impl<B> ValidateRequest<B> for HeaderEquals {
    type ResponseBody = Body;

    fn validate(&mut self, request: &mut Request<B>) -> Result<(), Response<Self::ResponseBody>> {
        if request.headers().get(&self.name) == Some(&self.want) {
            return Ok(());
        }

        tracing::debug!(header = %self.name, path = %request.uri().path(), "header check failed");
        let mut resp = Response::new(Body::from("Unauthorized\n"));
        *resp.status_mut() = StatusCode::UNAUTHORIZED;
        resp.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        Err(resp)
    }
}

/// A layer answering `401 Unauthorized` unless the request carries `name: want`.
///
/// ```rust
/// use axum::{Router, routing::get};
/// use axum::http::{HeaderName, HeaderValue};
///
/// let app: Router = Router::new().route("/admin", get(|| async { "ok" })).layer(
///     cryptix_http::require_header(
///         HeaderName::from_static("x-admin-token"),
///         HeaderValue::from_static("hunter2"),
///     ),
/// );
/// ```
#[must_use]
pub fn require_header(name: HeaderName, want: HeaderValue) -> ValidateRequestHeaderLayer<HeaderEquals> {
    ValidateRequestHeaderLayer::custom(HeaderEquals { name, want })
}
