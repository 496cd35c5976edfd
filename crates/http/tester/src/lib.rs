//! # Tester
//!
//! Drives an axum [`Router`] in-process, without binding a socket.
//!
//! ```rust
//! use axum::{Router, routing::get};
//! use cryptix_tester::Tester;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), cryptix_tester::TesterError> {
//! let t = Tester::new(Router::new().route("/", get(|| async { "hi" })));
//! let resp = t.get_body("/", None).await?;
//! assert_eq!(resp.status(), 200);
//! assert_eq!(resp.text(), "hi");
//! # Ok(())
//! # }
//! ```

mod error;
mod response;

pub use error::{TesterError, TesterErrorExt};
pub use response::TestResponse;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, header};
use serde::Serialize;
use tower::ServiceExt;

/// Responses larger than this are treated as a failure.
pub const MAX_BODY: usize = 16 * 1024 * 1024;

/// Sends requests to a router and collects the full responses.
#[derive(Debug, Clone)]
pub struct Tester {
    router: Router,
}

impl Tester {
    pub const fn new(router: Router) -> Self {
        Self { router }
    }

    /// `GET path`, with extra request headers (e.g. a `Cookie`).
    ///
    /// # Errors
    /// Fails if the request cannot be built or the body cannot be collected.
    pub async fn get_body(
        &self,
        path: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<TestResponse, TesterError> {
        let mut req = Request::builder().method(Method::GET).uri(path).body(Body::empty())?;
        if let Some(headers) = headers {
            req.headers_mut().extend(headers.clone());
        }
        self.send(req).await
    }

    /// `GET path`, asking for JSON. Decode the body with [`TestResponse::json`].
    ///
    /// # Errors
    /// Fails if the request cannot be built or the body cannot be collected.
    pub async fn get_json(&self, path: &str) -> Result<TestResponse, TesterError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())?;
        self.send(req).await
    }

    /// `POST path` with `value` encoded as a JSON body.
    ///
    /// # Errors
    /// Fails if `value` cannot be serialized, or as [`Tester::get_body`].
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<TestResponse, TesterError> {
        let blob = serde_json::to_vec(value)?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(blob))?;
        self.send(req).await
    }

    /// `POST path` with `pairs` as an urlencoded form.
    ///
    /// # Errors
    /// Fails as [`Tester::get_body`].
    pub async fn post_form(
        &self,
        path: &str,
        pairs: &[(&str, &str)],
    ) -> Result<TestResponse, TesterError> {
        self.post_form_with(path, pairs, None).await
    }

    /// Like [`Tester::post_form`], with extra request headers.
    ///
    /// # Errors
    /// Fails as [`Tester::get_body`].
    pub async fn post_form_with(
        &self,
        path: &str,
        pairs: &[(&str, &str)],
        headers: Option<&HeaderMap>,
    ) -> Result<TestResponse, TesterError> {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encode_form(pairs)))?;
        if let Some(headers) = headers {
            req.headers_mut().extend(headers.clone());
        }
        self.send(req).await
    }

    /// Sends an arbitrary request.
    ///
    /// # Errors
    /// Fails if the body cannot be collected.
    pub async fn send(&self, req: Request<Body>) -> Result<TestResponse, TesterError> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let Ok(resp) = self.router.clone().oneshot(req).await;
        let (parts, body) = resp.into_parts();
        let body = to_bytes(body, MAX_BODY).await?;

        tracing::debug!(%method, %uri, status = %parts.status, len = body.len(), "test request");
        Ok(TestResponse::new(parts.status, parts.headers, body))
    }
}

fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_form() {
        assert_eq!(encode_form(&[]), "");
        assert_eq!(encode_form(&[("user", "a b"), ("pass", "x&y=z")]), "user=a%20b&pass=x%26y%3Dz");
    }
}
