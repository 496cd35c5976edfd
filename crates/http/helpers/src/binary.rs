use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};

const CONTENT_DESCRIPTION: HeaderName = HeaderName::from_static("content-description");
const CONTENT_TRANSFER_ENCODING: HeaderName = HeaderName::from_static("content-transfer-encoding");

/// A `200` response marked as a binary file transfer.
pub fn binary(body: impl Into<Body>) -> Response {
    (
        [
            (CONTENT_DESCRIPTION, HeaderValue::from_static("File Transfer")),
            (CONTENT_TRANSFER_ENCODING, HeaderValue::from_static("binary")),
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
        ],
        body.into(),
    )
        .into_response()
}
