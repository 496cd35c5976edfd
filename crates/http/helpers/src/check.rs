use crate::error::HttpError;

/// Passes 2xx responses through and turns everything else into [`HttpError::Status`],
/// carrying the response body.
///
/// # Errors
/// [`HttpError::Status`] for a non-2xx status, [`HttpError::Client`] if the body of such
/// a response cannot be read.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|e| HttpError::Client {
        source: e,
        context: Some(format!("reading error body of {url}").into()),
    })?;

    Err(HttpError::Status { url, status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        let resp = http::Response::builder().status(status).body(body).unwrap();
        reqwest::Response::from(resp)
    }

    #[tokio::test]
    async fn test_valid_response_passes() {
        let resp = check_response(response(200, "fine")).await.unwrap();
        assert_eq!(resp.text().await.unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_not_found_carries_body() {
        let err = check_response(response(404, "test not found")).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));

        let msg = err.to_string();
        assert!(msg.ends_with(": 404\ntest not found"), "{msg}");
    }

    #[tokio::test]
    async fn test_server_error_is_rejected() {
        let err = check_response(response(500, "test err")).await.unwrap_err();
        assert!(matches!(err, HttpError::Status { ref body, .. } if body == "test err"));
    }
}
