use axum::Router;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::routing::get;
use cryptix_http::{HandlerError, RECOVERY_MESSAGE, binary, recovery_layer_in, require_header, trace_layer};
use cryptix_tester::{Tester, TesterError};
use std::fs;

async fn fails() -> Result<&'static str, HandlerError> {
    Err(anyhow::anyhow!("database on fire").into())
}

async fn works() -> Result<&'static str, HandlerError> {
    Ok("fine")
}

async fn explodes() -> &'static str {
    panic!("handler blew up")
}

#[tokio::test]
async fn handler_error_becomes_500() -> Result<(), TesterError> {
    cryptix_logger::init_test();

    let t = Tester::new(Router::new().route("/fails", get(fails)).route("/works", get(works)));

    let resp = t.get_body("/fails", None).await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text(), "database on fire\n");

    assert_eq!(t.get_body("/works", None).await?.text(), "fine");
    Ok(())
}

#[tokio::test]
async fn require_header_guards_routes() -> Result<(), TesterError> {
    let name = HeaderName::from_static("x-token");
    let app = Router::new()
        .route("/secret", get(|| async { "secret" }))
        .layer(require_header(name.clone(), HeaderValue::from_static("letmein")));
    let t = Tester::new(app);

    let resp = t.get_body("/secret", None).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.text(), "Unauthorized\n");

    let mut wrong = HeaderMap::new();
    wrong.insert(name.clone(), HeaderValue::from_static("guess"));
    assert_eq!(t.get_body("/secret", Some(&wrong)).await?.status(), StatusCode::UNAUTHORIZED);

    let mut right = HeaderMap::new();
    right.insert(name, HeaderValue::from_static("letmein"));
    assert_eq!(t.get_body("/secret", Some(&right)).await?.text(), "secret");
    Ok(())
}

#[tokio::test]
async fn binary_sets_transfer_headers() -> Result<(), TesterError> {
    let t = Tester::new(Router::new().route("/blob", get(|| async { binary(vec![0u8, 1, 2]) })));

    let resp = t.get_body("/blob", None).await?;
    assert_eq!(resp.header("content-description"), Some("File Transfer"));
    assert_eq!(resp.header("content-transfer-encoding"), Some("binary"));
    assert_eq!(resp.header(header::CONTENT_TYPE), Some("application/octet-stream"));
    assert_eq!(resp.bytes().as_ref(), &[0u8, 1, 2]);
    Ok(())
}

#[tokio::test]
async fn panics_are_recorded_and_answered_with_500() -> Result<(), Box<dyn std::error::Error>> {
    cryptix_logger::init_test();
    let dir = tempfile::tempdir()?;
    let panic_dir = dir.path().join("panics");

    let app = Router::new()
        .route("/boom", get(explodes))
        .route("/calm", get(|| async { "calm" }))
        .layer(recovery_layer_in(&panic_dir))
        .layer(trace_layer());
    let t = Tester::new(app);

    let resp = t.get_body("/boom", None).await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().trim_end(), RECOVERY_MESSAGE);

    let reports: Vec<_> = fs::read_dir(&panic_dir)?.flatten().map(|e| e.path()).collect();
    assert_eq!(reports.len(), 1);
    let name = reports[0].file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("httpRecovery"), "{name}");

    let report = fs::read_to_string(&reports[0])?;
    assert!(report.contains("Error: handler blew up"), "{report}");
    assert!(report.contains("Stack:"), "{report}");

    assert_eq!(t.get_body("/calm", None).await?.text(), "calm");
    Ok(())
}
