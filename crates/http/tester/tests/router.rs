use axum::extract::Form;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use cryptix_tester::{Tester, TesterError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
struct Login {
    user: String,
    pass: String,
}

fn app() -> Router {
    Router::new()
        .route("/point", get(|| async { Json(Point { x: 1, y: -2 }) }))
        .route("/echo", post(|Json(p): Json<Point>| async move { Json(Point { x: p.y, y: p.x }) }))
        .route(
            "/login",
            post(|Form(l): Form<Login>| async move {
                ([(header::SET_COOKIE, "sid=abc; Path=/; HttpOnly")], format!("{}:{}", l.user, l.pass))
            }),
        )
        .route(
            "/whoami",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("anonymous")
                    .to_owned()
            }),
        )
}

#[tokio::test]
async fn get_json_decodes_body() -> Result<(), TesterError> {
    let t = Tester::new(app());
    let resp = t.get_json("/point").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Point>()?, Point { x: 1, y: -2 });
    Ok(())
}

#[tokio::test]
async fn send_json_posts_body() -> Result<(), TesterError> {
    let t = Tester::new(app());
    let resp = t.send_json("/echo", &Point { x: 3, y: 4 }).await?;
    assert_eq!(resp.json::<Point>()?, Point { x: 4, y: 3 });
    Ok(())
}

#[tokio::test]
async fn post_form_encodes_pairs_and_exposes_cookie() -> Result<(), TesterError> {
    let t = Tester::new(app());
    let resp = t.post_form("/login", &[("user", "jo doe"), ("pass", "a&b")]).await?;
    assert_eq!(resp.text(), "jo doe:a&b");
    assert_eq!(resp.set_cookie(), Some("sid=abc"));
    assert_eq!(resp.set_cookie_raw(), Some("sid=abc; Path=/; HttpOnly"));
    Ok(())
}

#[tokio::test]
async fn get_body_forwards_headers() -> Result<(), TesterError> {
    let t = Tester::new(app());
    assert_eq!(t.get_body("/whoami", None).await?.text(), "anonymous");

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("sid=abc"));
    assert_eq!(t.get_body("/whoami", Some(&headers)).await?.text(), "sid=abc");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<(), TesterError> {
    let t = Tester::new(app());
    let resp = t.get_body("/nope", None).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.json::<Point>().is_err());
    Ok(())
}
