use crate::config::{AuthConfig, RenderConfig, StoreKind, UserConfig};
use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum::routing::{get, post};
use cryptix::http::auth::{AuthError, AuthHandler, CookieOptions, CookieStore, Identity, MemoryStore};
use cryptix::http::render::{DirSource, MemorySource, RenderError, Renderer, Value, plain_error};
use cryptix::http::{HandlerError, recovery_layer, require_header, trace_layer};
use cryptix::logger::{LevelControl, LoggerError};
use serde_json::json;
use std::sync::Arc;

const ADMIN_HEADER: &str = "x-admin-token";

/// Shared by all page handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppState {
    renderer: Renderer,
    log: Option<LevelControl>,
}

pub(crate) fn renderer(cfg: &RenderConfig) -> Result<Renderer, RenderError> {
    let builder = match &cfg.templates {
        Some(dir) => Renderer::builder(DirSource::new(dir)),
        None => Renderer::builder(
            MemorySource::new()
                .with("base.tmpl", include_str!("../templates/base.tmpl"))
                .with("login.tmpl", include_str!("../templates/login.tmpl"))
                .with("profile.tmpl", include_str!("../templates/profile.tmpl")),
        ),
    };

    builder
        .add_templates(["login.tmpl", "profile.tmpl"])
        .route("home", "/")
        .route("login", "/login")
        .route("logout", "/logout")
        .route("profile", "/profile")
        .inject("request_path", |parts: &Parts| {
            let path = parts.uri.path().to_owned();
            Value::from_function(move || path.clone())
        })
        .reload(cfg.reload)
        .build()
}

/// Checks credentials against the configured accounts.
fn checker(
    users: Vec<UserConfig>,
) -> impl Fn(&str, &str) -> Result<serde_json::Value, AuthError> + Send + Sync + 'static {
    let users = Arc::new(users);
    move |user: &str, pass: &str| {
        users
            .iter()
            .find(|u| u.name == user && u.password == pass)
            .map(|u| json!({ "name": u.name }))
            .ok_or(AuthError::BadLogin { context: None })
    }
}

pub(crate) fn auth(cfg: &AuthConfig) -> Result<AuthHandler> {
    let options = CookieOptions { secure: cfg.secure_cookies, ..CookieOptions::default() };
    let builder = AuthHandler::builder(checker(cfg.users.clone()));
    let builder = match cfg.store {
        StoreKind::Memory => builder.store(MemoryStore::default().options(options)),
        StoreKind::Cookie => {
            let store = match &cfg.cookie_secret {
                Some(secret) => CookieStore::from_secret(secret.as_bytes())
                    .context("auth.cookie_secret is unusable")?,
                None => {
                    tracing::warn!("no cookie secret configured, sessions end with the process");
                    CookieStore::generate()
                },
            };
            builder.store(store.options(options))
        },
    };

    if cfg.users.is_empty() {
        tracing::warn!("no users configured, every login will be rejected");
    }

    builder
        .session_name(&cfg.session_name)
        .landing(&cfg.landing)
        .logout(&cfg.logout)
        .lifetime(cfg.lifetime())
        .build()
        .context("invalid auth configuration")
}

pub(crate) fn init(
    renderer: Renderer,
    auth: &AuthHandler,
    log: Option<LevelControl>,
    admin_token: Option<&str>,
) -> Result<Router> {
    let state = AppState { renderer, log };

    let protected = auth.protect(Router::new().route("/profile", get(profile)));
    let mut app = Router::new()
        .route("/", get(home))
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/login", auth.login_route())
        .route("/logout", auth.logout_route())
        .merge(protected);

    if let Some(token) = admin_token {
        let token = HeaderValue::from_str(token).context("http.admin_token is not a valid header value")?;
        let admin = Router::new()
            .route("/admin/log/{module}/{level}", post(set_log_level))
            .layer(require_header(HeaderName::from_static(ADMIN_HEADER), token));
        app = app.merge(admin);
    }

    Ok(app.with_state(state).layer(recovery_layer()).layer(trace_layer()))
}

async fn home(State(app): State<AppState>, parts: Parts) -> Result<Response, RenderError> {
    app.renderer.render(&parts, "login.tmpl", StatusCode::OK, json!({}))
}

async fn profile(
    State(app): State<AppState>,
    Identity(user): Identity,
    parts: Parts,
) -> Result<Response, RenderError> {
    app.renderer.render(&parts, "profile.tmpl", StatusCode::OK, json!({ "user": user }))
}

/// Only modules registered at start-up can be changed, `*` changes all of them.
async fn set_log_level(
    State(app): State<AppState>,
    Path((module, level)): Path<(String, String)>,
) -> Result<Response, HandlerError> {
    let control = app.log.context("logging is not controllable in this process")?;
    match control.set_log_level(&module, &level) {
        Ok(()) => Ok(format!("{module}={level}\n").into_response()),
        Err(e @ LoggerError::NoSuchLogger { .. }) => Ok(plain_error(StatusCode::NOT_FOUND, &e)),
        Err(e @ LoggerError::InvalidLevel { .. }) => Ok(plain_error(StatusCode::BAD_REQUEST, &e)),
        Err(e) => Err(e.into()),
    }
}
