use crate::Auther;
use crate::error::AuthError;
use crate::session::{Session, SessionStore};
use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{MethodRouter, get, post};
use axum::{Form, Router};
use chrono::{TimeDelta, Utc};
use cryptix_time::Millisecs;
use serde::Deserialize;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Cookie name used unless [`AuthHandlerBuilder::session_name`] says otherwise.
pub const DEFAULT_SESSION_NAME: &str = "AuthSession";

/// Where a successful login redirects to by default.
pub const DEFAULT_LANDING: &str = "/";

/// How long a login stays valid by default.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(5 * 60);

const USER_KEY: &str = "user";
const TIMEOUT_KEY: &str = "timeout";

/// Renders an auth failure with the status the handler determined.
pub type ErrorHandler = Arc<dyn Fn(AuthError, StatusCode) -> Response + Send + Sync>;

/// Answers requests to protected routes that carry no valid session.
pub type NotAuthorizedHandler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// The login form. Missing fields read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

/// The identity returned by the [`Auther`] on login, available to handlers behind
/// [`AuthHandler::protect`].
#[derive(Debug, Clone, PartialEq)]
pub struct Identity(pub Value);

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or((StatusCode::UNAUTHORIZED, "Not Authorized\n"))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned())
    }
}

#[derive(Debug)]
pub struct NoStore;
pub struct WithStore(Arc<dyn SessionStore>);

impl fmt::Debug for WithStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WithStore")
    }
}

/// Configures an [`AuthHandler`]. A session store is required before it can be built.
pub struct AuthHandlerBuilder<S = NoStore> {
    auther: Arc<dyn Auther>,
    store: S,
    session_name: String,
    landing: String,
    logout: Option<String>,
    lifetime: Duration,
    error_handler: Option<ErrorHandler>,
    not_authorized: Option<NotAuthorizedHandler>,
}

impl<S: fmt::Debug> fmt::Debug for AuthHandlerBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandlerBuilder")
            .field("store", &self.store)
            .field("session_name", &self.session_name)
            .field("landing", &self.landing)
            .field("logout", &self.logout)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl AuthHandlerBuilder<NoStore> {
    /// Sets the store that keeps sessions between requests.
    pub fn store(self, store: impl SessionStore) -> AuthHandlerBuilder<WithStore> {
        AuthHandlerBuilder {
            auther: self.auther,
            store: WithStore(Arc::new(store)),
            session_name: self.session_name,
            landing: self.landing,
            logout: self.logout,
            lifetime: self.lifetime,
            error_handler: self.error_handler,
            not_authorized: self.not_authorized,
        }
    }
}

impl<S> AuthHandlerBuilder<S> {
    /// Name of the session cookie. Must not be empty.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }

    /// Location a successful login redirects to. Must not be empty.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub fn landing(mut self, location: impl Into<String>) -> Self {
        self.landing = location.into();
        self
    }

    /// Location a logout redirects to. Defaults to the landing location.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub fn logout(mut self, location: impl Into<String>) -> Self {
        self.logout = Some(location.into());
        self
    }

    /// How long a login stays valid.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub const fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Replaces the plain text error responses.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(AuthError, StatusCode) -> Response + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Replaces the response for protected routes without a valid session.
    #[must_use = "The builder must be configured before it can be used to build the handler."]
    pub fn not_authorized_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.not_authorized = Some(Arc::new(handler));
        self
    }
}

impl AuthHandlerBuilder<WithStore> {
    /// # Errors
    /// [`AuthError::InvalidConfiguration`] for an empty session name or redirect location,
    /// or a zero or out of range lifetime.
    pub fn build(self) -> Result<AuthHandler, AuthError> {
        let logout = self.logout.unwrap_or_else(|| self.landing.clone());
        let required = [
            ("session name", &self.session_name),
            ("landing redirect", &self.landing),
            ("logout redirect", &logout),
        ];
        for (what, value) in required {
            if value.is_empty() {
                return Err(invalid(format!("{what} can't be empty")));
            }
        }

        if self.lifetime.is_zero() {
            return Err(invalid("lifetime must be positive"));
        }
        let lifetime = TimeDelta::from_std(self.lifetime)
            .map_err(|e| invalid(format!("lifetime out of range: {e}")))?;

        let error_handler = self.error_handler.unwrap_or_else(|| Arc::new(plain_error));
        let not_authorized = self.not_authorized.unwrap_or_else(|| {
            let errors = Arc::clone(&error_handler);
            Arc::new(move |_: &Request| errors(AuthError::not_authorized(), StatusCode::UNAUTHORIZED))
        });

        Ok(AuthHandler {
            inner: Arc::new(Inner {
                auther: self.auther,
                store: self.store.0,
                session_name: self.session_name,
                landing: self.landing,
                logout,
                lifetime,
                error_handler,
                not_authorized,
            }),
        })
    }
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> AuthError {
    AuthError::InvalidConfiguration { message: message.into(), context: None }
}

/// The default [`ErrorHandler`]: the error message and a newline as plain text.
fn plain_error(err: AuthError, status: StatusCode) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        format!("{err}\n"),
    )
        .into_response()
}

struct Inner {
    auther: Arc<dyn Auther>,
    store: Arc<dyn SessionStore>,
    session_name: String,
    landing: String,
    logout: String,
    lifetime: TimeDelta,
    error_handler: ErrorHandler,
    not_authorized: NotAuthorizedHandler,
}

/// Login, logout and session checks. Cheap to clone.
#[derive(Clone)]
pub struct AuthHandler {
    inner: Arc<Inner>,
}

impl fmt::Debug for AuthHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandler")
            .field("session_name", &self.inner.session_name)
            .field("landing", &self.inner.landing)
            .field("logout", &self.inner.logout)
            .field("lifetime", &self.inner.lifetime)
            .finish_non_exhaustive()
    }
}

type Failure = (AuthError, StatusCode);

fn internal(err: AuthError) -> Failure {
    (err, StatusCode::INTERNAL_SERVER_ERROR)
}

impl AuthHandler {
    pub fn builder(auther: impl Auther) -> AuthHandlerBuilder<NoStore> {
        AuthHandlerBuilder {
            auther: Arc::new(auther),
            store: NoStore,
            session_name: DEFAULT_SESSION_NAME.to_owned(),
            landing: DEFAULT_LANDING.to_owned(),
            logout: None,
            lifetime: DEFAULT_LIFETIME,
            error_handler: None,
            not_authorized: None,
        }
    }

    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.inner.session_name
    }

    /// Handles a login form post.
    ///
    /// Empty credentials answer `400` without consulting the [`Auther`]. A rejected login
    /// answers `400`, any other checker or store failure `500`. On success the identity and
    /// its expiry are saved and the client is sent to the landing location with `303`.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        form: Result<Form<LoginForm>, FormRejection>,
    ) -> Response {
        self.try_authorize(headers, form).unwrap_or_else(|(err, status)| self.fail(err, status))
    }

    fn try_authorize(
        &self,
        headers: &HeaderMap,
        form: Result<Form<LoginForm>, FormRejection>,
    ) -> Result<Response, Failure> {
        let mut session = self.load(headers)?;

        let Form(login) = form.map_err(|rejection| {
            let status = rejection.status();
            (AuthError::Form { message: rejection.body_text().into(), context: None }, status)
        })?;
        if login.user.is_empty() || login.pass.is_empty() {
            return Err((AuthError::bad_login(), StatusCode::BAD_REQUEST));
        }

        let identity = self.inner.auther.check(&login.user, &login.pass).map_err(|err| {
            let status = match err {
                AuthError::BadLogin { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (err, status)
        })?;

        session.regenerate();
        session.insert(USER_KEY, identity);
        self.set_timeout(&mut session, Utc::now() + self.inner.lifetime)?;
        let cookie = self.inner.store.save(&mut session).map_err(internal)?;

        tracing::info!(user = %login.user, "login");
        Ok(redirect(&self.inner.landing, cookie))
    }

    /// Returns the identity of a request with a live session.
    ///
    /// # Errors
    /// [`AuthError::NotAuthorized`] when the session is new, lacks the identity or its expiry,
    /// or has expired. Store failures are passed through.
    pub fn authenticate_request(&self, headers: &HeaderMap) -> Result<Value, AuthError> {
        let session = self.inner.store.load(headers, &self.inner.session_name)?;
        if session.is_new() {
            return Err(AuthError::not_authorized());
        }

        let identity = session.get(USER_KEY).ok_or_else(AuthError::not_authorized)?;
        let timeout = session.get(TIMEOUT_KEY).ok_or_else(AuthError::not_authorized)?;
        let Ok(Millisecs(expires)) = serde_json::from_value::<Millisecs>(timeout.clone()) else {
            return Err(AuthError::not_authorized());
        };

        if Utc::now() > expires {
            return Err(AuthError::NotAuthorized { context: Some("session expired".into()) });
        }
        Ok(identity.clone())
    }

    /// Ends the session: backdates its expiry, drops the cookie and redirects with `303` to
    /// the logout location.
    pub fn logout(&self, headers: &HeaderMap) -> Response {
        self.try_logout(headers).unwrap_or_else(|(err, status)| self.fail(err, status))
    }

    fn try_logout(&self, headers: &HeaderMap) -> Result<Response, Failure> {
        let mut session = self.load(headers)?;

        self.set_timeout(&mut session, Utc::now() - self.inner.lifetime)?;
        session.expire();
        let cookie = self.inner.store.save(&mut session).map_err(internal)?;

        Ok(redirect(&self.inner.logout, cookie))
    }

    /// A `POST` route running [`AuthHandler::authorize`].
    pub fn login_route<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let auth = self.clone();
        post(move |headers: HeaderMap, form: Result<Form<LoginForm>, FormRejection>| async move {
            auth.authorize(&headers, form)
        })
    }

    /// A `GET` and `POST` route running [`AuthHandler::logout`].
    pub fn logout_route<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let auth = self.clone();
        let handler = move |headers: HeaderMap| {
            let auth = auth.clone();
            async move { auth.logout(&headers) }
        };
        get(handler.clone()).post(handler)
    }

    /// Puts every route of `router` behind [`authenticate`].
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.clone(), authenticate))
    }

    fn load(&self, headers: &HeaderMap) -> Result<Session, Failure> {
        self.inner.store.load(headers, &self.inner.session_name).map_err(internal)
    }

    fn set_timeout(&self, session: &mut Session, at: chrono::DateTime<Utc>) -> Result<(), Failure> {
        let value = serde_json::to_value(Millisecs(at)).map_err(|e| internal(e.into()))?;
        session.insert(TIMEOUT_KEY, value);
        Ok(())
    }

    fn fail(&self, err: AuthError, status: StatusCode) -> Response {
        if status.is_server_error() {
            tracing::error!(error = %err, "auth failure");
        } else {
            tracing::debug!(error = %err, %status, "auth rejected");
        }
        (self.inner.error_handler)(err, status)
    }
}

fn redirect(location: &str, cookie: HeaderValue) -> Response {
    ([(header::SET_COOKIE, cookie)], Redirect::to(location)).into_response()
}

/// Middleware admitting only requests with a live session.
///
/// Rejected requests get the not-authorized response. Admitted requests carry the
/// [`Identity`] in their extensions.
pub async fn authenticate(State(auth): State<AuthHandler>, mut request: Request, next: Next) -> Response {
    match auth.authenticate_request(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(Identity(identity));
            next.run(request).await
        },
        Err(err) => {
            tracing::debug!(error = %err, path = %request.uri().path(), "request not authorized");
            (auth.inner.not_authorized)(&request)
        },
    }
}
