use crate::error::AuthError;
use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, CookieBuilder, SameSite};
use serde_json::{Map, Value};
use std::time::Duration;

/// Loads and saves [`Session`]s, keyed by the cookie name.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the session named `name` carried by the request, or a fresh one.
    ///
    /// # Errors
    /// [`AuthError::Store`] if the backing storage fails. Unreadable cookies are not an
    /// error, they yield a fresh session.
    fn load(&self, headers: &HeaderMap, name: &str) -> Result<Session, AuthError>;

    /// Persists `session` and returns the `Set-Cookie` value to send back.
    ///
    /// # Errors
    /// [`AuthError::Store`] or [`AuthError::Encoding`] if the session cannot be kept.
    fn save(&self, session: &mut Session) -> Result<HeaderValue, AuthError>;
}

/// A named set of values tied to one client.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    name: String,
    id: Option<String>,
    /// Id dropped by [`Session::regenerate`], still held by the store until the next save.
    retired_id: Option<String>,
    values: Map<String, Value>,
    is_new: bool,
    expired: bool,
}

impl Session {
    /// A session the client did not send yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            retired_id: None,
            values: Map::new(),
            is_new: true,
            expired: false,
        }
    }

    /// A session restored from storage.
    pub fn restored(name: impl Into<String>, id: Option<String>, values: Map<String, Value>) -> Self {
        Self { name: name.into(), id, retired_id: None, values, is_new: false, expired: false }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store specific identifier, if the store uses one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drops the id so the next save issues a fresh one. Stores that keep state per id
    /// forget the old one on that save.
    pub fn regenerate(&mut self) {
        if let Some(id) = self.id.take() {
            self.retired_id = Some(id);
        }
    }

    /// Takes the id left behind by [`Session::regenerate`].
    pub fn take_retired_id(&mut self) -> Option<String> {
        self.retired_id.take()
    }

    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[must_use]
    pub const fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Marks the cookie to be dropped by the client as soon as it is saved.
    pub const fn expire(&mut self) {
        self.expired = true;
    }

    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.expired
    }
}

/// Attributes of the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    /// `None` makes a browser-session cookie.
    pub max_age: Option<Duration>,
    pub http_only: bool,
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self { path: "/".into(), max_age: None, http_only: true, secure: false }
    }
}

impl CookieOptions {
    /// Builds the cookie for `session`, expired right away if the session was expired.
    pub(crate) fn build(&self, session: &Session, value: String) -> CookieBuilder<'static> {
        let builder = Cookie::build((session.name().to_owned(), value))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax);

        if session.is_expired() {
            return builder.max_age(cookie::time::Duration::ZERO);
        }
        match self.max_age {
            Some(age) => builder.max_age(to_cookie_duration(age)),
            None => builder,
        }
    }
}

fn to_cookie_duration(d: Duration) -> cookie::time::Duration {
    cookie::time::Duration::try_from(d).unwrap_or(cookie::time::Duration::MAX)
}

/// Every cookie sent with the request, across all `Cookie` headers.
pub(crate) fn request_cookies(headers: &HeaderMap) -> impl Iterator<Item = Cookie<'static>> + '_ {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| Cookie::split_parse(v.to_owned()))
        .filter_map(Result::ok)
}

pub(crate) fn header_value(cookie: &Cookie<'_>) -> Result<HeaderValue, AuthError> {
    HeaderValue::try_from(cookie.to_string())
        .map_err(|e| AuthError::store(format!("invalid Set-Cookie value: {e}")))
}
