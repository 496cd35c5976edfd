use crate::error::AuthError;
use crate::session::{CookieOptions, Session, SessionStore, header_value, request_cookies};
use axum::http::{HeaderMap, HeaderValue};
use cookie::{CookieJar, Key};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Keeps the whole session in the cookie, JSON encoded and sealed with an
/// authenticated cipher. Nothing is stored server side.
#[derive(Clone)]
pub struct CookieStore {
    key: Key,
    options: CookieOptions,
}

impl fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore").field("options", &self.options).finish_non_exhaustive()
    }
}

impl CookieStore {
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self { key, options: CookieOptions::default() }
    }

    /// A store with a random key. Sessions do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Key::generate())
    }

    /// A store keyed by at least 64 bytes of secret material.
    ///
    /// # Errors
    /// [`AuthError::InvalidConfiguration`] if `secret` is too short.
    pub fn from_secret(secret: &[u8]) -> Result<Self, AuthError> {
        let key = Key::try_from(secret).map_err(|e| AuthError::InvalidConfiguration {
            message: format!("cookie key: {e}").into(),
            context: None,
        })?;
        Ok(Self::new(key))
    }

    #[must_use]
    pub fn options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the `Max-Age` of issued cookies.
    #[must_use]
    pub const fn max_age(mut self, age: Duration) -> Self {
        self.options.max_age = Some(age);
        self
    }

    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.options.secure = secure;
        self
    }
}

impl SessionStore for CookieStore {
    fn load(&self, headers: &HeaderMap, name: &str) -> Result<Session, AuthError> {
        let mut jar = CookieJar::new();
        request_cookies(headers).filter(|c| c.name() == name).for_each(|c| jar.add_original(c));

        let Some(cookie) = jar.private(&self.key).get(name) else {
            return Ok(Session::new(name));
        };

        match serde_json::from_str::<Map<String, Value>>(cookie.value()) {
            Ok(values) => Ok(Session::restored(name, None, values)),
            Err(e) => {
                tracing::debug!(session = name, error = %e, "discarding undecodable session");
                Ok(Session::new(name))
            },
        }
    }

    fn save(&self, session: &mut Session) -> Result<HeaderValue, AuthError> {
        let value = serde_json::to_string(session.values())?;

        let mut jar = CookieJar::new();
        jar.private_mut(&self.key).add(self.options.build(session, value));
        let sealed = jar
            .get(session.name())
            .ok_or_else(|| AuthError::store("sealed cookie missing from jar"))?;
        header_value(sealed)
    }
}
