use crate::error::AuthError;
use crate::session::{CookieOptions, Session, SessionStore, header_value, request_cookies};
use axum::http::{HeaderMap, HeaderValue};
use moka::sync::Cache;
use serde_json::{Map, Value};
use std::time::Duration;

/// Upper bound of [`MemoryStore::default`] entries.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// How long an untouched session is kept by [`MemoryStore::default`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const SESSION_ID_LEN: usize = 32;

/// Keeps session values in a bounded in-process cache. The cookie only carries a random id.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    cache: Cache<String, Map<String, Value>>,
    options: CookieOptions,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl MemoryStore {
    /// At most `capacity` sessions, each dropped `ttl` after its last save.
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { cache, options: CookieOptions::default() }
    }

    #[must_use]
    pub fn options(mut self, options: CookieOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of live sessions, after pending evictions ran.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, headers: &HeaderMap, name: &str) -> Result<Session, AuthError> {
        let restored = request_cookies(headers)
            .filter(|c| c.name() == name)
            .find_map(|c| self.cache.get(c.value()).map(|values| (c.value().to_owned(), values)));

        Ok(match restored {
            Some((id, values)) => Session::restored(name, Some(id), values),
            None => Session::new(name),
        })
    }

    fn save(&self, session: &mut Session) -> Result<HeaderValue, AuthError> {
        if let Some(old) = session.take_retired_id() {
            self.cache.invalidate(&old);
        }
        if session.is_expired() {
            if let Some(id) = session.id() {
                self.cache.invalidate(id);
            }
            return header_value(&self.options.build(session, String::new()).build());
        }

        let id = match session.id() {
            Some(id) => id.to_owned(),
            None => {
                let id = nanoid::nanoid!(SESSION_ID_LEN);
                session.set_id(id.clone());
                id
            },
        };

        self.cache.insert(id.clone(), session.values().clone());
        header_value(&self.options.build(session, id).build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn cookie_headers(set_cookie: &HeaderValue) -> HeaderMap {
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_owned();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::try_from(pair).unwrap());
        headers
    }

    #[test]
    fn test_round_trip_through_cache() {
        let store = MemoryStore::default();
        let mut session = store.load(&HeaderMap::new(), "S").unwrap();
        assert!(session.is_new());

        session.insert("k", Value::from(7));
        let set_cookie = store.save(&mut session).unwrap();
        assert_eq!(store.len(), 1);

        let loaded = store.load(&cookie_headers(&set_cookie), "S").unwrap();
        assert!(!loaded.is_new());
        assert_eq!(loaded.get("k"), Some(&Value::from(7)));
        assert_eq!(loaded.id(), session.id());
    }

    #[test]
    fn test_unknown_id_is_a_new_session() {
        let store = MemoryStore::default();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("S=forged"));
        assert!(store.load(&headers, "S").unwrap().is_new());
    }

    #[test]
    fn test_expire_drops_entry() {
        let store = MemoryStore::default();
        let mut session = Session::new("S");
        let set_cookie = store.save(&mut session).unwrap();

        let mut loaded = store.load(&cookie_headers(&set_cookie), "S").unwrap();
        loaded.expire();
        let removal = store.save(&mut loaded).unwrap();

        assert!(removal.to_str().unwrap().starts_with("S=;"));
        assert_eq!(store.len(), 0);
        assert!(store.load(&cookie_headers(&set_cookie), "S").unwrap().is_new());
    }

    #[test]
    fn test_regenerated_session_moves_to_new_id() {
        let store = MemoryStore::default();
        let mut session = Session::new("S");
        let first = store.save(&mut session).unwrap();

        let mut loaded = store.load(&cookie_headers(&first), "S").unwrap();
        loaded.insert("user", Value::from("alice"));
        loaded.regenerate();
        let second = store.save(&mut loaded).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len(), 1);
        assert!(store.load(&cookie_headers(&first), "S").unwrap().is_new());
        let current = store.load(&cookie_headers(&second), "S").unwrap();
        assert_eq!(current.get("user"), Some(&Value::from("alice")));
    }
}
