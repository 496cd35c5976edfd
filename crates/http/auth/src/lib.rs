//! # Session authentication
//!
//! Login, logout and route protection on top of a pluggable [`SessionStore`].
//!
//! * `POST` a form with `user` and `pass` to the [`AuthHandler::login_route`]. The
//!   [`Auther`] checks the credentials and the identity it returns is stored in the session
//!   together with an expiry.
//! * [`AuthHandler::protect`] guards routes. Handlers behind it receive the [`Identity`].
//! * [`AuthHandler::logout_route`] backdates the expiry and expires the cookie.
//!
//! Two stores are included: [`CookieStore`] keeps the session inside an encrypted cookie,
//! [`MemoryStore`] keeps it in a bounded in-process cache keyed by a random id.
//!
//! ```rust
//! use axum::{Router, routing::get};
//! use cryptix_auth::{AuthError, AuthHandler, CookieStore, Identity};
//!
//! # fn main() -> Result<(), AuthError> {
//! let checker = |user: &str, pass: &str| {
//!     if user == "admin" && pass == "secret" {
//!         Ok(serde_json::json!({ "name": user }))
//!     } else {
//!         Err(AuthError::BadLogin { context: None })
//!     }
//! };
//!
//! let auth = AuthHandler::builder(checker)
//!     .store(CookieStore::generate())
//!     .landing("/profile")
//!     .build()?;
//!
//! let protected = Router::new()
//!     .route("/profile", get(|Identity(who): Identity| async move { who.to_string() }));
//!
//! let app: Router = auth
//!     .protect(protected)
//!     .route("/login", auth.login_route())
//!     .route("/logout", auth.logout_route());
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod session;
mod store;

pub use error::{AuthError, AuthErrorExt};
pub use handler::{
    AuthHandler, AuthHandlerBuilder, DEFAULT_LANDING, DEFAULT_LIFETIME, DEFAULT_SESSION_NAME,
    ErrorHandler, Identity, LoginForm, NoStore, NotAuthorizedHandler, WithStore, authenticate,
};
pub use session::{CookieOptions, Session, SessionStore};
pub use store::{CookieStore, MemoryStore};

/// Checks a user's credentials.
///
/// Return [`AuthError::BadLogin`] for rejected credentials. Any other error is treated as
/// an internal failure. The returned identity is kept in the session and handed to
/// protected handlers.
pub trait Auther: Send + Sync + 'static {
    /// # Errors
    /// See the trait documentation.
    fn check(&self, user: &str, pass: &str) -> Result<serde_json::Value, AuthError>;
}

impl<F> Auther for F
where
    F: Fn(&str, &str) -> Result<serde_json::Value, AuthError> + Send + Sync + 'static,
{
    fn check(&self, user: &str, pass: &str) -> Result<serde_json::Value, AuthError> {
        self(user, pass)
    }
}
