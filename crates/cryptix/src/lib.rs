//! Facade crate for the cryptix toolkit.
//! Re-exports the individual crates under short module names.
//! Keep this crate thin: it composes the other crates and implements nothing itself.
//!
//! ## Usage
//! - Add `cryptix` with the desired feature flags (`server`, `testing`).
//! - The infrastructure crates (`backoff`, `crypt`, `io`, `logger`, `time`) are always present.

pub use cryptix_backoff as backoff;
pub use cryptix_crypt as crypt;
pub use cryptix_derive::cryptix_error;
pub use cryptix_io as io;
pub use cryptix_logger as logger;
pub use cryptix_time as time;

#[cfg(feature = "server")]
pub mod http {
    pub use cryptix_auth as auth;
    pub use cryptix_http::*;
    pub use cryptix_render as render;
}

#[cfg(feature = "testing")]
pub use cryptix_tester as tester;

/// Build-time enabled features (by Cargo feature).
pub const ENABLED: &[&str] = &[
    #[cfg(feature = "server")]
    "server",
    #[cfg(feature = "testing")]
    "testing",
];

#[must_use]
pub fn is_enabled(name: &str) -> bool {
    ENABLED.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_features() {
        assert_eq!(is_enabled("server"), cfg!(feature = "server"));
        assert!(!is_enabled("desktop"));
    }
}
