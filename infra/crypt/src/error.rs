//! # Crypt Errors

use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum CryptError {
    /// The key does not have [`crate::KEY_LEN`] bytes.
    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// [`crate::Crypter::pipe`] was called a second time.
    #[error("Crypter was used twice{}", format_context(.context))]
    AlreadyUsed { context: Option<Cow<'static, str>> },

    /// Reading key material or writing the stream failed.
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}
