//! One-shot stream encryption.
//!
//! A [`Crypter`] wraps AES-256 in counter mode behind a [`std::io::Write`] adapter. Because the
//! counter always starts from an all-zero IV, a crypter may only ever produce **one** stream:
//! reusing the key/IV pair would leak the XOR of two plaintexts. The type enforces this by
//! refusing a second [`Crypter::pipe`] call.
//!
//! Encryption and decryption are the same operation. Keys are usually derived from some
//! shared input with [`get_key`], which hashes it with SHA-512/256.
//!
//! ```rust
//! use cryptix_crypt::{Crypter, get_key};
//! use std::io::Write;
//!
//! # fn main() -> Result<(), cryptix_crypt::CryptError> {
//! let key = get_key(&b"shared secret material"[..])?;
//!
//! let mut sealed = Vec::new();
//! let mut w = Crypter::new(&key)?.pipe(&mut sealed)?;
//! w.write_all(b"attack at dawn")?;
//! drop(w);
//!
//! let mut opened = Vec::new();
//! Crypter::new(&key)?.pipe(&mut opened)?.write_all(&sealed)?;
//! assert_eq!(opened, b"attack at dawn");
//! # Ok(())
//! # }
//! ```

mod crypter;
mod error;
mod key;

pub use crypter::{CipherWriter, Crypter};
pub use error::{CryptError, CryptErrorExt};
pub use key::{KEY_LEN, get_key};
