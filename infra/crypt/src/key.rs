use crate::error::{CryptError, CryptErrorExt};
use sha2::{Digest, Sha512_256};
use std::io::{self, Read};

/// Length of a crypter key, the SHA-512/256 digest size.
pub const KEY_LEN: usize = 32;

/// Hashes everything `r` yields into a [`KEY_LEN`] byte key.
///
/// # Errors
/// Returns [`CryptError::Io`] if reading from `r` fails.
pub fn get_key(mut r: impl Read) -> Result<[u8; KEY_LEN], CryptError> {
    let mut hasher = Sha512_256::new();
    io::copy(&mut r, &mut hasher).context("could not copy data into the hasher")?;
    Ok(hasher.finalize().into())
}
