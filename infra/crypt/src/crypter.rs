use crate::error::CryptError;
use crate::key::KEY_LEN;
use ctr::cipher::{KeyIvInit, StreamCipher};
use std::fmt;
use std::io::{self, Write};
use zeroize::ZeroizeOnDrop;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

const BLOCK_LEN: usize = 16;

/// A single-use AES-256-CTR stream.
///
/// The IV is all zeroes, which is only sound because a crypter hands out exactly one
/// [`CipherWriter`]. The key is wiped when the crypter is dropped.
#[derive(ZeroizeOnDrop)]
pub struct Crypter {
    key: [u8; KEY_LEN],
    #[zeroize(skip)]
    used: bool,
}

impl fmt::Debug for Crypter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crypter").field("used", &self.used).finish_non_exhaustive()
    }
}

impl Crypter {
    /// Creates a crypter for a [`KEY_LEN`] byte key.
    ///
    /// # Errors
    /// Returns [`CryptError::InvalidKey`] for any other key length.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CryptError> {
        let key = key.as_ref();
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| CryptError::InvalidKey {
            message: format!("wrong key length. Got:{}", key.len()).into(),
            context: None,
        })?;
        Ok(Self { key, used: false })
    }

    /// Whether [`Crypter::pipe`] was already called.
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used
    }

    /// Takes the writer receiving the transformed bytes and returns the writer for the input.
    ///
    /// Writing cleartext yields ciphertext on `out` and vice versa.
    ///
    /// # Errors
    /// Returns [`CryptError::AlreadyUsed`] on the second call.
    pub fn pipe<W: Write>(&mut self, out: W) -> Result<CipherWriter<W>, CryptError> {
        if self.used {
            return Err(CryptError::AlreadyUsed { context: None });
        }

        let iv = [0u8; BLOCK_LEN];
        let stream = Aes256Ctr::new_from_slices(self.key.as_slice(), &iv).map_err(|_| {
            CryptError::InvalidKey { message: "couldn't create AES cipher".into(), context: None }
        })?;

        self.used = true;
        Ok(CipherWriter { stream, out, scratch: Vec::new() })
    }
}

/// Applies the keystream to everything written and forwards it to the wrapped writer.
pub struct CipherWriter<W> {
    stream: Aes256Ctr,
    out: W,
    scratch: Vec<u8>,
}

impl<W> fmt::Debug for CipherWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherWriter").finish_non_exhaustive()
    }
}

impl<W: Write> CipherWriter<W> {
    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.stream.apply_keystream(&mut self.scratch);
        // The keystream already advanced, so a short write would desync the stream.
        self.out.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [7u8; KEY_LEN];

    #[test]
    fn test_rejects_wrong_key_length() {
        let err = Crypter::new([0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptError::InvalidKey { .. }));
        assert!(err.to_string().contains("Got:16"));
    }

    #[test]
    fn test_key_is_wiped_on_drop() {
        fn wipes_on_drop<T: ZeroizeOnDrop>() {}
        wipes_on_drop::<Crypter>();
    }

    #[test]
    fn test_second_pipe_fails() {
        let mut c = Crypter::new(KEY).unwrap();
        let _w = c.pipe(Vec::new()).unwrap();

        assert!(c.is_used());
        assert!(matches!(c.pipe(Vec::new()), Err(CryptError::AlreadyUsed { .. })));
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut whole = Crypter::new(KEY).unwrap().pipe(Vec::new()).unwrap();
        whole.write_all(&data).unwrap();

        let mut chunked = Crypter::new(KEY).unwrap().pipe(Vec::new()).unwrap();
        for chunk in data.chunks(7) {
            chunked.write_all(chunk).unwrap();
        }

        assert_eq!(whole.into_inner(), chunked.into_inner());
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let mut w = Crypter::new(KEY).unwrap().pipe(Vec::new()).unwrap();
        w.write_all(b"plain old text").unwrap();
        assert_ne!(w.get_ref().as_slice(), b"plain old text");
    }
}
