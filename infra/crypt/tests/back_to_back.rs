use cryptix_crypt::{CryptError, Crypter, get_key};
use proptest::prelude::*;
use rand::RngCore;
use std::io::{self, Write};

fn transform(key: &[u8], input: &[u8]) -> Result<Vec<u8>, CryptError> {
    let mut out = Vec::with_capacity(input.len());
    let mut w = Crypter::new(key)?.pipe(&mut out)?;
    io::copy(&mut &input[..], &mut w)?;
    w.flush()?;
    drop(w);
    Ok(out)
}

#[test]
fn back_to_back_one_mebibyte() -> Result<(), CryptError> {
    let mut indata = vec![0u8; 1024 * 1024];
    rand::rng().fill_bytes(&mut indata);

    let key = get_key(&indata[..])?;

    let sealed = transform(&key, &indata)?;
    assert_eq!(sealed.len(), indata.len(), "didn't write enough to the ciphertext buffer");

    let opened = transform(&key, &sealed)?;
    assert!(opened == indata, "didn't decrypt data correctly");
    Ok(())
}

#[test]
fn wrong_key_does_not_decrypt() -> Result<(), CryptError> {
    let data = b"not for everyone";
    let sealed = transform(&get_key(&b"right"[..])?, data)?;
    let opened = transform(&get_key(&b"wrong"[..])?, &sealed)?;

    assert_ne!(opened.as_slice(), data.as_slice());
    Ok(())
}

proptest! {
    #[test]
    fn roundtrip_arbitrary_lengths(data in proptest::collection::vec(any::<u8>(), 0..4096), seed in any::<[u8; 8]>()) {
        let key = get_key(&seed[..]).unwrap();
        let sealed = transform(&key, &data).unwrap();
        prop_assert_eq!(sealed.len(), data.len());
        prop_assert_eq!(transform(&key, &sealed).unwrap(), data);
    }
}
