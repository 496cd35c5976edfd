use cryptix_derive::cryptix_error;
use std::borrow::Cow;

#[cryptix_error]
#[derive(Debug)]
pub enum SealError {
    #[error("Key file error{}: {source}", format_context(.context))]
    KeyFile { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Cipher reused{}", format_context(.context))]
    Reused { context: Option<Cow<'static, str>> },

    #[error("Internal seal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open_key() -> Result<Vec<u8>, SealError> {
    let bytes = std::fs::read("/nonexistent/key").context("reading key")?;
    if bytes.is_empty() {
        return Err("empty key".into());
    }
    Ok(bytes)
}

fn main() {
    let _ = open_key();
    let _ = SealError::Reused { context: None };
}
