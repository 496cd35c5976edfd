use std::borrow::Cow;
use std::io::{self, Read, Write};

/// Logs the outcome of one read or write call.
fn trace_chunk(prefix: &str, result: &io::Result<usize>, buf: &[u8]) {
    match result {
        Ok(n) => {
            let chunk = &buf[..(*n).min(buf.len())];
            tracing::debug!(prefix, n, "{prefix} {}", hex::encode(chunk));
        },
        Err(e) => tracing::debug!(prefix, error = %e, "{prefix} error"),
    }
}

/// Forwards reads to `inner`, logging every chunk with `prefix`.
#[derive(Debug)]
pub struct ReadLogger<R> {
    prefix: Cow<'static, str>,
    inner: R,
}

impl<R> ReadLogger<R> {
    pub fn new(prefix: impl Into<Cow<'static, str>>, inner: R) -> Self {
        Self { prefix: prefix.into(), inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ReadLogger<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        trace_chunk(&self.prefix, &result, buf);
        result
    }
}

/// Forwards writes to `inner`, logging every chunk with `prefix`.
#[derive(Debug)]
pub struct WriteLogger<W> {
    prefix: Cow<'static, str>,
    inner: W,
}

impl<W> WriteLogger<W> {
    pub fn new(prefix: impl Into<Cow<'static, str>>, inner: W) -> Self {
        Self { prefix: prefix.into(), inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for WriteLogger<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        trace_chunk(&self.prefix, &result, buf);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A bidirectional stream whose reads are logged with `<` and writes with `>`.
#[derive(Debug)]
pub struct LoggedStream<S> {
    inner: S,
}

impl<S: Read + Write> LoggedStream<S> {
    pub const fn wrap(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: Read> Read for LoggedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        trace_chunk("<", &result, buf);
        result
    }
}

impl<S: Write> Write for LoggedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        trace_chunk(">", &result, buf);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
