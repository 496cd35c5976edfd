use crate::error::LoggerError;
use std::io::{self, BufRead, BufReader, PipeReader, PipeWriter, Write};
use std::panic::Location;
use std::thread::{self, JoinHandle};

/// Write side of a line-forwarding pipe created by [`line_writer`].
///
/// Dropping it closes the pipe; the forwarding thread then logs any trailing partial
/// line and ends. Use [`LineWriter::close`] to wait for that.
#[derive(Debug)]
pub struct LineWriter {
    pipe: PipeWriter,
    worker: JoinHandle<()>,
}

/// Returns a writer that emits one `info` event per written line.
///
/// Every event carries the `unit` and the source location of this call, so output of
/// several child processes can be told apart.
///
/// # Errors
/// Returns [`LoggerError::Io`] if the pipe or the forwarding thread cannot be created.
#[track_caller]
pub fn line_writer(unit: impl Into<String>) -> Result<LineWriter, LoggerError> {
    let unit = unit.into();
    let caller = Location::caller();
    let (reader, pipe) = io::pipe()?;

    let worker = thread::Builder::new()
        .name(format!("log-{unit}"))
        .spawn(move || forward_lines(reader, &unit, caller))?;

    Ok(LineWriter { pipe, worker })
}

fn forward_lines(reader: PipeReader, unit: &str, caller: &'static Location<'static>) {
    for line in BufReader::new(reader).lines() {
        match line {
            Ok(line) => tracing::info!(unit, caller = %caller, "{line}"),
            Err(e) => {
                tracing::warn!(unit, caller = %caller, error = %e, "scanner error");
                return;
            },
        }
    }
}

impl LineWriter {
    /// Closes the pipe and waits until every line has been logged.
    ///
    /// # Errors
    /// Returns [`LoggerError::Internal`] if the forwarding thread panicked.
    pub fn close(self) -> Result<(), LoggerError> {
        let Self { pipe, worker } = self;
        drop(pipe);
        worker.join().map_err(|_| LoggerError::Internal {
            message: "line forwarding thread panicked".into(),
            context: None,
        })
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pipe.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.pipe.flush()
    }
}
