use crate::error::HttpError;
use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

/// Directory used by [`recovery_layer`], relative to the working directory.
pub const PANIC_DIR: &str = "panics";

/// Body of the `500` sent after a handler panicked.
pub const RECOVERY_MESSAGE: &str = "internal processing error - please try again";

const PANIC_FILE_PREFIX: &str = "httpRecovery";

thread_local! {
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Keeps the backtrace of the latest panic on each thread, then defers to the previous hook.
///
/// `catch_unwind` runs after the stack is gone, so this is the only place the panic site
/// can still be captured.
fn install_backtrace_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Writes a report for every caught panic and answers with a bare `500`.
#[derive(Debug, Clone)]
pub struct PanicRecorder {
    dir: PathBuf,
}

impl PanicRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        install_backtrace_hook();
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the message and the backtrace to a fresh file and returns its path.
    fn write_report(&self, message: &str) -> Result<PathBuf, HttpError> {
        fs::create_dir_all(&self.dir)?;
        let mut file = tempfile::Builder::new().prefix(PANIC_FILE_PREFIX).tempfile_in(&self.dir)?;

        let trace = LAST_BACKTRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| Backtrace::force_capture().to_string());
        writeln!(file, "warning! httpRecovery!\nError: {message}")?;
        write!(file, "Stack:\n{trace}")?;

        let (_, path) = file.keep().map_err(|e| HttpError::Io {
            source: e.error,
            context: Some("keeping panic report".into()),
        })?;
        Ok(path)
    }
}

impl ResponseForPanic for PanicRecorder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let message = panic_message(err.as_ref());

        match self.write_report(&message) {
            Ok(path) => {
                tracing::error!(event = "httpPanic", panic_log = %path.display(), "{message}");
            },
            Err(e) => {
                tracing::error!(event = "httpPanic", error = %e, "{message} (report not written)");
            },
        }

        let mut resp = Response::new(Body::from(format!("{RECOVERY_MESSAGE}\n")));
        *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        resp.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        resp
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_owned()
    }
}

/// Catches handler panics, writing a report under [`PANIC_DIR`].
#[must_use]
pub fn recovery_layer() -> CatchPanicLayer<PanicRecorder> {
    recovery_layer_in(PANIC_DIR)
}

/// Like [`recovery_layer`], writing reports into `dir`.
pub fn recovery_layer_in(dir: impl Into<PathBuf>) -> CatchPanicLayer<PanicRecorder> {
    CatchPanicLayer::custom(PanicRecorder::new(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_kinds() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown error");
    }
}
