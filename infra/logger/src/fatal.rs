use parking_lot::Mutex;
use std::fmt::Display;
use std::panic::Location;
use std::sync::{Arc, Weak};
use tracing_appender::non_blocking::WorkerGuard;

type CloseHook = Box<dyn FnOnce() + Send>;

/// The file writer guard of the installed logger, shared with its [`crate::Logger`].
pub(crate) type FileGuard = Arc<Mutex<Option<WorkerGuard>>>;

static CLOSE_HOOK: Mutex<Option<CloseHook>> = Mutex::new(None);
static FILE_GUARD: Mutex<Option<Weak<Mutex<Option<WorkerGuard>>>>> = Mutex::new(None);

/// Lets [`check_fatal`] flush `guard` before the process exits.
pub(crate) fn track_file_guard(guard: &FileGuard) {
    *FILE_GUARD.lock() = Some(Arc::downgrade(guard));
}

/// Drops the tracked file writer guard, which writes out buffered lines.
/// Returns whether there was one.
fn flush_file_guard() -> bool {
    let Some(guard) = FILE_GUARD.lock().take().and_then(|weak| weak.upgrade()) else {
        return false;
    };
    let taken = guard.lock().take();
    taken.is_some()
}

/// Registers a callback run by [`check_fatal`] right before the process exits,
/// e.g. to signal a shutdown channel. Replaces any previous hook.
pub fn set_close_hook(hook: impl FnOnce() + Send + 'static) {
    *CLOSE_HOOK.lock() = Some(Box::new(hook));
}

/// Unwraps `result` or terminates the process.
///
/// On error the caller's file and line and the error are logged, the close hook (if any)
/// runs, buffered log file output is flushed and the process exits with status 1.
#[track_caller]
pub fn check_fatal<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            let caller = Location::caller();
            tracing::error!(file = caller.file(), line = caller.line(), "Fatal Error: {e}");

            if let Some(hook) = CLOSE_HOOK.lock().take() {
                tracing::info!("Sending close message");
                hook();
            }

            tracing::error!("Stopping");
            flush_file_guard();
            std::process::exit(1)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_ok_passes_through() {
        let value: u32 = check_fatal(Ok::<_, String>(7));
        assert_eq!(value, 7);
    }

    #[test]
    fn test_hook_is_kept_until_fatal() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        set_close_hook(move || flag.store(true, Ordering::SeqCst));

        let _ = check_fatal(Ok::<_, String>(()));
        assert!(!fired.load(Ordering::SeqCst));
        assert!(CLOSE_HOOK.lock().is_some());
    }

    #[test]
    fn test_tracked_file_guard_is_flushed_once() {
        let (_writer, guard) = tracing_appender::non_blocking(std::io::sink());
        let shared: FileGuard = Arc::new(Mutex::new(Some(guard)));
        track_file_guard(&shared);

        assert!(flush_file_guard());
        assert!(shared.lock().is_none());
        assert!(!flush_file_guard());
    }
}
