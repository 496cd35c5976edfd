//! # HTTP helpers
//!
//! Small pieces shared by the HTTP facing crates:
//!
//! * [`check_response`] turns non-2xx client responses into errors.
//! * [`HandlerError`] lets axum handlers return `Result` and answer failures with a 500.
//! * [`require_header`] guards routes with a static header value.
//! * [`binary`] builds file-transfer responses.
//! * [`recovery_layer`] and [`trace_layer`] for the outer middleware stack.

mod binary;
mod check;
mod error;
mod handler;
mod recovery;
mod require;
mod trace;

pub use binary::binary;
pub use check::check_response;
pub use error::{HttpError, HttpErrorExt};
pub use handler::HandlerError;
pub use recovery::{PANIC_DIR, PanicRecorder, RECOVERY_MESSAGE, recovery_layer, recovery_layer_in};
pub use require::{HeaderEquals, require_header};
pub use trace::trace_layer;
