//! # I/O wrappers
//!
//! * [`ReadLogger`], [`WriteLogger`] and [`LoggedStream`] trace every chunk passing through
//!   as hex at `debug` level.
//! * [`CountingReader`] and [`CountingWriter`] count the bytes they forward.
//! * [`StdioConn`] talks to a child process over its stdin and stdout.
//!
//! ```rust
//! use cryptix_io::CountingReader;
//! use std::io;
//!
//! let mut r = CountingReader::new(&b"hello, world\n"[..]);
//! let copied = io::copy(&mut r, &mut io::sink()).unwrap();
//! assert_eq!(copied, 13);
//! assert_eq!(r.n(), 13);
//! ```

mod count;
mod debug;
mod error;
mod stdio;

pub use count::{ByteCounter, CountingReader, CountingWriter};
pub use debug::{LoggedStream, ReadLogger, WriteLogger};
pub use error::{IoError, IoErrorExt};
pub use stdio::StdioConn;
