use std::borrow::Cow;

#[cryptix_derive::cryptix_error]
pub enum IoError {
    /// Starting the child process or one of its helper threads failed.
    #[error("Process error{}: {source}", format_context(.context))]
    Process { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// The child did not hand out a requested stdio pipe.
    #[error("Missing pipe{}: {message}", format_context(.context))]
    MissingPipe { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal I/O error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
