use std::borrow::Cow;

/// Errors that can occur while setting up or reconfiguring logging.
#[cryptix_derive::cryptix_error]
pub enum LoggerError {
    /// Failure when configuring the rolling file appender (e.g., invalid path).
    #[error("Rolling file appender error{}: {source}", format_context(context))]
    Appender { source: tracing_appender::rolling::InitError, context: Option<Cow<'static, str>> },

    /// Occurs if a global tracing subscriber has already been initialized in the current process.
    #[error("Tracing subscriber error{}: {source}", format_context(context))]
    Subscriber {
        source: tracing_subscriber::util::TryInitError,
        context: Option<Cow<'static, str>>,
    },

    /// Swapping the active filter failed because the subscriber is gone.
    #[error("Filter reload error{}: {source}", format_context(context))]
    Reload { source: tracing_subscriber::reload::Error, context: Option<Cow<'static, str>> },

    /// Creating the pipe or the forwarding thread of a line writer failed.
    #[error("Logger I/O error{}: {source}", format_context(context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// A level was requested for a module that was never registered.
    #[error("No such logger{}: {message}", format_context(context))]
    NoSuchLogger { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The level name is not one of `critical|error|warning|notice|info|debug|trace`.
    #[error("Invalid log level{}: {message}", format_context(context))]
    InvalidLevel { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal logic errors.
    #[error("Internal logger error{}: {message}", format_context(context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Invalid configuration supplied to the logger builder.
    #[error("Invalid logger configuration{}: {message}", format_context(context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
