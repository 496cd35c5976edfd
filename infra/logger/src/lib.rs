//! # Logger
//!
//! Process-wide logging set up on top of `tracing-subscriber`.
//!
//! * Console output on stderr in one of three [`LogFormat`]s.
//! * Optional rolling log files written through a non-blocking worker.
//! * A reloadable filter: modules announce themselves with [`Logger::register`]
//!   and their level can be changed at runtime with [`Logger::set_log_level`].
//! * [`LoggerBuilder::from_env`] reads `CRYPTIX_LOGGING`, `CRYPTIX_LOGGING_FMT` and
//!   `CRYPTIX_LOGLVL`.
//! * [`check_fatal`] and [`line_writer`] cover start-up failures and child process output.
//!
//! ## Example
//!
//! ```rust
//! # use cryptix_logger::{LevelFilter, LogFormat, Logger};
//!
//! let logger = Logger::builder()
//!     .name("my-app")
//!     .format(LogFormat::NoColor)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//!
//! logger.register("my_app::db").unwrap();
//! logger.set_log_level("my_app::db", "warning").unwrap();
//! ```

mod error;
mod fatal;
mod level;
mod testing;
mod writer;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::fatal::{check_fatal, set_close_hook};
use crate::fatal::FileGuard;
pub use crate::level::parse_level;
pub use crate::testing::init_test;
pub use crate::writer::{LineWriter, line_writer};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use fxhash::FxHashMap;
use parking_lot::RwLock;
use private::Sealed;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

pub const ENV_LEVEL: &str = "CRYPTIX_LOGGING";
pub const ENV_FORMAT: &str = "CRYPTIX_LOGGING_FMT";
pub const ENV_MODULES: &str = "CRYPTIX_LOGLVL";

/// Console output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact, colored, with source locations.
    #[default]
    Color,
    /// Full timestamps, level, target and source location without escape codes.
    NoColor,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses `color`, `nocolor` or `json`; anything else is `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "color" => Some(Self::Color),
            "nocolor" => Some(Self::NoColor),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct LoggerConfig {
    console: bool,
    format: LogFormat,
    path: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
    // Problems found while reading the environment, reported once the subscriber is up.
    deferred: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            format: LogFormat::default(),
            path: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
            deferred: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// A builder for configuring and initializing the global tracing subscriber.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file_state: std::marker::PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Sets the name of the logger. It prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder {
            name: WithName(name.into()),
            config: self.config,
            file_state: std::marker::PhantomData,
        }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Configures maximum number of log files to keep.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    /// Configures the log file rotation strategy.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Writes log files as JSON lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self) -> Self {
        self.config.json = true;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    /// Configures the default level for targets without a directive.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds module directives (e.g., `cryptix_render=debug,hyper=info`).
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    /// Enables console logging on stderr.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Selects the console format.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Applies `CRYPTIX_LOGGING`, `CRYPTIX_LOGGING_FMT` and `CRYPTIX_LOGLVL`.
    ///
    /// An unknown level falls back to `error`, an unknown format keeps the configured one.
    /// Both are reported as soon as the subscriber is installed.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn from_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_LEVEL).filter(|v| !v.trim().is_empty()) {
            match parse_level(&value) {
                Ok(level) => self.config.level = level,
                Err(e) => {
                    self.config.deferred.push(format!("{ENV_LEVEL}: {e}"));
                    self.config.level = LevelFilter::ERROR;
                },
            }
        }

        if let Some(value) = lookup(ENV_FORMAT).filter(|v| !v.trim().is_empty()) {
            match LogFormat::from_name(&value) {
                Some(format) => self.config.format = format,
                None => self.config.deferred.push(format!("{ENV_FORMAT}: unknown format {value:?}")),
            }
        }

        if let Some(value) = lookup(ENV_MODULES).filter(|v| !v.trim().is_empty()) {
            self.config.env_filter = Some(match self.config.env_filter.take() {
                Some(existing) => format!("{existing},{value}"),
                None => value,
            });
        }

        self
    }

    /// Sets the directory for rolling log files.
    pub fn path(self, path: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.path = Some(path.into());
        LoggerBuilder { config, name: self.name, file_state: std::marker::PhantomData }
    }

    /// Consumes the builder and installs the global tracing subscriber.
    ///
    /// # Returns
    /// A [`Logger`] handle. It owns the worker guard of the file writer and must stay alive
    /// for the duration of the program so buffered lines get flushed. [`check_fatal`] flushes
    /// it before exiting.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber has already been set.
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid builder settings.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let LoggerBuilder { config, name: WithName(name), .. } = self;
        validate_config(&config, &name)?;

        let levels = Levels {
            default: config.level,
            base: config.env_filter.clone(),
            modules: FxHashMap::default(),
        };
        let (filter, handle) = reload::Layer::new(levels.compose()?);

        let mut layers = Vec::new();

        if config.console {
            let console = match config.format {
                LogFormat::Color => layer()
                    .compact()
                    .with_ansi(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(io::stderr)
                    .boxed(),
                LogFormat::NoColor => layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(io::stderr)
                    .boxed(),
                LogFormat::Json => layer().json().with_writer(io::stderr).boxed(),
            };
            layers.push(console);
        }

        let guard = if let Some(path) = config.path {
            fs::create_dir_all(&path).map_err(|e| LoggerError::Internal {
                message: e.to_string().into(),
                context: Some(format!("Failed to create path: {}", path.display()).into()),
            })?;

            let file_appender = RollingFileAppender::builder()
                .rotation(config.rotation)
                .filename_prefix(&name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(config.max_files)
                .build(path)?;

            let (non_blocking, g) = tracing_appender::non_blocking(file_appender);

            let file_layer = layer().with_writer(non_blocking).with_ansi(false);
            layers.push(if config.json { file_layer.json().boxed() } else { file_layer.boxed() });
            Some(g)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        for problem in &config.deferred {
            tracing::error!("{problem}");
        }

        let guard: FileGuard = Arc::new(parking_lot::Mutex::new(guard));
        fatal::track_file_guard(&guard);

        Ok(Logger { guard, control: LevelControl { handle, levels: Arc::new(RwLock::new(levels)) } })
    }
}

/// A handle to the initialized logging system.
///
/// Holds the background worker guard of the file writer and the filter control.
/// Drop it only when the application is shutting down.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: FileGuard,
    control: LevelControl,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`] to configure the global tracing subscriber.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cryptix_logger::{LevelFilter, Logger};
    ///
    /// let _logger = Logger::builder()
    ///     .name("my-app")
    ///     .level(LevelFilter::DEBUG)
    ///     .from_env()
    ///     .init()
    ///     .unwrap();
    /// ```
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder {
            config: LoggerConfig::default(),
            name: NoName,
            file_state: std::marker::PhantomData,
        }
    }

    /// Records a module (a tracing target prefix) whose level can be changed later.
    ///
    /// New modules start at the current default level.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] if `name` cannot be used as a filter target.
    pub fn register(&self, name: impl Into<String>) -> Result<(), LoggerError> {
        self.control.register(name)
    }

    /// Changes the level of one registered module, or of all of them when `name` is `*`.
    ///
    /// # Errors
    /// [`LoggerError::InvalidLevel`] for an unknown level name,
    /// [`LoggerError::NoSuchLogger`] for a module that was never registered.
    pub fn set_log_level(&self, name: &str, level: &str) -> Result<(), LoggerError> {
        self.control.set_log_level(name, level)
    }

    /// A cloneable handle for changing levels from elsewhere (e.g. an admin route).
    #[must_use]
    pub fn control(&self) -> LevelControl {
        self.control.clone()
    }

    /// Best-effort synchronization point before shutdown.
    ///
    /// Buffered file output is flushed when this handle is dropped.
    pub fn flush(&self) {
        tracing::debug!("Logger flushed");
    }

    /// Whether log lines are also written to rolling files.
    #[must_use]
    pub fn has_file_output(&self) -> bool {
        self.guard.lock().is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.has_file_output() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

/// Shared access to the module levels of an installed [`Logger`].
#[derive(Clone)]
pub struct LevelControl {
    handle: reload::Handle<EnvFilter, Registry>,
    levels: Arc<RwLock<Levels>>,
}

impl fmt::Debug for LevelControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels = self.levels.read();
        f.debug_struct("LevelControl")
            .field("default", &levels.default)
            .field("modules", &levels.modules)
            .finish_non_exhaustive()
    }
}

impl LevelControl {
    /// See [`Logger::register`].
    ///
    /// # Errors
    /// See [`Logger::register`].
    pub fn register(&self, name: impl Into<String>) -> Result<(), LoggerError> {
        let name = name.into();
        format!("{name}={}", LevelFilter::INFO).parse::<Directive>().map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Invalid module name '{name}': {e}").into(),
                context: None,
            }
        })?;

        let mut levels = self.levels.write();
        let default = levels.default;
        levels.modules.entry(name).or_insert(default);
        Ok(())
    }

    /// See [`Logger::set_log_level`].
    ///
    /// The levels only change once the new filter is active.
    ///
    /// # Errors
    /// See [`Logger::set_log_level`].
    pub fn set_log_level(&self, name: &str, level: &str) -> Result<(), LoggerError> {
        let level = parse_level(level)?;

        let mut levels = self.levels.write();
        let mut next = levels.clone();
        if name == "*" {
            next.default = level;
            next.modules.values_mut().for_each(|l| *l = level);
        } else {
            let Some(current) = next.modules.get_mut(name) else {
                return Err(LoggerError::NoSuchLogger {
                    message: name.to_owned().into(),
                    context: None,
                });
            };
            *current = level;
        }

        self.handle.reload(next.compose()?)?;
        *levels = next;
        Ok(())
    }

    /// The current level of a registered module.
    #[must_use]
    pub fn level_of(&self, name: &str) -> Option<LevelFilter> {
        self.levels.read().modules.get(name).copied()
    }

    /// Registered module names, sorted.
    #[must_use]
    pub fn modules(&self) -> Vec<String> {
        let mut names: Vec<_> = self.levels.read().modules.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone)]
struct Levels {
    default: LevelFilter,
    base: Option<String>,
    modules: FxHashMap<String, LevelFilter>,
}

impl Levels {
    /// Default level, then the configured directives, then one directive per module.
    fn compose(&self) -> Result<EnvFilter, LoggerError> {
        let mut directives: Vec<String> = self.base.iter().cloned().collect();
        directives.extend(self.modules.iter().map(|(name, level)| format!("{name}={level}")));
        let directives = directives.join(",");

        EnvFilter::builder().with_default_directive(self.default.into()).parse(&directives).map_err(
            |e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{directives}': {e}").into(),
                context: None,
            },
        )
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if config.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
    }

    #[test]
    fn test_logger_builder_initial_state() {
        let builder = Logger::builder().name("test-app").env_filter("cryptix=debug");
        assert!(builder.config.console);
        assert_eq!(builder.config.format, LogFormat::Color);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert_eq!(builder.config.env_filter.as_deref(), Some("cryptix=debug"));
        assert!(builder.config.path.is_none());
    }

    #[test]
    fn test_logger_builder_configuration() {
        let builder = Logger::builder()
            .name("test-app")
            .format(LogFormat::Json)
            .path("logs")
            .max_files(5)
            .json()
            .level(LevelFilter::DEBUG);

        assert_eq!(builder.config.level, LevelFilter::DEBUG);
        assert_eq!(builder.config.format, LogFormat::Json);
        assert_eq!(builder.config.max_files, 5);
        assert!(builder.config.json);
        assert_eq!(builder.config.path.as_deref(), Some(std::path::Path::new("logs")));
    }

    #[test]
    fn test_env_selects_level_format_and_modules() {
        let builder = Logger::builder().name("env").env_filter("hyper=warn").apply_env(env(&[
            (ENV_LEVEL, "notice"),
            (ENV_FORMAT, "nocolor"),
            (ENV_MODULES, "cryptix_render=debug"),
        ]));

        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert_eq!(builder.config.format, LogFormat::NoColor);
        assert_eq!(
            builder.config.env_filter.as_deref(),
            Some("hyper=warn,cryptix_render=debug")
        );
        assert!(builder.config.deferred.is_empty());
    }

    #[test]
    fn test_env_invalid_level_falls_back_to_error() {
        let builder = Logger::builder()
            .name("env")
            .apply_env(env(&[(ENV_LEVEL, "chatty"), (ENV_FORMAT, "sparkly")]));

        assert_eq!(builder.config.level, LevelFilter::ERROR);
        assert_eq!(builder.config.format, LogFormat::Color);
        assert_eq!(builder.config.deferred.len(), 2);
    }

    #[test]
    fn test_empty_env_changes_nothing() {
        let builder = Logger::builder().name("env").apply_env(env(&[(ENV_LEVEL, " ")]));
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert!(builder.config.deferred.is_empty());
    }

    #[test]
    fn test_compose_module_directives() {
        let mut levels = Levels {
            default: LevelFilter::WARN,
            base: Some("hyper=info".into()),
            modules: FxHashMap::default(),
        };
        levels.modules.insert("cryptix_auth".into(), LevelFilter::TRACE);

        let filter = levels.compose().unwrap().to_string();
        assert!(filter.contains("hyper=info"), "{filter}");
        assert!(filter.contains("cryptix_auth=trace"), "{filter}");
        assert!(filter.contains("warn"), "{filter}");
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        let levels = Levels {
            default: LevelFilter::INFO,
            base: Some("cryptix=loudest".into()),
            modules: FxHashMap::default(),
        };
        assert!(matches!(levels.compose(), Err(LoggerError::InvalidConfiguration { .. })));
    }

    fn control(levels: Levels) -> (reload::Layer<EnvFilter, Registry>, LevelControl) {
        let (layer, handle) = reload::Layer::new(EnvFilter::new("info"));
        (layer, LevelControl { handle, levels: Arc::new(RwLock::new(levels)) })
    }

    fn plain_levels() -> Levels {
        Levels { default: LevelFilter::INFO, base: None, modules: FxHashMap::default() }
    }

    #[test]
    fn test_register_rejects_names_that_break_the_filter() {
        let (_layer, control) = control(plain_levels());

        let err = control.register("bad[").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }), "{err}");
        assert!(control.modules().is_empty());

        control.register("good_module").unwrap();
        control.set_log_level("good_module", "debug").unwrap();
        control.set_log_level("good_module", "info").unwrap();
        assert_eq!(control.level_of("good_module"), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_failed_reload_keeps_levels() {
        let levels = Levels { base: Some("cryptix=loudest".into()), ..plain_levels() };
        let (_layer, control) = control(levels);
        control.register("cryptix_auth").unwrap();

        assert!(control.set_log_level("cryptix_auth", "trace").is_err());
        assert_eq!(control.level_of("cryptix_auth"), Some(LevelFilter::INFO));
        assert!(control.set_log_level("*", "debug").is_err());
        assert_eq!(control.level_of("cryptix_auth"), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_unregistered_module_is_no_such_logger() {
        let (_layer, control) = control(plain_levels());
        let err = control.set_log_level("cryptix_render", "debug").unwrap_err();
        assert!(matches!(err, LoggerError::NoSuchLogger { .. }), "{err}");
        assert!(control.modules().is_empty());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::from_name("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_name("color"), Some(LogFormat::Color));
        assert_eq!(LogFormat::from_name("rainbow"), None);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = validate_config(&LoggerConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
