use config::{Config, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Prefix of environment overrides (`CRYPTIX__HTTP__PORT` maps to `http.port`).
pub const ENV_PREFIX: &str = "CRYPTIX";

#[cryptix_derive::cryptix_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration from an optional file layered with environment overrides.
///
/// 1. **Base File**: `path` if given. A missing file leaves the defaults in place.
/// 2. **Environment Overrides**: variables prefixed with `CRYPTIX__`, nested keys separated by
///    double underscores (e.g., `CRYPTIX__AUTH__SESSION_NAME` maps to `auth.session_name`).
///
/// # Errors
/// Fails if the file is malformed or the merged values do not match `T`.
///
/// # Example
/// ```rust
/// use cryptix_server::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(path, None)
}

/// Like [`load_config`], reading overrides from `env` instead of the process environment.
///
/// # Errors
/// As [`load_config`].
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    env: Option<config::Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();
    if let Some(path) = path {
        let path = path.as_ref();
        info!("Loading config from {}", path.display());
        builder = builder.add_source(File::from(path).required(false));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake)
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Top-level configuration of the demo server.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub render: RenderConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    pub shutdown_timeout_secs: u64,
    /// Enables `/admin` routes guarded by an `X-Admin-Token` header with this value.
    pub admin_token: Option<String>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Which session store keeps logins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Cookie,
}

/// Session handling and the accepted accounts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_name: String,
    pub landing: String,
    pub logout: String,
    pub lifetime_secs: u64,
    pub store: StoreKind,
    /// At least 64 bytes. A random key is generated when absent.
    pub cookie_secret: Option<String>,
    pub secure_cookies: bool,
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
}

/// Template location and reloading.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory with `base.tmpl`, `login.tmpl` and `profile.tmpl`. The built-in pages are
    /// used when absent.
    pub templates: Option<PathBuf>,
    pub reload: bool,
}

// --- Default ---

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4583,
            ssl: None,
            shutdown_timeout_secs: 30,
            admin_token: None,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_name: cryptix::http::auth::DEFAULT_SESSION_NAME.to_owned(),
            landing: "/profile".to_owned(),
            logout: "/".to_owned(),
            lifetime_secs: 300,
            store: StoreKind::default(),
            cookie_secret: None,
            secure_cookies: false,
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

impl HttpConfig {
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
