//! # Cryptix Server
//!
//! A small demo server wiring the toolkit together: configuration from `server.toml` and
//! `CRYPTIX__*` variables, a session login backed by [`cryptix::http::auth`], pages rendered
//! by [`cryptix::http::render`], panic recovery and request tracing.
//!
//! ## Example
//! ```no_run
//! use cryptix_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod config;
mod router;

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use cryptix::logger::LevelControl;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ServerConfig,
    log: Option<LevelControl>,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ServerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub const fn port(mut self, port: u16) -> Self {
        self.cfg.http.port = port;
        self
    }

    /// Exposes module log levels through the admin routes.
    pub fn log_control(mut self, control: LevelControl) -> Self {
        self.log = Some(control);
        self
    }

    /// Both PEM files must exist. A group or world readable key is reported, not rejected.
    fn check_tls_files(&self) -> Result<()> {
        let Some(ssl) = &self.cfg.http.ssl else {
            return Ok(());
        };
        for (what, path) in [("certificate", &ssl.cert), ("private key", &ssl.key)] {
            if !path.is_file() {
                anyhow::bail!("TLS {what} missing: {}", path.display());
            }
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = ssl.key.metadata()?.permissions().mode();
            if mode & 0o077 != 0 {
                tracing::warn!(
                    key = %ssl.key.display(),
                    mode = format!("{mode:o}"),
                    "TLS key is readable by others, chmod 600 it"
                );
            }
        }
        Ok(())
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Validates the TLS files, if configured
    /// 2. Parses the page templates
    /// 3. Sets up the session store and the login handler
    /// 4. Builds the Axum router
    ///
    /// # Errors
    /// Returns an error if:
    /// * SSL certificate/key files are missing
    /// * Templates are missing or do not parse
    /// * The auth settings are invalid (empty names, short cookie secret)
    pub fn build(self) -> Result<Server> {
        self.check_tls_files()?;

        let address = SocketAddr::new(self.cfg.http.address, self.cfg.http.port);
        info!(address = %address, "Initializing server");

        let renderer = router::renderer(&self.cfg.render).context("Failed to load templates")?;
        let auth = router::auth(&self.cfg.auth)?;
        let app = router::init(renderer, &auth, self.log, self.cfg.http.admin_token.as_deref())?;

        Ok(Server { cfg: self.cfg, app })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    cfg: ServerConfig,
    app: Router,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete application router, e.g. for in-process tests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.cfg
    }

    /// Serves until SIGINT or SIGTERM, then drains open connections for at most
    /// `http.shutdown_timeout_secs`.
    ///
    /// # Errors
    /// Fails when the listener cannot bind or the TLS files do not load.
    pub async fn run(self) -> Result<()> {
        let Self { cfg, app } = self;
        let address = SocketAddr::new(cfg.http.address, cfg.http.port);
        let handle = Handle::<SocketAddr>::new();

        tokio::spawn(drain_on_signal(handle.clone(), cfg.http.shutdown_timeout()));

        let service = app.into_make_service();
        match &cfg.http.ssl {
            Some(ssl) => {
                let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                    .await
                    .context("loading TLS certificate and key")?;
                info!(%address, "listening on https");
                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(service)
                    .await
                    .with_context(|| format!("serving https on {address}"))?;
            },
            None => {
                info!(%address, "listening on http");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(service)
                    .await
                    .with_context(|| format!("serving http on {address}"))?;
            },
        }

        info!("server stopped");
        Ok(())
    }
}

/// Waits for a stop signal and starts a graceful shutdown of `handle`.
async fn drain_on_signal(handle: Handle<SocketAddr>, grace: Duration) {
    match stop_signal().await {
        Ok(name) => {
            info!(signal = name, grace_secs = grace.as_secs(), "draining connections");
            handle.graceful_shutdown(Some(grace));
        },
        Err(e) => error!(error = %e, "cannot listen for stop signals, shutdown needs a kill"),
    }
}

/// Resolves with the name of the first stop signal received.
#[cfg(unix)]
async fn stop_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal as unix_signal};

    let mut term = unix_signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::select! {
        res = signal::ctrl_c() => res.map(|()| "SIGINT").context("installing SIGINT handler"),
        _ = term.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn stop_signal() -> Result<&'static str> {
    signal::ctrl_c().await.context("installing Ctrl+C handler")?;
    Ok("Ctrl+C")
}
