use anyhow::Context;
use cryptix::logger::{Logger, check_fatal};
use cryptix_server::Server;
use cryptix_server::config::{ServerConfig, load_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log = Logger::builder().name(env!("CARGO_PKG_NAME")).from_env().init()?;
    for module in ["cryptix_server", "cryptix_auth", "cryptix_render", "tower_http"] {
        log.register(module)?;
    }

    let cfg: ServerConfig =
        check_fatal(load_config(Some("server")).context("Critical: Configuration is malformed"));

    Server::builder().config(cfg).log_control(log.control()).build()?.run().await
}
