mod bot;
mod config;
mod events;
mod gateway;
mod http;
mod liveness;
mod polls;
mod theme;
mod wisps;

use color_eyre::eyre::Result;
use tracing::{error, instrument};

use crate::config::Config;

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let listener = http::bind(config.http_port).await?;
    tokio::spawn(async move {
        if let Err(e) = http::serve(listener).await {
            error!("Keep-alive server stopped: {e}");
        }
    });

    bot::run(config).await
}
