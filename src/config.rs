use std::{env, str::FromStr, time::Duration};

use color_eyre::{eyre::eyre, Result};
use serenity::model::prelude::GuildId;
use tracing::{info, instrument, warn};

use crate::liveness::LivenessConfig;

/// Everything the bot reads from its environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub guild: Option<GuildId>,
    pub welcome_channel: String,
    pub welcome_image_url: Option<String>,
    pub http_port: u16,
    pub heartbeat_schedule: String,
    pub liveness: LivenessConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded ({e})");
        }

        Ok(Self {
            discord_token: discord_token()?,
            guild: guild(),
            welcome_channel: welcome_channel(),
            welcome_image_url: env::var("WELCOME_IMAGE_URL").ok(),
            http_port: parsed_or("PORT", 3000),
            heartbeat_schedule: heartbeat_schedule(),
            liveness: LivenessConfig {
                gateway_probe_interval: seconds_or("GATEWAY_PROBE_INTERVAL_SECS", 60),
                loopback_probe_interval: seconds_or("LOOPBACK_PROBE_INTERVAL_SECS", 60),
                probe_timeout: seconds_or("PROBE_TIMEOUT_SECS", 10),
                max_retries: parsed_or("MAX_RECONNECT_RETRIES", 10),
                reconnect_backoff: seconds_or("RECONNECT_BACKOFF_SECS", 30),
            },
        })
    }

    /// The URL the loopback probe hits to check our own front door.
    pub fn loopback_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.http_port)
    }
}

pub fn discord_token() -> Result<String> {
    env::var("DISCORD_TOKEN").map_err(|_| eyre!("$DISCORD_TOKEN not set"))
}

#[instrument]
pub fn guild() -> Option<GuildId> {
    let guild_id = match env::var("GUILD_ID") {
        Ok(guild_id) => guild_id,
        Err(e) => {
            info!("$GUILD_ID not set ({e})");
            return None;
        }
    };

    match guild_id.parse::<u64>() {
        Ok(guild_id) => Some(GuildId(guild_id)),
        Err(e) => {
            warn!("Ignoring $GUILD_ID: {e}");
            None
        }
    }
}

pub fn welcome_channel() -> String {
    env::var("WELCOME_CHANNEL").unwrap_or_else(|_| "bienvenue".to_owned())
}

pub fn heartbeat_schedule() -> String {
    env::var("HEARTBEAT_SCHEDULE").unwrap_or_else(|_| "0 */5 * * * *".to_owned())
}

#[instrument]
fn parsed_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring ${name} ({e}), using {default:?}");
            default
        }
    }
}

fn seconds_or(name: &str, default: u64) -> Duration {
    Duration::from_secs(parsed_or(name, default))
}
