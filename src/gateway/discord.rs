use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use serenity::{
    builder::CreateEmbed,
    client::bridge::gateway::{ShardId, ShardManager},
    gateway::ConnectionStage,
    http::{error::Error as HttpError, Http},
    model::{channel::ReactionType, id::ChannelId, Timestamp},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{Announcement, ConnectionStatus, Gateway, GatewayError, MessageHandle, Session};

const READY_POLL: Duration = Duration::from_millis(500);

/// Fill a serenity embed builder from an [`Announcement`].
pub fn render<'a>(
    embed: &'a mut CreateEmbed,
    announcement: &Announcement,
) -> &'a mut CreateEmbed {
    embed
        .title(&announcement.title)
        .description(&announcement.description)
        .colour(announcement.colour)
        .timestamp(Timestamp::now());
    if let Some(image) = &announcement.image {
        embed.image(image);
    }
    if let Some(footer) = &announcement.footer {
        embed.footer(|f| f.text(footer));
    }
    embed
}

fn translate(e: serenity::Error) -> GatewayError {
    if let serenity::Error::Http(http) = &e {
        if let HttpError::UnsuccessfulRequest(response) = http.as_ref() {
            if response.status_code.as_u16() == 404 {
                return GatewayError::NotFound;
            }
        }
    }
    GatewayError::Request(e.to_string())
}

/// Messaging over the bot's REST client.
#[derive(Clone)]
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn post_message(
        &self,
        channel: u64,
        announcement: &Announcement,
    ) -> Result<MessageHandle, GatewayError> {
        let message = ChannelId(channel)
            .send_message(&self.http, |m| m.embed(|e| render(e, announcement)))
            .await
            .map_err(translate)?;

        Ok(MessageHandle {
            channel,
            message: message.id.0,
        })
    }

    async fn add_reaction(&self, anchor: MessageHandle, symbol: &str) -> Result<(), GatewayError> {
        self.http
            .create_reaction(
                anchor.channel,
                anchor.message,
                &ReactionType::Unicode(symbol.to_owned()),
            )
            .await
            .map_err(translate)
    }

    async fn reaction_counts(
        &self,
        anchor: MessageHandle,
    ) -> Result<HashMap<String, u64>, GatewayError> {
        let message = self
            .http
            .get_message(anchor.channel, anchor.message)
            .await
            .map_err(translate)?;

        Ok(message
            .reactions
            .into_iter()
            .filter_map(|reaction| match reaction.reaction_type {
                ReactionType::Unicode(symbol) => Some((symbol, reaction.count)),
                _ => None,
            })
            .collect())
    }
}

/// The live gateway connection, observed and restarted through the shard manager.
#[derive(Clone)]
pub struct DiscordSession {
    shard_manager: Arc<Mutex<ShardManager>>,
    ready_timeout: Duration,
}

impl DiscordSession {
    pub fn new(shard_manager: Arc<Mutex<ShardManager>>, ready_timeout: Duration) -> Self {
        Self {
            shard_manager,
            ready_timeout,
        }
    }

    async fn shards(&self) -> Vec<ShardId> {
        let manager = self.shard_manager.lock().await;
        let runners = manager.runners.lock().await;
        runners.keys().copied().collect()
    }
}

#[async_trait]
impl Session for DiscordSession {
    async fn connection_status(&self) -> ConnectionStatus {
        let manager = self.shard_manager.lock().await;
        let runners = manager.runners.lock().await;

        if runners.is_empty() {
            return ConnectionStatus::Disconnected;
        }

        let stages: Vec<ConnectionStage> = runners.values().map(|runner| runner.stage).collect();
        debug!("Shard stages: {stages:?}");

        if stages.iter().all(|stage| *stage == ConnectionStage::Connected) {
            ConnectionStatus::Ready
        } else if stages.contains(&ConnectionStage::Disconnected) {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::Connecting
        }
    }

    async fn reconnect(&self) -> Result<(), GatewayError> {
        let mut shards = self.shards().await;
        if shards.is_empty() {
            shards.push(ShardId(0));
        }

        {
            let mut manager = self.shard_manager.lock().await;
            for shard in shards {
                info!("Restarting shard {shard:?}");
                manager.restart(shard).await;
            }
        }

        tokio::time::timeout(self.ready_timeout, async {
            while self.connection_status().await != ConnectionStatus::Ready {
                tokio::time::sleep(READY_POLL).await;
            }
        })
        .await
        .map_err(|_| GatewayError::Timeout)
    }
}
