use poise::serenity_prelude as serenity;
use ::serenity::gateway::ConnectionStage;

/// The platform events the bot acts on. Commands are routed by poise itself.
#[derive(Debug)]
pub enum InboundEvent<'a> {
    Ready { name: &'a str },
    MemberJoined(&'a serenity::Member),
    MessagePosted(&'a serenity::Message),
    ConnectionChanged { connected: bool },
}

impl<'a> InboundEvent<'a> {
    pub fn from_poise(event: &'a poise::Event<'_>) -> Option<Self> {
        match event {
            poise::Event::Ready { data_about_bot } => Some(Self::Ready {
                name: &data_about_bot.user.name,
            }),
            poise::Event::GuildMemberAddition { new_member } => {
                Some(Self::MemberJoined(new_member))
            }
            poise::Event::Message { new_message } => Some(Self::MessagePosted(new_message)),
            poise::Event::ShardStageUpdate { update } => {
                connection_change(update.new).map(|connected| Self::ConnectionChanged { connected })
            }
            poise::Event::Resume { .. } => Some(Self::ConnectionChanged { connected: true }),
            _ => None,
        }
    }
}

/// Only settled stages say anything about liveness; handshakes in between don't.
pub fn connection_change(stage: ConnectionStage) -> Option<bool> {
    match stage {
        ConnectionStage::Connected => Some(true),
        ConnectionStage::Disconnected => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_settled_stages_are_forwarded() {
        assert_eq!(connection_change(ConnectionStage::Connected), Some(true));
        assert_eq!(connection_change(ConnectionStage::Disconnected), Some(false));
        assert_eq!(connection_change(ConnectionStage::Handshake), None);
        assert_eq!(connection_change(ConnectionStage::Resuming), None);
    }
}
