use std::{sync::Arc, time::Duration};

use color_eyre::Result;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    bot::CommandContext,
    gateway::{Announcement, Gateway},
    theme,
};

/// One week.
const MAX_DELAY_MINUTES: i64 = 7 * 24 * 60;

pub fn reminder_announcement(author: &str, text: &str) -> Announcement {
    Announcement::new(
        format!("{} Rappel", theme::REMINDER),
        format!("{text}\n\n*Demandé par {author}*"),
        theme::GOLD,
    )
}

/// Post `announcement` in `channel` once `delay` has elapsed.
pub fn schedule(
    gateway: Arc<dyn Gateway>,
    channel: u64,
    delay: Duration,
    announcement: Announcement,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match gateway.post_message(channel, &announcement).await {
            Ok(handle) => info!("Posted reminder {handle}"),
            Err(e) => error!("Failed to post reminder in channel {channel}: {e}"),
        }
    })
}

/// Programme un rappel dans ce salon.
#[poise::command(slash_command, ephemeral)]
pub async fn rappel(
    ctx: CommandContext<'_>,
    #[description = "Le message du rappel"] message: String,
    #[description = "Dans combien de minutes"] minutes: i64,
) -> Result<()> {
    if !(1..=MAX_DELAY_MINUTES).contains(&minutes) {
        ctx.say(format!(
            "Le délai doit être entre 1 et {MAX_DELAY_MINUTES} minutes."
        ))
        .await?;
        return Ok(());
    }

    #[allow(clippy::cast_sign_loss)]
    let delay = Duration::from_secs(minutes as u64 * 60);
    schedule(
        ctx.data().gateway.clone(),
        ctx.channel_id().0,
        delay,
        reminder_announcement(&ctx.author().name, &message),
    );

    ctx.say(format!("{} Rappel programmé dans {minutes} minutes.", theme::REMINDER))
        .await?;
    Ok(())
}
