use color_eyre::Result;
use tracing::{info, warn};

use crate::{bot::CommandContext, gateway::discord, gateway::Announcement, theme};

/// Discord rejects longer thread names.
const MAX_THREAD_NAME: usize = 100;

/// One day, in minutes.
const THREAD_ARCHIVE_AFTER: u16 = 1440;

pub fn assembly_announcement(subject: &str) -> Announcement {
    Announcement::new(
        format!("{} Nouvelle Assemblée Populaire", theme::ASSEMBLY),
        format!(
            "**Sujet:** {subject}\n{} Cette assemblée est un espace de discussion horizontale.",
            theme::SOLIDARITY
        ),
        theme::RED,
    )
}

pub fn thread_name(subject: &str) -> String {
    let name: String = subject.trim().chars().take(MAX_THREAD_NAME).collect();
    if name.is_empty() {
        "Assemblée".to_owned()
    } else {
        name
    }
}

/// Crée une nouvelle assemblée populaire.
#[poise::command(slash_command)]
pub async fn assemblee(
    ctx: CommandContext<'_>,
    #[description = "Sujet de l'assemblée"] sujet: String,
) -> Result<()> {
    let announcement = assembly_announcement(&sujet);
    let reply = ctx
        .send(|r| r.embed(|e| discord::render(e, &announcement)))
        .await?;
    let message = reply.message().await?;

    let name = thread_name(&sujet);
    match ctx
        .channel_id()
        .create_public_thread(&ctx.serenity_context().http, message.id, |t| {
            t.name(&name).auto_archive_duration(THREAD_ARCHIVE_AFTER)
        })
        .await
    {
        Ok(thread) => info!("Opened assembly thread {} ({})", thread.name, thread.id),
        Err(e) => warn!("Assembly posted but its thread could not be created: {e}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_names_are_trimmed_and_bounded() {
        assert_eq!(thread_name("  Loyer du local "), "Loyer du local");
        assert_eq!(thread_name(&"é".repeat(150)).chars().count(), 100);
        assert_eq!(thread_name("   "), "Assemblée");
    }

    #[test]
    fn announcement_carries_the_subject() {
        let announcement = assembly_announcement("Jardin partagé");
        assert_eq!(announcement.title, "🏛️ Nouvelle Assemblée Populaire");
        assert!(announcement.description.starts_with("**Sujet:** Jardin partagé\n"));
        assert_eq!(announcement.colour, theme::RED);
    }
}
