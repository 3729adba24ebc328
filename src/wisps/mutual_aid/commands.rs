use color_eyre::Result;
use poise::serenity_prelude as serenity;

use crate::{bot::CommandContext, gateway::discord, gateway::Announcement, theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum AidKind {
    #[name = "Offrir"]
    Offer,
    #[name = "Demander"]
    Request,
}

impl AidKind {
    fn label(self) -> &'static str {
        match self {
            AidKind::Offer => "Offre d'aide",
            AidKind::Request => "Demande d'aide",
        }
    }
}

pub fn aid_announcement(kind: AidKind, description: &str) -> Announcement {
    Announcement::new(
        format!("{} Réseau d'Entraide Mutuelle", theme::SOLIDARITY),
        format!("**Type:** {}\n**Description:** {description}", kind.label()),
        theme::RED,
    )
}

/// Système d'entraide mutuelle.
#[poise::command(slash_command)]
pub async fn entraide(
    ctx: CommandContext<'_>,
    #[description = "Type d'entraide"]
    #[rename = "type"]
    kind: AidKind,
    #[description = "Description de l'entraide"] description: String,
) -> Result<()> {
    let announcement = aid_announcement(kind, &description);
    let reply = ctx
        .send(|r| r.embed(|e| discord::render(e, &announcement)))
        .await?;
    reply
        .message()
        .await?
        .react(
            ctx.serenity_context(),
            serenity::ReactionType::Unicode(theme::SOLIDARITY.to_owned()),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_read_naturally() {
        let offer = aid_announcement(AidKind::Offer, "Vélo à prêter");
        assert_eq!(
            offer.description,
            "**Type:** Offre d'aide\n**Description:** Vélo à prêter"
        );
        let request = aid_announcement(AidKind::Request, "Déménagement samedi");
        assert!(request.description.starts_with("**Type:** Demande d'aide"));
        assert_eq!(request.title, "✨ Réseau d'Entraide Mutuelle");
    }
}
