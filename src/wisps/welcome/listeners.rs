use color_eyre::Result;
use poise::serenity_prelude as serenity;
use tracing::{error, info, instrument};

use crate::{bot::Bot, gateway::Announcement, theme};

/// The configured channel may be given by name or by id.
pub fn matches_channel(wanted: &str, name: &str, id: u64) -> bool {
    let wanted = wanted.trim().trim_start_matches('#');
    name == wanted || wanted.parse::<u64>().map_or(false, |wanted| wanted == id)
}

pub fn welcome_announcement(username: &str, image: Option<&str>) -> Announcement {
    let description = format!(
        "**Salutations {username}!**\n\
         Tu viens de rejoindre un espace d'autogestion et de liberté.\n\n\
         {solidarity} **Notre Vision:**\n\
         • Démocratie directe et participative\n\
         • Entraide mutuelle et solidarité\n\
         • Organisation horizontale\n\
         • Action directe et autonomie\n\n\
         {revolution} **Participe à la vie collective:**\n\
         • /assemblee - Pour créer une assemblée\n\
         • /vote - Pour les décisions collectives\n\
         • /entraide - Pour l'entraide mutuelle\n\
         • /manifeste - Pour comprendre nos principes",
        solidarity = theme::SOLIDARITY,
        revolution = theme::REVOLUTION,
    );

    Announcement {
        image: image.map(ToOwned::to_owned),
        footer: Some(theme::FOOTER.to_owned()),
        ..Announcement::new(
            format!("{} Bienvenue dans la Commune Libre!", theme::ANARCHIST),
            description,
            theme::BLACK,
        )
    }
}

#[instrument(skip_all, fields(member = %member.user.name))]
pub async fn dispatch(ctx: &serenity::Context, member: &serenity::Member, bot: &Bot) -> Result<()> {
    let wanted = &bot.config.welcome_channel;
    let channels = member.guild_id.channels(&ctx.http).await?;
    let Some(channel) = channels
        .values()
        .filter(|channel| channel.kind == serenity::ChannelType::Text)
        .find(|channel| matches_channel(wanted, &channel.name, channel.id.0))
    else {
        error!("Welcome channel {wanted} was not found");
        return Ok(());
    };

    let announcement =
        welcome_announcement(&member.user.name, bot.config.welcome_image_url.as_deref());
    let handle = bot.gateway.post_message(channel.id.0, &announcement).await?;
    info!("Welcomed new member in {handle}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_match_by_name_or_id() {
        assert!(matches_channel("bienvenue", "bienvenue", 1));
        assert!(matches_channel("#bienvenue", "bienvenue", 1));
        assert!(matches_channel("945325244762165278", "accueil", 945_325_244_762_165_278));
        assert!(!matches_channel("bienvenue", "general", 1));
        assert!(!matches_channel("12", "general", 13));
    }

    #[test]
    fn welcome_greets_by_name() {
        let announcement = welcome_announcement("sacha", Some("https://example.org/flag.png"));
        assert_eq!(announcement.title, "Ⓐ Bienvenue dans la Commune Libre!");
        assert!(announcement.description.starts_with("**Salutations sacha!**\n"));
        assert!(announcement.description.contains("• /vote - Pour les décisions collectives"));
        assert_eq!(announcement.image.as_deref(), Some("https://example.org/flag.png"));
        assert_eq!(announcement.footer.as_deref(), Some(theme::FOOTER));
        assert_eq!(announcement.colour, theme::BLACK);
    }
}
