use color_eyre::Result;
use lazy_static::lazy_static;
use poise::serenity_prelude as serenity;
use regex::Regex;

use crate::theme;

struct Reaction {
    pattern: Regex,
    emoji: &'static str,
}

fn react(pattern: &str, emoji: &'static str) -> Reaction {
    Reaction {
        #[allow(clippy::expect_used)]
        pattern: Regex::new(pattern).expect("failed to compile reaction pattern"),
        emoji,
    }
}

lazy_static! {
    // First match wins.
    static ref REACTIONS: Vec<Reaction> = vec![
        react(r"(?i)\banarchi", theme::ANARCHIST),
        react(r"(?i)\bni dieu,? ni ma[iî]tre", theme::ANARCHIST),
        react(r"(?i)\b(solidarit|entraide)", theme::SOLIDARITY),
        react(r"(?i)\br[ée]volution", theme::REVOLUTION),
        react(r"(?i)\b(paix|libert[ée])\b", theme::PEACE),
        react(r"(?i)\bassembl[ée]e", theme::ASSEMBLY),
        react(r"(?i)\b(vote|sondage)s?\b", theme::VOTE),
    ];
}

pub fn reaction_for(content: &str) -> Option<&'static str> {
    REACTIONS
        .iter()
        .find(|reaction| reaction.pattern.is_match(content))
        .map(|reaction| reaction.emoji)
}

pub async fn dispatch(ctx: &serenity::Context, msg: &serenity::Message) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    if let Some(emoji) = reaction_for(&msg.content) {
        msg.react(ctx.clone(), serenity::ReactionType::Unicode(emoji.to_owned()))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_pick_their_emoji() {
        assert_eq!(reaction_for("Vive l'anarchie!"), Some(theme::ANARCHIST));
        assert_eq!(reaction_for("Merci pour la SOLIDARITÉ"), Some(theme::SOLIDARITY));
        assert_eq!(reaction_for("la révolution sera numérique"), Some(theme::REVOLUTION));
        assert_eq!(reaction_for("paix et liberté"), Some(theme::PEACE));
        assert_eq!(reaction_for("prochaine assemblée jeudi"), Some(theme::ASSEMBLY));
        assert_eq!(reaction_for("le vote est ouvert"), Some(theme::VOTE));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            reaction_for("assemblée pour l'entraide"),
            Some(theme::SOLIDARITY)
        );
    }

    #[test]
    fn ordinary_messages_are_left_alone() {
        assert_eq!(reaction_for("bonjour à toutes et tous"), None);
        assert_eq!(reaction_for("devote"), None);
    }
}
