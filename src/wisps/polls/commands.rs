use std::time::Duration;

use color_eyre::Result;
use itertools::Itertools;
use tracing::info;

use crate::{
    bot::CommandContext,
    gateway::{discord, Announcement, MessageHandle},
    polls::{PollError, PollRequest, TallyReport, TallyStage},
    theme,
};

use super::results::result_announcement;

/// 30 days.
const MAX_DURATION_HOURS: u64 = 720;

fn hours(value: i64) -> Option<Duration> {
    u64::try_from(value)
        .ok()
        .filter(|h| (1..=MAX_DURATION_HOURS).contains(h))
        .map(|h| Duration::from_secs(h * 3600))
}

fn duration_hours(value: i64) -> Result<Duration, String> {
    hours(value).ok_or_else(|| format!("La durée doit être entre 1 et {MAX_DURATION_HOURS} heures."))
}

fn follow_up_minutes(value: i64) -> Result<Duration, String> {
    minutes(value).ok_or_else(|| {
        format!(
            "Le suivi doit être entre 1 et {} minutes.",
            MAX_DURATION_HOURS * 60
        )
    })
}

fn minutes(value: i64) -> Option<Duration> {
    u64::try_from(value)
        .ok()
        .filter(|m| (1..=MAX_DURATION_HOURS * 60).contains(m))
        .map(|m| Duration::from_secs(m * 60))
}

/// Comma-separated survey options, trimmed, blanks dropped.
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

pub fn vote_announcement(proposition: &str, hours: i64, follow_up: Option<i64>) -> Announcement {
    let mut description = format!("**Proposition:** {proposition}\n**Durée:** {hours} heures");
    if let Some(minutes) = follow_up {
        description.push_str(&format!("\n**Suivi:** toutes les {minutes} minutes"));
    }
    Announcement::new(
        format!("{} Vote Collectif", theme::VOTE),
        description,
        theme::GOLD,
    )
}

pub fn survey_announcement(question: &str, options: &[String], hours: Option<i64>) -> Announcement {
    let listed = options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("**{}**. {option}", i + 1))
        .join("\n");
    let mut description = format!("**Question:** {question}\n**Options:**\n{listed}");
    if let Some(hours) = hours {
        description.push_str(&format!("\n**Durée:** {hours} heures"));
    }
    Announcement::new(
        format!("{} Sondage Participatif", theme::VOTE),
        description,
        theme::RED,
    )
}

fn parse_anchor(channel: u64, raw: &str) -> Result<MessageHandle, String> {
    raw.trim()
        .parse()
        .map(|message| MessageHandle { channel, message })
        .map_err(|_| format!("« {} » n'est pas un identifiant de message.", raw.trim()))
}

/// Lance un vote collectif.
#[poise::command(slash_command)]
pub async fn vote(
    ctx: CommandContext<'_>,
    #[description = "La proposition à voter"] proposition: String,
    #[description = "Durée du vote en heures"] duree: i64,
    #[description = "Décompte intermédiaire toutes les N minutes"] suivi: Option<i64>,
) -> Result<()> {
    let checked = duration_hours(duree).and_then(|duration| {
        let interval = suivi.map(follow_up_minutes).transpose()?;
        Ok((duration, interval))
    });
    let (duration, interval) = match checked {
        Ok(checked) => checked,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    ctx.defer_ephemeral().await?;

    let engine = &ctx.data().polls;
    let request = PollRequest::vote(
        proposition.as_str(),
        vote_announcement(&proposition, duree, suivi),
        duration,
    );
    let anchor = engine.open_poll(ctx.channel_id().0, request).await?;

    if let Some(interval) = interval {
        engine
            .schedule_periodic_tally(anchor, interval, duration)
            .await?;
    } else {
        engine.schedule_tally(anchor, duration).await?;
    }

    info!("{} opened a vote on {anchor}", ctx.author().name);
    ctx.say(format!("Vote ouvert, résultats dans {duree} heures."))
        .await?;

    Ok(())
}

/// Crée un sondage participatif.
#[poise::command(slash_command)]
pub async fn sondage(
    ctx: CommandContext<'_>,
    #[description = "La question du sondage"] question: String,
    #[description = "Options séparées par des virgules"] options: String,
    #[description = "Durée du sondage en heures"] duree: Option<i64>,
) -> Result<()> {
    let duration = match duree.map(duration_hours).transpose() {
        Ok(duration) => duration,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    let labels = split_options(&options);
    let announcement = survey_announcement(&question, &labels, duree);

    ctx.defer_ephemeral().await?;

    let engine = &ctx.data().polls;
    let request = PollRequest::survey(question.as_str(), announcement, labels, duration);
    let anchor = match engine.open_poll(ctx.channel_id().0, request).await {
        Ok(anchor) => anchor,
        Err(e @ PollError::InvalidOptionCount { .. }) => {
            ctx.say(format!("Sondage refusé: {e}.")).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(duration) = duration {
        engine.schedule_tally(anchor, duration).await?;
    }

    info!("{} opened a survey on {anchor}", ctx.author().name);
    ctx.say("Sondage ouvert.").await?;

    Ok(())
}

/// Affiche le décompte actuel d'un vote ou sondage ouvert.
#[poise::command(slash_command, ephemeral)]
pub async fn decompte(
    ctx: CommandContext<'_>,
    #[description = "Identifiant du message du vote"] message: String,
) -> Result<()> {
    let anchor = match parse_anchor(ctx.channel_id().0, &message) {
        Ok(anchor) => anchor,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    let engine = &ctx.data().polls;
    let Some(poll) = engine.get(anchor) else {
        ctx.say("Aucun vote ouvert sur ce message.").await?;
        return Ok(());
    };
    let result = engine.sample(anchor).await?;

    let report = TallyReport {
        poll,
        result,
        stage: TallyStage::Intermediate,
    };
    let announcement = result_announcement(&report);
    ctx.send(|r| r.embed(|e| discord::render(e, &announcement)))
        .await?;

    Ok(())
}

/// Annule un vote ou sondage ouvert sans publier de résultats.
#[poise::command(slash_command, required_permissions = "MANAGE_MESSAGES")]
pub async fn annuler(
    ctx: CommandContext<'_>,
    #[description = "Identifiant du message du vote"] message: String,
) -> Result<()> {
    let anchor = match parse_anchor(ctx.channel_id().0, &message) {
        Ok(anchor) => anchor,
        Err(reason) => {
            ctx.say(reason).await?;
            return Ok(());
        }
    };

    match ctx.data().polls.close_poll(anchor).await {
        Ok(poll) => {
            info!("{} cancelled poll {anchor}", ctx.author().name);
            ctx.say(format!("Annulé: {}", poll.subject)).await?;
        }
        Err(PollError::UnknownPoll(_)) => {
            ctx.say("Aucun vote ouvert sur ce message.").await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_trimmed_and_blanks_dropped() {
        assert_eq!(split_options(" Thé, Café ,,  "), vec!["Thé", "Café"]);
        assert!(split_options(" , ").is_empty());
    }

    #[test]
    fn durations_are_bounded() {
        assert_eq!(hours(2), Some(Duration::from_secs(7200)));
        assert_eq!(hours(0), None);
        assert_eq!(hours(-3), None);
        assert_eq!(hours(721), None);
        assert_eq!(minutes(15), Some(Duration::from_secs(900)));
        assert_eq!(minutes(0), None);
    }

    #[test]
    fn rejections_state_the_accepted_range() {
        assert_eq!(
            follow_up_minutes(50_000),
            Err("Le suivi doit être entre 1 et 43200 minutes.".to_owned())
        );
        assert_eq!(
            follow_up_minutes(0),
            Err("Le suivi doit être entre 1 et 43200 minutes.".to_owned())
        );
        assert_eq!(follow_up_minutes(43_200), Ok(Duration::from_secs(43_200 * 60)));
        assert_eq!(
            duration_hours(0),
            Err("La durée doit être entre 1 et 720 heures.".to_owned())
        );
    }

    #[test]
    fn vote_announcement_mentions_duration_and_follow_up() {
        let plain = vote_announcement("Ouvrir un jardin", 24, None);
        assert_eq!(plain.title, "📊 Vote Collectif");
        assert_eq!(
            plain.description,
            "**Proposition:** Ouvrir un jardin\n**Durée:** 24 heures"
        );

        let followed = vote_announcement("Ouvrir un jardin", 24, Some(60));
        assert!(followed.description.ends_with("**Suivi:** toutes les 60 minutes"));
    }

    #[test]
    fn survey_announcement_numbers_options() {
        let options = split_options("Thé,Café");
        let announcement = survey_announcement("Boisson?", &options, None);
        assert_eq!(
            announcement.description,
            "**Question:** Boisson?\n**Options:**\n**1**. Thé\n**2**. Café"
        );
        assert_eq!(announcement.colour, theme::RED);
    }

    #[test]
    fn anchors_parse_from_message_ids() {
        assert_eq!(
            parse_anchor(5, " 1234 "),
            Ok(MessageHandle {
                channel: 5,
                message: 1234
            })
        );
        assert_eq!(
            parse_anchor(5, "abc"),
            Err("« abc » n'est pas un identifiant de message.".to_owned())
        );
    }
}
