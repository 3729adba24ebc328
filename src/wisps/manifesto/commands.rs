use color_eyre::Result;

use crate::{bot::CommandContext, gateway::discord, gateway::Announcement, theme};

const PRINCIPLES: [&str; 4] = ["Autogestion", "Solidarité", "Action Directe", "Paix et Liberté"];

pub fn manifesto() -> Announcement {
    let mut description = "**Nos Principes Fondamentaux**".to_owned();
    for (i, principle) in PRINCIPLES.iter().enumerate() {
        description.push_str(&format!("\n{}. **{principle}**", i + 1));
    }
    Announcement::new(
        format!("{} Manifeste de la Commune Numérique", theme::REVOLUTION),
        description,
        theme::BLACK,
    )
}

/// Affiche le manifeste de notre communauté.
#[poise::command(slash_command)]
pub async fn manifeste(ctx: CommandContext<'_>) -> Result<()> {
    let announcement = manifesto();
    ctx.send(|r| r.embed(|e| discord::render(e, &announcement)))
        .await?;
    Ok(())
}
