pub mod assembly;
pub mod heartbeat;
pub mod manifesto;
pub mod mutual_aid;
pub mod polls;
pub mod reactions;
pub mod reminder;
pub mod welcome;

pub fn commands() -> Vec<poise::Command<crate::bot::Bot, color_eyre::eyre::ErrReport>> {
    vec![
        assembly::commands::assemblee(),
        polls::commands::vote(),
        polls::commands::sondage(),
        polls::commands::decompte(),
        polls::commands::annuler(),
        manifesto::commands::manifeste(),
        mutual_aid::commands::entraide(),
        reminder::commands::rappel(),
    ]
}
