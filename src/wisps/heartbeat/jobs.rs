use color_eyre::Result;
use tracing::info;

use crate::{bot::JobContext, theme};

/// Log that the bot is alive along with what it is currently tracking.
/// Fails once the liveness supervisor has given up, so the job log shows it.
pub(crate) async fn report_alive(ctx: JobContext) -> Result<()> {
    let state = ctx.liveness.health()?;
    let timers = ctx.polls.timers();

    info!(
        "{} Bot actif - {:?}, {} open polls, {} active timers ({} armed / {} disarmed)",
        theme::ANARCHIST,
        state.status,
        ctx.polls.open_count(),
        timers.active(),
        timers.armed(),
        timers.disarmed(),
    );

    Ok(())
}
