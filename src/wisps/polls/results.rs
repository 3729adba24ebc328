use std::sync::Arc;

use itertools::Itertools;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{
    gateway::{Announcement, Gateway},
    polls::{PollShape, TallyReport, TallyStage},
    theme,
};

/// Render a tally as the message posted under the poll.
pub fn result_announcement(report: &TallyReport) -> Announcement {
    let title = match (report.stage, report.poll.shape) {
        (TallyStage::Intermediate, _) => format!("{} Décompte intermédiaire", theme::VOTE),
        (TallyStage::Final, PollShape::Vote) => format!("{} Résultats du Vote", theme::VOTE),
        (TallyStage::Final, PollShape::Survey) => format!("{} Résultats du Sondage", theme::VOTE),
    };

    let lines = report
        .result
        .tallies
        .iter()
        .map(|tally| format!("{} {}: {}", tally.symbol, tally.label, tally.count))
        .join("\n");

    Announcement::new(
        title,
        format!("**{}**\n{lines}", report.poll.subject),
        theme::GOLD,
    )
}

/// Post every report the engine emits until the engine is dropped.
pub async fn announce(
    mut reports: mpsc::UnboundedReceiver<TallyReport>,
    gateway: Arc<dyn Gateway>,
) {
    while let Some(report) = reports.recv().await {
        let anchor = report.poll.id;
        match gateway
            .post_message(anchor.channel, &result_announcement(&report))
            .await
        {
            Ok(_) => info!("Announced {:?} tally for poll {anchor}", report.stage),
            Err(e) => error!("Failed to announce tally for poll {anchor}: {e}"),
        }
    }
}
