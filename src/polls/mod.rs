//! Timed polls: open a poll on an anchor message, then sample its reactions
//! once at a deadline or repeatedly until a final tally.

use thiserror::Error;

use crate::gateway::{GatewayError, MessageHandle};

mod engine;
pub mod model;
mod timers;

pub use engine::PollEngine;
pub use model::{PollRequest, PollShape, TallyReport, TallyStage};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("a poll needs between 1 and {max} options, got {given}")]
    InvalidOptionCount { given: usize, max: usize },
    #[error("anchor message {anchor} is unavailable: {source}")]
    AnchorUnavailable {
        anchor: MessageHandle,
        #[source]
        source: GatewayError,
    },
    #[error("no open poll on message {0}")]
    UnknownPoll(MessageHandle),
    #[error("tally interval must be longer than zero")]
    InvalidSchedule,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
