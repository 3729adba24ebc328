use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};

use super::PollError;
use crate::gateway::{Announcement, MessageHandle};

/// Reaction symbols for numbered choices, by ordinal position.
pub const KEYCAPS: [&str; 10] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

/// Affirm, deny, abstain.
pub const BALLOT: [&str; 3] = ["✅", "❌", "⚪"];

pub const VOTE_LABELS: [&str; 3] = ["Pour", "Contre", "Abstention"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollShape {
    /// Binary vote with an abstain option.
    Vote,
    /// Free multi-option survey.
    Survey,
}

impl PollShape {
    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            PollShape::Vote => &BALLOT,
            PollShape::Survey => &KEYCAPS,
        }
    }

    /// Pair each label with its symbol, rejecting counts the table can't cover.
    pub fn assign(self, labels: Vec<String>) -> Result<Vec<PollOption>, PollError> {
        let table = self.symbols();
        if labels.is_empty() || labels.len() > table.len() {
            return Err(PollError::InvalidOptionCount {
                given: labels.len(),
                max: table.len(),
            });
        }

        Ok(labels
            .into_iter()
            .zip(table)
            .map(|(label, symbol)| PollOption {
                label,
                symbol: (*symbol).to_owned(),
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOption {
    pub label: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyMode {
    SnapshotOnce,
    PeriodicThenFinal,
}

/// What a command hands to the engine to open a poll.
#[derive(Debug, Clone)]
pub struct PollRequest {
    /// The proposition or question, repeated on result messages.
    pub subject: String,
    pub announcement: Announcement,
    pub shape: PollShape,
    pub labels: Vec<String>,
    pub duration: Option<Duration>,
}

impl PollRequest {
    pub fn vote(subject: impl Into<String>, announcement: Announcement, duration: Duration) -> Self {
        Self {
            subject: subject.into(),
            announcement,
            shape: PollShape::Vote,
            labels: VOTE_LABELS.iter().map(|l| (*l).to_owned()).collect(),
            duration: Some(duration),
        }
    }

    pub fn survey(
        subject: impl Into<String>,
        announcement: Announcement,
        labels: Vec<String>,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            subject: subject.into(),
            announcement,
            shape: PollShape::Survey,
            labels,
            duration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub id: MessageHandle,
    pub subject: String,
    pub shape: PollShape,
    pub options: Vec<PollOption>,
    pub opened_at: DateTime<Utc>,
    pub closes_at: Option<DateTime<Utc>>,
    pub tally_mode: Option<TallyMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub label: String,
    pub symbol: String,
    pub count: u64,
}

/// Per-option counts, in option order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub tallies: Vec<Tally>,
}

impl PollResult {
    /// Build a result from raw platform counts. Every option's count includes
    /// the bot's own seeding reaction, so one is taken off; a reaction the
    /// platform no longer reports counts as zero.
    pub fn from_counts(options: &[PollOption], counts: &HashMap<String, u64>) -> Self {
        Self {
            tallies: options
                .iter()
                .map(|option| Tally {
                    label: option.label.clone(),
                    symbol: option.symbol.clone(),
                    count: counts
                        .get(&option.symbol)
                        .map_or(0, |count| count.saturating_sub(1)),
                })
                .collect(),
        }
    }

    pub fn count_of(&self, label: &str) -> Option<u64> {
        self.tallies
            .iter()
            .find(|tally| tally.label == label)
            .map(|tally| tally.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyStage {
    Intermediate,
    Final,
}

/// One emission of the engine.
#[derive(Debug, Clone)]
pub struct TallyReport {
    pub poll: Poll,
    pub result: PollResult,
    pub stage: TallyStage,
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn surveys_take_one_keycap_per_option_in_order() {
        for n in 1..=10 {
            let options = PollShape::Survey.assign(labels(n)).unwrap();
            let symbols: Vec<&str> = options.iter().map(|o| o.symbol.as_str()).collect();
            assert_eq!(symbols, KEYCAPS[..n].to_vec());
            assert_eq!(symbols.iter().unique().count(), n);
        }
    }

    #[test]
    fn option_counts_outside_the_table_are_rejected() {
        assert!(matches!(
            PollShape::Survey.assign(vec![]),
            Err(PollError::InvalidOptionCount { given: 0, max: 10 })
        ));
        assert!(matches!(
            PollShape::Survey.assign(labels(11)),
            Err(PollError::InvalidOptionCount { given: 11, max: 10 })
        ));
        assert!(matches!(
            PollShape::Vote.assign(labels(4)),
            Err(PollError::InvalidOptionCount { given: 4, max: 3 })
        ));
    }

    #[test]
    fn vote_uses_the_ballot_symbols() {
        let options = PollShape::Vote
            .assign(VOTE_LABELS.iter().map(|l| (*l).to_owned()).collect())
            .unwrap();
        assert_eq!(options[0].symbol, "✅");
        assert_eq!(options[1].symbol, "❌");
        assert_eq!(options[2].symbol, "⚪");
    }

    #[test]
    fn counts_exclude_the_seeding_reaction() {
        let options = PollShape::Survey
            .assign(vec!["Thé".to_owned(), "Café".to_owned()])
            .unwrap();
        let counts = HashMap::from([("1️⃣".to_owned(), 4), ("2️⃣".to_owned(), 1)]);

        let result = PollResult::from_counts(&options, &counts);

        assert_eq!(result.count_of("Thé"), Some(3));
        assert_eq!(result.count_of("Café"), Some(0));
        assert_eq!(result.tallies[0].label, "Thé");
    }

    #[test]
    fn missing_and_zero_counts_never_go_negative() {
        let options = PollShape::Vote
            .assign(VOTE_LABELS.iter().map(|l| (*l).to_owned()).collect())
            .unwrap();
        let counts = HashMap::from([("✅".to_owned(), 0)]);

        let result = PollResult::from_counts(&options, &counts);

        assert_eq!(
            result.tallies.iter().map(|t| t.count).collect::<Vec<_>>(),
            vec![0, 0, 0]
        );
    }
}
