use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use dashmap::DashMap;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{error, info, instrument, warn};

use super::{
    model::{Poll, PollRequest, PollResult, TallyMode, TallyReport, TallyStage},
    timers::{TimerGuard, TimerLedger},
    PollError,
};
use crate::gateway::{Gateway, MessageHandle};

struct OpenPoll {
    poll: Poll,
    timer: Option<JoinHandle<()>>,
    /// Which worker currently owns the timer; displaced workers must not touch the poll.
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
enum Plan {
    Once(Duration),
    Periodic { interval: Duration, until: Duration },
}

impl Plan {
    fn mode(self) -> TallyMode {
        match self {
            Plan::Once(_) => TallyMode::SnapshotOnce,
            Plan::Periodic { .. } => TallyMode::PeriodicThenFinal,
        }
    }
}

/// Owns every open poll and its single tally timer.
///
/// Results are emitted as [`TallyReport`]s on the channel returned by
/// [`PollEngine::new`]; turning them into messages is up to the receiver.
#[derive(Clone)]
pub struct PollEngine {
    gateway: Arc<dyn Gateway>,
    polls: Arc<DashMap<MessageHandle, OpenPoll>>,
    ledger: TimerLedger,
    generations: Arc<AtomicU64>,
    reports: mpsc::UnboundedSender<TallyReport>,
}

impl PollEngine {
    pub fn new(gateway: Arc<dyn Gateway>) -> (Self, mpsc::UnboundedReceiver<TallyReport>) {
        let (reports, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            gateway,
            polls: Arc::new(DashMap::new()),
            ledger: TimerLedger::default(),
            generations: Arc::new(AtomicU64::new(0)),
            reports,
        };
        (engine, receiver)
    }

    pub fn open_count(&self) -> usize {
        self.polls.len()
    }

    pub fn timers(&self) -> &TimerLedger {
        &self.ledger
    }

    pub fn get(&self, handle: MessageHandle) -> Option<Poll> {
        self.polls.get(&handle).map(|open| open.poll.clone())
    }

    /// Post the anchor message and seed one reaction per option, in order.
    /// Nothing is posted when the option count is invalid.
    #[instrument(skip(self, request), fields(subject = %request.subject))]
    pub async fn open_poll(
        &self,
        channel: u64,
        request: PollRequest,
    ) -> Result<MessageHandle, PollError> {
        let options = request.shape.assign(request.labels)?;

        let anchor = self
            .gateway
            .post_message(channel, &request.announcement)
            .await?;
        for option in &options {
            if let Err(e) = self.gateway.add_reaction(anchor, &option.symbol).await {
                warn!("Anchor {anchor} was posted but left without a poll: {e}");
                return Err(e.into());
            }
        }

        let opened_at = Utc::now();
        let closes_at = request
            .duration
            .and_then(|duration| chrono::Duration::from_std(duration).ok())
            .map(|duration| opened_at + duration);

        info!("Opened poll on {anchor} with {} options", options.len());
        self.polls.insert(
            anchor,
            OpenPoll {
                poll: Poll {
                    id: anchor,
                    subject: request.subject,
                    shape: request.shape,
                    options,
                    opened_at,
                    closes_at,
                    tally_mode: None,
                },
                timer: None,
                generation: 0,
            },
        );

        Ok(anchor)
    }

    /// Emit a single final tally once `after` has elapsed.
    pub async fn schedule_tally(
        &self,
        handle: MessageHandle,
        after: Duration,
    ) -> Result<(), PollError> {
        self.start(handle, Plan::Once(after)).await
    }

    /// Emit an intermediate tally every `interval` before `until`, then a
    /// final one at `until`.
    pub async fn schedule_periodic_tally(
        &self,
        handle: MessageHandle,
        interval: Duration,
        until: Duration,
    ) -> Result<(), PollError> {
        if interval.is_zero() {
            return Err(PollError::InvalidSchedule);
        }
        self.start(handle, Plan::Periodic { interval, until }).await
    }

    /// Read the current counts of an open poll.
    pub async fn sample(&self, handle: MessageHandle) -> Result<PollResult, PollError> {
        let poll = self.get(handle).ok_or(PollError::UnknownPoll(handle))?;
        sample(self.gateway.as_ref(), &poll).await
    }

    /// Drop a poll without tallying it. Its timer is gone when this returns.
    pub async fn close_poll(&self, handle: MessageHandle) -> Result<Poll, PollError> {
        let (_, open) = self
            .polls
            .remove(&handle)
            .ok_or(PollError::UnknownPoll(handle))?;

        if let Some(timer) = open.timer {
            cancel(timer).await;
        }

        info!("Closed poll on {handle} without a tally");
        Ok(open.poll)
    }

    async fn start(&self, handle: MessageHandle, plan: Plan) -> Result<(), PollError> {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;

        // The new timer is armed and swapped in under the same entry lock, so
        // overlapping schedules always leave exactly one live handle in the map.
        let displaced = {
            let mut open = self
                .polls
                .get_mut(&handle)
                .ok_or(PollError::UnknownPoll(handle))?;

            let worker = TallyWorker {
                gateway: self.gateway.clone(),
                polls: self.polls.clone(),
                reports: self.reports.clone(),
                handle,
                generation,
            };
            let timer = tokio::spawn(worker.run(plan, self.ledger.arm()));

            open.poll.tally_mode = Some(plan.mode());
            open.generation = generation;
            open.timer.replace(timer)
        };

        if let Some(previous) = displaced {
            cancel(previous).await;
        }

        info!("Scheduled {:?} tally for poll on {handle}", plan.mode());
        Ok(())
    }
}

async fn cancel(timer: JoinHandle<()>) {
    timer.abort();
    if let Err(e) = timer.await {
        if e.is_panic() {
            error!("Poll timer panicked: {e}");
        }
    }
}

async fn sample(gateway: &dyn Gateway, poll: &Poll) -> Result<PollResult, PollError> {
    let counts = gateway
        .reaction_counts(poll.id)
        .await
        .map_err(|source| PollError::AnchorUnavailable {
            anchor: poll.id,
            source,
        })?;
    Ok(PollResult::from_counts(&poll.options, &counts))
}

struct TallyWorker {
    gateway: Arc<dyn Gateway>,
    polls: Arc<DashMap<MessageHandle, OpenPoll>>,
    reports: mpsc::UnboundedSender<TallyReport>,
    handle: MessageHandle,
    generation: u64,
}

impl TallyWorker {
    /// `timer` is released when the deadline passes or the task is aborted.
    async fn run(self, plan: Plan, timer: TimerGuard) {
        match plan {
            Plan::Once(after) => {
                time::sleep(after).await;
            }
            Plan::Periodic { interval, until } => {
                let start = Instant::now();
                let mut ticker = time::interval_at(start + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                let final_tick = time::sleep_until(start + until);
                tokio::pin!(final_tick);

                loop {
                    tokio::select! {
                        biased;
                        () = &mut final_tick => break,
                        _ = ticker.tick() => self.emit(TallyStage::Intermediate).await,
                    }
                }
            }
        }

        drop(timer);

        self.emit(TallyStage::Final).await;
        self.polls
            .remove_if(&self.handle, |_, open| open.generation == self.generation);
    }

    async fn emit(&self, stage: TallyStage) {
        let poll = match self.polls.get(&self.handle) {
            Some(open) if open.generation == self.generation => open.poll.clone(),
            _ => return,
        };

        match sample(self.gateway.as_ref(), &poll).await {
            Ok(result) => {
                if self
                    .reports
                    .send(TallyReport {
                        poll,
                        result,
                        stage,
                    })
                    .is_err()
                {
                    warn!("Dropping {stage:?} tally for {}: nobody is listening", self.handle);
                }
            }
            Err(e) => warn!("Skipping {stage:?} tally: {e}"),
        }
    }
}
