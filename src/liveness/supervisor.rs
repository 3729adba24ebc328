use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use super::{
    Action, GatewayProbe, LivenessConfig, LivenessError, LivenessState, LivenessStatus, Probe,
    ProbeError, ProbeSource,
};
use crate::gateway::{GatewayError, Session};

const MIN_PROBE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum Signal {
    Probe {
        source: ProbeSource,
        outcome: Result<(), ProbeError>,
    },
    ReconnectFinished(Result<(), GatewayError>),
    RetryDue(u64),
}

pub struct Supervisor {
    config: LivenessConfig,
    session: Arc<dyn Session>,
    loopback: Arc<dyn Probe>,
}

/// Cheap to clone; shared with commands, jobs and the event handler.
#[derive(Clone)]
pub struct SupervisorHandle {
    signals: mpsc::UnboundedSender<Signal>,
    state: watch::Receiver<LivenessState>,
}

impl SupervisorHandle {
    pub fn state(&self) -> LivenessState {
        self.state.borrow().clone()
    }

    /// Err once the supervisor has given up on the gateway.
    pub fn health(&self) -> Result<LivenessState, LivenessError> {
        let state = self.state();
        if state.status == LivenessStatus::Exhausted {
            Err(LivenessError::ReconnectExhausted {
                attempts: state.consecutive_failures,
            })
        } else {
            Ok(state)
        }
    }

    /// Forward a connection stage change seen by the platform client.
    pub fn report_connection(&self, connected: bool) {
        let outcome = if connected {
            Ok(())
        } else {
            Err(ProbeError::Failure("gateway reported a disconnect".to_owned()))
        };
        if self
            .signals
            .send(Signal::Probe {
                source: ProbeSource::Events,
                outcome,
            })
            .is_err()
        {
            warn!("Liveness supervisor is gone, dropping connection report");
        }
    }
}

impl Supervisor {
    pub fn new(config: LivenessConfig, session: Arc<dyn Session>, loopback: Arc<dyn Probe>) -> Self {
        Self {
            config,
            session,
            loopback,
        }
    }

    pub fn spawn(self) -> SupervisorHandle {
        let (signals, inbox) = mpsc::unbounded_channel();
        let state = LivenessState::new(self.config.max_retries);
        let (publish, watch) = watch::channel(state.clone());

        spawn_probe(
            ProbeSource::Gateway,
            Arc::new(GatewayProbe::new(self.session.clone())),
            self.config.gateway_probe_interval,
            self.config.probe_timeout,
            signals.clone(),
        );
        spawn_probe(
            ProbeSource::Loopback,
            self.loopback.clone(),
            self.config.loopback_probe_interval,
            self.config.probe_timeout,
            signals.clone(),
        );

        info!(
            "Liveness supervisor started (max {} reconnect attempts)",
            state.max_retries
        );
        tokio::spawn(self.run(state, inbox, signals.clone(), publish));

        SupervisorHandle {
            signals,
            state: watch,
        }
    }

    async fn run(
        self,
        mut state: LivenessState,
        mut inbox: mpsc::UnboundedReceiver<Signal>,
        signals: mpsc::UnboundedSender<Signal>,
        publish: watch::Sender<LivenessState>,
    ) {
        while let Some(signal) = inbox.recv().await {
            let now = Utc::now();
            let step = match signal {
                Signal::Probe { source, outcome } => {
                    match &outcome {
                        Ok(()) => debug!("{source} probe healthy"),
                        Err(e) => warn!("{source} probe: {e}"),
                    }
                    state.observe(source, outcome.is_ok(), now)
                }
                Signal::ReconnectFinished(result) => {
                    match &result {
                        Ok(()) => info!("Reconnected to the gateway"),
                        Err(e) => warn!("Reconnect attempt failed: {e}"),
                    }
                    state.reconnect_finished(result.is_ok(), now)
                }
                Signal::RetryDue(ticket) => state.retry_due(ticket),
            };

            for (from, to) in &step.transitions {
                info!("Liveness {from:?} -> {to:?}");
            }

            match step.action {
                Action::None => {}
                Action::Reconnect => {
                    info!(
                        "Reconnect attempt {}/{}",
                        state.consecutive_failures + 1,
                        state.max_retries
                    );
                    let session = self.session.clone();
                    let signals = signals.clone();
                    tokio::spawn(async move {
                        let result = session.reconnect().await;
                        let _ = signals.send(Signal::ReconnectFinished(result));
                    });
                }
                Action::ScheduleRetry(ticket) => {
                    let backoff = self.config.reconnect_backoff;
                    let signals = signals.clone();
                    tokio::spawn(async move {
                        time::sleep(backoff).await;
                        let _ = signals.send(Signal::RetryDue(ticket));
                    });
                }
                Action::GiveUp => {
                    error!(
                        "{}",
                        LivenessError::ReconnectExhausted {
                            attempts: state.consecutive_failures
                        }
                    );
                }
            }

            publish.send_replace(state.clone());
        }
    }
}

fn spawn_probe(
    source: ProbeSource,
    probe: Arc<dyn Probe>,
    every: Duration,
    timeout: Duration,
    signals: mpsc::UnboundedSender<Signal>,
) -> JoinHandle<()> {
    let every = every.max(MIN_PROBE_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = match time::timeout(timeout, probe.check()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProbeError::Timeout),
            };
            if signals.send(Signal::Probe { source, outcome }).is_err() {
                break;
            }
        }
    })
}
