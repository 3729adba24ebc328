//! Keeps the gateway connection alive.
//!
//! Two independent probes (gateway status and an HTTP loopback request) feed
//! a single supervisor task, which owns the [`LivenessState`] and drives
//! bounded reconnect attempts.

use std::time::Duration;

use thiserror::Error;

mod probe;
mod state;
mod supervisor;

pub use probe::{GatewayProbe, HttpProbe, Probe, ProbeSource};
pub use state::{Action, LivenessState, LivenessStatus};
pub use supervisor::{Supervisor, SupervisorHandle};

#[derive(Debug, Clone)]
pub struct LivenessConfig {
    pub gateway_probe_interval: Duration,
    pub loopback_probe_interval: Duration,
    pub probe_timeout: Duration,
    pub max_retries: u32,
    pub reconnect_backoff: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            gateway_probe_interval: Duration::from_secs(60),
            loopback_probe_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            max_retries: 10,
            reconnect_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out")]
    Timeout,
    #[error("probe failed: {0}")]
    Failure(String),
}

#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("gave up reconnecting after {attempts} failed attempts, restart the process")]
    ReconnectExhausted { attempts: u32 },
}
