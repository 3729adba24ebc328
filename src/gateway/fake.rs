use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use super::{Announcement, ConnectionStatus, Gateway, GatewayError, MessageHandle, Session};

/// Records everything the core asks of the platform.
#[derive(Default)]
pub struct FakeGateway {
    next_id: AtomicU64,
    pub posted: Mutex<Vec<(MessageHandle, Announcement)>>,
    pub reactions: Mutex<Vec<(MessageHandle, String)>>,
    counts: Mutex<HashMap<MessageHandle, HashMap<String, u64>>>,
    reactions_fail: AtomicBool,
}

impl FakeGateway {
    pub fn set_counts(&self, anchor: MessageHandle, counts: &[(&str, u64)]) {
        let counts = counts
            .iter()
            .map(|(symbol, count)| ((*symbol).to_owned(), *count))
            .collect();
        self.counts.lock().unwrap().insert(anchor, counts);
    }

    pub fn fail_reactions(&self) {
        self.reactions_fail.store(true, Ordering::SeqCst);
    }

    /// Simulates the anchor message being deleted.
    pub fn delete(&self, anchor: MessageHandle) {
        self.counts.lock().unwrap().remove(&anchor);
    }

    pub fn posted_count(&self) -> usize {
        self.posted.lock().unwrap().len()
    }

    pub fn symbols_on(&self, anchor: MessageHandle) -> Vec<String> {
        self.reactions
            .lock()
            .unwrap()
            .iter()
            .filter(|(handle, _)| *handle == anchor)
            .map(|(_, symbol)| symbol.clone())
            .collect()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn post_message(
        &self,
        channel: u64,
        announcement: &Announcement,
    ) -> Result<MessageHandle, GatewayError> {
        let handle = MessageHandle {
            channel,
            message: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.posted
            .lock()
            .unwrap()
            .push((handle, announcement.clone()));
        self.counts.lock().unwrap().insert(handle, HashMap::new());
        Ok(handle)
    }

    async fn add_reaction(&self, anchor: MessageHandle, symbol: &str) -> Result<(), GatewayError> {
        if self.reactions_fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("missing permissions".to_owned()));
        }
        self.reactions
            .lock()
            .unwrap()
            .push((anchor, symbol.to_owned()));
        Ok(())
    }

    async fn reaction_counts(
        &self,
        anchor: MessageHandle,
    ) -> Result<HashMap<String, u64>, GatewayError> {
        self.counts
            .lock()
            .unwrap()
            .get(&anchor)
            .cloned()
            .ok_or(GatewayError::NotFound)
    }
}

/// A session whose status and reconnect outcomes are scripted by the test.
pub struct FakeSession {
    status: Mutex<ConnectionStatus>,
    outcomes: Mutex<VecDeque<bool>>,
    pub reconnects: AtomicUsize,
}

impl FakeSession {
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            outcomes: Mutex::new(VecDeque::new()),
            reconnects: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn script_reconnects(&self, outcomes: &[bool]) {
        self.outcomes.lock().unwrap().extend(outcomes);
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn connection_status(&self) -> ConnectionStatus {
        *self.status.lock().unwrap()
    }

    async fn reconnect(&self) -> Result<(), GatewayError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        let succeeded = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(false);
        if succeeded {
            self.set_status(ConnectionStatus::Ready);
            Ok(())
        } else {
            Err(GatewayError::Request("scripted failure".to_owned()))
        }
    }
}
