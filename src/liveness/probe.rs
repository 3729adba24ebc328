use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;

use super::ProbeError;
use crate::gateway::{ConnectionStatus, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSource {
    /// Periodic read of the gateway connection status.
    Gateway,
    /// Periodic HTTP request to our own keep-alive server.
    Loopback,
    /// Connection stage changes pushed by the platform client.
    Events,
}

impl ProbeSource {
    pub fn observes_gateway(self) -> bool {
        matches!(self, ProbeSource::Gateway | ProbeSource::Events)
    }
}

impl fmt::Display for ProbeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeSource::Gateway => write!(f, "gateway"),
            ProbeSource::Loopback => write!(f, "loopback"),
            ProbeSource::Events => write!(f, "event"),
        }
    }
}

#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;
}

pub struct GatewayProbe {
    session: Arc<dyn Session>,
}

impl GatewayProbe {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Probe for GatewayProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        match self.session.connection_status().await {
            ConnectionStatus::Ready => Ok(()),
            status => Err(ProbeError::Failure(format!("gateway is {status:?}"))),
        }
    }
}

/// Requests our own keep-alive route over HTTP.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Failure(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout
            } else {
                ProbeError::Failure(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Failure(format!("{} answered {status}", self.url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeSession;

    #[tokio::test]
    async fn gateway_probe_follows_the_connection_status() {
        let session = Arc::new(FakeSession::new(ConnectionStatus::Ready));
        let probe = GatewayProbe::new(session.clone());
        assert!(probe.check().await.is_ok());

        session.set_status(ConnectionStatus::Connecting);
        assert!(matches!(probe.check().await, Err(ProbeError::Failure(_))));
    }

    #[tokio::test]
    async fn http_probe_hits_the_keep_alive_route() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, crate::http::router()).await });

        let probe = HttpProbe::new(url, Duration::from_secs(5)).unwrap();
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn http_probe_fails_when_nothing_listens() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let probe = HttpProbe::new(url, Duration::from_secs(5)).unwrap();
        assert!(probe.check().await.is_err());
    }
}
