//! TCP reachability probe

use fetchflow_core::{flow::types::FlowFuture, ReachabilityProbe};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// Considers an endpoint reachable when a TCP connection to its host and
/// port opens within the timeout.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: Option<(String, u16)>,
    timeout: Duration,
}

impl TcpProbe {
    /// Aims the probe at the host and port (or the scheme's default port) of `endpoint`.
    ///
    /// An endpoint without a host is never reachable.
    #[must_use]
    pub fn for_endpoint(endpoint: &Url, timeout: Duration) -> Self {
        let address = endpoint
            .host_str()
            .zip(endpoint.port_or_known_default())
            .map(|(host, port)| (host.to_string(), port));
        Self { address, timeout }
    }

    /// Aims the probe at an explicit `host:port`.
    #[must_use]
    pub fn for_address(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            address: Some((host.into(), port)),
            timeout,
        }
    }
}

impl ReachabilityProbe for TcpProbe {
    fn is_reachable(&self) -> FlowFuture<'_, bool> {
        Box::pin(async move {
            let Some((host, port)) = &self.address else {
                return Ok(false);
            };

            let reachable = matches!(
                tokio::time::timeout(self.timeout, TcpStream::connect((host.as_str(), *port))).await,
                Ok(Ok(_))
            );
            debug!(host = %host, port = *port, reachable, "Probed endpoint");
            Ok(reachable)
        })
    }
}
