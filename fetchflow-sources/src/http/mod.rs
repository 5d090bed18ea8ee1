//! HTTP connection implementations

pub mod probe;

use crate::error::{Result, SourceError};
use fetchflow_core::{
    flow::types::FlowFuture, Connection, Connector, FlowComponent, FlowError, RawResponse,
    ReachabilityMode, ReachabilityProbe, Resource, ResponseMetadata,
};
use probe::TcpProbe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Configuration for HTTP connections
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Total time allowed for one request
    pub timeout: Duration,
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Time allowed for a reachability probe to connect
    pub probe_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("fetchflow/{}", env!("CARGO_PKG_VERSION")),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

impl HttpConfig {
    /// Builds a `reqwest` client honouring this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Client`] if the TLS backend cannot be initialised.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))
    }
}

/// A connection that issues GET requests for resources below an endpoint.
///
/// Resource paths are joined onto the endpoint with [`Url::join`], so an
/// absolute path like `/item/1` replaces the endpoint's own path. To keep a
/// prefix such as `https://host/v1/`, end the endpoint with `/` and pass a
/// relative path (`item/1`).
pub struct HttpConnection {
    client: reqwest::Client,
    endpoint: Url,
    mode: ReachabilityMode,
    probe: Arc<dyn ReachabilityProbe>,
    bearer_token: Option<String>,
}

impl HttpConnection {
    /// Create a connection with the default [`HttpConfig`]
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoint: Url, mode: ReachabilityMode) -> Result<Self> {
        Self::with_config(endpoint, mode, &HttpConfig::default())
    }

    /// Create a connection with its own client built from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_config(endpoint: Url, mode: ReachabilityMode, config: &HttpConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self::from_client(client, endpoint, mode, config.probe_timeout))
    }

    /// Create a connection sharing an existing client
    #[must_use]
    pub fn from_client(
        client: reqwest::Client,
        endpoint: Url,
        mode: ReachabilityMode,
        probe_timeout: Duration,
    ) -> Self {
        let probe = Arc::new(TcpProbe::for_endpoint(&endpoint, probe_timeout));
        Self {
            client,
            endpoint,
            mode,
            probe,
            bearer_token: None,
        }
    }

    /// Replace the reachability probe
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// The endpoint resources are resolved against
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether requests are preceded by a reachability probe
    #[must_use]
    pub const fn mode(&self) -> ReachabilityMode {
        self.mode
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint, path = %resource.path))]
    async fn send(&self, resource: Resource) -> Result<RawResponse> {
        let url = self.endpoint.join(&resource.path)?;
        let mut request = self.client.get(url);

        if !resource.query.is_empty() {
            request = request.query(&resource.query);
        }
        for (name, value) in &resource.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let url = response.url().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Request returned non-success status");
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = payload.len(), "Received response");

        Ok(RawResponse::new(
            payload,
            ResponseMetadata {
                status: status.as_u16(),
                headers,
                url: Some(url),
            },
        ))
    }
}

impl FlowComponent for HttpConnection {
    type Input = Resource;
    type Output = RawResponse;
    type Error = FlowError;
}

impl Connection for HttpConnection {
    fn make_request(&self, resource: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(async move {
            if self.mode == ReachabilityMode::Live && !self.probe.is_reachable().await? {
                warn!(endpoint = %self.endpoint, "Endpoint unreachable, request not sent");
                return Err(SourceError::Unreachable(self.endpoint.to_string()).into());
            }

            self.send(resource).await.map_err(FlowError::from)
        })
    }
}

/// Derives [`HttpConnection`]s that share one client.
#[derive(Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    probe_timeout: Duration,
    bearer_token: Option<String>,
}

impl HttpConnector {
    /// Create a connector from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
            probe_timeout: config.probe_timeout,
            bearer_token: None,
        })
    }

    /// Authenticate every derived connection with a bearer token
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl Connector for HttpConnector {
    fn connect(&self, endpoint: &Url, mode: ReachabilityMode) -> Arc<dyn Connection> {
        debug!(endpoint = %endpoint, ?mode, "Creating HTTP connection");
        let connection =
            HttpConnection::from_client(self.client.clone(), endpoint.clone(), mode, self.probe_timeout);
        match &self.bearer_token {
            Some(token) => Arc::new(connection.with_bearer_token(token.clone())),
            None => Arc::new(connection),
        }
    }
}
