use super::component::FlowComponent;
use super::types::{FlowFuture, RawResponse, Resource};
use crate::FlowError;
use std::sync::Arc;
use url::Url;

/// Issues requests for resources against a fixed endpoint.
pub trait Connection:
    FlowComponent<Input = Resource, Output = RawResponse, Error = FlowError> + Send + Sync
{
    fn make_request(&self, resource: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error>;
}

/// Pre-flight test of network availability.
pub trait ReachabilityProbe: Send + Sync {
    fn is_reachable(&self) -> FlowFuture<'_, bool>;
}

/// How a derived connection treats reachability. There is no partial mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityMode {
    /// Skip the check entirely.
    AlwaysReachable,
    /// Probe before every request.
    Live,
}

impl ReachabilityMode {
    #[must_use]
    pub const fn from_check(check_reachability: bool) -> Self {
        if check_reachability {
            Self::Live
        } else {
            Self::AlwaysReachable
        }
    }
}

/// Derives a connection from a base endpoint.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Url, mode: ReachabilityMode) -> Arc<dyn Connection>;
}

impl<C> Connector for Arc<C>
where
    C: Connector + ?Sized,
{
    fn connect(&self, endpoint: &Url, mode: ReachabilityMode) -> Arc<dyn Connection> {
        (**self).connect(endpoint, mode)
    }
}
