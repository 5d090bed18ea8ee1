use serde::{de::DeserializeOwned, Serialize};
use std::error::Error;

/// Common shape of every collaborator plugged into a flow.
pub trait FlowComponent {
    type Input;
    type Output;
    type Error: Error + Send + Sync + 'static;
}

/// A value a flow can decode from the network and round-trip through a cache.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}
