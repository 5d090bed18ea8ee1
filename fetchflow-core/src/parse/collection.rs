use super::decode_blocking;
use crate::flow::component::{FlowComponent, Payload};
use crate::flow::parser::Parser;
use crate::flow::types::FlowFuture;
use crate::{FlowError, Result};
use bytes::Bytes;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, warn};

// The container itself must be readable; elements are decoded one by one.
fn split_elements(bytes: &[u8]) -> Result<Vec<Value>> {
    serde_json::from_slice::<Vec<Value>>(bytes)
        .map_err(|e| FlowError::Parse(format!("payload is not a JSON array: {e}")))
}

/// All-or-nothing collection decoding: the first bad element fails the parse.
pub struct StrictCollectionParser<T> {
    _phantom: PhantomData<T>,
}

impl<T> StrictCollectionParser<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for StrictCollectionParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FlowComponent for StrictCollectionParser<T>
where
    T: Payload,
{
    type Input = Bytes;
    type Output = Vec<T>;
    type Error = FlowError;
}

impl<T> Parser for StrictCollectionParser<T>
where
    T: Payload,
{
    fn parse(&self, payload: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(decode_blocking(payload, |bytes| {
            split_elements(&bytes)?
                .into_iter()
                .enumerate()
                .map(|(index, element)| {
                    serde_json::from_value::<T>(element)
                        .map_err(|e| FlowError::Parse(format!("element {index}: {e}")))
                })
                .collect::<Result<Vec<T>>>()
        }))
    }
}

/// Best-effort collection decoding.
///
/// Elements that fail to decode are dropped and logged; the parse succeeds
/// with whatever remains, possibly nothing. Only a payload that is not an
/// array at all is an error.
pub struct PruningCollectionParser<T> {
    _phantom: PhantomData<T>,
}

impl<T> PruningCollectionParser<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for PruningCollectionParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FlowComponent for PruningCollectionParser<T>
where
    T: Payload,
{
    type Input = Bytes;
    type Output = Vec<T>;
    type Error = FlowError;
}

impl<T> Parser for PruningCollectionParser<T>
where
    T: Payload,
{
    fn parse(&self, payload: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(decode_blocking(payload, |bytes| {
            let elements = split_elements(&bytes)?;
            let total = elements.len();
            let kept: Vec<T> = elements
                .into_iter()
                .enumerate()
                .filter_map(|(index, element)| match serde_json::from_value::<T>(element) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!(index, error = %e, "Dropping malformed element");
                        None
                    }
                })
                .collect();
            debug!(kept = kept.len(), dropped = total - kept.len(), "Pruned collection");
            Ok(kept)
        }))
    }
}
