use super::decode_blocking;
use crate::flow::component::{FlowComponent, Payload};
use crate::flow::parser::Parser;
use crate::flow::types::FlowFuture;
use crate::FlowError;
use bytes::Bytes;
use std::marker::PhantomData;

/// Decodes a payload as exactly one `T`. Any malformation fails the parse.
pub struct ItemParser<T> {
    _phantom: PhantomData<T>,
}

impl<T> ItemParser<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for ItemParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FlowComponent for ItemParser<T>
where
    T: Payload,
{
    type Input = Bytes;
    type Output = T;
    type Error = FlowError;
}

impl<T> Parser for ItemParser<T>
where
    T: Payload,
{
    fn parse(&self, payload: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(decode_blocking(payload, |bytes| {
            serde_json::from_slice::<T>(&bytes).map_err(FlowError::from)
        }))
    }
}
