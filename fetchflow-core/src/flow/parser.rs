use super::component::FlowComponent;
use super::types::{ElementArity, FlowFuture};
use crate::FlowError;
use bytes::Bytes;

pub trait Parser: FlowComponent<Input = Bytes, Error = FlowError> + Send + Sync {
    fn parse(&self, payload: Self::Input) -> FlowFuture<'_, Self::Output, Self::Error>;
}

/// The parser family a factory wires into a network operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserSelection {
    Item,
    StrictCollection,
    PruningCollection,
}

impl ParserSelection {
    /// Pruning is only meaningful for collections; a single item never prunes.
    #[must_use]
    pub const fn select(arity: ElementArity, prune: bool) -> Self {
        match arity {
            ElementArity::Single => Self::Item,
            ElementArity::Collection if prune => Self::PruningCollection,
            ElementArity::Collection => Self::StrictCollection,
        }
    }
}
