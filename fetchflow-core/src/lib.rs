//! Fetchflow Core
//!
//! Generic retrieval flows: a [`FlowDefinition`] bundles three deferred
//! operations (load from cache, fetch from network, save to cache), and a
//! [`FlowFactory`] wires them from a connection, a configuration and the
//! arity of the payload type. [`FlowRunner`] sequences the stages.

pub mod composer;
pub mod config;
pub mod error;
pub mod flow;
pub mod parse;

// Re-export main types for easier access
pub use composer::{
    CachePolicy, FlowFactory, FlowRunner, Freshness, Origin, Retrieval, Stage, StageOutcome,
    StageReport,
};
pub use config::{ConfigError, FlowConfiguration, PersistenceConfiguration};
pub use error::{ErrorKind, FlowError, Result};
pub use flow::component::{FlowComponent, Payload};
pub use flow::connection::{Connection, Connector, ReachabilityMode, ReachabilityProbe};
pub use flow::definition::{FlowDefinition, LoadOperation, NetworkOperation, SaveOperation};
pub use flow::parser::{Parser, ParserSelection};
pub use flow::persistence::{Persistence, StoreProvider};
pub use flow::types::{ElementArity, FlowFuture, RawResponse, Resource, ResponseMetadata};
