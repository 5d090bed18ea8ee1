//! Fetchflow Sources
//!
//! HTTP implementations of the fetchflow-core connection seams: an
//! [`HttpConnection`] that issues GET requests against an endpoint, a
//! [`TcpProbe`] for live reachability checks, and an [`HttpConnector`] that
//! derives connections from endpoints for a `FlowFactory`.

#![warn(missing_docs)]

pub mod error;
pub mod http;

pub use error::{Result, SourceError};
pub use http::probe::TcpProbe;
pub use http::{HttpConfig, HttpConnection, HttpConnector};
