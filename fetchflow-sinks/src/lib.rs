//! Fetchflow Sinks
//!
//! Persistence handlers that back the cache stages of fetchflow-core flows.
//! [`JsonFileStore`] binds a [`JsonFilePersistence`] to each configured
//! storage location; every handler keeps one JSON document in one file.

#![warn(missing_docs)]

pub mod error;
pub mod file;
pub mod types;

pub use error::{Result, StoreError};
pub use file::{JsonFilePersistence, JsonFileStore};
pub use types::FileStoreConfig;
