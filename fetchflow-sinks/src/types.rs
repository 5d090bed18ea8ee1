//! Configuration for file-backed stores

use serde::{Deserialize, Serialize};

/// Configuration for [`JsonFileStore`](crate::JsonFileStore)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Write indented JSON instead of a single line
    pub pretty: bool,
}
