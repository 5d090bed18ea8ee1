use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::FlowError;

// For every stage operation
pub type FlowFuture<'a, T, E = FlowError> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Describes what to fetch, relative to a connection's endpoint.
///
/// Two descriptors are the same resource when path, query and headers are
/// all equal; a network call only supersedes in-flight calls for the same
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Resource {
    /// Path resolved against the endpoint with URL reference rules.
    ///
    /// A leading `/` makes it absolute and replaces any path prefix of the
    /// endpoint (`https://host/v1/` + `/item/1` is `https://host/item/1`).
    /// Use a relative path (`item/1`) to keep the prefix; the endpoint then
    /// needs a trailing `/`.
    pub path: String,
    /// Query parameters, in insertion order
    pub query: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl Resource {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl From<&str> for Resource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Resource {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// Transport metadata that accompanies a payload but never reaches a parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMetadata {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub url: Option<String>,
}

/// A successful transport response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub payload: Bytes,
    pub metadata: ResponseMetadata,
}

impl RawResponse {
    #[must_use]
    pub fn new(payload: impl Into<Bytes>, metadata: ResponseMetadata) -> Self {
        Self {
            payload: payload.into(),
            metadata,
        }
    }
}

/// Whether a flow decodes one value or a homogeneous sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementArity {
    Single,
    Collection,
}
