use thiserror::Error;

/// Error type shared by every stage of a flow.
///
/// Variants are grouped into coarse [`ErrorKind`]s so an orchestrator can
/// decide what to do without matching on transport or storage details.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// No persistence handler is wired; the caller should fall through to network.
    #[error("Persistence bailout: no cache configured")]
    PersistenceBailout,

    /// A persistence handler is wired but holds no value yet.
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    /// The storage location is unreadable, unwritable or holds corrupt data.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The request could not be carried out by the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reachability check reported the network as unavailable.
    #[error("Network unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A newer network call on the same flow started before this parse finished.
    #[error("Superseded by a newer request")]
    Superseded,

    /// The retrieval was cancelled by a shutdown signal.
    #[error("Retrieval cancelled")]
    Cancelled,
}

/// Coarse classification of [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PersistenceBailout,
    Persistence,
    Transport,
    Parse,
    Cancelled,
}

impl FlowError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PersistenceBailout => ErrorKind::PersistenceBailout,
            Self::CacheMiss(_) | Self::Persistence(_) => ErrorKind::Persistence,
            Self::Transport(_) | Self::Unreachable(_) | Self::Status { .. } => {
                ErrorKind::Transport
            }
            Self::Parse(_) => ErrorKind::Parse,
            Self::Superseded | Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True when a failed cache load should fall through to the network stage.
    #[must_use]
    pub const fn is_cache_fallthrough(&self) -> bool {
        matches!(self, Self::PersistenceBailout | Self::CacheMiss(_))
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
