//! JSON parsers for single-item and collection flows.

mod collection;
mod item;

pub use self::collection::{PruningCollectionParser, StrictCollectionParser};
pub use self::item::ItemParser;

use crate::{FlowError, Result};
use bytes::Bytes;

// Decoding is CPU-bound; keep it off the async worker threads.
async fn decode_blocking<T, F>(payload: Bytes, decode: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Bytes) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode(payload))
        .await
        .map_err(|e| FlowError::Parse(format!("decoder task failed: {e}")))?
}
