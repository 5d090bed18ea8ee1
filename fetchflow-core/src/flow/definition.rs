use super::types::{FlowFuture, Resource};
use crate::FlowError;
use std::fmt;
use std::sync::Arc;

pub type NetworkOperation<T> = Arc<dyn Fn(Resource) -> FlowFuture<'static, T> + Send + Sync>;
pub type LoadOperation<T> = Arc<dyn Fn() -> FlowFuture<'static, T> + Send + Sync>;
pub type SaveOperation<T> = Arc<dyn Fn(T) -> FlowFuture<'static, T> + Send + Sync>;

/// One resource-retrieval pipeline expressed as three deferred operations.
///
/// Only the network operation is mandatory. Without a cache the load stage
/// fails with [`FlowError::PersistenceBailout`] and the save stage hands its
/// input back unchanged, so a definition built from a network operation alone
/// behaves as "always fetch, persist nothing".
///
/// Nothing runs at construction. Each accessor returns a fresh future, and an
/// orchestrator decides whether and when to await it.
///
/// A definition is immutable. The `with_*` methods derive a new definition in
/// which the untouched stages are the very same `Arc` instances.
///
/// # Examples
///
/// ```
/// use fetchflow_core::{FlowDefinition, FlowError, Resource};
///
/// #[tokio::main]
/// async fn main() {
///     let flow = FlowDefinition::<usize>::new(|resource: Resource| {
///         Box::pin(async move { Ok(resource.path.len()) })
///     });
///
///     assert_eq!(flow.network(Resource::new("/abc")).await, Ok(4));
///     assert_eq!(flow.load_from_cache().await, Err(FlowError::PersistenceBailout));
///     assert_eq!(flow.save_to_cache(7).await, Ok(7));
/// }
/// ```
pub struct FlowDefinition<T> {
    network: NetworkOperation<T>,
    load_from_cache: LoadOperation<T>,
    save_to_cache: SaveOperation<T>,
}

impl<T> FlowDefinition<T>
where
    T: Send + 'static,
{
    /// Creates a definition from a network operation, accepting both cache defaults.
    #[must_use]
    pub fn new<N>(network: N) -> Self
    where
        N: Fn(Resource) -> FlowFuture<'static, T> + Send + Sync + 'static,
    {
        Self::from_operations(Arc::new(network), None, None)
    }

    /// Creates a definition from explicit operations.
    ///
    /// `None` selects [`Self::bailout_load`] or [`Self::passthrough_save`].
    #[must_use]
    pub fn from_operations(
        network: NetworkOperation<T>,
        load_from_cache: Option<LoadOperation<T>>,
        save_to_cache: Option<SaveOperation<T>>,
    ) -> Self {
        Self {
            network,
            load_from_cache: load_from_cache.unwrap_or_else(Self::bailout_load),
            save_to_cache: save_to_cache.unwrap_or_else(Self::passthrough_save),
        }
    }

    /// The load strategy used when no persistence handler is wired.
    #[must_use]
    pub fn bailout_load() -> LoadOperation<T> {
        Arc::new(|| -> FlowFuture<'static, T> {
            Box::pin(async { Err(FlowError::PersistenceBailout) })
        })
    }

    /// The save strategy used when no persistence handler is wired.
    #[must_use]
    pub fn passthrough_save() -> SaveOperation<T> {
        Arc::new(|value: T| -> FlowFuture<'static, T> { Box::pin(async move { Ok(value) }) })
    }

    #[must_use]
    pub fn with_network(&self, network: NetworkOperation<T>) -> Self {
        Self {
            network,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_load_from_cache(&self, load_from_cache: LoadOperation<T>) -> Self {
        Self {
            load_from_cache,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_save_to_cache(&self, save_to_cache: SaveOperation<T>) -> Self {
        Self {
            save_to_cache,
            ..self.clone()
        }
    }

    pub fn network(&self, resource: impl Into<Resource>) -> FlowFuture<'static, T> {
        (self.network)(resource.into())
    }

    pub fn load_from_cache(&self) -> FlowFuture<'static, T> {
        (self.load_from_cache)()
    }

    pub fn save_to_cache(&self, value: T) -> FlowFuture<'static, T> {
        (self.save_to_cache)(value)
    }

    #[must_use]
    pub fn shares_network_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.network, &other.network)
    }

    #[must_use]
    pub fn shares_load_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.load_from_cache, &other.load_from_cache)
    }

    #[must_use]
    pub fn shares_save_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.save_to_cache, &other.save_to_cache)
    }
}

impl<T> Clone for FlowDefinition<T> {
    fn clone(&self) -> Self {
        Self {
            network: Arc::clone(&self.network),
            load_from_cache: Arc::clone(&self.load_from_cache),
            save_to_cache: Arc::clone(&self.save_to_cache),
        }
    }
}

impl<T> fmt::Debug for FlowDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("payload", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
