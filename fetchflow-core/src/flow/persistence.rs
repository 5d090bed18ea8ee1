use super::component::{FlowComponent, Payload};
use super::types::FlowFuture;
use crate::FlowError;
use std::path::Path;
use std::sync::Arc;

/// Reads and writes one cached value at a storage location.
///
/// `save` resolves to the value it was given so it can be chained after a
/// network stage without cloning.
pub trait Persistence: FlowComponent<Input = (), Error = FlowError> + Send + Sync {
    fn load(&self) -> FlowFuture<'_, Self::Output, Self::Error>;

    fn save(&self, value: Self::Output) -> FlowFuture<'_, Self::Output, Self::Error>;
}

/// Binds persistence handlers to a location and a payload type.
pub trait StoreProvider: Send + Sync {
    fn handler<T>(&self, location: &Path) -> Arc<dyn Persistence<Output = T>>
    where
        T: Payload;
}

impl<S> StoreProvider for Arc<S>
where
    S: StoreProvider,
{
    fn handler<T>(&self, location: &Path) -> Arc<dyn Persistence<Output = T>>
    where
        T: Payload,
    {
        (**self).handler(location)
    }
}
