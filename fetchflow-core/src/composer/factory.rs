use crate::{
    config::{FlowConfiguration, PersistenceConfiguration},
    flow::{
        component::Payload,
        connection::{Connection, Connector},
        definition::{FlowDefinition, LoadOperation, NetworkOperation, SaveOperation},
        parser::{Parser, ParserSelection},
        persistence::StoreProvider,
        types::{ElementArity, FlowFuture, Resource},
    },
    parse::{ItemParser, PruningCollectionParser, StrictCollectionParser},
    FlowError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, instrument};
use url::Url;

/// Builds [`FlowDefinition`]s from a connection (or an endpoint) and a configuration.
///
/// The factory owns two seams: a [`Connector`] that derives connections from
/// endpoints, and a [`StoreProvider`] that binds persistence handlers to
/// storage locations. Neither is touched until a flow needs it, and building
/// a flow never performs I/O.
///
/// Resource paths are resolved against the endpoint with [`Url::join`]
/// rules by the connection; see [`Resource::path`].
///
/// Whether `T` is one item or a collection is decided by the entry point:
/// the `item_*` methods always parse a single value, the `collection_*`
/// methods decode `Vec<T>` strictly or with pruning depending on
/// [`FlowConfiguration::prune`].
///
/// # Examples
///
/// ```ignore
/// let factory = FlowFactory::new(HttpConnector::default(), JsonFileStore::default());
/// let endpoint = Url::parse("https://api.example.com")?;
/// let flow = factory.item_flow_for_endpoint::<Item>(&endpoint, &FlowConfiguration::default());
/// let item = flow.network("/item/1").await?;
/// ```
pub struct FlowFactory<K, S> {
    connector: K,
    store: S,
}

impl<K, S> FlowFactory<K, S>
where
    K: Connector,
    S: StoreProvider,
{
    #[must_use]
    pub const fn new(connector: K, store: S) -> Self {
        Self { connector, store }
    }

    #[must_use]
    pub const fn connector(&self) -> &K {
        &self.connector
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the parser family for an element arity under a configuration.
    #[must_use]
    pub const fn parser_selection(
        arity: ElementArity,
        config: &FlowConfiguration,
    ) -> ParserSelection {
        ParserSelection::select(arity, config.prune)
    }

    /// Derives a connection for `endpoint`, checking reachability or not per `config`.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub fn connection_for(&self, endpoint: &Url, config: &FlowConfiguration) -> Arc<dyn Connection> {
        let mode = config.reachability();
        debug!(?mode, "Deriving connection");
        self.connector.connect(endpoint, mode)
    }

    /// A single-item flow over an existing connection.
    pub fn item_flow<T>(
        &self,
        connection: Arc<dyn Connection>,
        config: &FlowConfiguration,
    ) -> FlowDefinition<T>
    where
        T: Payload,
    {
        let selection = Self::parser_selection(ElementArity::Single, config);
        debug!(?selection, payload = std::any::type_name::<T>(), "Assembling item flow");
        self.assemble(connection, Arc::new(ItemParser::<T>::new()), config)
    }

    /// A collection flow over an existing connection.
    pub fn collection_flow<T>(
        &self,
        connection: Arc<dyn Connection>,
        config: &FlowConfiguration,
    ) -> FlowDefinition<Vec<T>>
    where
        T: Payload,
    {
        let selection = Self::parser_selection(ElementArity::Collection, config);
        debug!(?selection, payload = std::any::type_name::<T>(), "Assembling collection flow");
        let parser: Arc<dyn Parser<Output = Vec<T>>> = match selection {
            ParserSelection::PruningCollection => Arc::new(PruningCollectionParser::<T>::new()),
            // `select` never yields `Item` for a collection
            ParserSelection::StrictCollection | ParserSelection::Item => {
                Arc::new(StrictCollectionParser::<T>::new())
            }
        };
        self.assemble(connection, parser, config)
    }

    /// A single-item flow over a connection derived from `endpoint`.
    pub fn item_flow_for_endpoint<T>(
        &self,
        endpoint: &Url,
        config: &FlowConfiguration,
    ) -> FlowDefinition<T>
    where
        T: Payload,
    {
        self.item_flow(self.connection_for(endpoint, config), config)
    }

    /// A collection flow over a connection derived from `endpoint`.
    pub fn collection_flow_for_endpoint<T>(
        &self,
        endpoint: &Url,
        config: &FlowConfiguration,
    ) -> FlowDefinition<Vec<T>>
    where
        T: Payload,
    {
        self.collection_flow(self.connection_for(endpoint, config), config)
    }

    fn assemble<T>(
        &self,
        connection: Arc<dyn Connection>,
        parser: Arc<dyn Parser<Output = T>>,
        config: &FlowConfiguration,
    ) -> FlowDefinition<T>
    where
        T: Payload,
    {
        let network = network_operation(connection, parser);

        match &config.persistence {
            PersistenceConfiguration::Disabled => {
                debug!("Persistence disabled, using cache defaults");
                FlowDefinition::from_operations(network, None, None)
            }
            PersistenceConfiguration::Enabled(path) => {
                debug!(path = %path.display(), "Wiring persistence handler");
                let handler = self.store.handler::<T>(path);

                let loader = Arc::clone(&handler);
                let load: LoadOperation<T> = Arc::new(move || -> FlowFuture<'static, T> {
                    let handler = Arc::clone(&loader);
                    Box::pin(async move { handler.load().await })
                });

                let save: SaveOperation<T> = Arc::new(move |value: T| -> FlowFuture<'static, T> {
                    let handler = Arc::clone(&handler);
                    Box::pin(async move { handler.save(value).await })
                });

                FlowDefinition::from_operations(network, Some(load), Some(save))
            }
        }
    }
}

// Request through the connection, then hand only the payload to the parser.
// Calls are numbered per resource; a parse still running when a newer call
// for an equal resource starts is abandoned. Calls for other resources never
// interfere.
fn network_operation<T>(
    connection: Arc<dyn Connection>,
    parser: Arc<dyn Parser<Output = T>>,
) -> NetworkOperation<T>
where
    T: Payload,
{
    let registry: Arc<Generations> = Arc::default();

    Arc::new(move |resource: Resource| -> FlowFuture<'static, T> {
        let connection = Arc::clone(&connection);
        let parser = Arc::clone(&parser);
        let registry = Arc::clone(&registry);

        Box::pin(async move {
            let mut ticket = RequestTicket::issue(&registry, &resource);
            debug!(path = %resource.path, generation = ticket.generation, "Issuing network request");

            let response = connection.make_request(resource).await?;
            debug!(status = response.metadata.status, bytes = response.payload.len(), "Parsing payload");

            let generation = ticket.generation;
            tokio::select! {
                biased;
                () = superseded(&mut ticket.newer, generation) => {
                    debug!(generation, "Discarding superseded parse");
                    Err(FlowError::Superseded)
                }
                parsed = parser.parse(response.payload) => parsed,
            }
        })
    })
}

// Latest generation per resource with a call in flight
type Generations = Mutex<HashMap<Resource, Arc<watch::Sender<u64>>>>;

// One in-flight call. Dropping the latest ticket for a resource frees its slot.
struct RequestTicket {
    registry: Arc<Generations>,
    resource: Resource,
    latest: Arc<watch::Sender<u64>>,
    newer: watch::Receiver<u64>,
    generation: u64,
}

impl RequestTicket {
    fn issue(registry: &Arc<Generations>, resource: &Resource) -> Self {
        let mut slots = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = Arc::clone(
            slots
                .entry(resource.clone())
                .or_insert_with(|| Arc::new(watch::channel(0).0)),
        );

        let mut generation = 0;
        latest.send_modify(|current| {
            *current += 1;
            generation = *current;
        });
        let newer = latest.subscribe();

        Self {
            registry: Arc::clone(registry),
            resource: resource.clone(),
            latest,
            newer,
            generation,
        }
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        let mut slots = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let is_latest = slots.get(&self.resource).is_some_and(|latest| {
            Arc::ptr_eq(latest, &self.latest) && *latest.borrow() == self.generation
        });
        if is_latest {
            slots.remove(&self.resource);
        }
    }
}

// Resolves once a newer call than `generation` has started.
async fn superseded(newer: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *newer.borrow_and_update() != generation {
            return;
        }
        if newer.changed().await.is_err() {
            // The ticket keeps its sender alive, so this is unreachable in practice.
            std::future::pending::<()>().await;
        }
    }
}
