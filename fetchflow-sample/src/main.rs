use fetchflow_core::{FlowConfiguration, FlowFactory, FlowRunner, Origin, Resource, StageOutcome};
use fetchflow_sinks::{FileStoreConfig, JsonFileStore};
use fetchflow_sources::{HttpConfig, HttpConnector};
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/";
const DEFAULT_RESOURCE: &str = "/todos";

// The payload we fetch; unknown fields are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Todo {
    user_id: u32,
    id: u32,
    title: String,
    completed: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fetchflow_core=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {e}");
    }
    init_tracing();

    let config = FlowConfiguration::from_env()?;
    let endpoint = Url::parse(
        &std::env::var("FETCHFLOW_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
    )?;
    let resource =
        std::env::var("FETCHFLOW_RESOURCE").unwrap_or_else(|_| DEFAULT_RESOURCE.to_string());
    info!(%endpoint, %resource, ?config, "Starting retrieval");

    let mut connector = HttpConnector::new(&HttpConfig::default())?;
    if let Ok(token) = std::env::var("FETCHFLOW_BEARER_TOKEN") {
        connector = connector.with_bearer_token(token);
    }
    let factory = FlowFactory::new(connector, JsonFileStore::new(FileStoreConfig { pretty: true }));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (feedback_tx, feedback_rx) = flume::unbounded();

        let flow = factory.collection_flow_for_endpoint::<Todo>(&endpoint, &config);
        let runner = FlowRunner::new(flow).with_feedback(feedback_tx);

        // Report stage outcomes as they arrive
        let reporter = tokio::spawn(async move {
            while let Ok(report) = feedback_rx.recv_async().await {
                match report.outcome {
                    StageOutcome::Failed(e) => warn!(stage = ?report.stage, error = %e, "Stage failed"),
                    outcome => info!(stage = ?report.stage, ?outcome, "Stage finished"),
                }
            }
        });

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(());
            }
        });

        let result = runner.retrieve(Resource::new(resource), Some(shutdown_rx)).await;
        drop(runner);
        let _ = reporter.await;

        match result {
            Ok(retrieval) => {
                let source = match retrieval.origin {
                    Origin::Cache => "cache",
                    Origin::Network => "network",
                };
                info!(count = retrieval.value.len(), source, "Retrieved todos");
                for todo in retrieval.value.iter().take(5) {
                    info!(id = todo.id, user = todo.user_id, done = todo.completed, "{}", todo.title);
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Retrieval failed");
                Err(Box::new(e) as Box<dyn Error>)
            }
        }
    })
}
