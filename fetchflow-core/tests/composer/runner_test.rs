use crate::helpers::{factory_with, init_tracing, Item, StubConnection};
use fetchflow_core::{
    flow::types::FlowFuture, CachePolicy, FlowConfiguration, FlowError, FlowRunner, LoadOperation,
    NetworkOperation, Origin, Resource, SaveOperation, Stage, StageOutcome, StageReport,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[cfg(test)]
mod runner_tests {
    use super::*;

    const WIDGET: &str = r#"{"id": 1, "name": "widget"}"#;

    fn cached_flow(
        connection: &Arc<StubConnection>,
        location: &str,
        cached: Option<Item>,
    ) -> fetchflow_core::FlowDefinition<Item> {
        let (factory, store) = factory_with(connection.clone());
        if let Some(item) = cached {
            store.seed(location, &item);
        }
        let config = FlowConfiguration::default().with_persistence(location);
        factory.item_flow::<Item>(connection.clone(), &config)
    }

    fn drain(feedback: &flume::Receiver<StageReport>) -> Vec<StageReport> {
        feedback.try_iter().collect()
    }

    #[tokio::test]
    async fn it_should_serve_fresh_cache_without_touching_network() {
        // Given
        init_tracing();
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let flow = cached_flow(&connection, "/tmp/hit.json", Some(Item::new(1, "cached")));
        let runner = FlowRunner::new(flow);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();

        // Then
        assert_eq!(result.value, Item::new(1, "cached"));
        assert_eq!(result.origin, Origin::Cache);
        assert_eq!(connection.calls(), 0);
    }

    #[tokio::test]
    async fn it_should_fall_through_to_network_when_persistence_is_disabled() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let (factory, _) = factory_with(connection.clone());
        let flow = factory.item_flow::<Item>(connection.clone(), &FlowConfiguration::default());
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(flow).with_feedback(tx);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();

        // Then
        assert_eq!(result.value, Item::new(1, "widget"));
        assert_eq!(result.origin, Origin::Network);
        assert_eq!(
            drain(&rx),
            vec![
                StageReport {
                    stage: Stage::LoadFromCache,
                    outcome: StageOutcome::Failed(FlowError::PersistenceBailout),
                },
                StageReport {
                    stage: Stage::Network,
                    outcome: StageOutcome::Succeeded,
                },
                StageReport {
                    stage: Stage::SaveToCache,
                    outcome: StageOutcome::Succeeded,
                },
            ]
        );
    }

    #[tokio::test]
    async fn it_should_fetch_and_save_on_cache_miss() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let (factory, store) = factory_with(connection.clone());
        let config = FlowConfiguration::default().with_persistence("/tmp/miss.json");
        let runner = FlowRunner::new(factory.item_flow::<Item>(connection.clone(), &config));

        // When
        let first = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();
        let second = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();

        // Then
        assert_eq!(first.origin, Origin::Network);
        assert_eq!(second.origin, Origin::Cache);
        assert_eq!(connection.calls(), 1);
        assert!(store.stored("/tmp/miss.json").is_some());
    }

    #[tokio::test]
    async fn it_should_refetch_when_cached_value_is_stale() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let flow = cached_flow(&connection, "/tmp/stale.json", Some(Item::new(0, "old")));
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(flow)
            .with_freshness(|item: &Item| item.id > 0)
            .with_feedback(tx);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();

        // Then
        assert_eq!(result.value, Item::new(1, "widget"));
        assert_eq!(result.origin, Origin::Network);
        assert_eq!(drain(&rx)[0].outcome, StageOutcome::Stale);
    }

    #[tokio::test]
    async fn it_should_fail_retrieval_on_persistence_error() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let (factory, _) = factory_with(connection.clone());
        let load: LoadOperation<Item> = Arc::new(|| -> FlowFuture<'static, Item> {
            Box::pin(async { Err(FlowError::Persistence("corrupt cache".into())) })
        });
        let flow = factory
            .item_flow::<Item>(connection.clone(), &FlowConfiguration::default())
            .with_load_from_cache(load);
        let runner = FlowRunner::new(flow);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await;

        // Then
        assert_eq!(result, Err(FlowError::Persistence("corrupt cache".into())));
        assert_eq!(connection.calls(), 0);
    }

    #[tokio::test]
    async fn it_should_skip_load_stage_when_network_only() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let flow = cached_flow(&connection, "/tmp/network-only.json", Some(Item::new(9, "cached")));
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(flow)
            .with_policy(CachePolicy::NetworkOnly)
            .with_feedback(tx);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await.unwrap();

        // Then
        assert_eq!(result.value, Item::new(1, "widget"));
        assert_eq!(connection.calls(), 1);
        let stages: Vec<Stage> = drain(&rx).into_iter().map(|r| r.stage).collect();
        assert_eq!(stages, vec![Stage::Network, Stage::SaveToCache]);
    }

    #[tokio::test]
    async fn it_should_report_network_failure_and_skip_save() {
        // Given
        let connection = Arc::new(StubConnection::failing(FlowError::Unreachable(
            "api.example.com".into(),
        )));
        let saves = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&saves);
        let save: SaveOperation<Item> = Arc::new(move |value: Item| -> FlowFuture<'static, Item> {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(value) })
        });
        let (factory, _) = factory_with(connection.clone());
        let flow = factory
            .item_flow::<Item>(connection, &FlowConfiguration::default())
            .with_save_to_cache(save);
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(flow).with_feedback(tx);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await;

        // Then
        assert_eq!(result, Err(FlowError::Unreachable("api.example.com".into())));
        assert_eq!(saves.load(Ordering::SeqCst), 0);
        let last = drain(&rx).pop().unwrap();
        assert_eq!(last.stage, Stage::Network);
        assert!(matches!(last.outcome, StageOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn it_should_cancel_active_stage_on_shutdown() {
        // Given
        let connection = Arc::new(
            StubConnection::ok(WIDGET).with_delay("/item/1", Duration::from_millis(500)),
        );
        let (factory, store) = factory_with(connection.clone());
        let config = FlowConfiguration::default().with_persistence("/tmp/cancelled.json");
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(factory.item_flow::<Item>(connection, &config)).with_feedback(tx);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // When
        let handle = tokio::spawn(async move {
            runner
                .retrieve(Resource::new("/item/1"), Some(shutdown_rx))
                .await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        let result = handle.await.unwrap();

        // Then
        assert_eq!(result, Err(FlowError::Cancelled));
        assert!(store.stored("/tmp/cancelled.json").is_none());
        let last = drain(&rx).pop().unwrap();
        assert_eq!(
            last,
            StageReport {
                stage: Stage::Network,
                outcome: StageOutcome::Cancelled,
            }
        );
    }

    #[tokio::test]
    async fn it_should_keep_running_when_shutdown_channel_closes() {
        // Given
        let connection = Arc::new(
            StubConnection::ok(WIDGET).with_delay("/item/1", Duration::from_millis(50)),
        );
        let (factory, _) = factory_with(connection.clone());
        let runner = FlowRunner::new(
            factory.item_flow::<Item>(connection, &FlowConfiguration::default()),
        );
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

        // When
        drop(shutdown_tx);
        let result = runner
            .retrieve(Resource::new("/item/1"), Some(shutdown_rx))
            .await;

        // Then
        assert_eq!(result.map(|r| r.value), Ok(Item::new(1, "widget")));
    }

    #[tokio::test]
    async fn it_should_report_superseded_network_stage_as_cancelled() {
        // Given
        let connection = Arc::new(StubConnection::ok(WIDGET));
        let (factory, _) = factory_with(connection.clone());
        let network: NetworkOperation<Item> =
            Arc::new(|_resource: Resource| -> FlowFuture<'static, Item> {
                Box::pin(async { Err(FlowError::Superseded) })
            });
        let flow = factory
            .item_flow::<Item>(connection, &FlowConfiguration::default())
            .with_network(network);
        let (tx, rx) = flume::unbounded();
        let runner = FlowRunner::new(flow).with_feedback(tx);

        // When
        let result = runner.retrieve(Resource::new("/item/1"), None).await;

        // Then
        assert_eq!(result, Err(FlowError::Superseded));
        assert_eq!(
            drain(&rx).pop().unwrap(),
            StageReport {
                stage: Stage::Network,
                outcome: StageOutcome::Cancelled,
            }
        );
    }

    #[tokio::test]
    async fn it_should_keep_concurrent_retrievals_of_different_resources_apart() {
        // Given
        let connection = Arc::new(
            StubConnection::ok(WIDGET).with_delay("/item/a", Duration::from_millis(100)),
        );
        let (factory, _) = factory_with(connection.clone());
        let runner = Arc::new(FlowRunner::new(
            factory.item_flow::<Item>(connection, &FlowConfiguration::default()),
        ));

        // When
        let slow = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.retrieve(Resource::new("/item/a"), None).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = runner.retrieve(Resource::new("/item/b"), None).await;
        let slow = slow.await.unwrap();

        // Then
        assert_eq!(fast.map(|r| r.value), Ok(Item::new(1, "widget")));
        assert_eq!(slow.map(|r| r.value), Ok(Item::new(1, "widget")));
    }
}
