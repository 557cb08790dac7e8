//! Startup pass, live feed worker and service wiring.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{build_reconciler, meta, FakeRuntime};
use container_dns::cache::RecordCache;
use container_dns::{Config, ContainerDns, DnsError, FeedDriver, Shutdown};

fn driver(runtime: &Arc<FakeRuntime>, cache: &RecordCache) -> FeedDriver {
    FeedDriver::new(runtime.clone(), build_reconciler(runtime.clone(), cache))
}

#[tokio::test]
async fn startup_pass_registers_up_and_tracks_created() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_metadata("a", meta("web", "172.17.0.2", &[]));
    runtime.set_metadata("b", meta("db", "172.17.0.3", &[]));
    runtime.add_running("a", "Up 2 hours");
    runtime.add_running("b", "Created");

    let cache = RecordCache::new();
    let mut driver = driver(&runtime, &cache);

    let listed = driver.startup_pass().await.unwrap();

    assert_eq!(listed, 2);
    let a = driver.reconciler().tracked("a").unwrap();
    assert!(a.active);
    let b = driver.reconciler().tracked("b").unwrap();
    assert!(b.created);
    assert_eq!(cache.names(), vec!["web.docker."]);
    assert_eq!(runtime.inspect_calls(), vec!["a".to_string()]);
}

#[tokio::test]
async fn startup_enumeration_failure_is_fatal() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.fail_listing();

    let cache = RecordCache::new();
    let Err(err) = driver(&runtime, &cache).run(Shutdown::new().0).await else {
        panic!("startup listing failure must be fatal");
    };

    assert!(matches!(err, DnsError::RuntimeEnumeration(_)));
    assert_eq!(runtime.calls(), vec!["list"]);
}

#[tokio::test]
async fn live_feed_runs_after_startup_in_order() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_metadata("a", meta("web", "172.17.0.2", &[]));
    runtime.set_metadata("c", meta("worker", "172.17.0.4", &[]));
    runtime.add_running("a", "Up 2 hours");
    runtime.push_event("c", "create");
    runtime.push_event("c", "start");
    runtime.push_event("a", "die");

    let cache = RecordCache::new();
    let (shutdown, _trigger) = Shutdown::new();
    let handle = driver(&runtime, &cache).run(shutdown).await.unwrap();
    let reconciler = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not finish")
        .unwrap();

    assert!(reconciler.is_tracked("c"));
    assert!(!reconciler.is_tracked("a"));
    assert_eq!(cache.names(), vec!["worker.docker."]);
    assert_eq!(&runtime.calls()[..2], &["list", "inspect"]);
    assert_eq!(runtime.calls()[2], "subscribe");
}

#[tokio::test]
async fn feed_errors_are_skipped() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_metadata("b", meta("api", "172.17.0.3", &[]));
    runtime.push_feed_error("unexpected EOF");
    runtime.push_event("b", "Up Less than a second");

    let cache = RecordCache::new();
    let (shutdown, _trigger) = Shutdown::new();
    let handle = driver(&runtime, &cache).run(shutdown).await.unwrap();
    let reconciler = handle.await.unwrap();

    assert!(reconciler.is_tracked("b"));
    assert!(cache.contains("api.docker."));
}

#[tokio::test]
async fn shutdown_stops_worker_on_open_feed() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_metadata("a", meta("web", "172.17.0.2", &[]));
    runtime.push_event("a", "Up 1 second");
    runtime.keep_feed_open();

    let cache = RecordCache::new();
    let (shutdown, trigger) = Shutdown::new();
    let handle = driver(&runtime, &cache).run(shutdown).await.unwrap();

    // Let the scripted event through before stopping.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cache.contains("web.docker.") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("event was not processed");

    trigger.trigger();
    let reconciler = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker ignored shutdown")
        .unwrap();

    assert!(reconciler.is_tracked("a"));
}

#[tokio::test]
async fn service_runs_until_feed_closes() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.set_metadata(
        "a",
        meta("web", "172.17.0.2", &["DNS_PUBLISH_NAME_W=www.example.com:172.17.0.2"]),
    );
    runtime.set_metadata("b", meta("db", "172.17.0.3", &[]));
    runtime.add_running("a", "Up 2 hours");
    runtime.push_event("b", "create");
    runtime.push_event("b", "start");

    let service = ContainerDns::new(Config::default());
    let cache = service.cache().clone();
    let (shutdown, _trigger) = Shutdown::new();

    tokio::time::timeout(
        Duration::from_secs(5),
        service.run_with_runtime(runtime.clone(), shutdown),
    )
    .await
    .expect("service did not stop")
    .unwrap();

    assert_eq!(
        cache.names(),
        vec!["db.docker.", "web.docker.", "www.example.com."]
    );
    assert_eq!(
        cache.lookup_reverse("2.0.17.172.in-addr.arpa."),
        vec!["web.docker.".to_string(), "www.example.com.".to_string()]
    );
}

#[tokio::test]
async fn service_propagates_startup_failure() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.fail_listing();

    let service = ContainerDns::new(Config::default());
    let (shutdown, _trigger) = Shutdown::new();
    let result = service.run_with_runtime(runtime, shutdown).await;

    assert!(matches!(result, Err(DnsError::RuntimeEnumeration(_))));
}

#[tokio::test]
async fn service_exits_early_when_already_shutting_down() {
    let runtime = Arc::new(FakeRuntime::new());
    runtime.add_running("a", "Up 2 hours");

    let service = ContainerDns::new(Config::default());
    let (shutdown, trigger) = Shutdown::new();
    trigger.trigger();

    service
        .run_with_runtime(runtime.clone(), shutdown)
        .await
        .unwrap();

    assert!(runtime.calls().is_empty());
}
