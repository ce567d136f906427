//! Adapter selection from configuration through to delivery.

use std::sync::Arc;
use std::time::Duration;

use call_adapter::{
    AdapterConfig, AsyncCall, CallSiteMarker, CallSiteName, ConfigurationError, DispatchPriority,
    MarkerName, Outcome, RebindingCallAdapterFactory, ResponseType, ReturnShape,
};
use call_adapter_testkit::{init_tracing, Completion, RecordingListener, ScriptedCall, SerialQueue};

const WAIT: Duration = Duration::from_secs(10);

const CONFIG: &str = r#"
{
    "call_sites": {
        "fetch_user": { "front_of_queue": true },
        "list_repos": {}
    }
}
"#;

fn site(name: &str) -> CallSiteName {
    CallSiteName::new(name).unwrap()
}

fn user_call() -> ReturnShape {
    ReturnShape::call(ResponseType::new("User").unwrap())
}

#[tokio::test]
async fn test_configured_front_of_queue_site_delivers_on_queue() {
    init_tracing();
    let queue = Arc::new(SerialQueue::start("adapter-main").unwrap());
    let factory = RebindingCallAdapterFactory::create(queue.clone());
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();

    let adapter = factory
        .get(&user_call(), &config.markers_for(&site("fetch_user")))
        .unwrap()
        .expect("fetch_user should be adapted");
    assert_eq!(adapter.priority(), DispatchPriority::FrontOfQueue);
    assert_eq!(adapter.response_type().as_str(), "User");

    let call = adapter.adapt::<String>(Box::new(
        ScriptedCall::succeeding("ada".to_string()).with_completion(Completion::Spawned),
    ));
    let (listener, mut seen) = RecordingListener::channel();
    call.enqueue(Some(listener)).unwrap();

    let notification = seen.next(WAIT).await.expect("no notification");
    assert_eq!(notification.outcome, Outcome::Success("ada".to_string()));
    assert_eq!(notification.thread, queue.thread_id());
    assert_eq!(queue.paths(), vec![DispatchPriority::FrontOfQueue]);
}

#[test]
fn test_configured_site_without_options_uses_ordinary_priority() {
    init_tracing();
    let queue = Arc::new(SerialQueue::start("adapter-ordinary").unwrap());
    let factory = RebindingCallAdapterFactory::create(queue);
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();

    let adapter = factory
        .get(&user_call(), &config.markers_for(&site("list_repos")))
        .unwrap()
        .unwrap();

    assert_eq!(adapter.priority(), DispatchPriority::Ordinary);
}

#[test]
fn test_unconfigured_site_is_left_alone() {
    init_tracing();
    let queue = Arc::new(SerialQueue::start("adapter-none").unwrap());
    let factory = RebindingCallAdapterFactory::create(queue);
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();

    let adapter = factory
        .get(&user_call(), &config.markers_for(&site("delete_user")))
        .unwrap();

    assert!(adapter.is_none());
}

#[test]
fn test_configured_site_with_wrong_return_shape_fails_at_selection() {
    init_tracing();
    let queue = Arc::new(SerialQueue::start("adapter-shape").unwrap());
    let factory = RebindingCallAdapterFactory::create(queue);
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();
    let mut markers = config.markers_for(&site("fetch_user"));
    markers.push(CallSiteMarker::Other(MarkerName::new("GET").unwrap()));

    let err = factory
        .get(
            &ReturnShape::Other {
                type_name: "Stream<User>".to_string(),
            },
            &markers,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigurationError::IncompatibleReturnShape { .. }
    ));
}

#[tokio::test]
async fn test_duplicate_of_adapted_call_runs_independently() {
    init_tracing();
    let queue = Arc::new(SerialQueue::start("adapter-duplicate").unwrap());
    let factory = RebindingCallAdapterFactory::create(queue.clone());
    let config = AdapterConfig::from_json_str(CONFIG).unwrap();
    let adapter = factory
        .get(&user_call(), &config.markers_for(&site("fetch_user")))
        .unwrap()
        .unwrap();

    let original = adapter.adapt::<u32>(Box::new(
        ScriptedCall::succeeding(1u32).with_completion(Completion::Spawned),
    ));
    original.cancel();
    let copy = original.duplicate();
    assert!(!copy.is_canceled());
    assert!(!copy.is_executed());

    let (first, mut first_seen) = RecordingListener::channel();
    let (second, mut second_seen) = RecordingListener::channel();
    original.enqueue(Some(first)).unwrap();
    copy.enqueue(Some(second)).unwrap();

    let first = first_seen.next(WAIT).await.expect("no notification");
    let second = second_seen.next(WAIT).await.expect("no notification");
    assert_eq!(
        first.outcome,
        Outcome::Failure(call_adapter::CallError::Canceled)
    );
    assert_eq!(second.outcome, Outcome::Success(1));
    assert_eq!(
        queue.paths(),
        vec![DispatchPriority::FrontOfQueue, DispatchPriority::FrontOfQueue]
    );
}
