use std::{num::NonZeroUsize, time::Duration};

use comms::{Vector, group::Aggregator};
use controller::Controller;
use machine_learning::{Dataset, LinearSgd};
use orchestrator::{
    LocalProvider, OrchestratorError, ProviderEvent, ResourceId, ResourceProvider,
    ResourceRequest, TaskId, TaskSet,
};
use tokio::time::timeout;

fn tasks(workers: usize) -> TaskSet {
    let dataset = Dataset::new(vec![Vector::from(vec![1.0, 2.0])]).unwrap();
    let controller = Controller::new(dataset, Aggregator::Average, NonZeroUsize::MIN);
    TaskSet::local(workers, LinearSgd::default(), controller, 1024)
}

fn request(count: usize) -> ResourceRequest {
    ResourceRequest {
        count,
        memory_mb: 128,
        cores: 4,
    }
}

#[tokio::test]
async fn allocates_up_to_capacity() {
    let (mut provider, mut events) = LocalProvider::new(3);

    provider.request(request(3)).await.unwrap();
    for expected in 0..3 {
        let Some(ProviderEvent::Allocated(id)) = events.recv().await else {
            panic!("expected an allocation");
        };
        assert_eq!(id, ResourceId(expected));
    }
    assert_eq!(provider.live(), 3);

    provider.request(request(1)).await.unwrap();
    assert!(matches!(
        events.recv().await,
        Some(ProviderEvent::AllocationFailed(_))
    ));
    assert_eq!(provider.live(), 3);
}

#[tokio::test]
async fn rejects_empty_resources() {
    let (mut provider, mut events) = LocalProvider::new(3);

    let zero_cores = ResourceRequest {
        cores: 0,
        ..request(1)
    };
    provider.request(zero_cores).await.unwrap();

    assert!(matches!(
        events.recv().await,
        Some(ProviderEvent::AllocationFailed(_))
    ));
    assert_eq!(provider.live(), 0);
}

#[tokio::test]
async fn task_needs_an_active_context() {
    let (mut provider, mut events) = LocalProvider::new(1);
    let mut tasks = tasks(1);

    provider.request(request(1)).await.unwrap();
    events.recv().await.unwrap();

    let task = tasks.take_worker(0).unwrap();
    let err = provider.submit_task(ResourceId(0), task).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Provider(_)));
}

#[tokio::test]
async fn reports_running_then_failure() {
    let (mut provider, mut events) = LocalProvider::new(1);
    let mut tasks = tasks(1);
    let task = tasks.take_worker(0).unwrap();
    // Without a root the worker's link is closed right away.
    drop(tasks);

    provider.request(request(1)).await.unwrap();
    provider.submit_context(ResourceId(0)).await.unwrap();
    provider.submit_task(ResourceId(0), task).await.unwrap();

    assert!(matches!(events.recv().await, Some(ProviderEvent::Allocated(_))));
    assert!(matches!(
        events.recv().await,
        Some(ProviderEvent::ContextActive(ResourceId(0)))
    ));
    match events.recv().await {
        Some(ProviderEvent::TaskRunning { resource, task_id }) => {
            assert_eq!(resource, ResourceId(0));
            assert_eq!(task_id, TaskId::worker(0));
        }
        other => panic!("expected running, got {other:?}"),
    }
    assert!(matches!(
        events.recv().await,
        Some(ProviderEvent::TaskFailed { .. })
    ));
}

#[tokio::test]
async fn release_stops_the_task() {
    let (mut provider, mut events) = LocalProvider::new(1);
    let mut tasks = tasks(1);
    let task = tasks.take_worker(0).unwrap();

    provider.request(request(1)).await.unwrap();
    provider.submit_context(ResourceId(0)).await.unwrap();
    provider.submit_task(ResourceId(0), task).await.unwrap();

    events.recv().await.unwrap();
    events.recv().await.unwrap();
    assert!(matches!(
        events.recv().await,
        Some(ProviderEvent::TaskRunning { .. })
    ));

    // The worker waits on a partition that never comes.
    provider.release(ResourceId(0)).await.unwrap();
    assert_eq!(provider.live(), 0);

    let next = timeout(Duration::from_millis(100), events.recv()).await;
    assert!(next.is_err(), "an aborted task must not report");

    let err = provider.release(ResourceId(0)).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Provider(_)));
}
