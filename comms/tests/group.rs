use std::time::Duration;

use comms::{
    Vector,
    group::{AggregationErr, Aggregator, GroupErr, local_group},
};
use tokio::time::{sleep, timeout};

fn rows(values: &[f64]) -> Vec<Vector> {
    values.iter().map(|&x| Vector::from(vec![x, x])).collect()
}

#[tokio::test]
async fn scatter_delivers_each_partition_to_its_leaf() {
    let (mut root, leaves) = local_group(3, 1024);
    let partitions = vec![rows(&[1.0, 2.0]), Vec::new(), rows(&[3.0])];
    let expected = partitions.clone();

    let root_fut = async move { root.scatter(partitions).await.unwrap() };
    let leaves_fut = futures::future::join_all(leaves.into_iter().map(|mut leaf| async move {
        (leaf.id(), leaf.receive_partition().await.unwrap())
    }));

    let ((), received) = tokio::join!(root_fut, leaves_fut);
    for (id, partition) in received {
        assert_eq!(partition, expected[id]);
    }
}

#[tokio::test]
async fn scatter_rejects_wrong_partition_count() {
    let (mut root, _leaves) = local_group(2, 1024);
    let err = root.scatter(vec![Vec::new()]).await.unwrap_err();
    assert!(matches!(
        err,
        GroupErr::PartitionCount {
            expected: 2,
            got: 1
        }
    ));
}

#[tokio::test]
async fn broadcast_then_reduce_round() {
    let (mut root, leaves) = local_group(3, 1024);
    let theta = Vector::from(vec![1.0, 2.0]);

    let root_fut = async move {
        root.broadcast(&theta).await.unwrap();
        let aggregate = root.reduce(Aggregator::Concat).await.unwrap();
        root.disconnect().await.unwrap();
        aggregate
    };

    let leaves_fut = futures::future::join_all(leaves.into_iter().map(|mut leaf| async move {
        let mut rounds = 0;
        while let Some(mut params) = leaf.receive_broadcast().await.unwrap() {
            let scale = (leaf.id() + 1) as f64;
            params.iter_mut().for_each(|p| *p *= scale);
            leaf.send_contribution(&params).await.unwrap();
            rounds += 1;
        }
        rounds
    }));

    let (aggregate, rounds) = tokio::join!(root_fut, leaves_fut);
    // (1 + 2 + 3) / 3 = 2
    assert_eq!(*aggregate, [2.0, 4.0]);
    assert_eq!(rounds, [1, 1, 1]);
}

#[tokio::test]
async fn reduce_ignores_arrival_order() {
    for delays in [[0, 10, 20], [20, 10, 0], [10, 0, 20]] {
        let (mut root, leaves) = local_group(3, 1024);

        let leaves_fut = futures::future::join_all(leaves.into_iter().zip(delays).map(
            |(mut leaf, delay)| async move {
                sleep(Duration::from_millis(delay)).await;
                let contribution = Vector::from(vec![0.1 * (leaf.id() + 1) as f64, 1.0 / 3.0]);
                leaf.send_contribution(&contribution).await.unwrap();
            },
        ));

        let (aggregate, _) = tokio::join!(root.reduce(Aggregator::Average), leaves_fut);
        let expected = Aggregator::Average
            .merge(&[
                Vector::from(vec![0.1, 1.0 / 3.0]),
                Vector::from(vec![0.2, 1.0 / 3.0]),
                Vector::from(vec![0.30000000000000004, 1.0 / 3.0]),
            ])
            .unwrap();
        assert_eq!(aggregate.unwrap(), expected);
    }
}

#[tokio::test]
async fn reduce_waits_for_every_leaf() {
    let (mut root, mut leaves) = local_group(2, 1024);
    leaves[0].send_contribution(&Vector::zeros(2)).await.unwrap();

    let res = timeout(Duration::from_millis(50), root.reduce(Aggregator::Concat)).await;
    assert!(res.is_err(), "reduce returned with a missing contribution");
}

#[tokio::test]
async fn all_sentinel_average_is_reported_not_fatal() {
    let (mut root, mut leaves) = local_group(2, 1024);
    for leaf in leaves.iter_mut() {
        leaf.send_contribution(&Vector::zeros(3)).await.unwrap();
    }

    let err = root.reduce(Aggregator::Average).await.unwrap_err();
    assert!(matches!(
        err,
        GroupErr::Aggregation(AggregationErr::AllSentinel { count: 2 })
    ));

    // The links are still in sync: a following round works.
    for leaf in leaves.iter_mut() {
        leaf.send_contribution(&Vector::from(vec![1.0, 1.0, 1.0])).await.unwrap();
    }
    let aggregate = root.reduce(Aggregator::Average).await.unwrap();
    assert_eq!(*aggregate, [1.0, 1.0, 1.0]);
}

#[tokio::test]
async fn leaf_errors_surface_at_the_root() {
    let (mut root, mut leaves) = local_group(2, 1024);
    leaves[1].report_error("numerically invalid").await.unwrap();

    let err = root.reduce(Aggregator::Concat).await.unwrap_err();
    match err {
        GroupErr::Remote { leaf, detail } => {
            assert_eq!(leaf, 1);
            assert_eq!(detail, "numerically invalid");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn leaf_rejects_parameters_before_partition() {
    let (mut root, mut leaves) = local_group(1, 1024);
    root.broadcast(&Vector::zeros(2)).await.unwrap();

    let err = leaves[0].receive_partition().await.unwrap_err();
    assert!(matches!(
        err,
        GroupErr::UnexpectedMessage {
            leaf: 0,
            got: "data/parameters"
        }
    ));
}

#[tokio::test]
async fn reduce_rejects_contributions_unlike_the_broadcast() {
    let (mut root, mut leaves) = local_group(2, 1024);
    root.broadcast(&Vector::zeros(2)).await.unwrap();

    for leaf in leaves.iter_mut() {
        leaf.receive_broadcast().await.unwrap();
        leaf.send_contribution(&Vector::from(vec![1.0; 5])).await.unwrap();
    }

    let err = root.reduce(Aggregator::Concat).await.unwrap_err();
    assert!(matches!(
        err,
        GroupErr::Aggregation(AggregationErr::DimensionMismatch {
            expected: 2,
            got: 5,
            ..
        })
    ));
}
