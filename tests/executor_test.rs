use paper_harvest::core::executor::ParallelExecutor;
use paper_harvest::utils::error::HarvestError;
use paper_harvest::utils::progress::Progress;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("paper-{}", i)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ten_items_three_failures_yield_seven_results() {
    let executor = ParallelExecutor::new(4).without_progress();
    let progress = Progress::hidden(10);

    let report = executor
        .run_with_progress(
            items(10),
            |item: String| async move {
                let index: usize = item.trim_start_matches("paper-").parse().unwrap();
                if index % 3 == 1 {
                    return Err(HarvestError::Processing {
                        message: format!("{} unavailable", item),
                    });
                }
                Ok(Some(index))
            },
            &progress,
        )
        .await;

    assert_eq!(report.submitted, 10);
    assert_eq!(report.failed, 3);
    assert_eq!(report.resolved(), 7);
    assert_eq!(progress.completed(), 10);

    let mut results = report.results;
    results.sort();
    assert_eq!(results, vec![0, 2, 3, 5, 6, 8, 9]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_never_more_than_concurrency_in_flight() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let executor = ParallelExecutor::new(3).without_progress();

    let worker_in_flight = Arc::clone(&in_flight);
    let worker_peak = Arc::clone(&peak);
    let report = executor
        .run(items(12), move |item: String| {
            let in_flight = Arc::clone(&worker_in_flight);
            let peak = Arc::clone(&worker_peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(item))
            }
        })
        .await;

    assert_eq!(report.resolved(), 12);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_item_is_isolated() {
    let executor = ParallelExecutor::new(2).without_progress();

    let report = executor
        .run(items(5), |item: String| async move {
            if item == "paper-2" {
                panic!("parser blew up on {}", item);
            }
            Ok(Some(item))
        })
        .await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.resolved(), 4);
    assert!(!report.results.contains(&"paper-2".to_string()));
}

#[test]
fn test_executor_runs_on_a_plain_runtime() {
    let executor = ParallelExecutor::new(2).without_progress();

    let report = tokio_test::block_on(executor.run(items(3), |item: String| async move {
        Ok::<_, HarvestError>(if item == "paper-0" { None } else { Some(item) })
    }));

    assert_eq!(report.empty, 1);
    assert_eq!(report.resolved(), 2);
    assert_eq!(report.submitted - report.failed - report.empty, report.resolved());
}
