//! Bounded fan-out over independent work items.
//!
//! Each item runs as its own tokio task; at most `concurrency` tasks are in
//! flight. Results arrive in completion order. A failing (or panicking) item
//! is logged with its description and dropped without touching the others.

use crate::domain::model::PublicationRecord;
use crate::utils::error::Result;
use crate::utils::progress::Progress;
use futures::{stream, StreamExt};
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Something the executor can name in its failure log.
pub trait WorkItem: Send + 'static {
    fn describe(&self) -> String;
}

impl WorkItem for PublicationRecord {
    fn describe(&self) -> String {
        format!(
            "{}, url: {}",
            self.title,
            self.canonical_url.as_deref().unwrap_or("<none>")
        )
    }
}

impl WorkItem for String {
    fn describe(&self) -> String {
        self.clone()
    }
}

#[derive(Debug)]
pub struct ExecutionReport<R> {
    pub results: Vec<R>,
    pub submitted: usize,
    pub failed: usize,
    pub empty: usize,
}

impl<R> ExecutionReport<R> {
    fn new(submitted: usize) -> Self {
        Self {
            results: Vec::with_capacity(submitted),
            submitted,
            failed: 0,
            empty: 0,
        }
    }

    pub fn resolved(&self) -> usize {
        self.results.len()
    }
}

#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    concurrency: usize,
    label: String,
    show_progress: bool,
}

impl ParallelExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            label: "resolve".to_string(),
            show_progress: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<T, R, W, Fut>(&self, items: Vec<T>, worker: W) -> ExecutionReport<R>
    where
        T: WorkItem,
        R: Send + 'static,
        W: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>>> + Send + 'static,
    {
        let progress = if self.show_progress {
            Progress::new(items.len(), &self.label)
        } else {
            Progress::hidden(items.len())
        };
        self.run_with_progress(items, worker, &progress).await
    }

    pub async fn run_with_progress<T, R, W, Fut>(
        &self,
        items: Vec<T>,
        worker: W,
        progress: &Progress,
    ) -> ExecutionReport<R>
    where
        T: WorkItem,
        R: Send + 'static,
        W: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>>> + Send + 'static,
    {
        let mut report = ExecutionReport::new(items.len());
        let worker = Arc::new(worker);

        tracing::debug!(
            "🔀 {}: {} items, concurrency {}",
            self.label,
            report.submitted,
            self.concurrency
        );

        // map 是惰性的：buffer_unordered 最多只會建立 concurrency 個 task
        let mut completions = stream::iter(items)
            .map(|item| {
                let worker = Arc::clone(&worker);
                let description = item.describe();
                let handle = tokio::spawn(async move { (*worker)(item).await });
                async move { (description, handle.await) }
            })
            .buffer_unordered(self.concurrency);

        while let Some((description, joined)) = completions.next().await {
            match joined {
                Ok(Ok(Some(result))) => report.results.push(result),
                Ok(Ok(None)) => {
                    report.empty += 1;
                    tracing::debug!("No result for: {}", description);
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::error!("❌ Failed to process: {} ({})", description, e);
                }
                Err(join_error) => {
                    report.failed += 1;
                    tracing::error!("❌ Worker aborted on: {} ({})", description, join_error);
                }
            }
            progress.tick();
        }

        progress.finish(format!(
            "{} resolved, {} failed",
            report.resolved(),
            report.failed
        ));
        report
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
