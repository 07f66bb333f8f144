//! Batch Scheduler
//!
//! Fans a sitemap out into per-URL remote calls and collates the results
//! back into sitemap order.
//!
//! Two nested task groups are used: one task per batch, and inside each
//! batch one task per URL. Every batch is launched immediately, so the
//! number of calls in flight is only bounded by `max_in_flight` when set.

use super::collator::Collator;
use super::partition::{create_batches, DEFAULT_BATCH_SIZE};
use crate::sitemap::SitemapEntry;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Tuning for one fan-out
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// URLs per batch
    pub batch_size: usize,
    /// Global cap on concurrent remote calls across all batches
    pub max_in_flight: Option<usize>,
    /// Deadline for the whole fan-out; on expiry in-flight calls are aborted
    pub deadline: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: None,
            deadline: None,
        }
    }
}

/// One sitemap entry and the result fetched for its URL, if any
#[derive(Debug, Clone)]
pub struct Collated<T> {
    pub entry: SitemapEntry,
    pub result: Option<T>,
}

/// Fetch every entry's URL with `fetch` and return one [`Collated`] per entry,
/// in input order.
///
/// A failed fetch is logged and leaves that entry's result empty; it never
/// fails the whole call. Returns only after every spawned task has finished
/// or the deadline has passed.
pub async fn fan_out<T, F, Fut>(
    entries: Vec<SitemapEntry>,
    options: &BatchOptions,
    fetch: F,
) -> Vec<Collated<T>>
where
    T: Clone + Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let deadline = options.deadline.map(|d| Instant::now() + d);
    let collator = Arc::new(Collator::new());
    let limiter = options
        .max_in_flight
        .map(|n| Arc::new(Semaphore::new(n.max(1))));
    let fetch = Arc::new(fetch);

    let batches = create_batches(&entries, options.batch_size);
    tracing::debug!(
        entries = entries.len(),
        batches = batches.len(),
        batch_size = options.batch_size,
        "Dispatching batches"
    );

    let mut batch_tasks = JoinSet::new();
    for (index, batch) in batches.into_iter().enumerate() {
        let urls: Vec<String> = batch.iter().map(|e| e.loc.clone()).collect();
        batch_tasks.spawn(run_batch(
            index,
            urls,
            Arc::clone(&fetch),
            Arc::clone(&collator),
            limiter.clone(),
        ));
    }

    if !join_batches(&mut batch_tasks, deadline).await {
        tracing::warn!(
            collated = collator.len(),
            total = entries.len(),
            "Deadline exceeded, aborting in-flight fetches"
        );
        // Aborting a batch drops its inner JoinSet, which aborts its URL tasks
        batch_tasks.abort_all();
        while batch_tasks.join_next().await.is_some() {}
    }

    // Draining leaves the collator empty before it is dropped
    let results = collator.drain();

    entries
        .into_iter()
        .map(|entry| {
            let result = results.get(&entry.loc).cloned();
            Collated { entry, result }
        })
        .collect()
}

/// Wait for every batch; `false` if the deadline passed first
async fn join_batches(batch_tasks: &mut JoinSet<usize>, deadline: Option<Instant>) -> bool {
    let wait_all = async {
        while let Some(joined) = batch_tasks.join_next().await {
            match joined {
                Ok(index) => tracing::debug!("Batch {} complete", index + 1),
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "Batch task failed"),
            }
        }
    };

    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, wait_all).await.is_ok(),
        None => {
            wait_all.await;
            true
        }
    }
}

async fn run_batch<T, F, Fut>(
    index: usize,
    urls: Vec<String>,
    fetch: Arc<F>,
    collator: Arc<Collator<T>>,
    limiter: Option<Arc<Semaphore>>,
) -> usize
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let mut workers = JoinSet::new();

    for url in urls {
        let fetch = Arc::clone(&fetch);
        let collator = Arc::clone(&collator);
        let limiter = limiter.clone();

        workers.spawn(async move {
            let _permit = match limiter {
                Some(limiter) => match limiter.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };

            match (*fetch)(url.clone()).await {
                Ok(result) => collator.put(url, result),
                Err(e) => tracing::warn!(url = %url, error = %format!("{:#}", e), "Fetch failed"),
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!(batch = index + 1, error = %e, "URL worker failed");
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entries(locs: &[&str]) -> Vec<SitemapEntry> {
        locs.iter().map(|l| SitemapEntry::new(*l)).collect()
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_empty_result() {
        let options = BatchOptions {
            batch_size: 2,
            ..Default::default()
        };

        let out = fan_out(entries(&["A", "B", "C"]), &options, |url| async move {
            if url == "B" {
                anyhow::bail!("boom");
            }
            Ok(format!("ok-{}", url))
        })
        .await;

        let got: Vec<_> = out
            .iter()
            .map(|c| (c.entry.loc.as_str(), c.result.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("A", Some("ok-A".to_string())),
                ("B", None),
                ("C", Some("ok-C".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_input() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let out = fan_out(Vec::new(), &BatchOptions::default(), move |_url| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .await;
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_urls_share_one_result() {
        let out = fan_out(
            entries(&["A", "B", "A"]),
            &BatchOptions::default(),
            |url| async move { Ok::<_, anyhow::Error>(url.to_lowercase()) },
        )
        .await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].result.as_deref(), Some("a"));
        assert_eq!(out[2].result.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_results() {
        let options = BatchOptions {
            batch_size: 1,
            deadline: Some(Duration::from_millis(300)),
            ..Default::default()
        };

        let out = fan_out(entries(&["fast", "slow"]), &options, |url| async move {
            if url == "slow" {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok::<_, anyhow::Error>(url)
        })
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].result.as_deref(), Some("fast"));
        assert_eq!(out[1].result, None);
    }
}
