// src/concurrency.rs
//! Admission-controlled fan-out of per-record work.

use futures::future::join_all;
use std::future::Future;
use tokio::sync::Semaphore;

/// Runs `work` over every item with at most `limit` units in flight.
///
/// All units run to completion and results come back in input order. A
/// unit's failure is carried in its own output; siblings are unaffected.
/// Units run cooperatively on the calling task, nothing is spawned.
pub async fn run_bounded<I, T, F, Fut>(items: Vec<I>, limit: usize, work: F) -> Vec<T>
where
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = T>,
{
    let semaphore = Semaphore::new(limit.max(1));
    let semaphore = &semaphore;
    let work = &work;

    join_all(items.into_iter().enumerate().map(|(index, item)| async move {
        // The semaphore is never closed, so acquisition cannot fail.
        let _permit = semaphore.acquire().await.ok();
        work(index, item).await
    }))
    .await
}
