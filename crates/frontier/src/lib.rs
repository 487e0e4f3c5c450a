pub mod visited;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use sitecrawler_core::{CanonicalUrl, FrontierEntry, VisitedStatus};
pub use visited::{Claim, VisitedSet};

/// The BFS frontier: a FIFO queue of [`FrontierEntry`] plus the bookkeeping
/// needed to know when the crawl is finished.
///
/// Push order is the only ordering guarantee; there is no guarantee about
/// completion order between URLs (see the concurrency model).
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierEntry>>,
    visited: Arc<VisitedSet>,
    max_depth: Option<u32>,
    max_pages: u64,
    claimed: AtomicU64,
    in_flight: AtomicUsize,
}

impl Frontier {
    pub fn new(visited: Arc<VisitedSet>, max_pages: u64, max_depth: Option<u32>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            visited,
            max_depth,
            max_pages,
            claimed: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn visited(&self) -> &Arc<VisitedSet> {
        &self.visited
    }

    /// Attempt to enqueue `url` at `depth`. Returns `true` if it was
    /// actually added (claimed for the first time, within depth and page
    /// budget); `false` otherwise. Claiming happens here, at enqueue time,
    /// so that two workers racing to discover the same link can't both
    /// push it.
    pub async fn push(&self, url: CanonicalUrl, depth: u32) -> bool {
        if let Some(max_depth) = self.max_depth {
            if depth > max_depth {
                return false;
            }
        }
        if self.claimed.load(Ordering::SeqCst) >= self.max_pages {
            return false;
        }
        if self.visited.claim(url.as_str()) != Claim::New {
            return false;
        }
        let claimed_now = self.claimed.fetch_add(1, Ordering::SeqCst) + 1;
        if claimed_now > self.max_pages {
            // Lost the race against the cap; un-claim is not needed since a
            // claimed-but-never-enqueued URL simply never gets processed.
            self.claimed.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        self.queue.lock().await.push_back(FrontierEntry { url, depth });
        true
    }

    /// Enqueue a seed URL at depth 0, bypassing nothing — seeds go through
    /// the same claim protocol as any other URL.
    pub async fn push_seed(&self, url: CanonicalUrl) -> bool {
        self.push(url, 0).await
    }

    /// Pop up to `n` entries in one lock acquisition.
    pub async fn pop_batch(&self, n: usize) -> Vec<FrontierEntry> {
        let mut queue = self.queue.lock().await;
        let mut batch = Vec::with_capacity(n.min(queue.len()));
        for _ in 0..n {
            match queue.pop_front() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        if !batch.is_empty() {
            self.in_flight.fetch_add(batch.len(), Ordering::SeqCst);
        }
        batch
    }

    /// Call once per entry returned by `pop_batch` when the worker is done
    /// with it (whichever terminal state it reached).
    pub fn mark_done(&self, status: VisitedStatus, url: &CanonicalUrl) {
        self.visited.set_status(url.as_str(), status);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// The crawl is finished when the queue is empty and nothing is
    /// in-flight — not merely when the queue looks empty, which would race
    /// against workers still discovering children.
    pub async fn is_done(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0 && self.queue.lock().await.is_empty()
    }

    pub fn claimed_count(&self) -> u64 {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn at_page_cap(&self) -> bool {
        self.claimed.load(Ordering::SeqCst) >= self.max_pages
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }
}

/// Helper used by the Sitemap Loader to seed many URLs at once, logging a
/// summary the way the engine does for every batch.
pub async fn seed_many(frontier: &Frontier, urls: impl IntoIterator<Item = CanonicalUrl>) -> usize {
    let mut added = 0;
    let mut total = 0;
    for url in urls {
        total += 1;
        if frontier.push_seed(url).await {
            added += 1;
        }
    }
    debug!(added, total, "seeded frontier");
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> CanonicalUrl {
        CanonicalUrl(s.to_string())
    }

    #[tokio::test]
    async fn fifo_order() {
        let visited = Arc::new(VisitedSet::new());
        let frontier = Frontier::new(visited, 100, None);
        frontier.push(url("https://a/1"), 0).await;
        frontier.push(url("https://a/2"), 1).await;
        let batch = frontier.pop_batch(10).await;
        assert_eq!(batch[0].url.as_str(), "https://a/1");
        assert_eq!(batch[1].url.as_str(), "https://a/2");
    }

    #[tokio::test]
    async fn duplicate_push_rejected() {
        let visited = Arc::new(VisitedSet::new());
        let frontier = Frontier::new(visited, 100, None);
        assert!(frontier.push(url("https://a/1"), 0).await);
        assert!(!frontier.push(url("https://a/1"), 0).await);
    }

    #[tokio::test]
    async fn respects_max_depth() {
        let visited = Arc::new(VisitedSet::new());
        let frontier = Frontier::new(visited, 100, Some(1));
        assert!(frontier.push(url("https://a/1"), 1).await);
        assert!(!frontier.push(url("https://a/2"), 2).await);
    }

    #[tokio::test]
    async fn never_exceeds_max_pages() {
        let visited = Arc::new(VisitedSet::new());
        let frontier = Frontier::new(visited, 2, None);
        assert!(frontier.push(url("https://a/1"), 0).await);
        assert!(frontier.push(url("https://a/2"), 0).await);
        assert!(!frontier.push(url("https://a/3"), 0).await);
        assert_eq!(frontier.claimed_count(), 2);
    }

    #[tokio::test]
    async fn done_waits_for_in_flight() {
        let visited = Arc::new(VisitedSet::new());
        let frontier = Frontier::new(visited, 100, None);
        frontier.push(url("https://a/1"), 0).await;
        let batch = frontier.pop_batch(10).await;
        assert!(!frontier.is_done().await);
        frontier.mark_done(VisitedStatus::Ok, &batch[0].url);
        assert!(frontier.is_done().await);
    }
}
