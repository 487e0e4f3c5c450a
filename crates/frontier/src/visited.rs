use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use sitecrawler_core::VisitedStatus;

/// Outcome of [`VisitedSet::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller is the first to claim this URL; it is now recorded.
    New,
    /// Some caller (possibly this one, in an earlier call) already claimed it.
    Seen,
}

/// Exact (non-probabilistic) set of canonical URLs that have been claimed
/// for processing during this run.
///
/// `claim` must return `New` for exactly one caller per URL across the
/// lifetime of the run — a bloom filter's false-positive rate would
/// violate that, so this is backed by a `DashMap` keyed on the full URL
/// string rather than a compact probabilistic filter.
#[derive(Debug, Default)]
pub struct VisitedSet {
    inner: DashMap<String, VisitedStatus>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self { inner: DashMap::new() }
    }

    /// Seed the set from a durable store at startup without going through
    /// the claim protocol (these URLs are already settled, not newly won).
    pub fn mark_seen(&self, url: &str, status: VisitedStatus) {
        self.inner.insert(url.to_string(), status);
    }

    /// Atomically test-and-set: the first caller for a given `url` gets
    /// `New`, every later caller (concurrent or not) gets `Seen`.
    pub fn claim(&self, url: &str) -> Claim {
        match self.inner.entry(url.to_string()) {
            Entry::Occupied(_) => Claim::Seen,
            Entry::Vacant(v) => {
                v.insert(VisitedStatus::Ok);
                Claim::New
            }
        }
    }

    /// Record the terminal status of a URL that was previously claimed.
    /// A failed fetch stays claimed (never un-claimed) to prevent livelock.
    pub fn set_status(&self, url: &str, status: VisitedStatus) {
        self.inner.insert(url.to_string(), status);
    }

    pub fn status(&self, url: &str) -> Option<VisitedStatus> {
        self.inner.get(url).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of every URL currently recorded as failed.
    pub fn failed_urls(&self) -> Vec<String> {
        self.inner
            .iter()
            .filter(|r| *r.value() == VisitedStatus::Failed)
            .map(|r| r.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exactly_once() {
        let visited = VisitedSet::new();
        assert_eq!(visited.claim("https://a/"), Claim::New);
        assert_eq!(visited.claim("https://a/"), Claim::Seen);
        assert_eq!(visited.claim("https://a/"), Claim::Seen);
    }

    #[test]
    fn failed_stays_claimed() {
        let visited = VisitedSet::new();
        assert_eq!(visited.claim("https://a/"), Claim::New);
        visited.set_status("https://a/", VisitedStatus::Failed);
        assert_eq!(visited.claim("https://a/"), Claim::Seen);
        assert_eq!(visited.failed_urls(), vec!["https://a/".to_string()]);
    }

    #[test]
    fn mark_seen_preloads_without_claim_semantics() {
        let visited = VisitedSet::new();
        visited.mark_seen("https://a/", VisitedStatus::Ok);
        assert_eq!(visited.claim("https://a/"), Claim::Seen);
    }
}
