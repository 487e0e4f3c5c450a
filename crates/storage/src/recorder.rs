use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use serde::Serialize;
use tokio::fs;

use sitecrawler_core::RunStats;

/// Thread-safe counters for a single crawl run, flushed to
/// `crawl_stats.json` at the end.
pub struct RunRecorder {
    stats: Mutex<RunStats>,
}

impl Default for RunRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRecorder {
    pub fn new() -> Self {
        let mut stats = RunStats::default();
        stats.started_at = Some(chrono::Utc::now());
        Self { stats: Mutex::new(stats) }
    }

    pub fn record_page(&self) {
        self.stats.lock().unwrap().pages_crawled += 1;
    }

    pub fn record_file(&self, category: &str) {
        *self.stats.lock().unwrap().files_downloaded.entry(category.to_string()).or_insert(0) += 1;
    }

    pub fn record_error(&self, failed_url: Option<&str>) {
        let mut stats = self.stats.lock().unwrap();
        stats.errors += 1;
        if let Some(url) = failed_url {
            stats.failed_urls.push(url.to_string());
        }
    }

    pub fn record_pdf(&self, success: bool, backend: Option<&str>) {
        let mut stats = self.stats.lock().unwrap();
        if success {
            stats.pdf_processed += 1;
            if let Some(b) = backend {
                *stats.pdf_method_counts.entry(b.to_string()).or_insert(0) += 1;
            }
        } else {
            stats.pdf_failed += 1;
        }
    }

    pub fn record_proxy(&self, rotations: u64, successes: u64, failures: u64) {
        let mut stats = self.stats.lock().unwrap();
        stats.proxy_rotations = rotations;
        stats.proxy_successes = successes;
        stats.proxy_failures = failures;
    }

    pub fn snapshot(&self) -> RunStats {
        self.stats.lock().unwrap().clone()
    }

    /// Stamp `finished_at` and write `crawl_stats.json` under `base_dir`.
    pub async fn finish_and_write(&self, base_dir: &Path) -> Result<()> {
        self.stats.lock().unwrap().finished_at = Some(chrono::Utc::now());
        let snapshot = self.snapshot();

        #[derive(Serialize)]
        struct ProxyStats {
            rotations: u64,
            successes: u64,
            failures: u64,
        }
        #[derive(Serialize)]
        struct PdfProcessing {
            processed: u64,
            failed: u64,
            methods: std::collections::HashMap<String, u64>,
        }
        #[derive(Serialize)]
        struct CrawlStats<'a> {
            pages_crawled: u64,
            files_downloaded: &'a std::collections::HashMap<String, u64>,
            errors: u64,
            failed_urls: &'a [String],
            pdf_processing: PdfProcessing,
            proxy_stats: ProxyStats,
            started_at: Option<chrono::DateTime<chrono::Utc>>,
            finished_at: Option<chrono::DateTime<chrono::Utc>>,
        }

        let doc = CrawlStats {
            pages_crawled: snapshot.pages_crawled,
            files_downloaded: &snapshot.files_downloaded,
            errors: snapshot.errors,
            failed_urls: &snapshot.failed_urls,
            pdf_processing: PdfProcessing {
                processed: snapshot.pdf_processed,
                failed: snapshot.pdf_failed,
                methods: snapshot.pdf_method_counts,
            },
            proxy_stats: ProxyStats {
                rotations: snapshot.proxy_rotations,
                successes: snapshot.proxy_successes,
                failures: snapshot.proxy_failures,
            },
            started_at: snapshot.started_at,
            finished_at: snapshot.finished_at,
        };

        let json = serde_json::to_string_pretty(&doc)?;
        fs::write(base_dir.join("crawl_stats.json"), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_summary_json() {
        let recorder = RunRecorder::new();
        recorder.record_page();
        recorder.record_file("document");
        recorder.record_error(Some("https://example.com/dead"));
        recorder.record_pdf(true, Some("native"));

        let dir = tempfile::tempdir().unwrap();
        recorder.finish_and_write(dir.path()).await.unwrap();

        let contents = fs::read_to_string(dir.path().join("crawl_stats.json")).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["pages_crawled"], 1);
        assert_eq!(value["files_downloaded"]["document"], 1);
        assert_eq!(value["failed_urls"][0], "https://example.com/dead");
        assert_eq!(value["pdf_processing"]["processed"], 1);
    }
}
