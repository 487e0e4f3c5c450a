use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A URL that has been through [`crate::normalize::normalize_url`].
///
/// Two wire URLs that normalize equal are the same resource; the newtype
/// exists so callers can't accidentally compare a raw `Url` against one
/// that has already been canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalUrl(pub String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in the BFS frontier: a canonical URL paired with its depth
/// from the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: CanonicalUrl,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitedStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_body_size: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_body_size: 50 * 1024 * 1024,
            user_agent: "sitecrawler/0.1".to_string(),
        }
    }
}

/// Result of a single HTTP attempt, after redirects have been followed.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub requested_url: String,
    pub final_url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub latency: Duration,
}

/// A fixed, closed set of downloadable-file categories, derived from the
/// URL path suffix (see the file-category table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Image,
    Audio,
    Video,
    Code,
    Data,
    Ebook,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Document => "document",
            FileCategory::Spreadsheet => "spreadsheet",
            FileCategory::Presentation => "presentation",
            FileCategory::Archive => "archive",
            FileCategory::Image => "image",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Code => "code",
            FileCategory::Data => "data",
            FileCategory::Ebook => "ebook",
            FileCategory::Other => "other",
        }
    }
}

/// What the Classifier decided to do with a URL.
#[derive(Debug, Clone)]
pub enum ClassifyAction {
    CrawlPage,
    DownloadFile(FileCategory),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    pub title: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub headers: HashMap<String, String>,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfExtraction {
    pub backend: String,
    pub text_length: usize,
    pub text_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub url: String,
    pub filename: String,
    pub category: String,
    pub size: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub headers: HashMap<String, String>,
    pub status_code: u16,
    pub filepath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_extraction: Option<PdfExtraction>,
}

/// Extracted text + outbound links produced by the HTML extractor.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtract {
    pub title: Option<String>,
    pub body_text: String,
    pub links: Vec<String>,
}

/// One entry in the proxy ring.
#[derive(Debug, Clone)]
pub struct Proxy {
    /// `None` means "direct" (no proxy).
    pub url: Option<String>,
    pub latency_ms: Option<u64>,
}

impl Proxy {
    pub fn direct() -> Self {
        Self { url: None, latency_ms: None }
    }

    pub fn is_direct(&self) -> bool {
        self.url.is_none()
    }
}

/// Counters accumulated over a run and serialized into `crawl_stats.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub pages_crawled: u64,
    pub files_downloaded: HashMap<String, u64>,
    pub errors: u64,
    pub failed_urls: Vec<String>,
    pub pdf_processed: u64,
    pub pdf_failed: u64,
    pub pdf_method_counts: HashMap<String, u64>,
    pub proxy_rotations: u64,
    pub proxy_successes: u64,
    pub proxy_failures: u64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}
