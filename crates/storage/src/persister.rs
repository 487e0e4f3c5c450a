use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;

use sitecrawler_core::{FileMetadata, PageMetadata, PdfExtraction as PdfExtractionMeta};

fn md5_hex(s: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Content-addressed filesystem writer. Layout, per domain:
/// ```text
/// crawled_data/<domain>/text/<md5>.txt
/// crawled_data/<domain>/text/<md5>_pdf.txt
/// crawled_data/<domain>/metadata/<md5>.json
/// crawled_data/<domain>/metadata/<md5>_file.json
/// crawled_data/<domain>/files/<category>/<name>
/// crawled_data/<domain>/crawl_stats.json
/// ```
pub struct Persister {
    base_dir: PathBuf,
    /// Serializes filename-collision resolution so two workers can't both
    /// decide `report_1.pdf` is free.
    collision_lock: Mutex<()>,
}

impl Persister {
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(base_dir.join("text")).await?;
        fs::create_dir_all(base_dir.join("metadata")).await?;
        fs::create_dir_all(base_dir.join("files")).await?;
        Ok(Self { base_dir, collision_lock: Mutex::new(()) })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn write_json<T: Serialize>(&self, path: PathBuf, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Persist an HTML page's extracted text + metadata.
    pub async fn persist_page(
        &self,
        url: &str,
        title: Option<String>,
        body_text: &str,
        status_code: u16,
        headers: HashMap<String, String>,
    ) -> Result<()> {
        let h = md5_hex(url);
        fs::write(self.base_dir.join("text").join(format!("{h}.txt")), body_text)
            .await
            .with_context(|| format!("writing text for {url}"))?;

        let metadata = PageMetadata {
            url: url.to_string(),
            title,
            timestamp: chrono::Utc::now(),
            headers,
            status_code,
        };
        self.write_json(self.base_dir.join("metadata").join(format!("{h}.json")), &metadata).await
    }

    /// Duplicate body (by content hash) — URL stays claimed upstream but no
    /// artifact is written here.
    pub fn skip_duplicate(&self, _url: &str) {}

    /// Persist PDF-extracted text alongside the downloaded file.
    pub async fn persist_pdf_text(&self, url: &str, text: &str) -> Result<String> {
        let h = md5_hex(url);
        let rel = format!("text/{h}_pdf.txt");
        fs::write(self.base_dir.join(&rel), text).await?;
        Ok(rel)
    }

    /// Persist a downloaded file plus its metadata, resolving filename
    /// collisions deterministically. Returns the path written.
    pub async fn persist_file(
        &self,
        url: &str,
        category: &str,
        bytes: &[u8],
        status_code: u16,
        headers: HashMap<String, String>,
        pdf_extraction: Option<PdfExtractionMeta>,
    ) -> Result<PathBuf> {
        let h = md5_hex(url);
        let category_dir = self.base_dir.join("files").join(category);
        fs::create_dir_all(&category_dir).await?;

        let filename = {
            let _guard = self.collision_lock.lock().await;
            let base_name = safe_filename(url, &h);
            resolve_collision(&category_dir, &base_name).await?
        };

        let filepath = category_dir.join(&filename);
        fs::write(&filepath, bytes).await.with_context(|| format!("writing file for {url}"))?;

        let metadata = FileMetadata {
            url: url.to_string(),
            filename,
            category: category.to_string(),
            size: bytes.len(),
            timestamp: chrono::Utc::now(),
            headers,
            status_code,
            filepath: filepath.to_string_lossy().to_string(),
            pdf_extraction,
        };
        self.write_json(self.base_dir.join("metadata").join(format!("{h}_file.json")), &metadata).await?;

        Ok(filepath)
    }
}

/// Derive a safe filename from the URL path's basename, falling back to
/// the content-hash when the path has none. Long names are truncated and
/// given an MD5 suffix to stay well under common filesystem limits.
fn safe_filename(url: &str, hash: &str) -> String {
    let basename = url::Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next_back().map(|s| s.to_string())))
        .filter(|s| !s.is_empty());

    let raw = basename.unwrap_or_else(|| format!("{hash}.unknown"));
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();

    const MAX_LEN: usize = 50;
    if sanitized.len() <= MAX_LEN {
        sanitized
    } else {
        let (stem, ext) = split_ext(&sanitized);
        let truncated: String = stem.chars().take(30).collect();
        format!("{truncated}_{hash}{ext}")
    }
}

fn split_ext(name: &str) -> (&str, String) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, format!(".{ext}")),
        _ => (name, String::new()),
    }
}

/// If `dir/name` exists, append `_<n>` before the extension, incrementing
/// `n` until a free path is found.
async fn resolve_collision(dir: &Path, name: &str) -> Result<String> {
    if !fs::try_exists(dir.join(name)).await.unwrap_or(false) {
        return Ok(name.to_string());
    }
    let (stem, ext) = split_ext(name);
    let mut n = 1u32;
    loop {
        let candidate = format!("{stem}_{n}{ext}");
        if !fs::try_exists(dir.join(&candidate)).await.unwrap_or(false) {
            return Ok(candidate);
        }
        n += 1;
    }
}
