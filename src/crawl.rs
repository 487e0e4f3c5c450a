use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dashmap::DashSet;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use sitecrawler_core::{AppConfig, CanonicalUrl, ClassifyAction, FetchConfig, VisitedStatus};
use sitecrawler_fetch::{Fetcher, ProxyRotator};
use sitecrawler_frontier::{Frontier, VisitedSet};
use sitecrawler_parser::{classify, html::parse_html, md5_hex, sitemap};
use sitecrawler_pdf::PdfExtractor;
use sitecrawler_storage::{Persister, RunRecorder, SqliteVisitedStore};

pub async fn run_crawl(config: AppConfig) -> Result<()> {
    let base_url = Url::parse(&config.general.base_url)?;
    let domain = base_url.host_str().ok_or_else(|| anyhow::anyhow!("base_url has no host"))?.to_string();

    let data_dir = config.storage.data_dir.clone().unwrap_or_else(|| "crawled_data".to_string());
    let site_dir = std::path::Path::new(&data_dir).join(&domain);
    let persister = Arc::new(Persister::new(&site_dir).await?);
    let recorder = Arc::new(RunRecorder::new());

    let visited = Arc::new(VisitedSet::new());
    let durable = match &config.storage.visited_db_path {
        Some(path) => {
            let store = SqliteVisitedStore::open(path).await?;
            for (url, status) in store.load_all().await? {
                visited.mark_seen(&url, status);
            }
            Some(Arc::new(store))
        }
        None => None,
    };

    let frontier = Arc::new(Frontier::new(
        Arc::clone(&visited),
        config.general.max_pages,
        config.general.max_depth,
    ));

    let proxy = Arc::new(match &config.proxy.proxy_file {
        Some(path) => {
            ProxyRotator::load_file(
                path,
                Duration::from_secs(config.proxy.update_interval_secs),
                config.proxy.health_check_url.clone(),
            )
            .await
        }
        None => ProxyRotator::new(
            Vec::new(),
            Duration::from_secs(config.proxy.update_interval_secs),
            config.proxy.health_check_url.clone(),
        ),
    });

    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(config.fetch.timeout_secs),
        ..FetchConfig::default()
    };
    let request_delay = Duration::from_secs_f64(config.fetch.request_delay_secs);
    let fetcher = Arc::new(Fetcher::new(fetch_config, config.fetch.max_retries, request_delay, Arc::clone(&proxy)));

    let pdf_extractor = Arc::new(PdfExtractor::default());
    let content_hashes: Arc<DashSet<String>> = Arc::new(DashSet::new());

    // Seed from base_url, then from robots.txt + sitemap(s). A zero page
    // budget means no fetches at all, not even for seeding.
    if config.general.max_pages > 0 {
        let seed = CanonicalUrl(base_url.to_string());
        frontier.push_seed(seed).await;
        seed_from_sitemaps(&frontier, &fetcher, &base_url, &domain).await;
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    info!(base_url = %config.general.base_url, concurrent_requests = config.fetch.concurrent_requests, "starting crawl");

    let mut worker_handles = Vec::new();
    for worker_id in 0..config.fetch.concurrent_requests {
        let frontier = Arc::clone(&frontier);
        let fetcher = Arc::clone(&fetcher);
        let persister = Arc::clone(&persister);
        let recorder = Arc::clone(&recorder);
        let pdf_extractor = Arc::clone(&pdf_extractor);
        let content_hashes = Arc::clone(&content_hashes);
        let durable = durable.clone();
        let domain = domain.clone();
        let download_files = config.general.download_files;
        let mut shutdown = shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                if shutdown.try_recv().is_ok() {
                    info!(worker_id, "worker stopping on shutdown signal");
                    break;
                }
                if frontier.is_done().await {
                    break;
                }

                let batch = frontier.pop_batch(1).await;
                let Some(entry) = batch.into_iter().next() else {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                };

                let status = process_url(
                    worker_id,
                    &entry.url,
                    entry.depth,
                    &domain,
                    download_files,
                    &frontier,
                    &fetcher,
                    &persister,
                    &recorder,
                    &pdf_extractor,
                    &content_hashes,
                )
                .await;

                if let Some(store) = &durable {
                    let _ = store.record(entry.url.as_str(), status).await;
                }
                frontier.mark_done(status, &entry.url);

                fetcher.politeness_sleep().await;
            }
        });
        worker_handles.push(handle);
    }

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, waiting for in-flight fetches to finish");
            let _ = shutdown_tx.send(());
        }
        _ = wait_for_completion(Arc::clone(&frontier)) => {
            info!("frontier exhausted");
        }
    }

    for handle in worker_handles {
        let _ = handle.await;
    }

    recorder.record_proxy(proxy.rotations(), proxy.successes(), proxy.failures());
    for failed in frontier.visited().failed_urls() {
        recorder.record_error(Some(&failed));
    }
    recorder.finish_and_write(&site_dir).await?;

    info!(claimed = frontier.claimed_count(), "crawl complete");
    Ok(())
}

async fn wait_for_completion(frontier: Arc<Frontier>) {
    loop {
        if frontier.is_done().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn process_url(
    worker_id: usize,
    url: &CanonicalUrl,
    depth: u32,
    domain: &str,
    download_files: bool,
    frontier: &Frontier,
    fetcher: &Fetcher,
    persister: &Persister,
    recorder: &RunRecorder,
    pdf_extractor: &PdfExtractor,
    content_hashes: &DashSet<String>,
) -> VisitedStatus {
    let Ok(parsed) = Url::parse(url.as_str()) else {
        return VisitedStatus::Failed;
    };

    let action = classify(parsed.path());
    info!(worker_id, url = url.as_str(), depth, action = ?action, "processing");

    match action {
        ClassifyAction::CrawlPage => fetch_and_crawl_page(url, &parsed, depth, domain, frontier, fetcher, persister, recorder, content_hashes).await,
        ClassifyAction::DownloadFile(category) if download_files => {
            fetch_and_store_file(url, category, fetcher, persister, recorder, pdf_extractor).await
        }
        ClassifyAction::DownloadFile(_) => VisitedStatus::Ok,
    }
}

async fn fetch_and_crawl_page(
    url: &CanonicalUrl,
    parsed: &Url,
    depth: u32,
    domain: &str,
    frontier: &Frontier,
    fetcher: &Fetcher,
    persister: &Persister,
    recorder: &RunRecorder,
    content_hashes: &DashSet<String>,
) -> VisitedStatus {
    let resp = match fetcher.fetch(url.as_str()).await {
        Ok(r) => r,
        Err(e) => {
            warn!(url = url.as_str(), error = %e, "fetch failed permanently");
            return VisitedStatus::Failed;
        }
    };

    let is_html = resp.content_type.as_deref().map(|ct| ct.contains("html")).unwrap_or(true);
    if !is_html {
        return VisitedStatus::Ok;
    }

    let body_str = String::from_utf8_lossy(&resp.body);
    let digest = md5_hex(body_str.as_bytes());
    if !content_hashes.insert(digest) {
        return VisitedStatus::Ok;
    }

    let final_url = Url::parse(&resp.final_url).unwrap_or_else(|_| parsed.clone());
    let extract = parse_html(&body_str, &final_url);

    if let Err(e) = persister
        .persist_page(url.as_str(), extract.title.clone(), &extract.body_text, resp.status, resp.headers.clone())
        .await
    {
        warn!(url = url.as_str(), error = %e, "persist failed");
        return VisitedStatus::Failed;
    }
    recorder.record_page();

    for link in extract.links {
        if let Ok(link_url) = Url::parse(&link) {
            if !sitecrawler_core::is_valid_url(&link_url, domain) {
                continue;
            }
        }
        frontier.push(CanonicalUrl(link), depth + 1).await;
    }

    VisitedStatus::Ok
}

async fn fetch_and_store_file(
    url: &CanonicalUrl,
    category: sitecrawler_core::FileCategory,
    fetcher: &Fetcher,
    persister: &Persister,
    recorder: &RunRecorder,
    pdf_extractor: &PdfExtractor,
) -> VisitedStatus {
    let resp = match fetcher.fetch_streamed(url.as_str()).await {
        Ok(r) => r,
        Err(e) => {
            warn!(url = url.as_str(), error = %e, "file fetch failed permanently");
            return VisitedStatus::Failed;
        }
    };

    let is_pdf = matches!(category, sitecrawler_core::FileCategory::Document) && url.as_str().to_lowercase().ends_with(".pdf");
    let pdf_meta = if is_pdf {
        match pdf_extractor.extract(&resp.body) {
            Some(extraction) => {
                let text_path = persister.persist_pdf_text(url.as_str(), &extraction.text).await.ok();
                recorder.record_pdf(true, Some(&extraction.backend));
                let text_length = extraction.text.len();
                text_path.map(move |path| sitecrawler_core::PdfExtraction {
                    backend: extraction.backend,
                    text_length,
                    text_path: path,
                })
            }
            None => {
                recorder.record_pdf(false, None);
                None
            }
        }
    } else {
        None
    };

    match persister
        .persist_file(url.as_str(), category.as_str(), &resp.body, resp.status, resp.headers.clone(), pdf_meta)
        .await
    {
        Ok(_) => {
            recorder.record_file(category.as_str());
            VisitedStatus::Ok
        }
        Err(e) => {
            warn!(url = url.as_str(), error = %e, "file persist failed");
            VisitedStatus::Failed
        }
    }
}

/// Seed the frontier from `/robots.txt` sitemap directives and, for each
/// sitemap found, the `<url><loc>` entries inside it. Failures here only
/// shrink the seed set — they never abort the crawl.
async fn seed_from_sitemaps(frontier: &Frontier, fetcher: &Fetcher, base_url: &Url, domain: &str) {
    let robots_url = format!("{}://{}/robots.txt", base_url.scheme(), domain);
    let Ok(robots_resp) = fetcher.fetch(&robots_url).await else {
        return;
    };
    let body = String::from_utf8_lossy(&robots_resp.body);
    let sitemap_urls = sitemap::parse_robots_txt(&body);

    for sitemap_url in sitemap_urls {
        let Ok(resp) = fetcher.fetch(&sitemap_url).await else { continue };
        if !sitemap::content_type_is_xml(resp.content_type.as_deref()) {
            continue;
        }
        let body = String::from_utf8_lossy(&resp.body);
        let locs = sitemap::parse_sitemap_xml(&body);
        let mut added = 0;
        for loc in locs {
            if let Ok(parsed) = Url::parse(&loc) {
                if parsed.host_str() == Some(domain) {
                    if frontier.push_seed(CanonicalUrl(loc)).await {
                        added += 1;
                    }
                }
            }
        }
        if added > 0 {
            info!(sitemap_url, added, "seeded from sitemap");
        }
    }
}
