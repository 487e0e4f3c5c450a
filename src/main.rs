mod cli;
mod crawl;

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// mimalloc avoids the memory bloat glibc's allocator shows under the high
// concurrency a crawl's worker pool produces.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use sitecrawler_core::config::AppConfig;

use crate::cli::{Cli, Commands};
use crate::crawl::run_crawl;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using built-in defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;

    let data_dir = config.storage.data_dir.clone().unwrap_or_else(|| "crawled_data".to_string());

    // Every run gets a log file next to its corpus, in addition to stderr.
    std::fs::create_dir_all(&data_dir).ok();
    let file_appender = tracing_appender::rolling::never(&data_dir, "crawl.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    match cli.command {
        Commands::Crawl { base_url, max_pages, max_depth, concurrent_requests, proxy_file, no_files } => {
            if let Some(base_url) = base_url {
                config.general.base_url = base_url;
            }
            if let Some(max_pages) = max_pages {
                config.general.max_pages = max_pages;
            }
            if max_depth.is_some() {
                config.general.max_depth = max_depth;
            }
            if let Some(n) = concurrent_requests {
                config.fetch.concurrent_requests = n;
            }
            if proxy_file.is_some() {
                config.proxy.proxy_file = proxy_file;
            }
            if no_files {
                config.general.download_files = false;
            }
            run_crawl(config).await?;
        }
        Commands::Stats { path } => {
            let path = path.unwrap_or_else(|| format!("{data_dir}/crawl_stats.json"));
            let contents = std::fs::read_to_string(&path)?;
            let value: serde_json::Value = serde_json::from_str(&contents)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
