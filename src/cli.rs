use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sitecrawler", about = "Single-site breadth-first web crawler")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl a site starting from its base URL
    Crawl {
        /// Seed URL; overrides general.base_url from the config file
        #[arg(long)]
        base_url: Option<String>,

        /// Maximum number of pages to claim before stopping
        #[arg(long)]
        max_pages: Option<u64>,

        /// Maximum BFS depth from the seed
        #[arg(long)]
        max_depth: Option<u32>,

        /// Worker pool width
        #[arg(long)]
        concurrent_requests: Option<usize>,

        /// Path to a line-oriented proxy list (ip:port:user:pass)
        #[arg(long)]
        proxy_file: Option<String>,

        /// Disable the downloadable-file pipeline
        #[arg(long)]
        no_files: bool,
    },
    /// Print the summary from a previous run's crawl_stats.json
    Stats {
        /// Path to crawl_stats.json (defaults to <data_dir>/crawl_stats.json)
        #[arg(long)]
        path: Option<String>,
    },
}
