use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    pub base_url: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: u64,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default = "default_true")]
    pub download_files: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchSettings {
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            request_delay_secs: default_request_delay(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProxyConfig {
    pub proxy_file: Option<String>,
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    #[serde(default = "default_health_url")]
    pub health_check_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub visited_db_path: Option<String>,
}

fn default_max_pages() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_concurrent_requests() -> usize {
    5
}
fn default_request_delay() -> f64 {
    0.1
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_update_interval() -> u64 {
    3600
}
fn default_health_url() -> String {
    "https://httpbin.org/ip".to_string()
}
