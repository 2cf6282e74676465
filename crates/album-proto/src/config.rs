use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;
use super::protocol::Severity;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Polls spent waiting on the oracle before the download click is retried.
    /// Each poll takes about half a second.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    #[serde(default = "default_oracle_url")]
    pub oracle_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// CSS selectors for the album viewer controls.  Update these with the
/// browser's developer tools when the site's class names change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_album_viewer")]
    pub album_viewer: String,
    #[serde(default = "default_download_button")]
    pub download_button: String,
    #[serde(default = "default_next_button")]
    pub next_button: String,
    #[serde(default = "default_info_button")]
    pub info_button: String,
    #[serde(default = "default_info_close_button")]
    pub info_close_button: String,
    /// Value cells of the info panel; the first is the file name, the second
    /// the capture date.
    #[serde(default = "default_media_field")]
    pub media_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// DevTools HTTP endpoint of a browser started with
    /// `--remote-debugging-port`.
    #[serde(default = "default_debugger_url")]
    pub debugger_url: String,
    #[serde(default = "default_page_url_contains")]
    pub page_url_contains: String,
    /// Opened in a new tab when no existing tab matches `page_url_contains`.
    #[serde(default = "default_album_url")]
    pub album_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Folder whose completed files are counted.
    #[serde(default = "platform::download_dir")]
    pub watch_dir: PathBuf,
    /// File name endings that mark a download still being written.
    #[serde(default = "default_partial_suffixes")]
    pub partial_suffixes: Vec<String>,
    /// Messages at or above this severity are echoed back to the driver.
    #[serde(default = "default_echo_level")]
    pub echo_level: Severity,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
            oracle_url: default_oracle_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            album_viewer: default_album_viewer(),
            download_button: default_download_button(),
            next_button: default_next_button(),
            info_button: default_info_button(),
            info_close_button: default_info_close_button(),
            media_field: default_media_field(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debugger_url: default_debugger_url(),
            page_url_contains: default_page_url_contains(),
            album_url: default_album_url(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            watch_dir: platform::download_dir(),
            partial_suffixes: default_partial_suffixes(),
            echo_level: default_echo_level(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_retry_budget() -> u32 {
    40
}

fn default_oracle_url() -> String {
    format!("http://localhost:{}", default_port())
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_album_viewer() -> String {
    ".viewer-3uWLw".to_string()
}

fn default_download_button() -> String {
    ".icon-download-2-nI1".to_string()
}

fn default_next_button() -> String {
    ".ico-next-4KyWW.center-S44vV".to_string()
}

fn default_info_button() -> String {
    ".icon-info-2yKNU".to_string()
}

fn default_info_close_button() -> String {
    ".ico-close-3WH4i".to_string()
}

fn default_media_field() -> String {
    ".value-2QSQC".to_string()
}

fn default_debugger_url() -> String {
    "http://127.0.0.1:9222".to_string()
}

fn default_page_url_contains() -> String {
    "i.mi.com".to_string()
}

fn default_album_url() -> String {
    "https://us.i.mi.com/gallery/".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    50001
}

fn default_partial_suffixes() -> Vec<String> {
    vec!["crdownload".to_string()]
}

fn default_echo_level() -> Severity {
    Severity::Info
}

fn default_log_dir() -> PathBuf {
    platform::data_dir().join("logs")
}

impl Config {
    /// Loads the user config, writing the defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
