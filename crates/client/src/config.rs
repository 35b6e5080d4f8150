//! Client configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use storefront_shared::{PageRequest, CHAT_ENDPOINT, DEFAULT_RECONNECT_DELAY_MS};

pub const DEFAULT_API_URL: &str = "http://localhost:9900";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the REST backend, e.g. `http://localhost:9900`.
    pub api_url: String,
    /// Path of the chat broker endpoint on the same origin.
    pub chat_path: String,
    /// Fixed delay between chat reconnect attempts.
    pub reconnect_delay: Duration,
    pub page_size: u32,
    /// Overrides the platform config dir for durable session storage.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            chat_path: CHAT_ENDPOINT.to_string(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            page_size: PageRequest::DEFAULT_SIZE,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment.
    ///
    /// Environment variables:
    /// - `STOREFRONT_API_URL`: backend origin (default: "http://localhost:9900")
    /// - `STOREFRONT_CHAT_PATH`: chat broker path (default: "/chat")
    /// - `STOREFRONT_RECONNECT_DELAY_MS`: chat reconnect delay (default: 5000)
    /// - `STOREFRONT_PAGE_SIZE`: catalog page size (default: 10)
    /// - `STOREFRONT_DATA_DIR`: directory for the session store (default: platform config dir)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("STOREFRONT_API_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let chat_path = lookup("STOREFRONT_CHAT_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.chat_path);

        let reconnect_delay = lookup("STOREFRONT_RECONNECT_DELAY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_delay);

        let page_size = lookup("STOREFRONT_PAGE_SIZE")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.page_size);

        let data_dir = lookup("STOREFRONT_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            api_url,
            chat_path,
            reconnect_delay,
            page_size,
            data_dir,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn first_page(&self) -> PageRequest {
        PageRequest::first(self.page_size)
    }

    /// Chat broker URL: the API origin with its scheme switched to ws/wss.
    pub fn ws_url(&self) -> String {
        let path = if self.chat_path.starts_with('/') {
            self.chat_path.clone()
        } else {
            format!("/{}", self.chat_path)
        };

        match url::Url::parse(&self.api_url) {
            Ok(mut url) => {
                let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
                // http(s) -> ws(s) is always an allowed special-scheme swap
                let _ = url.set_scheme(scheme);
                url.set_path(&path);
                url.to_string()
            }
            Err(_) => {
                let base = self.api_url.trim_end_matches('/');
                if let Some(rest) = base.strip_prefix("https://") {
                    format!("wss://{rest}{path}")
                } else if let Some(rest) = base.strip_prefix("http://") {
                    format!("ws://{rest}{path}")
                } else {
                    format!("{base}{path}")
                }
            }
        }
    }

    /// `host[:port]` of the backend, sent in the STOMP CONNECT frame.
    pub fn broker_host(&self) -> String {
        match url::Url::parse(&self.api_url) {
            Ok(url) => match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                _ => "localhost".to_string(),
            },
            Err(_) => "localhost".to_string(),
        }
    }
}
