use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::classifier::ModelSource;
use crate::market::FeedSettings;

pub const DEFAULT_PRICE_API_KEY: &str = "579b464db66ec23bdd000001cdd3946e44ce4aad7209ff7b23ac571b";
pub const DEFAULT_PRICE_BASE_URL: &str =
    "https://api.data.gov.in/resource/9ef84268-d588-465a-a308-a864a43d0070";

/// Artifact file names probed in every search directory, in order.
pub const MODEL_FILE_NAMES: [&str; 3] = ["trained_model.json", "plant_disease_model.json", "AgriShield.json"];

/// AgriShield plant disease API
#[derive(Parser, Debug, Clone)]
#[command(name = "agrishield")]
#[command(version)]
#[command(about = "Plant disease recognition API with a commodity price feed")]
pub struct Config {
    /// Host to bind to
    #[arg(long, env = "AGRISHIELD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Explicit model artifact, tried before the search directories
    #[arg(long, env = "AGRISHIELD_MODEL")]
    pub model: Option<PathBuf>,

    /// Directory searched for model artifacts (also its `models/` subdirectory)
    #[arg(long, env = "AGRISHIELD_MODEL_DIR", default_value = ".")]
    pub model_dir: PathBuf,

    /// Where to fetch the artifact from when none exists locally
    #[arg(long, env = "MODEL_DOWNLOAD_URL")]
    pub model_download_url: Option<String>,

    /// API key for the commodity price feed
    #[arg(long, env = "AGMARKNET_API_KEY", default_value = DEFAULT_PRICE_API_KEY, hide_env_values = true)]
    pub price_api_key: String,

    /// Commodity price feed endpoint
    #[arg(long, env = "AGMARKNET_BASE_URL", default_value = DEFAULT_PRICE_BASE_URL)]
    pub price_base_url: String,

    /// Maximum number of records requested from the price feed
    #[arg(long, env = "AGMARKNET_LIMIT", default_value_t = 10)]
    pub price_limit: u32,

    /// Price feed request timeout in seconds
    #[arg(long, env = "AGMARKNET_TIMEOUT_SECS", default_value_t = 10)]
    pub price_timeout_secs: u64,

    /// Load the model before accepting requests instead of on first use
    #[arg(long, env = "AGRISHIELD_PRELOAD")]
    pub preload: bool,

    /// Enable debug logging
    #[arg(short, long, env = "AGRISHIELD_VERBOSE")]
    pub verbose: bool,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ordered artifact candidates: the explicit path, then every file name
    /// in `model_dir` and `model_dir/models`.
    pub fn model_candidates(&self) -> Vec<PathBuf> {
        let search_dirs = [self.model_dir.clone(), self.model_dir.join("models")];
        self.model
            .iter()
            .cloned()
            .chain(
                search_dirs
                    .iter()
                    .flat_map(|dir| MODEL_FILE_NAMES.iter().map(move |name| dir.join(name))),
            )
            .collect()
    }

    pub fn model_source(&self) -> ModelSource {
        ModelSource {
            candidates: self.model_candidates(),
            // An empty env var means "not configured".
            download_url: self
                .model_download_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            base_url: self.price_base_url.clone(),
            api_key: self.price_api_key.clone(),
            limit: self.price_limit,
            timeout: Duration::from_secs(self.price_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_model_comes_first() {
        let config = Config::parse_from([
            "agrishield",
            "--model",
            "/opt/custom.json",
            "--model-dir",
            "/srv/app",
        ]);
        let candidates = config.model_candidates();
        assert_eq!(candidates.len(), 7);
        assert_eq!(candidates[0], PathBuf::from("/opt/custom.json"));
        assert_eq!(candidates[1], PathBuf::from("/srv/app/trained_model.json"));
        assert_eq!(candidates[4], PathBuf::from("/srv/app/models/trained_model.json"));
    }

    #[test]
    fn blank_download_url_is_ignored() {
        let config = Config::parse_from(["agrishield", "--model-download-url", " "]);
        assert!(config.model_source().download_url.is_none());
        let config = Config::parse_from(["agrishield", "--model-download-url", "https://example.com/m.json"]);
        assert_eq!(
            config.model_source().download_url.as_deref(),
            Some("https://example.com/m.json")
        );
    }

    #[test]
    fn feed_settings_follow_flags() {
        let config = Config::parse_from([
            "agrishield",
            "--price-base-url",
            "http://localhost:1234/prices",
            "--price-limit",
            "25",
            "--price-timeout-secs",
            "3",
            "--port",
            "8080",
        ]);
        let feed = config.feed_settings();
        assert_eq!(feed.base_url, "http://localhost:1234/prices");
        assert_eq!(feed.limit, 25);
        assert_eq!(feed.timeout, Duration::from_secs(3));
        assert!(config.bind_addr().ends_with(":8080"));
    }
}
