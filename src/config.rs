//! Runtime configuration for chat-relay.
//!
//! Configuration is loaded from a JSON file (every field optional) and can be
//! overridden from the command line. The upstream credential never lives in
//! the file: it is read from the process environment at startup.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Default upstream chat-completions endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.fireworks.ai/inference/v1/chat/completions";

/// Environment variable holding the upstream credential.
pub const DEFAULT_API_KEY_ENV: &str = "FIREWORKS_API_KEY";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay", about = "Chat-completion relay for a hosted inference API")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "relay.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Upstream chat-completions URL (overrides the config file).
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Upstream inference API.
    pub upstream: UpstreamConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8080").
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream inference API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Chat-completions endpoint that requests are forwarded to.
    pub url: String,

    /// Name of the environment variable carrying the bearer credential.
    pub api_key_env: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Read the credential from the environment. Empty values count as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(listen) = &cli.listen {
            self.server.listen = listen.clone();
        }
        if let Some(url) = &cli.upstream_url {
            self.upstream.url = url.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
        assert_eq!(cfg.upstream.url, DEFAULT_UPSTREAM_URL);
        assert_eq!(cfg.upstream.api_key_env, "FIREWORKS_API_KEY");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.upstream.url, DEFAULT_UPSTREAM_URL);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"upstream": {{"url": "http://127.0.0.1:9000/v1/chat"}}}}"#).unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.upstream.url, "http://127.0.0.1:9000/v1/chat");
        assert_eq!(cfg.upstream.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "chat-relay",
            "--listen",
            "127.0.0.1:3000",
            "--upstream-url",
            "http://localhost:1/x",
        ]);
        let cfg = Config::default().with_cli_overrides(&cli);
        assert!(!cli.log_json);
        assert_eq!(cfg.server.listen, "127.0.0.1:3000");
        assert_eq!(cfg.upstream.url, "http://localhost:1/x");
    }

    #[test]
    fn test_log_json_flag() {
        let cli = Cli::parse_from(["chat-relay", "--log-json", "-v"]);
        assert!(cli.log_json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_empty_api_key_counts_as_unset() {
        let upstream = UpstreamConfig {
            api_key_env: "CHAT_RELAY_TEST_EMPTY_KEY".to_string(),
            ..UpstreamConfig::default()
        };
        std::env::set_var("CHAT_RELAY_TEST_EMPTY_KEY", "");
        assert_eq!(upstream.api_key(), None);

        std::env::set_var("CHAT_RELAY_TEST_EMPTY_KEY", "fw-secret");
        assert_eq!(upstream.api_key().as_deref(), Some("fw-secret"));
        std::env::remove_var("CHAT_RELAY_TEST_EMPTY_KEY");
    }
}
