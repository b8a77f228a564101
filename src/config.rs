use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

pub const KNOWN_LENSES: [&str; 3] = ["quadrants", "levels", "states"];

/// Main configuration structure loaded from integral_lens.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    /// Per-lens overrides keyed by lens name
    pub lenses: HashMap<String, LensOverride>,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8788)),
        }
    }
}

/// Completion service endpoint and request bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub path: String,
    pub timeout_ms: u64,
    /// Model used by every lens unless overridden per lens
    pub default_model: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            path: "/v1/responses".to_string(),
            timeout_ms: 30_000,
            default_model: None,
        }
    }
}

impl UpstreamConfig {
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LensOverride {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub instructions: Option<String>,
}

/// Runtime configuration loaded from environment variables
#[derive(Clone)]
pub struct RuntimeConfig {
    pub api_key: Option<String>,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            log_level: "integral_lens=info,tower_http=info".to_string(),
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "integral_lens=info,tower_http=info".to_string()),
        }
    }
}

impl Config {
    /// Populate the process environment from LENS_ENV_FILE or `.env`.
    /// Variables already set are left alone, so calling this twice is harmless.
    pub fn load_env_file() {
        if let Ok(env_path) = std::env::var("LENS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }
    }

    /// Load configuration from TOML file and environment variables
    /// Uses INTEGRAL_LENS_CONFIG environment variable or defaults to "integral_lens.toml"
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        let config_path = std::env::var("INTEGRAL_LENS_CONFIG")
            .unwrap_or_else(|_| "integral_lens.toml".to_string());

        let mut config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LENS_HTTP_BIND") {
            match v.parse::<SocketAddr>() {
                Ok(bind) => self.server.http_bind = bind,
                Err(_) => tracing::warn!("Ignoring unparseable LENS_HTTP_BIND '{}'", v),
            }
        }
        if let Ok(url) = std::env::var("LENS_UPSTREAM_URL") {
            self.upstream.base_url = url;
            tracing::debug!("LENS_UPSTREAM_URL env override applied");
        }
        if let Ok(path) = std::env::var("LENS_UPSTREAM_PATH") {
            self.upstream.path = path;
        }
        if let Some(timeout) = std::env::var("LENS_UPSTREAM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.upstream.timeout_ms = timeout;
        }
        if let Ok(model) = std::env::var("LENS_MODEL")
            && !model.trim().is_empty()
        {
            self.upstream.default_model = Some(model);
        }
    }

    /// Clamp out-of-range values and reject ones that cannot be repaired
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if !self.upstream.base_url.starts_with("https://")
            && !self.upstream.base_url.starts_with("http://")
        {
            anyhow::bail!(
                "Upstream base URL '{}' must start with http:// or https://",
                self.upstream.base_url
            );
        }
        if !self.upstream.base_url.starts_with("https://") {
            tracing::warn!(
                "Upstream base URL '{}' is not HTTPS; the credential will travel in clear text",
                self.upstream.base_url
            );
        }

        let clamped = self.upstream.timeout_ms.clamp(1_000, 300_000);
        if clamped != self.upstream.timeout_ms {
            tracing::warn!(
                "upstream timeout {}ms out of range, clamping to {}ms",
                self.upstream.timeout_ms,
                clamped
            );
            self.upstream.timeout_ms = clamped;
        }

        for (name, over) in self.lenses.iter_mut() {
            if !KNOWN_LENSES.contains(&name.as_str()) {
                tracing::warn!("Override for unknown lens '{}' will be ignored", name);
            }
            if let Some(t) = over.temperature
                && !(0.0..=2.0).contains(&t)
            {
                tracing::warn!("temperature {} for lens '{}' clamped to [0, 2]", t, name);
                over.temperature = Some(t.clamp(0.0, 2.0));
            }
            if over.max_output_tokens == Some(0) {
                anyhow::bail!("max_output_tokens for lens '{}' must be > 0", name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_parse() {
        let toml = r#"
            [server]
            http_bind = "0.0.0.0:9000"

            [upstream]
            timeout_ms = 45000
            default_model = "gpt-5"

            [lenses.levels]
            temperature = 0.7
            max_output_tokens = 2500
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.server.http_bind.port(), 9000);
        assert_eq!(config.upstream.timeout_ms, 45_000);
        assert_eq!(config.upstream.base_url, "https://api.openai.com");
        let levels = config.lenses.get("levels").unwrap();
        assert_eq!(levels.max_output_tokens, Some(2500));
        assert!(levels.model.is_none());
    }

    #[test]
    fn test_upstream_url_joins_cleanly() {
        let mut upstream = UpstreamConfig::default();
        assert_eq!(upstream.url(), "https://api.openai.com/v1/responses");
        upstream.base_url = "http://127.0.0.1:9999/".to_string();
        upstream.path = "v1/responses".to_string();
        assert_eq!(upstream.url(), "http://127.0.0.1:9999/v1/responses");
    }

    #[test]
    fn test_validate_clamps_timeout_and_temperature() {
        let mut config = Config::default();
        config.upstream.timeout_ms = 5;
        config.lenses.insert(
            "states".to_string(),
            LensOverride {
                temperature: Some(3.5),
                ..Default::default()
            },
        );
        config.validate().unwrap();
        assert_eq!(config.upstream.timeout_ms, 1_000);
        assert_eq!(config.lenses["states"].temperature, Some(2.0));
    }

    #[test]
    fn test_validate_rejects_zero_token_budget() {
        let mut config = Config::default();
        config.lenses.insert(
            "quadrants".to_string(),
            LensOverride {
                max_output_tokens: Some(0),
                ..Default::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_upstream() {
        let mut config = Config::default();
        config.upstream.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_runtime_debug_redacts_key() {
        let runtime = RuntimeConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", runtime);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("redacted"));
    }
}
