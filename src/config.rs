use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Server settings, read from the environment (`.env` is loaded by the binary).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Origin of the web frontend allowed by CORS
    pub allowed_origin: String,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Recipe generation is disabled when this is unset.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let defaults = OpenAiConfig::default();
        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "127.0.0.1")?,
            port: try_load("PORT", "8080")?,
            allowed_origin: try_load("ALLOWED_ORIGIN", "http://localhost:3000")?,
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY").ok().filter(|key| !key.trim().is_empty()),
                base_url: try_load("OPENAI_BASE_URL", &defaults.base_url)?,
                model: try_load("OPENAI_MODEL", &defaults.model)?,
            },
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        tracing::info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| {
            tracing::warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("{e}")
        })
        .with_context(|| format!("invalid value for {key}: {raw}"))
}

#[test]
fn test_try_load() {
    let port: u16 = try_load("HALAL_FINDER_TEST_UNSET_PORT", "8080").unwrap();
    assert_eq!(port, 8080);
    assert!(try_load::<u16>("HALAL_FINDER_TEST_UNSET_PORT", "not a port").is_err());
}
