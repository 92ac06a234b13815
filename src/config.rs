//! Centralized configuration management for sonata-admin

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

/// Deployment the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Everything short of production shows the BETA banner
    pub fn is_beta(&self) -> bool {
        *self != Environment::Production
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" | "" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow::anyhow!(
                "Unsupported ENVIRONMENT: {}. Supported values: local, staging, production",
                other
            )),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Scheme of the API (`http` or `https`)
    pub api_protocol: String,
    /// Host and optional port of the API
    pub api_host: String,
    pub environment: Environment,
    /// File holding persisted preferences (dark mode, session token)
    pub prefs_path: PathBuf,
    /// Page size requested from list endpoints
    pub results_per_page: u32,
    /// Filter debounce windows
    pub debounce: DebounceConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Quiet periods before a filter edit is applied (milliseconds)
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    pub text_filter_ms: u64,
    pub select_filter_ms: u64,
    pub arithmetic_filter_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            text_filter_ms: 800,
            select_filter_ms: 500,
            arithmetic_filter_ms: 800,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "sonata-admin/0.1.0".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let api_protocol = std::env::var("API_PROTOCOL").unwrap_or_else(|_| "http".to_string());
        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string());

        let environment = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;

        let prefs_path = std::env::var("SONATA_PREFS_PATH")
            .unwrap_or_else(|_| "./sonata-admin.prefs.json".to_string())
            .into();

        let defaults = DebounceConfig::default();
        let debounce = DebounceConfig {
            text_filter_ms: parse_env_var("SONATA_TEXT_FILTER_DEBOUNCE_MS")?
                .unwrap_or(defaults.text_filter_ms),
            select_filter_ms: parse_env_var("SONATA_SELECT_FILTER_DEBOUNCE_MS")?
                .unwrap_or(defaults.select_filter_ms),
            arithmetic_filter_ms: parse_env_var("SONATA_ARITHMETIC_FILTER_DEBOUNCE_MS")?
                .unwrap_or(defaults.arithmetic_filter_ms),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("SONATA_HTTP_TIMEOUT_SECONDS")?.unwrap_or(30),
            user_agent: std::env::var("SONATA_USER_AGENT")
                .unwrap_or_else(|_| "sonata-admin/0.1.0".to_string()),
        };

        Ok(Config {
            api_protocol,
            api_host,
            environment,
            prefs_path,
            results_per_page: parse_env_var("SONATA_RESULTS_PER_PAGE")?.unwrap_or(1000),
            debounce,
            http,
        })
    }

    /// Base URL every route is appended to
    pub fn api_base_url(&self) -> String {
        format!(
            "{}://{}",
            self.api_protocol.trim_end_matches("://"),
            self.api_host.trim_end_matches('/')
        )
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn text_filter_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce.text_filter_ms)
    }

    pub fn select_filter_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce.select_filter_ms)
    }

    pub fn arithmetic_filter_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce.arithmetic_filter_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.api_protocol.as_str() {
            "http" | "https" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "API_PROTOCOL must be http or https, got '{}'",
                    other
                ))
            }
        }

        if self.api_host.trim().is_empty() {
            return Err(anyhow::anyhow!("API_HOST must not be empty"));
        }

        if self.results_per_page == 0 {
            return Err(anyhow::anyhow!("SONATA_RESULTS_PER_PAGE must be at least 1"));
        }

        // Check if parent directory of the preferences file exists
        if let Some(parent) = self.prefs_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create preferences directory: {}", parent.display())
                })?;
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            api_protocol: "https".to_string(),
            api_host: "api.school.test/".to_string(),
            environment: Environment::Production,
            prefs_path: "./prefs.json".into(),
            results_per_page: 100,
            debounce: DebounceConfig::default(),
            http: HttpConfig::default(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.debounce.text_filter_ms, 800);
        assert_eq!(config.debounce.select_filter_ms, 500);
        assert_eq!(config.http.timeout_seconds, 30);
    }

    #[test]
    fn test_base_url_is_built_from_protocol_and_host() {
        assert_eq!(sample().api_base_url(), "https://api.school.test");
    }

    #[test]
    fn test_environment_parsing_and_beta_banner() {
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert!(Environment::Local.is_beta());
        assert!(Environment::Staging.is_beta());
        assert!(!Environment::Production.is_beta());
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_config_validation() {
        sample().validate().unwrap();

        let mut bad = sample();
        bad.api_protocol = "ftp".to_string();
        assert!(bad.validate().is_err());
    }
}
