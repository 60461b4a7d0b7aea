use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::utils::get_env_with_prefix;

/// Main configuration for a Tallyward service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(skip)]
    pub auth: AuthConfig,
    #[serde(skip)]
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Token verification settings.
///
/// The signing secret is kept in a [`SecretString`] so it never shows up
/// in debug output or serialized config.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: u64,
}

/// Payment gateway and checkout settings.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub api_key: SecretString,
    pub webhook_secret: SecretString,
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new()),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::new(String::new()),
            webhook_secret: SecretString::new(String::new()),
            success_url: "http://localhost:8000/checkout/success".to_string(),
            cancel_url: "http://localhost:8000/checkout/cancelled".to_string(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB default, signup and webhook payloads are small
}

fn default_token_ttl() -> u64 {
    3600
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set the maximum request body size in bytes
    ///
    /// # Example
    ///
    /// ```rust
    /// use tallyward::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .with_max_body_size(512 * 1024)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.config.auth.jwt_secret = secret.into();
        self
    }

    pub fn with_token_ttl_seconds(mut self, ttl: u64) -> Self {
        self.config.auth.token_ttl_seconds = ttl;
        self
    }

    pub fn with_billing_api_key(mut self, key: impl Into<SecretString>) -> Self {
        self.config.billing.api_key = key.into();
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.config.billing.webhook_secret = secret.into();
        self
    }

    pub fn with_checkout_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.config.billing.success_url = success_url.into();
        self.config.billing.cancel_url = cancel_url.into();
        self
    }

    /// Load configuration from environment variables with TALLYWARD_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // Check TALLYWARD_PORT first, fall back to PORT (for Railway/Heroku compatibility)
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        if let Some(secret) = get_env_with_prefix("JWT_SECRET") {
            self.config.auth.jwt_secret = secret.into();
        }
        if let Some(ttl) = get_env_with_prefix("TOKEN_TTL_SECONDS") {
            if let Ok(t) = ttl.parse() {
                self.config.auth.token_ttl_seconds = t;
            }
        }

        if let Some(key) = get_env_with_prefix("BILLING_API_KEY") {
            self.config.billing.api_key = key.into();
        }
        if let Some(secret) = get_env_with_prefix("BILLING_WEBHOOK_SECRET") {
            self.config.billing.webhook_secret = secret.into();
        }
        if let Some(url) = get_env_with_prefix("CHECKOUT_SUCCESS_URL") {
            self.config.billing.success_url = url;
        }
        if let Some(url) = get_env_with_prefix("CHECKOUT_CANCEL_URL") {
            self.config.billing.cancel_url = url;
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port)
    /// - Invalid log level
    /// - Token TTL of zero
    /// - Checkout redirect URLs without an http(s) scheme
    pub fn build(self) -> crate::error::Result<Config> {
        // Validate server address
        self.config.server.addr().map_err(|e| {
            crate::error::TallywardError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(crate::error::TallywardError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate port is in valid range
        if self.config.server.port == 0 {
            return Err(crate::error::TallywardError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        // Validate max body size
        if self.config.server.max_body_size == 0 {
            return Err(crate::error::TallywardError::bad_request(
                "Maximum body size must be greater than 0",
            ));
        }

        if self.config.auth.token_ttl_seconds == 0 {
            return Err(crate::error::TallywardError::bad_request(
                "Token TTL must be greater than 0",
            ));
        }

        for url in [
            &self.config.billing.success_url,
            &self.config.billing.cancel_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(crate::error::TallywardError::bad_request(format!(
                    "Checkout redirect URL must use http or https: {}",
                    url
                )));
            }
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
