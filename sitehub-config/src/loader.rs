//! Configuration loading and environment variable handling

use crate::domains::SitehubConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "SITEHUB".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<SitehubConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: SitehubConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<SitehubConfig> {
        let mut config = SitehubConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<SitehubConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut SitehubConfig) -> ConfigResult<()> {
        if let Ok(bind) = self.get_env_var("SERVER_BIND_ADDRESS") {
            config.server.bind_address = bind;
        }

        if let Ok(port) = self.get_env_var("SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SERVER_PORT: {}", e)))?;
        }

        if let Ok(environment) = self.get_env_var("ENVIRONMENT") {
            config.server.environment = parse_enum(&environment, "ENVIRONMENT")?;
        }

        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.registry_database.url = url;
        }

        if let Ok(url) = self.get_env_var("ADMIN_DATABASE_URL") {
            config.admin_database.url = url;
        }

        if let Ok(host) = self.get_env_var("DB_HOST") {
            config.provisioning.db_host = host;
        }

        if let Ok(port) = self.get_env_var("DB_PORT") {
            config.provisioning.db_port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid DB_PORT: {}", e)))?;
        }

        if let Ok(base_domain) = self.get_env_var("BASE_DOMAIN") {
            config.provisioning.base_domain = base_domain.to_lowercase();
        }

        if let Ok(secret) = self.get_env_var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }

        if let Ok(policy) = self.get_env_var("HOST_BINDING") {
            config.auth.host_binding = parse_enum(&policy, "HOST_BINDING")?;
        }

        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = parse_enum(&log_level, "LOG_LEVEL")?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.logging.format = parse_enum(&format, "LOG_FORMAT")?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_enum<T>(value: &str, name: &str) -> ConfigResult<T>
where
    T: FromStr<Err = String>,
{
    T::from_str(value).map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))
}
