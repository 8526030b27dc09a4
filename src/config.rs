//! Configuration management

use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_DATABASE_NAME: &str = "logs";
pub const DEFAULT_COLLECTION: &str = "nginx";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string
    pub url: String,
    pub name: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// How many IPs the "IPs:" section lists
    pub top_ips: u32,
    /// Path counted as a status check when requested with GET
    pub status_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("LOG_STATS")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("database.name", DEFAULT_DATABASE_NAME)?
            .set_default("database.collection", DEFAULT_COLLECTION)?
            .set_default("report.top_ips", 10)?
            .set_default("report.status_path", "/status")?
            .set_default("logging.level", "warn")?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let url = &self.database.url;
        if url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
            anyhow::bail!("Invalid database URL '{}'. Must start with mongodb:// or mongodb+srv://", url);
        }
        if self.database.name.is_empty() {
            anyhow::bail!("Database name cannot be empty");
        }
        if self.database.collection.is_empty() {
            anyhow::bail!("Collection name cannot be empty");
        }

        if self.report.top_ips == 0 {
            anyhow::bail!("Invalid report.top_ips: 0 is not allowed");
        }
        if !self.report.status_path.starts_with('/') {
            anyhow::bail!("Invalid report.status_path '{}'. Must start with '/'", self.report.status_path);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid logging level '{}'. Must be one of: {:?}", self.logging.level, valid_levels);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        Config::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_point_at_local_nginx_collection() {
        let config = default_config();
        assert_eq!(config.database.url, "mongodb://127.0.0.1:27017");
        assert_eq!(config.database.name, "logs");
        assert_eq!(config.database.collection, "nginx");
        assert_eq!(config.report.top_ips, 10);
        assert_eq!(config.report.status_path, "/status");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_mongo_url() {
        let mut config = default_config();
        config.database.url = "postgres://localhost".into();
        assert!(config.validate().is_err());

        config.database.url = "mongodb+srv://cluster.example.net".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("LOG_STATS_DATABASE__URL", "mongodb://10.1.2.3:27017");
        std::env::set_var("LOG_STATS_REPORT__TOP_IPS", "5");
        let loaded = Config::load();
        std::env::remove_var("LOG_STATS_DATABASE__URL");
        std::env::remove_var("LOG_STATS_REPORT__TOP_IPS");

        let config = loaded.unwrap();
        assert_eq!(config.database.url, "mongodb://10.1.2.3:27017");
        assert_eq!(config.report.top_ips, 5);
        assert_eq!(config.database.name, "logs");
        assert_eq!(config.database.collection, "nginx");
    }

    #[test]
    fn rejects_empty_url() {
        let mut config = default_config();
        config.database.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_database_name() {
        let mut config = default_config();
        config.database.name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_collection() {
        let mut config = default_config();
        config.database.collection.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_top_ips() {
        let mut config = default_config();
        config.report.top_ips = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_relative_status_path() {
        let mut config = default_config();
        config.report.status_path = "status".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = default_config();
        config.logging.level = "DEBUG".into();
        assert!(config.validate().is_ok());

        config.logging.level = "verbose".into();
        assert!(config.validate().is_err());
    }
}
