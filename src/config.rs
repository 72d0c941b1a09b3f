use serde::{Deserialize, Serialize};

use crate::model::{JoinPolicy, PaginationDefaults};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub joins: JoinConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub connection_string: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page: u64,
    pub default_limit: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Fail pipeline builds that name an unknown relation
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Insert the demonstration data set at start-up
    pub load: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5042,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            connection_string: None,
            max_connections: 20,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        let defaults = PaginationDefaults::default();
        Self {
            default_page: defaults.page,
            default_limit: defaults.limit,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and
    /// `INFLUENCER_*` environment variables, in that order
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("INFLUENCER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.pagination.default_page == 0 || self.pagination.default_limit == 0 {
            anyhow::bail!("pagination defaults must be positive");
        }
        Ok(())
    }

    /// Get the database URL from config or environment
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Ok(connection_string.clone());
        }

        std::env::var("DATABASE_URL").map_err(|_| {
            anyhow::anyhow!("postgres backend needs database.connection_string or DATABASE_URL")
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn pagination_defaults(&self) -> PaginationDefaults {
        PaginationDefaults {
            page: self.pagination.default_page,
            limit: self.pagination.default_limit,
        }
    }

    pub fn join_policy(&self) -> JoinPolicy {
        if self.joins.strict {
            JoinPolicy::Strict
        } else {
            JoinPolicy::Lenient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server_address(), "127.0.0.1:5042");
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.pagination_defaults(), PaginationDefaults { page: 1, limit: 10 });
        assert_eq!(config.join_policy(), JoinPolicy::Lenient);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_default_limit_is_invalid() {
        let mut config = AppConfig::default();
        config.pagination.default_limit = 0;

        assert!(config.validate().is_err());
    }
}
