//! Configuration loading and management
//!
//! Configuration comes from a YAML file and is then overridden from the
//! environment:
//!
//! - `MONGO_URI_BRANCH{n}`: connection string of branch `n`
//! - `APP_ENV` (falls back to `NODE_ENV`): `development` or `production`
//! - `ORDER_ROUTER_ADDR`: listen address
//!
//! ```yaml
//! listen_addr: 0.0.0.0:3000
//! environment: production
//! default_page_size: 200
//! branches:
//!   - id: 1
//!     uri: mongodb://db1:27017/branch1
//!   - id: 2
//!     uri: mongodb://db2:27017/branch2
//!     collection: orders_archive
//! ```

use crate::core::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::core::registry::DEFAULT_COLLECTION;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Deployment mode
///
/// Internal error details are only exposed in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Whether error envelopes may carry internal details
    pub fn exposes_details(self) -> bool {
        self == Environment::Development
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Configuration for one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Branch identifier used in request paths
    pub id: u32,

    /// Connection string
    #[serde(default)]
    pub uri: String,

    /// Database name; defaults to the one in the connection string
    #[serde(default)]
    pub database: Option<String>,

    /// Order collection name
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl BranchConfig {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            uri: String::new(),
            database: None,
            collection: default_collection(),
        }
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub environment: Environment,

    /// Page size used when a request has no `limit`
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Allow cross-origin requests from anywhere
    #[serde(default)]
    pub cors_permissive: bool,

    pub branches: Vec<BranchConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Default configuration with branches 1, 2 and 3
    pub fn default_branches() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            environment: Environment::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            cors_permissive: false,
            branches: (1..=3).map(BranchConfig::new).collect(),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for branch in &mut self.branches {
            if let Some(uri) = lookup(&format!("MONGO_URI_BRANCH{}", branch.id)) {
                branch.uri = uri;
            }
        }
        if let Some(env) = lookup("APP_ENV")
            .or_else(|| lookup("NODE_ENV"))
            .as_deref()
            .and_then(Environment::parse)
        {
            self.environment = env;
        }
        if let Some(addr) = lookup("ORDER_ROUTER_ADDR") {
            self.listen_addr = addr;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.branches.is_empty() {
            return Err(anyhow!("At least one branch must be configured"));
        }

        let mut seen = HashSet::new();
        for branch in &self.branches {
            if branch.id == 0 {
                return Err(anyhow!("Branch ids start at 1"));
            }
            if !seen.insert(branch.id) {
                return Err(anyhow!("Branch {} is configured twice", branch.id));
            }
            if branch.collection.trim().is_empty() {
                return Err(anyhow!("Branch {} has an empty collection name", branch.id));
            }
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.default_page_size) {
            return Err(anyhow!(
                "default_page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.default_page_size
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default_branches();
        assert_eq!(config.branches.len(), 3);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_defaults() {
        let config = AppConfig::from_yaml_str(
            "branches:\n  - id: 1\n    uri: mongodb://localhost/b1\n",
        )
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.default_page_size, 200);
        assert_eq!(config.branches[0].collection, "globalorders");
        assert!(config.branches[0].database.is_none());
    }

    #[test]
    fn test_yaml_serialization() {
        let config = AppConfig::default_branches();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MONGO_URI_BRANCH2", "mongodb://db2/branch2"),
            ("NODE_ENV", "development"),
            ("ORDER_ROUTER_ADDR", "127.0.0.1:8080"),
        ]);
        let config = AppConfig::default_branches()
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.branches[1].uri, "mongodb://db2/branch2");
        assert!(config.branches[0].uri.is_empty());
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_app_env_wins_over_node_env() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("APP_ENV", "production"), ("NODE_ENV", "development")]);
        let config = AppConfig::default_branches()
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_page_size() {
        let mut config = AppConfig::default_branches();
        config.branches.push(BranchConfig::new(2));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_branches();
        config.default_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default_branches();
        config.branches.clear();
        assert!(config.validate().is_err());
    }
}
