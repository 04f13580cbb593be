

use std::path::Path;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use redact::Secret;
use serde::Deserialize;
use tracing::debug;

use super::error::{PurgeError, Result};
use crate::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_THROTTLE_RETRIES, DEFAULT_MAX_THROTTLE_WAIT_SECS,
    DEFAULT_PARTITION_KEY_FIELD, DEFAULT_REQUEST_TIMEOUT_SECS, EMULATOR_ACCOUNT_KEY,
};


pub const ENV_PREFIX: &str = "COSMOS_PURGE";

/// Connection settings for one Cosmos DB collection. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CosmosConfig {
    pub endpoint: String,
    pub account_key: Secret<String>,
    pub database: String,
    pub collection: String,

    pub cross_partition: bool,
    /// Field holding the partition key, e.g. `tenantId` or `/tenant/id`.
    /// Only read in cross-partition mode.
    pub partition_key_field: String,

    pub request_timeout_secs: u64,
    pub max_throttle_retries: u32,
    pub max_throttle_wait_secs: u64,
    /// The emulator ships a self-signed certificate.
    pub accept_invalid_certs: bool,
}

impl CosmosConfig {

    pub fn new(database: &str, collection: &str) -> Self {
        Self {
            database: database.to_string(),
            collection: collection.to_string(),
            ..Self::default()
        }
    }


    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::from_builder(builder.add_source(Environment::with_prefix(ENV_PREFIX)))
    }


    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder.build()?.try_deserialize::<Self>()?;
        Ok(config)
    }


    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(PurgeError::Config("endpoint must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(PurgeError::Config("database must not be empty".to_string()));
        }
        if self.collection.trim().is_empty() {
            return Err(PurgeError::Config("collection must not be empty".to_string()));
        }
        if self.cross_partition && self.partition_key_field.trim().is_empty() {
            return Err(PurgeError::Config(
                "partition_key_field is required in cross-partition mode".to_string(),
            ));
        }
        Ok(())
    }

    /// True once database and collection are known, i.e. nothing has to be prompted for.
    pub fn is_complete(&self) -> bool {
        !self.database.trim().is_empty() && !self.collection.trim().is_empty()
    }


    pub fn collection_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.collection)
    }

    pub fn account_key(&self) -> &str {
        self.account_key.expose_secret()
    }

    pub fn set_account_key(&mut self, key: impl Into<String>) {
        self.account_key = Secret::new(key.into());
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_throttle_wait(&self) -> Duration {
        Duration::from_secs(self.max_throttle_wait_secs)
    }
}

impl Default for CosmosConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            account_key: Secret::new(EMULATOR_ACCOUNT_KEY.to_string()),
            database: String::new(),
            collection: String::new(),
            cross_partition: false,
            partition_key_field: DEFAULT_PARTITION_KEY_FIELD.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
            max_throttle_wait_secs: DEFAULT_MAX_THROTTLE_WAIT_SECS,
            accept_invalid_certs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::FileFormat;

    fn from_json(json: &str) -> Result<CosmosConfig> {
        CosmosConfig::from_builder(
            Config::builder().add_source(File::from_str(json, FileFormat::Json)),
        )
    }

    #[test]
    fn test_defaults_match_emulator() {
        let config = CosmosConfig::default();
        assert_eq!(config.endpoint, "https://localhost:8081");
        assert_eq!(config.account_key(), EMULATOR_ACCOUNT_KEY);
        assert_eq!(config.partition_key_field, "id");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_throttle_retries, 3);
        assert!(!config.cross_partition);
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let config = from_json(
            r#"{
                "endpoint": "https://acct.documents.azure.com:443",
                "database": "shop",
                "collection": "orders",
                "cross_partition": true,
                "partition_key_field": "/tenant/id"
            }"#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://acct.documents.azure.com:443");
        assert_eq!(config.collection_link(), "dbs/shop/colls/orders");
        assert!(config.cross_partition);
        assert_eq!(config.partition_key_field, "/tenant/id");
        assert_eq!(config.max_throttle_wait_secs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_account_key_is_redacted_in_debug() {
        let mut config = CosmosConfig::new("db", "coll");
        config.set_account_key("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert_eq!(config.account_key(), "super-secret");
    }

    #[test]
    fn test_validate_requires_database_and_collection() {
        let err = CosmosConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("database"));

        let err = CosmosConfig::new("db", " ").validate().unwrap_err();
        assert!(err.to_string().contains("collection"));

        let mut config = CosmosConfig::new("db", "coll");
        config.cross_partition = true;
        config.partition_key_field.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_complete() {
        assert!(!CosmosConfig::default().is_complete());
        assert!(CosmosConfig::new("db", "coll").is_complete());
    }
}
