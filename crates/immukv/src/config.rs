use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Default interval between opportunistic orphan checks on `get`: 5 minutes.
pub const DEFAULT_REPAIR_CHECK_INTERVAL_MS: u64 = 300_000;

/// Client configuration.
///
/// ```toml
/// bucket = "my-ledger"
/// region = "eu-west-1"
/// prefix = "app/"
/// kms_key_id = "alias/immukv"      # optional
/// repair_check_interval_ms = 60000 # optional, default 300000
/// read_only = false                # optional
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub bucket: String,
    pub region: String,
    /// Object name prefix, used verbatim.
    #[serde(default)]
    pub prefix: String,
    /// When set, every write requests KMS server-side encryption with this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default = "default_repair_check_interval_ms")]
    pub repair_check_interval_ms: u64,
    /// Refuse `set` and never attempt repair writes.
    #[serde(default)]
    pub read_only: bool,
}

fn default_repair_check_interval_ms() -> u64 {
    DEFAULT_REPAIR_CHECK_INTERVAL_MS
}

impl ClientConfig {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            prefix: prefix.into(),
            kms_key_id: None,
            repair_check_interval_ms: DEFAULT_REPAIR_CHECK_INTERVAL_MS,
            read_only: false,
        }
    }

    pub fn with_kms_key(mut self, key_id: impl Into<String>) -> Self {
        self.kms_key_id = Some(key_id.into());
        self
    }

    pub fn with_repair_check_interval_ms(mut self, interval_ms: u64) -> Self {
        self.repair_check_interval_ms = interval_ms;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(ClientError::Config("bucket must not be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(ClientError::Config("region must not be empty".into()));
        }
        if matches!(&self.kms_key_id, Some(key) if key.trim().is_empty()) {
            return Err(ClientError::Config("kms_key_id must not be empty when set".into()));
        }
        Ok(())
    }
}
