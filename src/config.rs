//! Startup configuration of the key material store.
//!
//! ```json
//! {
//!   "type": "PKCS12",
//!   "location": "keystore.p12",
//!   "password": "changeit",
//!   "alias": "wua",
//!   "issuer": "Digg",
//!   "validity-hours": 24,
//!   "eudi-wallet-info": { "general_info": { "wallet_provider_name": "Digg" } },
//!   "status": "{\"status_list\":{\"idx\":412,\"uri\":\"https://revocation_url/statuslists/1\"}}"
//! }
//! ```
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::{Map, Value};
use zeroize::Zeroize;

use crate::keystore::{KeyMaterialError, KeystoreType};

#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KeystoreConfig {
    /// Container format, `PKCS12` unless given.
    #[serde(rename = "type", default)]
    pub keystore_type: KeystoreType,
    /// Keystore file, or directory for a `PEM` keystore. Relative paths are resolved against the directory
    /// of the configuration file when loaded with [`KeystoreConfig::from_json_file`].
    pub location: PathBuf,
    pub password: String,
    pub alias: String,
    pub eudi_wallet_info: Descriptor,
    pub status: Descriptor,
    pub issuer: String,
    pub validity_hours: u32,
}

/// A structured claim value, either inline or pre-serialized as a JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    Serialized(String),
    Inline(Value),
}

impl KeystoreConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KeyMaterialError> {
        let path = path.as_ref();
        let config_error = |reason: String| KeyMaterialError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let data = fs::read(path).map_err(|e| config_error(e.to_string()))?;
        let mut config: Self =
            serde_json::from_slice(&data).map_err(|e| config_error(e.to_string()))?;

        if config.location.is_relative() {
            if let Some(dir) = path.parent() {
                config.location = dir.join(&config.location);
            }
        }
        Ok(config)
    }

    pub fn validity(&self) -> time::Duration {
        time::Duration::hours(i64::from(self.validity_hours))
    }
}

impl Descriptor {
    /// Decode into a JSON object. `field` names the setting in errors.
    pub fn parse(&self, field: &'static str) -> Result<Map<String, Value>, KeyMaterialError> {
        let invalid = |reason: String| KeyMaterialError::InvalidDescriptor { field, reason };
        let value = match self {
            Descriptor::Serialized(s) => {
                serde_json::from_str(s).map_err(|e| invalid(e.to_string()))?
            }
            Descriptor::Inline(v) => v.clone(),
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(invalid(format!("expected a JSON object, found {other}"))),
        }
    }
}

impl std::fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("keystore_type", &self.keystore_type)
            .field("location", &self.location)
            .field("password", &"<redacted>")
            .field("alias", &self.alias)
            .field("eudi_wallet_info", &self.eudi_wallet_info)
            .field("status", &self.status)
            .field("issuer", &self.issuer)
            .field("validity_hours", &self.validity_hours)
            .finish()
    }
}

impl Drop for KeystoreConfig {
    fn drop(&mut self) {
        self.password.zeroize();
    }
}
