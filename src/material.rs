//! The provider's key material and static issuance settings, loaded once and
//! shared read-only by every issuance.
use p256::ecdsa::{SigningKey, VerifyingKey};
use serde_json::{Map, Value};
use time::Duration;

use crate::{
    config::KeystoreConfig,
    keystore::{KeyEntry, KeyMaterialError, X5Chain},
};

/// Everything an issuance needs besides the request itself.
///
/// Construct with [`KeyMaterial::from_config`] at startup, or piece by piece
/// with [`KeyMaterial::builder`].
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    entry: KeyEntry,
    issuer: String,
    key_id: Option<String>,
    validity: Duration,
    wallet_info: Map<String, Value>,
    status: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    entry: Option<KeyEntry>,
    issuer: Option<String>,
    key_id: Option<String>,
    validity: Option<Duration>,
    wallet_info: Option<Map<String, Value>>,
    status: Option<Map<String, Value>>,
}

impl KeyMaterial {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Load the keystore entry and decode the descriptors named by `config`.
    /// The alias doubles as the key id.
    pub fn from_config(config: &KeystoreConfig) -> Result<Self, KeyMaterialError> {
        let wallet_info = config.eudi_wallet_info.parse("eudi-wallet-info")?;
        let status = config.status.parse("status")?;
        let entry = config
            .keystore_type
            .load(&config.location, &config.password, &config.alias)?;

        let material = Self::builder()
            .entry(entry)
            .issuer(config.issuer.clone())
            .key_id(config.alias.clone())
            .validity(config.validity())
            .wallet_info(wallet_info)
            .status(status)
            .build()?;

        tracing::info!(
            issuer = %material.issuer,
            validity = %material.validity,
            "key material ready"
        );
        Ok(material)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        self.entry.signing_key()
    }

    pub fn public_key(&self) -> &VerifyingKey {
        self.entry.public_key()
    }

    pub fn certificate_chain(&self) -> &X5Chain {
        self.entry.certificate_chain()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Value of the `kid` header for profiles that carry one.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn wallet_info(&self) -> &Map<String, Value> {
        &self.wallet_info
    }

    pub fn status(&self) -> &Map<String, Value> {
        &self.status
    }
}

impl Builder {
    /// Set the signing key and its certificate chain.
    pub fn entry(mut self, entry: KeyEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Set the value of the `iss` claim.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the key id. Optional.
    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Set the lifetime of issued attestations.
    pub fn validity(mut self, validity: Duration) -> Self {
        self.validity = Some(validity);
        self
    }

    /// Set the `eudi_wallet_info` claim.
    pub fn wallet_info(mut self, wallet_info: Map<String, Value>) -> Self {
        self.wallet_info = Some(wallet_info);
        self
    }

    /// Set the `status` claim.
    pub fn status(mut self, status: Map<String, Value>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Result<KeyMaterial, KeyMaterialError> {
        let entry = self
            .entry
            .ok_or(KeyMaterialError::MissingParameter("entry"))?;
        let issuer = self
            .issuer
            .ok_or(KeyMaterialError::MissingParameter("issuer"))?;
        let validity = self
            .validity
            .ok_or(KeyMaterialError::MissingParameter("validity"))?;
        let wallet_info = self
            .wallet_info
            .ok_or(KeyMaterialError::MissingParameter("wallet_info"))?;
        let status = self
            .status
            .ok_or(KeyMaterialError::MissingParameter("status"))?;

        // Claims carry whole seconds, so `exp - iat` is only exact for these.
        if !validity.is_positive() || validity.subsec_nanoseconds() != 0 {
            return Err(KeyMaterialError::InvalidValidity);
        }

        Ok(KeyMaterial {
            entry,
            issuer,
            key_id: self.key_id,
            validity,
            wallet_info,
            status,
        })
    }
}
