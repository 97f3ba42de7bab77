//! Loading of the provider's signing key and certificate chain.
//!
//! Two containers are supported, selected by [`KeystoreType`]:
//!
//! - `PKCS12`: a single PKCS#12 file, password protected, holding the key and
//!   its chain under a friendly name (the alias).
//! - `PEM`: a directory with a PKCS#8 key, encrypted or not, in `<alias>.key`
//!   and the certificate chain in `<alias>.crt`, leaf first.
//!
//! Either way the key must be EC P-256 and the leaf certificate must certify it.
use std::path::Path;

use const_oid::{AssociatedOid, ObjectIdentifier};
use p256::{
    ecdsa::{SigningKey, VerifyingKey},
    NistP256,
};
use pkcs8::PrivateKeyInfo;
use serde::Deserialize;

pub mod error;
pub mod pem;
pub mod pkcs12;
pub mod x5chain;

pub use error::KeyMaterialError;
pub use x5chain::X5Chain;

/// id-ecPublicKey, RFC 5480.
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Container format of a keystore, named by the `type` configuration key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum KeystoreType {
    #[default]
    #[serde(rename = "PKCS12", alias = "pkcs12", alias = "p12")]
    Pkcs12,
    #[serde(rename = "PEM", alias = "pem")]
    Pem,
}

impl KeystoreType {
    /// Open the keystore at `location` and load the entry stored under
    /// `alias`, unlocking it with `credential`.
    pub fn load(
        self,
        location: impl AsRef<Path>,
        credential: &str,
        alias: &str,
    ) -> Result<KeyEntry, KeyMaterialError> {
        let location = location.as_ref();
        let entry = match self {
            Self::Pkcs12 => pkcs12::load(location, credential, alias)?,
            Self::Pem => pem::load(location, credential, alias)?,
        };

        tracing::info!(
            alias,
            keystore = ?self,
            subject = entry.certificate_chain.end_entity_common_name(),
            chain_len = entry.certificate_chain.len(),
            fingerprint = %entry.certificate_chain.end_entity_fingerprint(),
            "loaded keystore entry"
        );
        Ok(entry)
    }
}

/// A signing key together with the certificate chain that anchors it.
#[derive(Clone)]
pub struct KeyEntry {
    alias: String,
    signing_key: SigningKey,
    public_key: VerifyingKey,
    certificate_chain: X5Chain,
}

impl KeyEntry {
    /// Pair a signing key with its chain.
    ///
    /// The leaf certificate must certify the public half of `signing_key`.
    pub fn new(
        alias: impl Into<String>,
        signing_key: SigningKey,
        certificate_chain: X5Chain,
    ) -> Result<Self, KeyMaterialError> {
        let alias = alias.into();
        let public_key: VerifyingKey = certificate_chain
            .end_entity_public_key::<NistP256>()
            .map_err(|_| KeyMaterialError::CertificateKeyMismatch(alias.clone()))?;
        if &public_key != signing_key.verifying_key() {
            return Err(KeyMaterialError::CertificateKeyMismatch(alias));
        }

        Ok(Self {
            alias,
            signing_key,
            public_key,
            certificate_chain,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// The public key certified by the leaf certificate.
    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn certificate_chain(&self) -> &X5Chain {
        &self.certificate_chain
    }
}

impl std::fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEntry")
            .field("alias", &self.alias)
            .field("subject", &self.certificate_chain.end_entity_common_name())
            .field("chain_len", &self.certificate_chain.len())
            .finish_non_exhaustive()
    }
}

/// Load `alias` from the keystore at `location`, taking a directory for a
/// `PEM` keystore and anything else for a `PKCS12` file.
pub fn load(
    location: impl AsRef<Path>,
    credential: &str,
    alias: &str,
) -> Result<KeyEntry, KeyMaterialError> {
    let location = location.as_ref();
    let keystore_type = if location.is_dir() {
        KeystoreType::Pem
    } else {
        KeystoreType::Pkcs12
    };
    keystore_type.load(location, credential, alias)
}

/// Turn a decrypted PKCS#8 key into a P-256 signing key.
fn signing_key_from_pkcs8(
    alias: &str,
    info: PrivateKeyInfo<'_>,
) -> Result<SigningKey, KeyMaterialError> {
    let not_ec = |reason: String| KeyMaterialError::NotEcKey {
        alias: alias.to_string(),
        reason,
    };
    if info.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(not_ec(format!(
            "unsupported key algorithm {}",
            info.algorithm.oid
        )));
    }
    let curve = info
        .algorithm
        .parameters_oid()
        .map_err(|e| not_ec(format!("missing curve parameters: {e}")))?;
    if curve != NistP256::OID {
        return Err(not_ec(format!("unsupported curve {curve}")));
    }

    p256::SecretKey::try_from(info)
        .map(SigningKey::from)
        .map_err(|e| KeyMaterialError::Malformed {
            alias: alias.to_string(),
            reason: format!("invalid P-256 private key: {e}"),
        })
}
