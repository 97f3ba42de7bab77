//! Issuance of wallet unit attestations.
//!
//! An [`Issuer`] runs the whole pipeline for one request: the wallet's JWK is
//! validated and bound into a [`ClaimSet`] by the [`ClaimSetBuilder`], which
//! the [`AttestationSigner`] then signs under an [`IssuanceProfile`].
//!
//! ```ignore
//! let material = KeyMaterial::from_config(&KeystoreConfig::from_json_file("wua.json")?)?;
//! let issuer = Issuer::new(material);
//! let token = issuer.issue_with_nonce(&wallet_jwk, Some(&nonce))?;
//! ```
use std::sync::Arc;

use crate::{error::Result, material::KeyMaterial};

pub mod attested_key;
pub mod claims;
pub mod profile;
pub mod signer;
pub mod token;

pub use attested_key::AttestedKey;
pub use claims::{ClaimSet, ClaimSetBuilder};
pub use profile::IssuanceProfile;
pub use signer::{AttestationSigner, JwsHeader, PreparedAttestation};
pub use token::{SignedAttestation, TokenError};

/// Issues attestations from shared, read-only key material.
///
/// Cloning is cheap; clones share the same material.
#[derive(Debug, Clone)]
pub struct Issuer {
    material: Arc<KeyMaterial>,
}

impl Issuer {
    pub fn new(material: impl Into<Arc<KeyMaterial>>) -> Self {
        Self {
            material: material.into(),
        }
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Issue under [`IssuanceProfile::V1`]: `kid` header, no nonce.
    pub fn issue(&self, jwk: &str) -> Result<SignedAttestation> {
        self.issue_with_profile(jwk, None, IssuanceProfile::V1)
    }

    /// Issue under [`IssuanceProfile::V2`], binding `nonce` when given, even if empty.
    pub fn issue_with_nonce(&self, jwk: &str, nonce: Option<&str>) -> Result<SignedAttestation> {
        self.issue_with_profile(jwk, nonce, IssuanceProfile::V2)
    }

    pub fn issue_with_profile(
        &self,
        jwk: &str,
        nonce: Option<&str>,
        profile: IssuanceProfile,
    ) -> Result<SignedAttestation> {
        let nonce = match nonce {
            Some(_) if !profile.nonce_claim() => {
                tracing::debug!(typ = profile.typ(), "profile does not bind nonces, ignoring");
                None
            }
            nonce => nonce,
        };

        let claims = ClaimSetBuilder::new(&self.material)
            .build(jwk, nonce)
            .map_err(|e| {
                tracing::warn!("claim set not built: {e}");
                e
            })?;

        let token = AttestationSigner::new(&self.material, profile)
            .sign(&claims)
            .map_err(|e| {
                tracing::error!("{e}");
                e
            })?;

        tracing::debug!(
            typ = profile.typ(),
            nonce = claims.nonce.is_some(),
            exp = claims.exp,
            "issued wallet unit attestation"
        );
        Ok(token)
    }
}
