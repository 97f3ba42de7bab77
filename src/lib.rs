//! Issuance of Wallet Unit Attestations (WUA).
//!
//! A WUA is a compact ES256 JWS, signed by the wallet provider, binding a
//! wallet instance's public key to a statement about the wallet solution.
//! The provider's certificate chain travels in the `x5c` header so relying
//! parties can verify the attestation offline.
//!
//! The pipeline has three parts:
//!
//! - [`material::KeyMaterial`]: the signing key, certificate chain and static
//!   settings, loaded once from a [`keystore`] at startup.
//! - [`issuance::ClaimSetBuilder`]: validates the wallet's JWK and assembles
//!   the claim set, optionally binding a nonce.
//! - [`issuance::AttestationSigner`]: adds the header for the selected
//!   [`issuance::IssuanceProfile`] and signs.
//!
//! [`issuance::Issuer`] ties them together and is what a transport layer calls.
pub mod config;
pub mod error;
pub mod helpers;
pub mod issuance;
pub mod keystore;
pub mod material;

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_support;

pub use error::{Error, Result};
pub use issuance::{IssuanceProfile, Issuer, SignedAttestation};
pub use keystore::KeyMaterialError;
pub use material::KeyMaterial;
