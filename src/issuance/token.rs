//! Issued attestations in compact serialization, and their inspection.
//!
//! Inspection decodes the header and claims and checks the ES256 signature
//! against a given key or the `x5c` leaf. It does not validate the chain.
use std::fmt;

use p256::{
    ecdsa::{Signature, VerifyingKey},
    NistP256,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use signature::Verifier;

use crate::keystore::X5Chain;

use super::{claims::ClaimSet, signer::JwsHeader};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("{segment} is not valid base64url: {source}")]
    Base64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid certificate chain: {0:#}")]
    Certificate(anyhow::Error),
    #[error("signature does not verify")]
    InvalidSignature,
}

/// A signed wallet unit attestation: `header.claims.signature`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignedAttestation(String);

struct Segments<'t> {
    header: &'t str,
    payload: &'t str,
    signature: &'t str,
}

impl SignedAttestation {
    pub(crate) fn from_parts(signing_input: String, signature: &str) -> Self {
        let mut token = signing_input;
        token.push('.');
        token.push_str(signature);
        Self(token)
    }

    /// Accept a compact serialization for inspection. Only the shape is
    /// checked here.
    pub fn parse(token: impl Into<String>) -> Result<Self, TokenError> {
        let token = Self(token.into().trim().to_string());
        token.segments()?;
        Ok(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    fn segments(&self) -> Result<Segments<'_>, TokenError> {
        let mut parts = self.0.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Segments {
                header,
                payload,
                signature,
            }),
            _ => Err(TokenError::Malformed(
                "expected three '.' separated segments".to_string(),
            )),
        }
    }

    fn decode_segment<T: DeserializeOwned>(
        segment: &'static str,
        encoded: &str,
    ) -> Result<T, TokenError> {
        let bytes = base64::decode_config(encoded, base64::URL_SAFE_NO_PAD)
            .map_err(|source| TokenError::Base64 { segment, source })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn decode_header(&self) -> Result<JwsHeader, TokenError> {
        Self::decode_segment("header", self.segments()?.header)
    }

    pub fn decode_claims(&self) -> Result<ClaimSet, TokenError> {
        Self::decode_segment("payload", self.segments()?.payload)
    }

    /// The claims as a plain JSON object, every member included.
    pub fn claims_json(&self) -> Result<Map<String, Value>, TokenError> {
        Self::decode_segment("payload", self.segments()?.payload)
    }

    pub fn certificate_chain(&self) -> Result<X5Chain, TokenError> {
        X5Chain::from_x5c(&self.decode_header()?.x5c).map_err(TokenError::Certificate)
    }

    /// The P-256 key of the `x5c` leaf certificate.
    pub fn leaf_verifying_key(&self) -> Result<VerifyingKey, TokenError> {
        self.certificate_chain()?
            .end_entity_public_key::<NistP256>()
            .map_err(TokenError::Certificate)
    }

    /// Check the ES256 signature with `key`.
    pub fn verify(&self, key: &VerifyingKey) -> Result<(), TokenError> {
        let segments = self.segments()?;
        let header = self.decode_header()?;
        if header.alg != super::signer::ES256 {
            return Err(TokenError::Malformed(format!(
                "unsupported algorithm '{}'",
                header.alg
            )));
        }

        let signing_input_len = segments.header.len() + 1 + segments.payload.len();
        let signing_input = &self.0.as_bytes()[..signing_input_len];
        let signature = base64::decode_config(segments.signature, base64::URL_SAFE_NO_PAD)
            .map_err(|source| TokenError::Base64 {
                segment: "signature",
                source,
            })?;
        let signature =
            Signature::from_slice(&signature).map_err(|_| TokenError::InvalidSignature)?;

        key.verify(signing_input, &signature)
            .map_err(|_| TokenError::InvalidSignature)
    }
}

impl fmt::Display for SignedAttestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SignedAttestation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SignedAttestation> for String {
    fn from(token: SignedAttestation) -> Self {
        token.0
    }
}
