//! Compact JWS (RFC 7515) production for attestations.
//!
//! Only ES256 is produced: the signature segment is the 64-byte `r || s`
//! encoding, not DER.
use p256::ecdsa::Signature;
use serde::{Deserialize, Serialize};
use signature::Signer;

use crate::{
    error::{Error, Result},
    material::KeyMaterial,
};

use super::{claims::ClaimSet, profile::IssuanceProfile, token::SignedAttestation};

pub const ES256: &str = "ES256";

/// Protected header of an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Leaf first, standard base64 of each certificate's DER.
    pub x5c: Vec<String>,
}

/// Signs claim sets with the provider key under a given profile.
#[derive(Debug, Clone, Copy)]
pub struct AttestationSigner<'a> {
    material: &'a KeyMaterial,
    profile: IssuanceProfile,
}

/// A claim set with its header, encoded and awaiting a signature.
#[derive(Debug, Clone)]
pub struct PreparedAttestation {
    signing_input: String,
}

impl<'a> AttestationSigner<'a> {
    pub fn new(material: &'a KeyMaterial, profile: IssuanceProfile) -> Self {
        Self { material, profile }
    }

    pub fn header(&self) -> Result<JwsHeader> {
        let kid = if self.profile.key_id_header() {
            let kid = self
                .material
                .key_id()
                .ok_or_else(|| Error::Signing("profile requires a key id".to_string()))?;
            Some(kid.to_string())
        } else {
            None
        };

        Ok(JwsHeader {
            alg: ES256.to_string(),
            typ: self.profile.typ().to_string(),
            kid,
            x5c: self.material.certificate_chain().to_x5c(),
        })
    }

    /// Encode header and claims for signing elsewhere.
    pub fn prepare(&self, claims: &ClaimSet) -> Result<PreparedAttestation> {
        let header = serde_json::to_vec(&self.header()?)
            .map_err(|e| Error::Signing(format!("unable to encode header: {e}")))?;
        let payload = serde_json::to_vec(claims)
            .map_err(|e| Error::Signing(format!("unable to encode claims: {e}")))?;

        Ok(PreparedAttestation {
            signing_input: format!(
                "{}.{}",
                base64::encode_config(header, base64::URL_SAFE_NO_PAD),
                base64::encode_config(payload, base64::URL_SAFE_NO_PAD)
            ),
        })
    }

    /// Sign `claims` with the store's private key.
    pub fn sign(&self, claims: &ClaimSet) -> Result<SignedAttestation> {
        let prepared = self.prepare(claims)?;
        let signature: Signature = self
            .material
            .signing_key()
            .try_sign(prepared.signing_input())
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(prepared.complete(signature))
    }
}

impl PreparedAttestation {
    /// The bytes to sign: `BASE64URL(header) '.' BASE64URL(claims)`.
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// Attach an ES256 signature over [`PreparedAttestation::signing_input`].
    pub fn complete(self, signature: Signature) -> SignedAttestation {
        let Self { signing_input } = self;
        let signature = base64::encode_config(signature.to_bytes(), base64::URL_SAFE_NO_PAD);
        SignedAttestation::from_parts(signing_input, &signature)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        issuance::claims::ClaimSetBuilder,
        test_support::{self, Provider},
    };

    #[test]
    fn v1_header_carries_kid_and_chain() {
        let provider = Provider::generate();
        let material = test_support::key_material(&provider);

        let header = AttestationSigner::new(&material, IssuanceProfile::V1)
            .header()
            .unwrap();

        assert_eq!(header.alg, "ES256");
        assert_eq!(header.typ, "keyattestation+jwt");
        assert_eq!(header.kid.as_deref(), Some(test_support::ALIAS));
        assert_eq!(header.x5c, provider.chain().to_x5c());
    }

    #[test]
    fn v2_header_omits_kid() {
        let material = test_support::key_material(&Provider::generate());

        let header = AttestationSigner::new(&material, IssuanceProfile::V2)
            .header()
            .unwrap();
        let encoded = serde_json::to_value(&header).unwrap();

        assert_eq!(header.typ, "key-attestation+jwt");
        assert!(encoded.get("kid").is_none());
    }

    #[test]
    fn kid_profile_without_key_id_is_a_signing_error() {
        let provider = Provider::generate();
        let material = KeyMaterial::builder()
            .entry(provider.key_entry())
            .issuer(test_support::ISSUER)
            .validity(test_support::VALIDITY)
            .wallet_info(test_support::wallet_info())
            .status(test_support::status())
            .build()
            .unwrap();
        let (_, jwk) = test_support::wallet_jwk();
        let claims = ClaimSetBuilder::new(&material).build(&jwk, None).unwrap();

        let result = AttestationSigner::new(&material, IssuanceProfile::V1).sign(&claims);

        assert!(matches!(result, Err(Error::Signing(_))));
    }

    #[test]
    fn remote_signature_completes_prepared_token() {
        let provider = Provider::generate();
        let material = test_support::key_material(&provider);
        let (_, jwk) = test_support::wallet_jwk();
        let claims = ClaimSetBuilder::new(&material)
            .build(&jwk, Some("n"))
            .unwrap();
        let signer = AttestationSigner::new(&material, IssuanceProfile::V2);

        let prepared = signer.prepare(&claims).unwrap();
        let signature: Signature = provider.signing_key.sign(prepared.signing_input());
        let token = prepared.complete(signature);

        token.verify(material.public_key()).unwrap();
        assert_eq!(token.decode_claims().unwrap(), claims);
    }
}
