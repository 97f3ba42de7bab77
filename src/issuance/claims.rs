//! The claim set of a wallet unit attestation.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    error::{Error, Result},
    helpers::NonEmptyVec,
    material::KeyMaterial,
};

use super::attested_key::AttestedKey;

/// JWT payload. Times are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub eudi_wallet_info: Map<String, Value>,
    pub status: Map<String, Value>,
    pub attested_keys: NonEmptyVec<AttestedKey>,
    /// Absent and empty are distinct: an empty nonce is still serialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Assembles claim sets from the store's static settings.
#[derive(Debug, Clone)]
pub struct ClaimSetBuilder<'a> {
    material: &'a KeyMaterial,
    issued_at: Option<OffsetDateTime>,
}

impl<'a> ClaimSetBuilder<'a> {
    pub fn new(material: &'a KeyMaterial) -> Self {
        Self {
            material,
            issued_at: None,
        }
    }

    /// Fix the issuance instant instead of reading the clock.
    pub fn issued_at(mut self, issued_at: OffsetDateTime) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Build the claims binding `jwk`, and `nonce` when given.
    pub fn build(&self, jwk: &str, nonce: Option<&str>) -> Result<ClaimSet> {
        let attested_key = AttestedKey::from_jwk_str(jwk)?;

        let iat = self
            .issued_at
            .unwrap_or_else(OffsetDateTime::now_utc)
            .unix_timestamp();
        let exp = iat
            .checked_add(self.material.validity().whole_seconds())
            .ok_or_else(|| Error::Signing("expiry overflows".to_string()))?;

        Ok(ClaimSet {
            iss: self.material.issuer().to_string(),
            iat,
            exp,
            eudi_wallet_info: self.material.wallet_info().clone(),
            status: self.material.status().clone(),
            attested_keys: NonEmptyVec::new(attested_key),
            nonce: nonce.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::{self, Provider};
    use time::macros::datetime;

    #[test]
    fn fills_claims_from_material() {
        let material = test_support::key_material(&Provider::generate());
        let (_, jwk) = test_support::wallet_jwk();
        let now = datetime!(2024-05-01 12:00 UTC);

        let claims = ClaimSetBuilder::new(&material)
            .issued_at(now)
            .build(&jwk, None)
            .unwrap();

        assert_eq!(claims.iss, test_support::ISSUER);
        assert_eq!(claims.iat, now.unix_timestamp());
        assert_eq!(claims.exp - claims.iat, material.validity().whole_seconds());
        assert_eq!(claims.exp, (now + material.validity()).unix_timestamp());
        assert_eq!(&claims.eudi_wallet_info, material.wallet_info());
        assert_eq!(&claims.status, material.status());
        assert_eq!(claims.attested_keys.len(), 1);
        assert_eq!(claims.nonce, None);
    }

    #[test]
    fn nonce_is_tri_state() {
        let material = test_support::key_material(&Provider::generate());
        let (_, jwk) = test_support::wallet_jwk();
        let builder = ClaimSetBuilder::new(&material);
        let claim_count = |nonce: Option<&str>| {
            let claims = builder.build(&jwk, nonce).unwrap();
            let value = serde_json::to_value(&claims).unwrap();
            (value.get("nonce").cloned(), value.as_object().unwrap().len())
        };

        assert_eq!(claim_count(Some("abc")), (Some("abc".into()), 7));
        assert_eq!(claim_count(Some("")), (Some("".into()), 7));
        assert_eq!(claim_count(None), (None, 6));
    }

    #[test]
    fn invalid_key_is_rejected() {
        let material = test_support::key_material(&Provider::generate());

        assert!(matches!(
            ClaimSetBuilder::new(&material).build(r#"{"not":"a jwk"}"#, Some("abc")),
            Err(Error::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let material = test_support::key_material(&Provider::generate());
        let (_, jwk) = test_support::wallet_jwk();
        let claims = ClaimSetBuilder::new(&material)
            .build(&jwk, Some(""))
            .unwrap();

        let decoded: ClaimSet =
            serde_json::from_str(&serde_json::to_string(&claims).unwrap()).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.nonce.as_deref(), Some(""));
    }
}
