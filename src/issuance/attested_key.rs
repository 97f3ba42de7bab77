//! The wallet public key bound by an attestation.
use elliptic_curve::{
    generic_array::GenericArray,
    sec1::{EncodedPoint, FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey,
};
use serde::{Deserialize, Serialize};
use ssi_jwk::{Params, JWK};

use crate::error::{Error, Result};

/// Curve names registered for `OKP` keys, never valid with `kty` `EC`.
const OKP_CURVES: [&str; 4] = ["Ed25519", "Ed448", "X25519", "X448"];

/// EC curves whose points are checked before they are attested. Keys on any
/// other EC curve are carried over as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
    P521,
    Secp256k1,
}

impl Curve {
    pub fn from_jwk_crv(crv: &str) -> Option<Self> {
        match crv {
            "P-256" => Some(Self::P256),
            "P-384" => Some(Self::P384),
            "P-521" => Some(Self::P521),
            "secp256k1" => Some(Self::Secp256k1),
            _ => None,
        }
    }

    pub fn jwk_crv(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
            Self::Secp256k1 => "secp256k1",
        }
    }

    fn coordinate_len(self) -> usize {
        match self {
            Self::P256 | Self::Secp256k1 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    fn is_on_curve(self, x: &[u8], y: &[u8]) -> bool {
        match self {
            Self::P256 => is_on_curve::<p256::NistP256>(x, y),
            Self::P384 => is_on_curve::<p384::NistP384>(x, y),
            Self::P521 => is_on_curve::<p521::NistP521>(x, y),
            Self::Secp256k1 => is_on_curve::<k256::Secp256k1>(x, y),
        }
    }
}

/// `x` and `y` must already have the curve's field size.
fn is_on_curve<C>(x: &[u8], y: &[u8]) -> bool
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let point = EncodedPoint::<C>::from_affine_coordinates(
        GenericArray::from_slice(x),
        GenericArray::from_slice(y),
        false,
    );
    PublicKey::<C>::from_encoded_point(&point).is_some().into()
}

/// Public members of an EC JWK, as placed in the `attested_keys` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedKey {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl AttestedKey {
    /// Parse and validate a wallet key given as a JWK string.
    ///
    /// Private members such as `d` are accepted on input but never carried over.
    pub fn from_jwk_str(jwk: &str) -> Result<Self> {
        let jwk: JWK = serde_json::from_str(jwk)
            .map_err(|e| Error::InvalidKeyFormat(format!("not a JWK: {e}")))?;
        Self::try_from(jwk)
    }

    /// `None` for curves that are attested without a point check.
    pub fn curve(&self) -> Option<Curve> {
        Curve::from_jwk_crv(&self.crv)
    }
}

impl TryFrom<JWK> for AttestedKey {
    type Error = Error;

    fn try_from(jwk: JWK) -> Result<Self> {
        let Params::EC(params) = &jwk.params else {
            return Err(Error::InvalidKeyFormat("key type must be 'EC'".to_string()));
        };

        let crv = params
            .curve
            .as_deref()
            .ok_or_else(|| Error::InvalidKeyFormat("missing 'crv'".to_string()))?;
        if OKP_CURVES.contains(&crv) {
            return Err(Error::InvalidKeyFormat(format!(
                "curve '{crv}' requires key type 'OKP'"
            )));
        }
        let x = &params
            .x_coordinate
            .as_ref()
            .ok_or_else(|| Error::InvalidKeyFormat("missing 'x'".to_string()))?
            .0;
        let y = &params
            .y_coordinate
            .as_ref()
            .ok_or_else(|| Error::InvalidKeyFormat("missing 'y'".to_string()))?
            .0;

        match Curve::from_jwk_crv(crv) {
            Some(curve) => {
                let len = curve.coordinate_len();
                if x.len() != len || y.len() != len {
                    return Err(Error::InvalidKeyFormat(format!(
                        "coordinates must be {len} bytes long for {crv}"
                    )));
                }
                if !curve.is_on_curve(x, y) {
                    return Err(Error::InvalidKeyFormat(format!("point is not on {crv}")));
                }
            }
            None => {
                if x.is_empty() || x.len() != y.len() {
                    return Err(Error::InvalidKeyFormat(format!(
                        "coordinates of a {crv} key must be non-empty and of equal length"
                    )));
                }
                tracing::debug!("attesting key on unchecked curve '{crv}'");
            }
        }

        Ok(Self {
            kty: "EC".to_string(),
            crv: crv.to_string(),
            x: base64::encode_config(x, base64::URL_SAFE_NO_PAD),
            y: base64::encode_config(y, base64::URL_SAFE_NO_PAD),
            key_use: jwk.public_key_use.clone(),
        })
    }
}
