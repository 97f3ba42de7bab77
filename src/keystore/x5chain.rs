//! The provider's `X.509` certificate chain, leaf first.
//!
//! The chain is held with each certificate's `DER` encoding in memory so it can
//! be placed in a JWS `x5c` header without re-encoding. `x5c` entries are
//! standard (padded) base64 of the `DER` bytes, per RFC 7515 section 4.1.6.
use crate::helpers::NonEmptyVec;

use anyhow::{Context, Error, Result};
use const_oid::{db::rfc4519::COMMON_NAME, AssociatedOid};
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, TeletexStringRef, Utf8StringRef},
    referenced::OwnedToRef,
    Tag, Tagged,
};
use ecdsa::{PrimeCurve, VerifyingKey};
use elliptic_curve::{
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey,
};
use sha2::{Digest, Sha256};
use x509_cert::der::Encode;
use x509_cert::{attr::AttributeValue, certificate::Certificate, der::Decode};

/// X.509 certificate with the DER representation held in memory for ease of serialization.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CertificateWithDer {
    pub inner: Certificate,
    der: Vec<u8>,
}

impl CertificateWithDer {
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let inner = Certificate::from_der(bytes)
            .context("unable to parse certificate from DER encoding")?;
        Ok(Self {
            inner,
            der: bytes.to_vec(),
        })
    }

    pub fn from_cert(certificate: Certificate) -> Result<Self> {
        let der = certificate.to_der()?;
        Ok(Self {
            inner: certificate,
            der,
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X5Chain(NonEmptyVec<CertificateWithDer>);

impl From<NonEmptyVec<CertificateWithDer>> for X5Chain {
    fn from(v: NonEmptyVec<CertificateWithDer>) -> Self {
        Self(v)
    }
}

impl X5Chain {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Encode the chain as the value of a JWS `x5c` header.
    pub fn to_x5c(&self) -> Vec<String> {
        self.0.iter().map(|x509| base64::encode(&x509.der)).collect()
    }

    /// Decode the value of a JWS `x5c` header.
    pub fn from_x5c<S: AsRef<str>>(x5c: &[S]) -> Result<Self, Error> {
        x5c.iter()
            .enumerate()
            .try_fold(Self::builder(), |builder, (index, encoded)| {
                let der = base64::decode(encoded.as_ref())
                    .with_context(|| format!("x5c entry {index} is not valid base64"))?;
                builder.with_der_certificate(&der)
            })?
            .build()
    }

    /// Retrieve the end-entity certificate.
    pub fn end_entity_certificate(&self) -> &Certificate {
        &self.0.first().inner
    }

    /// Retrieve the public key of the end-entity certificate.
    pub fn end_entity_public_key<C>(&self) -> Result<VerifyingKey<C>, Error>
    where
        C: AssociatedOid + CurveArithmetic + PrimeCurve,
        AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
        FieldBytesSize<C>: ModulusSize,
    {
        public_key(self.end_entity_certificate())
    }

    /// Retrieve the first common name of the end-entity certificate.
    pub fn end_entity_common_name(&self) -> &str {
        common_name_or_unknown(self.end_entity_certificate())
    }

    /// SHA-256 fingerprint of the end-entity certificate, base64url encoded.
    pub fn end_entity_fingerprint(&self) -> String {
        base64::encode_config(Sha256::digest(&self.0.first().der), base64::URL_SAFE_NO_PAD)
    }

    /// Iterate over the certificates in the chain.
    pub fn iter(&self) -> impl Iterator<Item = &CertificateWithDer> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for symmetry with [`X5Chain::len`].
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Default, Debug, Clone)]
pub struct Builder {
    certs: Vec<CertificateWithDer>,
}

impl Builder {
    pub fn with_certificate(mut self, cert: Certificate) -> Result<Builder> {
        let x509 = CertificateWithDer::from_cert(cert)?;
        self.certs.push(x509);
        Ok(self)
    }
    pub fn with_der_certificate(mut self, data: &[u8]) -> Result<Builder> {
        let x509 = CertificateWithDer::from_der(data)?;
        self.certs.push(x509);
        Ok(self)
    }
    pub fn build(self) -> Result<X5Chain> {
        Ok(X5Chain(self.certs.try_into().context(
            "at least one certificate must be given to the builder",
        )?))
    }
}

/// Get the public key from a certificate for verification.
fn public_key<C>(certificate: &Certificate) -> Result<VerifyingKey<C>, Error>
where
    C: AssociatedOid + CurveArithmetic + PrimeCurve,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    certificate
        .tbs_certificate
        .subject_public_key_info
        .owned_to_ref()
        .try_into()
        .map(|key: PublicKey<C>| key.into())
        .context("could not parse public key from PKCS8 SPKI")
}

fn common_name_or_unknown(certificate: &Certificate) -> &str {
    certificate
        .tbs_certificate
        .subject
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter(|attribute| attribute.oid == COMMON_NAME)
        .find_map(|attribute| attribute_value_to_str(&attribute.value))
        .unwrap_or("Unknown")
}

fn attribute_value_to_str(av: &AttributeValue) -> Option<&str> {
    match av.tag() {
        Tag::PrintableString => PrintableStringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Utf8String => Utf8StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Ia5String => Ia5StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::TeletexString => TeletexStringRef::try_from(av).ok().map(|s| s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::test_support;
    use p256::NistP256;

    #[test]
    fn builds_leaf_first_chain() {
        let fixture = test_support::Provider::generate();
        let chain = fixture.chain();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.end_entity_common_name(), test_support::LEAF_COMMON_NAME);
        let root = chain.iter().last().unwrap();
        assert_eq!(
            common_name_or_unknown(&root.inner),
            test_support::ROOT_COMMON_NAME
        );
        let leaf_key: VerifyingKey<NistP256> = chain.end_entity_public_key().unwrap();
        assert_eq!(&leaf_key, fixture.signing_key.verifying_key());
    }

    #[test]
    fn parsed_and_der_certificates_agree() {
        let fixture = test_support::Provider::generate();
        let leaf = &fixture.certificates[0];

        let parsed = X5Chain::builder()
            .with_certificate(leaf.clone())
            .unwrap()
            .build()
            .unwrap();
        let from_der = X5Chain::builder()
            .with_der_certificate(&leaf.to_der().unwrap())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(parsed, from_der);
    }

    #[test]
    fn x5c_preserves_order_and_bytes() {
        let fixture = test_support::Provider::generate();
        let chain = fixture.chain();
        let x5c = chain.to_x5c();

        assert_eq!(x5c.len(), 2);
        for (encoded, cert) in x5c.iter().zip(chain.iter()) {
            assert_eq!(base64::decode(encoded).unwrap(), cert.der());
        }
        assert_eq!(X5Chain::from_x5c(&x5c).unwrap(), chain);
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(X5Chain::builder().build().is_err());
        assert!(X5Chain::from_x5c::<String>(&[]).is_err());
        assert!(X5Chain::from_x5c(&["not base64!"]).is_err());
    }
}
