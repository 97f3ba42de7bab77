//! Fixtures shared by the unit and integration tests: a throwaway provider
//! PKI, keystores on disk and wallet keys.
//!
//! Compiled for unit tests and behind the `test-utils` feature.
use std::{fs, path::Path, time::Duration};

use der::{pem::LineEnding, Encode, EncodePem};
use elliptic_curve::{
    sec1::{EncodedPoint, ModulusSize, ToEncodedPoint},
    Curve, FieldBytesSize,
};
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use p256::{
    ecdsa::{Signature, SigningKey},
    pkcs8::EncodePrivateKey,
};
use pkcs8::PrivateKeyInfo;
use rand::random;
use serde_json::{json, Map, Value};
use signature::Signer;
use x509_cert::{
    builder::{Builder, CertificateBuilder, Profile},
    ext::pkix::{BasicConstraints, KeyUsage, KeyUsages},
    name::Name,
    spki::{SignatureBitStringEncoding, SubjectPublicKeyInfoOwned},
    time::Validity,
    Certificate,
};
use zeroize::Zeroizing;

use crate::{
    keystore::{pem, KeyEntry, X5Chain},
    material::KeyMaterial,
};

pub const LEAF_COMMON_NAME: &str = "WUA signer";
pub const ROOT_COMMON_NAME: &str = "WUA root";
pub const ISSUER: &str = "Digg";
pub const ALIAS: &str = "wua";
pub const PASSWORD: &str = "changeit";
pub const VALIDITY: time::Duration = time::Duration::hours(24);

#[derive(Debug, Clone, Copy)]
pub enum KeyEncoding {
    Encrypted,
    Plain,
}

/// A provider signing key certified by a freshly minted root.
pub struct Provider {
    pub signing_key: SigningKey,
    /// Leaf first.
    pub certificates: Vec<Certificate>,
}

impl Provider {
    pub fn generate() -> Self {
        let root_key = SigningKey::random(&mut rand::thread_rng());
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let root_name: Name = format!("CN={ROOT_COMMON_NAME},O=Wallet Provider")
            .parse()
            .unwrap();
        let leaf_name: Name = format!("CN={LEAF_COMMON_NAME},O=Wallet Provider")
            .parse()
            .unwrap();

        let root = issue_certificate(&root_key, None, root_name.clone(), &root_key, true);
        let leaf = issue_certificate(&signing_key, Some(root_name), leaf_name, &root_key, false);

        Self {
            signing_key,
            certificates: vec![leaf, root],
        }
    }

    pub fn chain(&self) -> X5Chain {
        self.certificates
            .iter()
            .cloned()
            .try_fold(X5Chain::builder(), |builder, cert| {
                builder.with_certificate(cert)
            })
            .unwrap()
            .build()
            .unwrap()
    }

    pub fn chain_pem(&self) -> String {
        self.certificates
            .iter()
            .map(|cert| cert.to_pem(LineEnding::LF).unwrap())
            .collect()
    }

    /// The chain as it appears in an `x5c` header.
    pub fn x5c(&self) -> Vec<String> {
        self.certificates
            .iter()
            .map(|cert| base64::encode(cert.to_der().unwrap()))
            .collect()
    }

    pub fn key_entry(&self) -> KeyEntry {
        KeyEntry::new(ALIAS, self.signing_key.clone(), self.chain()).unwrap()
    }

    /// Write `<alias>.key` and `<alias>.crt` into the `PEM` keystore `dir`.
    pub fn write_pem_entry(&self, dir: &Path, alias: &str, password: &str, encoding: KeyEncoding) {
        let key = match encoding {
            KeyEncoding::Encrypted => encrypted_key_pem(&self.signing_key, password),
            KeyEncoding::Plain => self.signing_key.to_pkcs8_pem(LineEnding::LF).unwrap(),
        };
        let path = |extension: &str| dir.join(format!("{alias}.{extension}"));
        fs::write(path(pem::KEY_EXTENSION), key.as_bytes()).unwrap();
        fs::write(path(pem::CHAIN_EXTENSION), self.chain_pem()).unwrap();
    }

    /// A `PKCS12` keystore holding the key and chain under `alias`.
    pub fn pkcs12(&self, alias: &str, password: &str) -> Vec<u8> {
        let key = self.signing_key.to_pkcs8_der().unwrap();
        let chain: Vec<_> = self
            .certificates
            .iter()
            .map(|cert| p12_keystore::Certificate::from_der(&cert.to_der().unwrap()).unwrap())
            .collect();
        let local_key_id = random::<[u8; 20]>().to_vec();
        let entry = PrivateKeyChain::new(key.as_bytes().to_vec(), local_key_id, chain);

        let mut keystore = KeyStore::new();
        keystore.add_entry(alias, KeyStoreEntry::PrivateKeyChain(entry));
        keystore.writer(password).write().unwrap()
    }

    pub fn write_pkcs12(&self, path: &Path, alias: &str, password: &str) {
        fs::write(path, self.pkcs12(alias, password)).unwrap();
    }
}

fn issue_certificate(
    subject_key: &SigningKey,
    issuer: Option<Name>,
    subject: Name,
    issuer_key: &SigningKey,
    ca: bool,
) -> Certificate {
    let spki = SubjectPublicKeyInfoOwned::from_key(*subject_key.verifying_key()).unwrap();
    let mut builder = CertificateBuilder::new(
        Profile::Manual { issuer },
        random::<u64>().into(),
        Validity::from_now(Duration::from_secs(3600)).unwrap(),
        subject,
        spki,
        issuer_key,
    )
    .unwrap();

    let usage = if ca {
        KeyUsages::KeyCertSign | KeyUsages::CRLSign
    } else {
        KeyUsages::DigitalSignature.into()
    };
    builder.add_extension(&KeyUsage(usage)).unwrap();
    builder
        .add_extension(&BasicConstraints {
            ca,
            path_len_constraint: ca.then_some(0),
        })
        .unwrap();

    let signature: Signature = issuer_key.sign(&builder.finalize().unwrap());
    builder
        .assemble(signature.to_der().to_bitstring().unwrap())
        .unwrap()
}

/// PBES2 (PBKDF2-SHA256, AES-256-CBC) with a low iteration count to keep
/// the tests quick.
pub fn encrypted_key_pem(key: &SigningKey, password: &str) -> Zeroizing<String> {
    let der = key.to_pkcs8_der().unwrap();
    let salt: [u8; 16] = random();
    let iv: [u8; 16] = random();
    let params = pkcs8::pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, &salt, &iv)
        .unwrap();
    PrivateKeyInfo::try_from(der.as_bytes())
        .unwrap()
        .encrypt_with_params(params, password)
        .unwrap()
        .to_pem("ENCRYPTED PRIVATE KEY", LineEnding::LF)
        .unwrap()
}

pub fn plain_p384_key_pem(key: &p384::SecretKey) -> String {
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn wallet_info() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "general_info": {
            "wallet_provider_name": "Digg",
            "wallet_solution_id": "Diggidigg-id",
            "wallet_solution_version": "0.0.1",
            "wallet_solution_certification_information": "UNCERTIFIED"
        },
        "wscd_info": {
            "wscd_type": "REMOTE",
            "wscd_certification_information": "UNCERTIFIED",
            "wscd_attack_resistance": 2
        }
    }) else {
        unreachable!()
    };
    map
}

pub fn status() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "status_list": {
            "idx": 412,
            "uri": "https://revocation_url/statuslists/1"
        }
    }) else {
        unreachable!()
    };
    map
}

/// Key material for `provider`, with the alias as key id.
pub fn key_material(provider: &Provider) -> KeyMaterial {
    KeyMaterial::builder()
        .entry(provider.key_entry())
        .issuer(ISSUER)
        .validity(VALIDITY)
        .wallet_info(wallet_info())
        .status(status())
        .key_id(ALIAS)
        .build()
        .unwrap()
}

/// A fresh P-256 wallet key pair and its public part as a JWK string.
pub fn wallet_jwk() -> (SigningKey, String) {
    let key = SigningKey::random(&mut rand::thread_rng());
    let jwk = jwk_for(&key, None);
    (key, jwk)
}

pub fn jwk_for(key: &SigningKey, key_use: Option<&str>) -> String {
    let mut jwk: Value =
        serde_json::from_str(&ec_jwk::<p256::NistP256>("P-256", &key.verifying_key().to_encoded_point(false)))
            .unwrap();
    if let Some(key_use) = key_use {
        jwk["use"] = key_use.into();
    }
    jwk.to_string()
}

/// A public EC JWK for an uncompressed point.
pub fn ec_jwk<C>(crv: &str, point: &EncodedPoint<C>) -> String
where
    C: Curve,
    FieldBytesSize<C>: ModulusSize,
{
    let encode = |bytes: &[u8]| base64::encode_config(bytes, base64::URL_SAFE_NO_PAD);
    json!({
        "kty": "EC",
        "crv": crv,
        "x": encode(point.x().unwrap().as_slice()),
        "y": encode(point.y().unwrap().as_slice()),
    })
    .to_string()
}

/// A fresh P-521 wallet public key as a JWK string.
pub fn p521_jwk() -> String {
    let key = p521::SecretKey::random(&mut rand::thread_rng());
    ec_jwk::<p521::NistP521>("P-521", &key.public_key().to_encoded_point(false))
}

/// A fresh secp256k1 wallet public key as a JWK string.
pub fn secp256k1_jwk() -> String {
    let key = k256::SecretKey::random(&mut rand::thread_rng());
    ec_jwk::<k256::Secp256k1>("secp256k1", &key.public_key().to_encoded_point(false))
}
