use std::{fs, path::PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use wua::{
    config::KeystoreConfig,
    test_support::{Provider, ALIAS, ISSUER, PASSWORD, VALIDITY},
    Issuer, KeyMaterial,
};

#[allow(dead_code)]
fn main() {}

/// A `PKCS12` keystore with `provider`'s key stored under [`ALIAS`], and a
/// configuration file `wua.json` next to it.
pub struct Deployment {
    pub dir: TempDir,
    pub provider: Provider,
}

impl Deployment {
    pub fn new() -> Self {
        let deployment = Self::empty(Provider::generate());
        deployment
            .provider
            .write_pkcs12(&deployment.keystore(), ALIAS, PASSWORD);
        deployment
    }

    /// Only the configuration, no keystore file.
    pub fn empty(provider: Provider) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = json!({
            "type": "PKCS12",
            "location": "keystore.p12",
            "password": PASSWORD,
            "alias": ALIAS,
            "issuer": ISSUER,
            "validity-hours": VALIDITY.whole_hours(),
            "eudi-wallet-info": wallet_info(),
            "status": status().to_string(),
        });
        fs::write(dir.path().join("wua.json"), config.to_string()).unwrap();
        Self { dir, provider }
    }

    pub fn keystore(&self) -> PathBuf {
        self.dir.path().join("keystore.p12")
    }

    pub fn config(&self) -> KeystoreConfig {
        KeystoreConfig::from_json_file(self.dir.path().join("wua.json")).unwrap()
    }

    #[allow(dead_code)]
    pub fn issuer(&self) -> Issuer {
        Issuer::new(KeyMaterial::from_config(&self.config()).unwrap())
    }
}

pub fn wallet_info() -> Value {
    wua::test_support::wallet_info().into()
}

pub fn status() -> Value {
    wua::test_support::status().into()
}

/// A fresh P-256 wallet public key as a JWK.
#[allow(dead_code)]
pub fn wallet_jwk() -> Value {
    let (_, jwk) = wua::test_support::wallet_jwk();
    serde_json::from_str(&jwk).unwrap()
}

/// Split a compact token into its three segments.
#[allow(dead_code)]
pub fn segments(token: &str) -> (String, String, String) {
    let mut parts = token.split('.').map(str::to_string);
    let segments = (
        parts.next().unwrap(),
        parts.next().unwrap(),
        parts.next().unwrap(),
    );
    assert!(parts.next().is_none());
    segments
}
