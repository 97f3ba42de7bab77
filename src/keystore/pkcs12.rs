//! `PKCS12` keystores: one password protected file holding private key
//! entries under their friendly names, as written by `keytool` or `openssl
//! pkcs12 -export -name <alias>`.
use std::{fs, path::Path};

use der::{asn1::AnyRef, Decode};
use p12_keystore::{KeyStore, KeyStoreEntry};
use pkcs8::PrivateKeyInfo;

use super::{signing_key_from_pkcs8, KeyEntry, KeyMaterialError, X5Chain};

pub(super) fn load(
    location: &Path,
    credential: &str,
    alias: &str,
) -> Result<KeyEntry, KeyMaterialError> {
    let data = fs::read(location).map_err(|source| KeyMaterialError::Unreadable {
        path: location.to_path_buf(),
        source,
    })?;
    let malformed = |reason: String| KeyMaterialError::Malformed {
        alias: alias.to_string(),
        reason,
    };

    let keystore = KeyStore::from_pkcs12(&data, credential).map_err(|e| {
        tracing::debug!("unable to open PKCS#12 keystore '{}': {e}", location.display());
        // Well formed DER that does not open is a password failing the MAC
        // or decryption.
        if AnyRef::from_der(&data).is_ok() {
            KeyMaterialError::BadCredential(alias.to_string())
        } else {
            malformed("not a PKCS#12 keystore".to_string())
        }
    })?;

    let chain = match keystore.entry(alias) {
        Some(KeyStoreEntry::PrivateKeyChain(chain)) => chain,
        Some(_) => return Err(KeyMaterialError::MissingPrivateKey(alias.to_string())),
        None => return Err(KeyMaterialError::MissingAlias(alias.to_string())),
    };

    let info = PrivateKeyInfo::try_from(chain.key())
        .map_err(|e| malformed(format!("unable to parse private key: {e}")))?;
    let signing_key = signing_key_from_pkcs8(alias, info)?;

    let certificates = chain
        .chain()
        .iter()
        .try_fold(X5Chain::builder(), |builder, cert| {
            builder.with_der_certificate(cert.as_der())
        })
        .map_err(|e| malformed(format!("{e:#}")))?
        .build()
        .map_err(|_| KeyMaterialError::MissingCertificate(alias.to_string()))?;

    KeyEntry::new(alias, signing_key, certificates)
}
