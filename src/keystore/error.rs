use std::path::PathBuf;

/// Failures while loading the provider's key material.
///
/// All of these are fatal at startup: a process that hits one must not serve
/// issuance requests.
#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("unable to open keystore at '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("keystore has no entry for alias '{0}'")]
    MissingAlias(String),
    #[error("keystore entry '{alias}' is malformed: {reason}")]
    Malformed { alias: String, reason: String },
    #[error("keystore entry '{0}' holds no private key")]
    MissingPrivateKey(String),
    #[error("keystore credential rejected for entry '{0}'")]
    BadCredential(String),
    #[error("keystore entry '{alias}' is not an EC P-256 key: {reason}")]
    NotEcKey { alias: String, reason: String },
    #[error("keystore entry '{0}' has no certificate")]
    MissingCertificate(String),
    #[error("leaf certificate of entry '{0}' does not certify its private key")]
    CertificateKeyMismatch(String),
    #[error("invalid '{field}' descriptor: {reason}")]
    InvalidDescriptor { field: &'static str, reason: String },
    #[error("validity must be a positive, whole number of seconds")]
    InvalidValidity,
    #[error("missing parameter: '{0}'")]
    MissingParameter(&'static str),
    #[error("unable to read configuration from '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}
