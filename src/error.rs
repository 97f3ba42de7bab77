use crate::keystore::KeyMaterialError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Issuance failures, split by who is at fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key material could not be loaded. Fatal at startup.
    #[error(transparent)]
    KeyMaterial(#[from] KeyMaterialError),
    /// The caller supplied something that is not an acceptable EC JWK.
    #[error("invalid attested key: {0}")]
    InvalidKeyFormat(String),
    #[error("unable to sign attestation: {0}")]
    Signing(String),
}

impl Error {
    /// Whether the request itself was at fault, as opposed to the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidKeyFormat(_))
    }

    /// A message fit for the caller. Server faults are not detailed.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidKeyFormat(_) => self.to_string(),
            Error::KeyMaterial(_) | Error::Signing(_) => {
                "wallet unit attestation could not be issued".to_string()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_key_format_is_a_client_error() {
        let rejected = Error::InvalidKeyFormat("missing 'x'".to_string());
        assert!(rejected.is_client_error());
        assert!(rejected.public_message().contains("missing 'x'"));

        let signing = Error::Signing("key id is not configured".to_string());
        assert!(!signing.is_client_error());
        assert!(!signing.public_message().contains("key id"));

        let material: Error = KeyMaterialError::MissingAlias("wua".to_string()).into();
        assert!(!material.is_client_error());
        assert!(!material.public_message().contains("wua"));
    }
}
