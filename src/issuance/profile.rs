/// Header and claim shape of an issued attestation.
///
/// Two protocol versions are in use. [`IssuanceProfile::V1`] identifies the
/// signing key with a `kid` header and never binds a nonce;
/// [`IssuanceProfile::V2`] drops the `kid` and binds the wallet's nonce when
/// one is supplied. Both carry the full `x5c` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceProfile {
    typ: &'static str,
    key_id_header: bool,
    nonce_claim: bool,
}

impl IssuanceProfile {
    pub const V1: Self = Self::new("keyattestation+jwt", true, false);
    pub const V2: Self = Self::new("key-attestation+jwt", false, true);

    pub const fn new(typ: &'static str, key_id_header: bool, nonce_claim: bool) -> Self {
        Self {
            typ,
            key_id_header,
            nonce_claim,
        }
    }

    /// Value of the `typ` header.
    pub fn typ(&self) -> &'static str {
        self.typ
    }

    /// Whether the `kid` header is set.
    pub fn key_id_header(&self) -> bool {
        self.key_id_header
    }

    /// Whether a supplied nonce becomes a `nonce` claim.
    pub fn nonce_claim(&self) -> bool {
        self.nonce_claim
    }
}

impl Default for IssuanceProfile {
    fn default() -> Self {
        Self::V2
    }
}
