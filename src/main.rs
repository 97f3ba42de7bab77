use std::path::PathBuf;

use anyhow::{bail, Context, Error};
use clap::Parser;
use clap_stdin::MaybeStdin;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wua::{
    config::KeystoreConfig,
    issuance::{IssuanceProfile, Issuer, SignedAttestation},
    KeyMaterial,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Issue a wallet unit attestation for a wallet public key.
    Issue {
        /// JSON configuration of the keystore and issuance settings.
        #[arg(short, long)]
        config: PathBuf,
        /// Keystore password, overriding the configured one.
        #[arg(long, env = "WUA_KEYSTORE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long, value_enum, default_value_t = Profile::V2)]
        profile: Profile,
        /// Nonce to bind into the attestation. Ignored by the v1 profile.
        #[arg(long)]
        nonce: Option<String>,
        /// Wallet public key as a JWK.
        jwk: MaybeStdin<String>,
    },
    /// Print the header and claims of an attestation and check its signature
    /// against the leaf of its certificate chain.
    Inspect {
        /// Compact serialized attestation.
        token: MaybeStdin<String>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Profile {
    /// `keyattestation+jwt` with a key id, no nonce.
    V1,
    /// `key-attestation+jwt`, nonce when supplied.
    V2,
}

impl From<Profile> for IssuanceProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::V1 => IssuanceProfile::V1,
            Profile::V2 => IssuanceProfile::V2,
        }
    }
}

fn main() -> Result<(), Error> {
    init_logging();

    match Args::parse().action {
        Action::Issue {
            config,
            password,
            profile,
            nonce,
            jwk,
        } => issue(config, password, profile, nonce, jwk.to_string()),
        Action::Inspect { token } => inspect(token.to_string()),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn issue(
    config: PathBuf,
    password: Option<String>,
    profile: Profile,
    nonce: Option<String>,
    jwk: String,
) -> Result<(), Error> {
    let mut config = KeystoreConfig::from_json_file(&config)?;
    if let Some(password) = password {
        config.password = password;
    }
    let issuer = Issuer::new(KeyMaterial::from_config(&config)?);

    match issuer.issue_with_profile(jwk.trim(), nonce.as_deref(), profile.into()) {
        Ok(token) => {
            println!("{token}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("issuance failed: {e}");
            bail!(e.public_message())
        }
    }
}

fn inspect(token: String) -> Result<(), Error> {
    let token = SignedAttestation::parse(token).context("could not parse attestation")?;
    let header = token.decode_header().context("could not decode header")?;
    let claims = token.claims_json().context("could not decode claims")?;

    println!("{}", serde_json::to_string_pretty(&header)?);
    println!("{}", serde_json::to_string_pretty(&claims)?);

    let verified = token
        .leaf_verifying_key()
        .and_then(|key| token.verify(&key));
    match verified {
        Ok(()) => println!(
            "signature: valid ({})",
            token.certificate_chain()?.end_entity_common_name()
        ),
        Err(e) => println!("signature: invalid ({e})"),
    }
    Ok(())
}
