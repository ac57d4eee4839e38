//! # Keygen Subcommand
//!
//! Generates oracle node keys. The seed goes to the node operator; the
//! public key goes into `trusted_oracle_keys` of the verifier config.

use clap::Args;
use serde::Serialize;

use gt_crypto::Ed25519KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Number of key pairs to generate.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct GeneratedKey {
    pub seed: String,
    pub public_key: String,
}

pub fn run_keygen(args: &KeygenArgs) -> anyhow::Result<Vec<GeneratedKey>> {
    anyhow::ensure!(args.count > 0, "--count must be at least 1");
    let keys = (0..args.count)
        .map(|_| {
            let kp = Ed25519KeyPair::generate();
            GeneratedKey {
                seed: kp.seed_hex(),
                public_key: kp.public_key().to_hex(),
            }
        })
        .collect();
    tracing::info!(count = args.count, "oracle keys generated");
    Ok(keys)
}
