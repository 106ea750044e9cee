//! HTLC Bridge Service
//!
//! Runs the order engine behind the REST API, bootstrapped from
//! `config/htlc.toml` (or `HTLC_CONFIG_PATH`, or `--config`).
//!
//! ## Usage
//!
//! ```bash
//! htlc-bridge --config config/htlc.toml serve
//! htlc-bridge commit --secret "my secret"
//! htlc-bridge keygen
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use rand::Rng;
use tracing::info;

use htlc_bridge::api::ApiServer;
use htlc_bridge::auth;
use htlc_bridge::config::Config;
use htlc_bridge::hashlock;
use htlc_bridge::service::HtlcService;

#[derive(Parser, Debug)]
#[command(name = "htlc-bridge")]
#[command(about = "Hash time-locked order engine for TON <-> EVM swaps")]
struct Args {
    /// Path to the configuration file (default: HTLC_CONFIG_PATH or config/htlc.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the API server
    Serve,
    /// Print the hashlock committing to a secret
    Commit {
        /// Secret as UTF-8 text
        #[arg(long)]
        secret: String,
    },
    /// Generate an Ed25519 key pair for a [[signers]] entry
    Keygen,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    match args.command {
        Command::Commit { secret } => {
            println!("{}", hashlock::commit(secret.as_bytes()));
            Ok(())
        }
        Command::Keygen => {
            let mut rng = rand::rngs::OsRng;
            let mut secret_key_bytes = [0u8; 32];
            rng.fill(&mut secret_key_bytes);
            let signing_key = SigningKey::from_bytes(&secret_key_bytes);

            println!("Generated Ed25519 Key Pair:");
            println!("Private Key (hex): 0x{}", hex::encode(signing_key.as_bytes()));
            println!(
                "Public Key (hex): {}",
                auth::public_key_hex(&signing_key.verifying_key())
            );
            println!();
            println!("Add the public key to a [[signers]] entry in your config.");
            Ok(())
        }
        Command::Serve => {
            info!("Starting HTLC Bridge Service");

            let config = match args.config {
                Some(path) => {
                    info!("Loading configuration from: {}", path);
                    Config::load_from_path(&path)?
                }
                None => Config::load()?,
            };
            info!(
                "Configuration loaded (owner {}, local chain {}, {} bridge(s))",
                config.engine.owner,
                config.engine.local_chain_id,
                config.bridges.len()
            );

            let service = HtlcService::from_config(&config)?;
            ApiServer::new(config.api.clone(), service).run().await
        }
    }
}
