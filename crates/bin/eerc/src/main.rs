//! eerc CLI
//!
//! key derivation and balance tooling for encrypted erc tokens. ledger
//! reads and wallet signing happen elsewhere; this tool consumes their
//! output (a signature hex string, a `balanceOf` snapshot as json).
//!
//! ## Usage
//!
//! ```bash
//! # message the wallet must sign to register
//! eerc message --address 0x71c7...
//!
//! # derive keys from that signature and keep them
//! eerc derive --address 0x71c7... --signature 0x... --chain-id 43113 -o keys.json
//!
//! # decrypt a balance snapshot
//! eerc balance --keys keys.json --snapshot balance.json
//!
//! # build a pct for a deposit to a registered key
//! eerc deposit-pct --amount 1000 --public-key 123...,456...
//!
//! # auditor: open transfer commitments
//! eerc audit --keys auditor.json --commitments commitments.json
//! ```

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use eerc_crypto::audit;
use eerc_crypto::curve::Point;
use eerc_crypto::field::{self, Fq};
use eerc_crypto::keys::{self, registration_message};
use eerc_crypto::keystore::UserKeys;
use eerc_crypto::params::ENCRYPTED_DECIMALS;
use eerc_crypto::{BalanceReconstructor, DecodeParams, EncryptedBalance, Pct};

#[derive(Parser)]
#[command(name = "eerc")]
#[command(about = "encrypted erc key and balance tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the registration message for an address
    Message {
        #[arg(short, long)]
        address: String,
    },

    /// Derive encryption keys from a registration signature
    Derive {
        #[arg(short, long)]
        address: String,

        /// Wallet signature over the registration message (hex)
        #[arg(short, long, env = "EERC_SIGNATURE", hide_env_values = true)]
        signature: String,

        /// Chain id bound into the registration hash
        #[arg(long, default_value = "43113")]
        chain_id: u64,

        /// Write the key record here instead of printing public values only
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt a balance snapshot
    Balance {
        /// Key record written by `derive`
        #[arg(short, long, env = "EERC_KEYS")]
        keys: PathBuf,

        /// `balanceOf` snapshot as json, `-` for stdin
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Public key the registrar holds for this user, as `x,y`
        #[arg(long)]
        registered_key: Option<String>,

        /// Largest amount the discrete log search will try
        #[arg(long, env = "EERC_DLOG_CEILING")]
        ceiling: Option<u64>,
    },

    /// Build the pct that accompanies a deposit
    DepositPct {
        /// Amount in encrypted units
        #[arg(short, long)]
        amount: u64,

        /// Recipient public key as `x,y`
        #[arg(short, long)]
        public_key: String,
    },

    /// Open transfer commitments with the auditor key
    Audit {
        /// Auditor key record
        #[arg(short, long, env = "EERC_KEYS")]
        keys: PathBuf,

        /// Json array of 7-element commitments, `-` for stdin
        #[arg(short, long)]
        commitments: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!("eerc={level},eerc_crypto={level}"))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Message { address } => {
            println!("{}", registration_message(&address));
            Ok(())
        }
        Commands::Derive {
            address,
            signature,
            chain_id,
            output,
        } => run_derive(&address, &signature, chain_id, output.as_deref()),
        Commands::Balance {
            keys,
            snapshot,
            registered_key,
            ceiling,
        } => run_balance(&keys, &snapshot, registered_key.as_deref(), ceiling),
        Commands::DepositPct { amount, public_key } => run_deposit_pct(amount, &public_key),
        Commands::Audit { keys, commitments } => run_audit(&keys, &commitments),
    }
}

fn run_derive(address: &str, signature: &str, chain_id: u64, output: Option<&Path>) -> Result<()> {
    let record = UserKeys::derive(address, signature, chain_id).context("failed to derive keys")?;

    if let Some(path) = output {
        record
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "key record written");
    }

    let public = json!({
        "address": record.address,
        "publicKey": record.public_key,
        "registrationHash": record.registration_hash.as_ref().map(field::to_decimal),
    });
    println!("{}", serde_json::to_string_pretty(&public)?);
    Ok(())
}

fn run_balance(
    keys_path: &Path,
    snapshot_path: &Path,
    registered_key: Option<&str>,
    ceiling: Option<u64>,
) -> Result<()> {
    let record = UserKeys::load(keys_path)
        .with_context(|| format!("failed to load keys from {}", keys_path.display()))?;
    let pair = record.key_pair().context("key record is inconsistent")?;

    if let Some(text) = registered_key {
        let registered = parse_point(text)?;
        keys::verify_public_key(&pair.public_key, &registered, &record.address)
            .context("derived key does not match the registered key")?;
    }

    let snapshot: EncryptedBalance = serde_json::from_str(&read_input(snapshot_path)?)
        .context("snapshot is not a balanceOf result")?;

    let params = match ceiling {
        Some(c) => DecodeParams::V1.with_ceiling(c),
        None => DecodeParams::V1,
    };
    info!(
        version = params.version,
        ceiling = params.dlog_ceiling,
        pcts = snapshot.amount_pcts.len(),
        "reconstructing balance"
    );

    let units = BalanceReconstructor::new(params)
        .reconstruct_snapshot(&pair.private_key, &snapshot)
        .context("failed to reconstruct balance")?;

    let report = json!({
        "address": record.address,
        "units": units.to_string(),
        "balance": format_units(units, ENCRYPTED_DECIMALS),
        "source": if snapshot.egct.is_empty() { "pct" } else { "egct" },
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_deposit_pct(amount: u64, public_key: &str) -> Result<()> {
    let recipient = parse_point(public_key)?;
    if !recipient.is_on_curve() {
        anyhow::bail!("public key is not a babyjubjub point");
    }

    let pct = Pct::encrypt(&[Fq::from(amount)], &recipient, &mut rand::rngs::OsRng)
        .context("failed to encrypt amount")?;
    println!("{}", serde_json::to_string_pretty(&pct)?);
    Ok(())
}

fn run_audit(keys_path: &Path, commitments_path: &Path) -> Result<()> {
    let pair = UserKeys::load(keys_path)
        .with_context(|| format!("failed to load keys from {}", keys_path.display()))?
        .key_pair()
        .context("auditor key record is inconsistent")?;

    let commitments: Vec<Pct> = serde_json::from_str(&read_input(commitments_path)?)
        .context("commitments must be a json array of 7-element arrays")?;

    let opened = audit::open_all(&pair.private_key, &commitments);
    let readable = opened.iter().filter(|r| r.is_ok()).count();
    if readable < opened.len() {
        warn!(unreadable = opened.len() - readable, "some commitments were not for this auditor");
    }

    let report: Vec<_> = opened
        .into_iter()
        .enumerate()
        .map(|(i, result)| match result {
            Ok(note) => json!({
                "index": i,
                "amount": note.amount.to_string(),
                "sender": note.sender,
            }),
            Err(e) => json!({ "index": i, "error": e.to_string() }),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// `x,y` in decimal or 0x hex
fn parse_point(text: &str) -> Result<Point> {
    let (x, y) = text
        .split_once(',')
        .context("point must be written as x,y")?;
    Ok(Point::new(field::parse(x)?, field::parse(y)?))
}

/// fixed-point display of an integer amount
fn format_units(amount: u64, decimals: u8) -> String {
    let scale = 10u64.pow(decimals as u32);
    if decimals == 0 {
        return amount.to_string();
    }
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = decimals as usize
    )
}
