#![forbid(unsafe_code)]
//! Command-line front-end for key management, signing and recovery.

use clap::{Parser, Subcommand};
use colored::*;
use ethsigner::address::{public_key_to_address, to_checksum_address, validate_address_checksum};
use ethsigner::config::load_config;
use ethsigner::crypto::{derive_public_key, generate_private_key, private_key_from_hex, KeyPair};
use ethsigner::mnemonic::{private_key_from_mnemonic, private_key_to_mnemonic};
use ethsigner::units::{decimal_to_hex, ether_to_wei};
use ethsigner::{Signer, Transaction};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "ethsigner.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates a new private key and prints its address
    Generate {
        /// Also print the 24-word backup phrase
        #[arg(long)]
        mnemonic: bool,
    },
    /// Derives the public key and address of a private key
    Address {
        /// Private key as 64 hex characters
        private_key: String,
    },
    /// Checks the mixed-case checksum of an address
    CheckAddress {
        address: String,
    },
    /// Signs a JSON transaction and prints the signed encoding as hex
    Sign {
        /// Private key as 64 hex characters
        #[arg(long)]
        key: String,
        /// JSON file with nonce, gasPrice, gasLimit, to, value, data, chainId
        #[arg(long)]
        tx: PathBuf,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Recovers the sender of a signed transaction
    Recover {
        /// Signed transaction hex
        signed: String,
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// Converts between private keys and BIP-39 phrases
    Mnemonic {
        #[command(subcommand)]
        action: MnemonicAction,
    },
    /// Converts an ether amount to wei
    ToWei {
        ether: String,
    },
}

#[derive(Subcommand)]
enum MnemonicAction {
    /// Prints the private key encoded by a phrase
    ToKey {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
    /// Prints the phrase for a private key
    FromKey {
        private_key: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { mnemonic } => generate(mnemonic)?,
        Commands::Address { private_key } => address(&private_key)?,
        Commands::CheckAddress { address } => check_address(&address),
        Commands::Sign { key, tx, config } => sign(&key, &tx, &config)?,
        Commands::Recover { signed, config } => recover(&signed, &config)?,
        Commands::Mnemonic { action } => match action {
            MnemonicAction::ToKey { words } => {
                let key = private_key_from_mnemonic(&words.join(" "))?;
                println!("{}", hex::encode(key));
            }
            MnemonicAction::FromKey { private_key } => {
                let key = private_key_from_hex(&private_key)?;
                println!("{}", private_key_to_mnemonic(&key)?);
            }
        },
        Commands::ToWei { ether } => {
            let wei = ether_to_wei(&ether)?;
            println!("{} {}", "Wei:".bright_green(), wei);
            println!("{} {}", "Hex:".bright_green(), decimal_to_hex(wei));
        }
    }

    Ok(())
}

fn generate(with_mnemonic: bool) -> Result<(), Box<dyn std::error::Error>> {
    let private_key = generate_private_key()?;
    let keypair = KeyPair::from_secret_bytes(&private_key)?;

    println!("{}", "🔑 New key generated".bright_cyan().bold());
    println!("{} {}", "Private key:".bright_yellow(), hex::encode(private_key));
    println!(
        "{} {}",
        "Address:    ".bright_green(),
        to_checksum_address(&keypair.address())
    );
    if with_mnemonic {
        println!(
            "{} {}",
            "Phrase:     ".bright_magenta(),
            private_key_to_mnemonic(&private_key)?
        );
    }
    println!();
    println!("{}", "⚠️  Store the private key offline; it is not saved anywhere.".yellow());
    Ok(())
}

fn address(private_key_hex: &str) -> Result<(), Box<dyn std::error::Error>> {
    let private_key = private_key_from_hex(private_key_hex)?;
    let public_key = derive_public_key(&private_key)?;
    let address = public_key_to_address(&public_key)?;

    println!("{} {}", "Public key:".bright_cyan(), hex::encode(public_key));
    println!("{} {}", "Address:   ".bright_green(), to_checksum_address(&address));
    Ok(())
}

fn check_address(address: &str) {
    if validate_address_checksum(address) {
        println!("{} {}", "✅ Valid address:".green(), address);
    } else {
        println!("{} {}", "❌ Invalid address:".red().bold(), address);
        std::process::exit(1);
    }
}

fn sign(
    key_hex: &str,
    tx_path: &Path,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let signer = Signer::new(load_config(config_path)?);
    let private_key = private_key_from_hex(key_hex)?;

    let tx_json = std::fs::read_to_string(tx_path)
        .map_err(|e| format!("Failed to read {}: {}", tx_path.display(), e))?;
    let tx: Transaction = serde_json::from_str(&tx_json)
        .map_err(|e| format!("Failed to parse transaction: {}", e))?;

    println!("{}", signer.sign_to_hex(&tx, &private_key)?);
    Ok(())
}

fn recover(signed_hex: &str, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let signer = Signer::new(load_config(config_path)?);
    let public_key = signer.recover_public_key_hex(signed_hex)?;
    let address = public_key_to_address(&public_key)?;

    println!("{} {}", "Public key:".bright_cyan(), hex::encode(public_key));
    println!("{} {}", "Sender:    ".bright_green(), to_checksum_address(&address));
    Ok(())
}
