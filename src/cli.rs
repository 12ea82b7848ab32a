//! QRL offline signer CLI
//!
//! Commands:
//! - `sign-tx-offline`: build, sign and write a transfer without a node
//! - `create-wallet`: fresh XMSS wallet file, optionally encrypted
//! - `verify-tx`: offline check of a signed transfer file

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use rpassword::prompt_password;
use zeroize::Zeroizing;

use crate::config::{SignerConfig, DEFAULT_TREE_HEIGHT};
use crate::crypto::aes256::Aes256CtrCipher;
use crate::crypto::descriptor::Descriptor;
use crate::crypto::hash::HashFunction;
use crate::error::SignerError;
use crate::logging;
use crate::outputs::OutputRequest;
use crate::pipeline::{self, SignRequest};
use crate::signing::SigningProvider;
use crate::tx::SignedTransaction;
use crate::wallet::WalletRecord;

// CLI args
#[derive(Parser, Debug)]
#[command(name = "qrl_offline_signer", version, about = "Offline QRL transfer signing")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// More diagnostics on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Fewer diagnostics on stderr (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    quiet: u8,

    /// Mnemonic word list, one word per line
    #[arg(long, global = true, env = "QRL_WORDLIST")]
    wordlist: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Sign a transfer offline and write it to a file
    #[command(disable_help_flag = true)]
    SignTxOffline(SignArgs),

    /// Create a new wallet file
    CreateWallet(CreateArgs),

    /// Check the signature and hash of a signed transfer file
    VerifyTx {
        /// Signed transaction JSON file
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SignArgs {
    /// Number of Quanta (Shor if -s flag set) to send
    quantity: String,

    /// JSON file of the signed transaction
    output: PathBuf,

    /// QRL address of recipient
    #[arg(short = 'r', long)]
    recipient: Option<String>,

    /// JSON object of recipients/quantities for multi-output transactions
    #[arg(short = 'j', long = "json-object")]
    json_object: Option<String>,

    /// JSON file of recipients
    #[arg(short = 'R', long)]
    file: Option<PathBuf>,

    /// Send in Shor
    #[arg(short = 's', long)]
    shor: bool,

    /// Fee for transaction in Shor (defaults to 100 Shor)
    #[arg(short = 'f', long)]
    fee: Option<String>,

    /// OTS key index
    #[arg(short = 'i', long = "otsindex")]
    otsindex: String,

    /// JSON file of wallet from where funds should be sent
    #[arg(short = 'w', long)]
    wallet: Option<PathBuf>,

    /// Hexseed/mnemonic of wallet from where funds should be sent
    #[arg(short = 'h', long)]
    hexseed: Option<String>,

    /// Wallet file password
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Record used OTS indices here and refuse to reuse them
    #[arg(long = "ots-ledger", env = "QRL_OTS_LEDGER")]
    ots_ledger: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HashFlag {
    #[value(name = "sha2_256")]
    Sha2_256,
    #[value(name = "shake_128")]
    Shake128,
    #[value(name = "shake_256")]
    Shake256,
}

impl From<HashFlag> for HashFunction {
    fn from(f: HashFlag) -> Self {
        match f {
            HashFlag::Sha2_256 => HashFunction::Sha2_256,
            HashFlag::Shake128 => HashFunction::Shake128,
            HashFlag::Shake256 => HashFunction::Shake256,
        }
    }
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Wallet file to write
    output: PathBuf,

    /// Tree height (even, 2..=30); a tree holds 2^height signatures
    #[arg(long, default_value_t = DEFAULT_TREE_HEIGHT)]
    height: u8,

    #[arg(long = "hash", value_enum, default_value_t = HashFlag::Shake128)]
    hash: HashFlag,

    /// Encrypt address, hexseed and mnemonic with a password
    #[arg(short = 'e', long)]
    encrypt: bool,

    /// Password for --encrypt; prompted when absent
    #[arg(short = 'p', long)]
    password: Option<String>,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbose.min(8) as i8 - cli.quiet.min(8) as i8;
    logging::init(verbosity);
    run(cli).await
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.cmd {
        Cmd::SignTxOffline(args) => {
            let config = SignerConfig::new(cli.wordlist, args.ots_ledger.clone());
            cmd_sign_tx_offline(args, &config).await
        }
        Cmd::CreateWallet(args) => {
            let config = SignerConfig::new(cli.wordlist, None);
            cmd_create_wallet(args, &config).await
        }
        Cmd::VerifyTx { file } => cmd_verify_tx(file),
    }
}

/// Output-shape and signer-material failures read as refusals to send.
fn describe(e: SignerError) -> anyhow::Error {
    match e {
        SignerError::ConflictingInput
        | SignerError::MissingOutputs
        | SignerError::ConflictingFlag
        | SignerError::MissingSignerMaterial
        | SignerError::MalformedJson(_)
        | SignerError::EmptyOutputs
        | SignerError::InvalidOutputEntry { .. }
        | SignerError::InvalidAddress { .. }
        | SignerError::InvalidAmount(_) => anyhow::Error::new(e).context("Unable to send"),
        other => other.into(),
    }
}

fn prompt_wallet_password() -> crate::error::Result<Zeroizing<String>> {
    prompt_password("Enter password for wallet file: ")
        .map(Zeroizing::new)
        .map_err(|e| SignerError::io("<tty>", e))
}

async fn cmd_sign_tx_offline(args: SignArgs, config: &SignerConfig) -> Result<()> {
    let from_wallet = args.wallet.is_some();
    let req = SignRequest {
        outputs: OutputRequest {
            recipient: args.recipient,
            quantity: Some(args.quantity),
            shor: args.shor,
            json_object: args.json_object,
            file: args.file,
        },
        fee: args.fee,
        ots_index: args.otsindex,
        wallet: args.wallet,
        hexseed: args.hexseed.map(Zeroizing::new),
        password: args.password.map(Zeroizing::new),
    };

    let provider = SigningProvider::new(config.wordlist.clone());
    let prepared = pipeline::prepare(&req, config.default_fee, &provider, prompt_wallet_password)
        .await
        .map_err(describe)?;

    if from_wallet {
        println!("Sending from: {}", prepared.from_address());
    }
    println!("Transaction outputs:");
    for o in &prepared.outputs {
        println!("address to: {}", o.to);
        println!("amount in shor: {}", o.amount);
    }
    println!("Fee: {} Shor", prepared.fee);

    let mut ledger = pipeline::open_ledger(config.ots_ledger.as_deref())?;
    let ots = prepared.ots;
    let tx = prepared
        .sign_and_write(&args.output, ledger.as_mut())
        .map_err(|e| match e {
            SignerError::Io { .. } => anyhow::Error::new(e)
                .context(format!("Writing transaction to file {} failed", args.output.display())),
            other => other.into(),
        })?;

    println!("✔ Transaction signed with OTS key {ots}. (nodes will reject this transaction if key reuse is detected)");
    println!("✔ Transaction written to {}", args.output.display());
    println!("Transaction hash: {}", tx.hash);
    Ok(())
}

async fn cmd_create_wallet(args: CreateArgs, config: &SignerConfig) -> Result<()> {
    let descriptor = Descriptor::new(args.hash.into(), args.height)?;
    let provider = SigningProvider::new(config.wordlist.clone());
    let ready = provider.ready().await?;

    let mut record = WalletRecord::generate(descriptor, ready.wordlist())?;
    let address = record.address.clone();

    if args.encrypt {
        let password = match args.password {
            Some(p) => Zeroizing::new(p),
            None => {
                let first = Zeroizing::new(prompt_password("Enter password for wallet file: ")?);
                let again = Zeroizing::new(prompt_password("Confirm password: ")?);
                if first != again {
                    bail!("passwords do not match");
                }
                first
            }
        };
        record.encrypt(&Aes256CtrCipher, &password);
    }
    record.save(&args.output)?;

    println!("Address: {address}");
    println!("Tree height {} ({} signatures)", descriptor.height, 1u64 << descriptor.height);
    println!("✔ Wallet written to {}", args.output.display());
    Ok(())
}

fn cmd_verify_tx(file: PathBuf) -> Result<()> {
    let tx = SignedTransaction::read(&file)?;
    if !tx.verify()? {
        bail!("transaction {} does not verify", file.display());
    }
    println!("✔ Signature and hash valid (OTS key {})", tx.ots);
    println!("Transaction hash: {}", tx.hash);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sign_flags_parse() {
        let cli = Cli::try_parse_from([
            "qrl_offline_signer",
            "sign-tx-offline",
            "1",
            "tx.json",
            "-r",
            "Qabc",
            "-h",
            "00ff",
            "-i",
            "5",
            "-f",
            "200",
        ])
        .unwrap();
        match cli.cmd {
            Cmd::SignTxOffline(a) => {
                assert_eq!(a.hexseed.as_deref(), Some("00ff"));
                assert_eq!(a.otsindex, "5");
                assert_eq!(a.fee.as_deref(), Some("200"));
                assert!(!a.shor);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn otsindex_is_required() {
        let res = Cli::try_parse_from(["qrl_offline_signer", "sign-tx-offline", "1", "tx.json", "-h", "00"]);
        assert!(res.is_err());
    }

    #[test]
    fn output_errors_read_as_refusals() {
        assert_eq!(
            format!("{:#}", describe(SignerError::MissingOutputs)),
            "Unable to send: no recipients"
        );
        assert_eq!(
            format!("{:#}", describe(SignerError::WalletDecrypt("invalid password"))),
            "Unable to open wallet file: invalid password"
        );
    }
}
