//! QRL offline signer
//! Main binary entry point

#![forbid(unsafe_code)]

use qrl_offline_signer::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("⨉ {e:#}");
        std::process::exit(1);
    }
}
