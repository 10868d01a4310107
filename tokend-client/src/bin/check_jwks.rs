use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use tokend_client::{check_jwks, init_tracing, EXIT_INVALID};

/// Exits 0 when the document is a readable key set, 1 otherwise.
#[derive(Debug, Parser)]
#[command(name = "check-jwks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Document to check, base64 encoded.
    document: Option<String>,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing();
    match check_jwks(args.document.as_deref()) {
        Ok(set) => {
            info!("valid key set with {} key(s)", set.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::from(EXIT_INVALID)
        }
    }
}
