use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use tokend_client::{init_tracing, report, rotate_jwks, EXIT_PENDING};
use tokend_jwks::Rotation;

/// Adds a new signing key in front of the current one.
///
/// When the document already holds two keys it is printed unchanged and the
/// command exits with status 2; run `clean-jwks` first.
#[derive(Debug, Parser)]
#[command(name = "rotate-jwks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Current document, base64 encoded.
    document: Option<String>,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing();
    match rotate_jwks(args.document.as_deref()) {
        Ok(Rotation::Rotated(set)) => report(set.encode(true)),
        Ok(Rotation::Pending(set)) => {
            warn!("a rotation is already pending, document left unchanged");
            match set.encode(true) {
                Ok(document) => {
                    println!("{document}");
                    ExitCode::from(EXIT_PENDING)
                }
                Err(err) => report(Err(err)),
            }
        }
        Err(err) => report(Err(err)),
    }
}
