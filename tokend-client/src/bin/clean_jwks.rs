use std::process::ExitCode;

use clap::Parser;

use tokend_client::{clean_jwks, init_tracing, report};

/// Removes the oldest key of a rotated document.
#[derive(Debug, Parser)]
#[command(name = "clean-jwks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Current document, base64 encoded.
    document: Option<String>,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing();
    report(clean_jwks(args.document.as_deref()))
}
