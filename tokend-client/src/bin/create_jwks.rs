use std::process::ExitCode;

use clap::Parser;

use tokend_client::{create_jwks, init_tracing, report};

/// Prints a new single-key document, base64 encoded.
#[derive(Debug, Parser)]
#[command(name = "create-jwks")]
#[command(author, version, about, long_about = None)]
struct Cli {}

fn main() -> ExitCode {
    Cli::parse();
    init_tracing();
    report(create_jwks())
}
