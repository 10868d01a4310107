use std::process::ExitCode;

use clap::Parser;

use tokend_client::{init_tracing, report, sign_token};

/// Signs a `{iss, jti, scp}` token with the head key of `JWKS`.
#[derive(Debug, Parser)]
#[command(name = "sign-token")]
#[command(author, version, about, long_about = None)]
struct Cli {
    scope: String,
    jti: String,
    /// Key set document, raw JSON or base64 encoded.
    #[clap(long, env, hide_env_values = true)]
    jwks: String,
    #[clap(long, env)]
    issuer: String,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing();
    report(sign_token(&args.jwks, &args.issuer, &args.scope, &args.jti))
}
