use std::{fmt, fs, ops::RangeInclusive};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Clone, Deserialize)]
#[command(name = "server")]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    #[clap(long)]
    #[arg(short = 'c')]
    #[serde(default)]
    pub config: Option<String>,
    /// Key set document, raw JSON or base64 encoded.
    #[clap(long, env)]
    pub jwks: String,
    #[clap(long, env)]
    pub issuer: String,
    /// Default access token lifetime in seconds.
    #[clap(long, env)]
    #[arg(default_value_t = 3600)]
    #[serde(default = "default_jwt_duration")]
    pub jwt_duration: i64,
    /// `host:port` of the denylist redis. In-memory denylist when unset.
    #[clap(long, env)]
    #[serde(default)]
    pub redis_addr: Option<String>,
    #[clap(long, env)]
    #[arg(default_value_t = 0)]
    #[serde(default)]
    pub redis_db: i64,
    #[clap(long, env)]
    #[serde(default)]
    pub redis_password: Option<String>,
    /// Seconds a denylist entry lives, 0 keeps it forever.
    #[clap(long, env)]
    #[arg(default_value_t = 0)]
    #[serde(default)]
    pub denylist_ttl: u64,
    #[clap(long, env)]
    #[arg(default_value_t = default_rust_log())]
    #[serde(default = "default_rust_log")]
    pub rust_log: String,
    #[clap(long, env = "SERVER_PORT")]
    #[arg(value_parser = port_in_range, short = 'p', default_value_t = 8080)]
    #[serde(default = "default_port")]
    pub port: u16,
    #[clap(long, env)]
    #[serde(default)]
    pub cors_origin: Option<String>,
    #[clap(long, env)]
    #[arg(default_value_t = false)]
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("config", &self.config)
            .field("jwks", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("jwt_duration", &self.jwt_duration)
            .field("redis_addr", &self.redis_addr)
            .field("redis_db", &self.redis_db)
            .field(
                "redis_password",
                &self.redis_password.as_ref().map(|_| "<redacted>"),
            )
            .field("denylist_ttl", &self.denylist_ttl)
            .field("rust_log", &self.rust_log)
            .field("port", &self.port)
            .field("cors_origin", &self.cors_origin)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

fn default_jwt_duration() -> i64 {
    3600
}

fn default_rust_log() -> String {
    String::from(
        "server=info,tokend_server=info,tokend_storage=info,tower_http=info",
    )
}

fn default_port() -> u16 {
    8080
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

pub fn load(cfg: &str) -> Result<AppConfig> {
    let content =
        fs::read_to_string(cfg).context("could not read config file")?;
    toml::from_str(&content).context("could not parse config file")
}
