use anyhow::Context;
use serde::Deserialize;

/// Config, read once from a TOML file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve the API on
    pub listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size the API accepts
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// Postgres connection string, including credentials.
    pub db_dsn: String,

    /// maximum number of connections maintained by PostgresStore
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// HMAC secret used to sign and verify access tokens.
    pub jwt_secret: String,

    /// How long an issued access token stays valid.
    #[serde(default = "token_lifetime_secs")]
    pub token_lifetime_secs: u64,

    /// bcrypt work factor for new password hashes.
    #[serde(default = "bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_file(filepath: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(filepath)
            .with_context(|| format!("couldn't read config file {}", filepath))?;
        Self::from_toml(&contents).with_context(|| format!("couldn't parse config file {}", filepath))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

fn max_body_size() -> usize {
    65536
}

fn token_lifetime_secs() -> u64 {
    3600
}

fn bcrypt_cost() -> u32 {
    10
}
