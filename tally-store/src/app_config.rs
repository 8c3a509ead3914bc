use serde::Deserialize;
use std::env;
use tally_engine::EngineConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Remote order source connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Shop handle, i.e. `{shop}.myshopify.com`.
    pub shop: String,
    pub access_token: String,
    pub api_version: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    250
}

/// Spreadsheet-backed ledger settings. Token acquisition is outside this
/// system; a ready-to-use bearer token is expected here.
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    pub spreadsheet_id: String,
    pub stock_spreadsheet_id: String,
    pub access_token: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of TALLY)
            // Eg.. `TALLY__SERVER__PORT=8080` would set the server port
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
