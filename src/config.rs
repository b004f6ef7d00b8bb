use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entry::{CategoryCharset, ParsePolicy};
use crate::error::CalldeckError;

/// Environment variable holding the remote store API key.
pub const API_KEY_ENV: &str = "CALLDECK_API_KEY";

const DEFAULT_TABLE: &str = "user_chart_data";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub remote: RemoteSection,
    #[serde(default)]
    pub parsing: Option<ParsingSection>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RemoteSection {
    pub base_url: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ParsingSection {
    #[serde(default)]
    pub policy: Option<ParsePolicy>,
    #[serde(default)]
    pub charset: Option<CategoryCharset>,
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub table: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub remote: RemoteConfig,
    pub policy: ParsePolicy,
    pub charset: CategoryCharset,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CalldeckError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("calldeck.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(CalldeckError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CalldeckError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CalldeckError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let parsing = config.parsing.unwrap_or(ParsingSection {
            policy: None,
            charset: None,
        });
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            remote: RemoteConfig {
                base_url: config.remote.base_url.trim_end_matches('/').to_string(),
                table: config
                    .remote
                    .table
                    .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                timeout_secs: config.remote.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            policy: parsing.policy.unwrap_or_default(),
            charset: parsing.charset.unwrap_or_default(),
        }
    }
}
