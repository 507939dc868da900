//! Command-line interface parsing for the Fingerbank client
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a client configuration, including where and how long responses are
//! cached.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::{ClientConfig, InterrogateParams, DEFAULT_BASE_URL};
use crate::cache::{CacheConfig, DiskStore, DEFAULT_MARKER_HEADER, DEFAULT_MAX_AGE_SECS};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key on the command line or in the environment
    #[error("Missing API key: pass --api-key or set FINGERBANK_API_KEY")]
    MissingApiKey,

    /// The default cache directory could not be determined
    #[error("Could not determine a cache directory: pass --cache-dir or --no-cache")]
    NoCacheDir,

    /// `interrogate` was called without any parameter
    #[error("Invalid interrogation: give at least one of --dhcp-fingerprint, --mac, --user-agent")]
    EmptyInterrogation,
}

/// Fingerbank CLI - identify devices from their network fingerprints
#[derive(Parser, Debug)]
#[command(name = "fingerbank")]
#[command(about = "Query the Fingerbank device-fingerprinting API")]
#[command(version)]
pub struct Cli {
    /// Fingerbank API key
    #[arg(long, env = "FINGERBANK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Always query the API, without reading or writing the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Directory for cached responses (defaults to the user cache directory)
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached response stays fresh
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_MAX_AGE_SECS)]
    pub max_age: u64,

    /// Header added to responses served from cache; empty disables it
    #[arg(long, value_name = "NAME", default_value = DEFAULT_MARKER_HEADER)]
    pub cache_header: String,

    #[command(subcommand)]
    pub command: Command,
}

/// API operations available from the command line
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Identify a device from its fingerprints
    ///
    /// Examples:
    ///   fingerbank interrogate --dhcp-fingerprint 1,15,3,6,44,46,47,31,33,121,249,43
    ///   fingerbank interrogate --mac aa:bb:cc:dd:ee:ff --user-agent "Mozilla/5.0"
    Interrogate {
        /// DHCP option 55 fingerprint
        #[arg(long, value_name = "FP")]
        dhcp_fingerprint: Option<String>,

        /// MAC address
        #[arg(long)]
        mac: Option<String>,

        /// HTTP user agent (repeatable)
        #[arg(long = "user-agent", value_name = "UA")]
        user_agents: Vec<String>,
    },

    /// Show a device by id
    Device {
        /// Fingerbank device id
        id: u64,
    },

    /// Dump base information for all devices
    BaseInfo {
        /// Fields to include, comma separated (id, name, parent_id, virtual_parent_id, details)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Show account information (never cached)
    Account,
}

impl Command {
    /// Returns the interrogation parameters, if this is an interrogation
    pub fn interrogate_params(&self) -> Option<InterrogateParams> {
        match self {
            Command::Interrogate {
                dhcp_fingerprint,
                mac,
                user_agents,
            } => Some(InterrogateParams {
                dhcp_fingerprint: dhcp_fingerprint.clone(),
                mac: mac.clone(),
                user_agents: user_agents.clone(),
            }),
            _ => None,
        }
    }
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Client settings, cache included
    pub client: ClientConfig,
    /// Operation to run
    pub command: Command,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the API key is missing, the cache directory is
    ///   unknown, or an interrogation has no parameters
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingApiKey)?;

        if let Some(params) = cli.command.interrogate_params() {
            if params.is_empty() {
                return Err(CliError::EmptyInterrogation);
            }
        }

        let client = ClientConfig::new(api_key)
            .with_base_url(cli.base_url.as_str())
            .with_cache(cache_config(cli)?);

        Ok(StartupConfig {
            client,
            command: cli.command.clone(),
        })
    }
}

/// Builds the cache settings selected on the command line
fn cache_config(cli: &Cli) -> Result<CacheConfig, CliError> {
    if cli.no_cache {
        return Ok(CacheConfig::disabled());
    }

    let store = match &cli.cache_dir {
        Some(dir) => DiskStore::with_dir(dir.clone()),
        None => DiskStore::new().ok_or(CliError::NoCacheDir)?,
    };

    Ok(CacheConfig::new(Arc::new(store))
        .with_max_age_secs(cli.max_age)
        .with_marker_header(cli.cache_header.as_str()))
}
