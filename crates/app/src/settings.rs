//! Handles settings for the application. Configuration is read from a TOML
//! file (`config/gastos.toml` unless `--config` says otherwise), then from
//! `GASTOS__SECTION__KEY` environment variables.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/gastos.toml";

#[derive(Debug, Parser)]
#[command(name = "gastos", about = "Telegram bot to track expenses in bolivares")]
struct Args {
    /// Config file path (TOML).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    /// IANA timezone used for timestamps and month keys.
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "America/Caracas".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Telegram {
    pub token: String,
    pub allowed_users: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub data_dir: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            base_url: "https://ve.dolarapi.com".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Gemini {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for Gemini {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub telegram: Telegram,
    pub storage: Storage,
    pub rates: Rates,
    pub gemini: Gemini,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        Self::from_path(&args.config)
    }

    fn from_path(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("GASTOS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("telegram.allowed_users")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
