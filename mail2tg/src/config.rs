use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use mail2tg_relay::receivers::WILDCARD;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Recipient address (or `*`) to Telegram chat id
    #[serde(default, deserialize_with = "receivers_map")]
    pub receivers: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SmtpConfig {
    /// Anything `TcpListener::bind` accepts, eg. `0.0.0.0:2525`
    #[serde(default)]
    pub listen: String,
    /// Name announced in the SMTP greeting
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub debug: bool,
}

impl LoggingConfig {
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref().filter(|p| !p.as_os_str().is_empty())
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.receivers.get(WILDCARD).map_or(true, |v| v.is_empty()) {
            bail!("No wildcard receiver (*) found in config.");
        }
        if self.bot.token.is_empty() {
            bail!("No bot.token defined in config");
        }
        if self.smtp.listen.is_empty() {
            bail!("No smtp.listen defined in config.");
        }
        if self.smtp.name.is_empty() {
            bail!("No smtp.name defined in config.");
        }
        Ok(())
    }
}

pub fn read_config(config_file: PathBuf) -> Result<Config> {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .open(config_file.as_path())
        .with_context(|| format!("unable to open config file {:?}", config_file))?;

    let mut config = String::new();
    file.read_to_string(&mut config)?;

    parse_config(&config)
}

pub fn parse_config(config: &str) -> Result<Config> {
    let config: Config = toml::from_str(config).context("invalid config file")?;
    config.validate()?;
    Ok(config)
}

// Chat ids are accepted both as `"123"` and `123`.
fn receivers_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChatId {
        Text(String),
        Number(i64),
    }

    let raw = HashMap::<String, ChatId>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(address, id)| match id {
            ChatId::Text(s) => (address, s),
            ChatId::Number(n) => (address, n.to_string()),
        })
        .collect())
}
