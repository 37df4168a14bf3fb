use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no backend URL is injected via config.toml
pub const BACKEND_URL_ENV: &str = "BACKEND_SERVER";
/// Locale sent with every chat turn
pub const LOCALE_ID: &str = "en_US";
/// Session id shared by every chat turn. See DESIGN.md before changing how it is derived.
pub const DEFAULT_SESSION_ID: &str = "user-session-123";

const CONFIG_FILE: &str = "config.toml";
const LOCAL_STORAGE_FILE: &str = "local_storage.json";
const LOG_FILE: &str = "grocer.log";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL injected at deploy time
    pub backend_url: Option<String>,

    /// Conversational runtime settings
    pub lex: LexConfig,

    /// Override for the local key/value store holding the bearer token
    pub credentials_path: Option<PathBuf>,

    /// UI preferences
    pub ui: UiConfig,

    /// Grocer home directory
    #[serde(skip)]
    pub grocer_home: PathBuf,
}

/// Conversational runtime (Lex V2) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexConfig {
    pub region: String,
    pub bot_id: String,
    pub bot_alias_id: String,
    pub session_id: String,
    /// Runtime URL requests are sent to. Required: requests go out unsigned,
    /// so this is a signing gateway or a local runtime, never the AWS host.
    pub endpoint: Option<String>,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            backend_url: None,
            lex: LexConfig::default(),
            credentials_path: None,
            ui: UiConfig::default(),
            grocer_home: home.join(".grocer"),
        }
    }
}

impl Default for LexConfig {
    fn default() -> Self {
        LexConfig {
            region: String::new(),
            bot_id: String::new(),
            bot_alias_id: String::new(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            endpoint: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            placeholder: "Type your message...".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from ~/.grocer/config.toml, falling back to the environment
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let mut config = Self::load_from(&home.join(".grocer"))?;
        config.lex.fill_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration rooted at an explicit grocer home directory
    pub fn load_from(grocer_home: &Path) -> Result<Self> {
        fs::create_dir_all(grocer_home)
            .context("Failed to create .grocer directory")?;

        let config_path = grocer_home.join(CONFIG_FILE);
        let mut config: Config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.grocer_home = grocer_home.to_path_buf();
        Ok(config)
    }

    /// Backend base URL: injected value first, then the process environment
    pub fn backend_base_url(&self) -> Result<String> {
        resolve_backend_url(self.backend_url.as_deref(), |key| std::env::var(key).ok())
    }

    /// Path of the local key/value store the bearer token is read from
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| self.grocer_home.join(LOCAL_STORAGE_FILE))
    }

    pub fn log_path(&self) -> PathBuf {
        self.grocer_home.join(LOG_FILE)
    }
}

impl LexConfig {
    /// Fill blank fields from AWS_REGION, LEX_BOT_ID, LEX_BOT_ALIAS_ID and LEX_ENDPOINT
    pub fn fill_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |field: &mut String, key: &str| {
            if field.trim().is_empty() {
                if let Some(value) = lookup(key) {
                    *field = value;
                }
            }
        };

        fill(&mut self.region, "AWS_REGION");
        fill(&mut self.bot_id, "LEX_BOT_ID");
        fill(&mut self.bot_alias_id, "LEX_BOT_ALIAS_ID");

        if self.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
            self.endpoint = lookup("LEX_ENDPOINT").filter(|e| !e.trim().is_empty());
        }
    }
}

/// Resolve the backend base URL from an injected value or an environment lookup.
/// Trailing slashes are dropped so paths can be appended with `format!`.
pub fn resolve_backend_url(
    injected: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    injected
        .map(str::to_string)
        .filter(|url| !url.trim().is_empty())
        .or_else(|| lookup(BACKEND_URL_ENV).filter(|url| !url.trim().is_empty()))
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .with_context(|| {
            format!("No backend URL configured; set backend_url in {CONFIG_FILE} or {BACKEND_URL_ENV}")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn injected_url_wins_over_environment() {
        let url = resolve_backend_url(
            Some("http://injected:5000/"),
            env(&[(BACKEND_URL_ENV, "http://env:5000")]),
        )
        .unwrap();
        assert_eq!(url, "http://injected:5000");
    }

    #[test]
    fn environment_is_the_fallback() {
        let url = resolve_backend_url(None, env(&[(BACKEND_URL_ENV, "http://env:5000")])).unwrap();
        assert_eq!(url, "http://env:5000");

        let url = resolve_backend_url(Some("  "), env(&[(BACKEND_URL_ENV, "http://env:5000")])).unwrap();
        assert_eq!(url, "http://env:5000");
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(resolve_backend_url(None, env(&[])).is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.backend_url, None);
        assert_eq!(config.lex.session_id, DEFAULT_SESSION_ID);
        assert_eq!(config.credentials_path(), dir.path().join("local_storage.json"));
        assert_eq!(config.log_path(), dir.path().join("grocer.log"));
    }

    #[test]
    fn load_parses_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            r#"
backend_url = "http://localhost:5000"

[lex]
region = "eu-central-1"
bot_id = "BOT123"
"#,
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.lex.region, "eu-central-1");
        assert_eq!(config.lex.bot_id, "BOT123");
        assert_eq!(config.lex.session_id, DEFAULT_SESSION_ID);
        assert_eq!(config.ui.placeholder, "Type your message...");
    }

    #[test]
    fn lex_environment_fills_only_blank_fields() {
        let mut lex = LexConfig {
            region: "us-east-1".to_string(),
            ..LexConfig::default()
        };
        lex.fill_from(env(&[
            ("AWS_REGION", "eu-west-1"),
            ("LEX_BOT_ID", "BOT"),
            ("LEX_BOT_ALIAS_ID", "ALIAS"),
        ]));

        assert_eq!(lex.region, "us-east-1");
        assert_eq!(lex.bot_id, "BOT");
        assert_eq!(lex.bot_alias_id, "ALIAS");
        assert_eq!(lex.endpoint, None);

        lex.fill_from(env(&[("LEX_ENDPOINT", "http://gateway:9000")]));
        assert_eq!(lex.endpoint.as_deref(), Some("http://gateway:9000"));

        // an explicit endpoint is never overwritten
        lex.fill_from(env(&[("LEX_ENDPOINT", "http://other:9000")]));
        assert_eq!(lex.endpoint.as_deref(), Some("http://gateway:9000"));
    }

    #[test]
    fn blank_endpoint_takes_environment_value() {
        let mut lex = LexConfig {
            endpoint: Some(" ".to_string()),
            ..LexConfig::default()
        };
        lex.fill_from(env(&[("LEX_ENDPOINT", "http://gateway:9000")]));
        assert_eq!(lex.endpoint.as_deref(), Some("http://gateway:9000"));

        let mut lex = LexConfig::default();
        lex.fill_from(env(&[("LEX_ENDPOINT", "  ")]));
        assert_eq!(lex.endpoint, None);
    }
}
