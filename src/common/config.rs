//! Configuration file handling and settings resolution
//!
//! Values are merged with a fixed precedence: environment variables win
//! over the config file, which wins over built-in defaults.

use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};
use crate::scenario::ScenarioConfig;

/// Environment variable holding the LifeUp host
pub const ENV_HOST: &str = "LIFEUP_HOST";
/// Environment variable holding the LifeUp HTTP API port
pub const ENV_PORT: &str = "LIFEUP_PORT";
/// Environment variable holding the LifeUp API token
pub const ENV_API_TOKEN: &str = "LIFEUP_API_TOKEN";
/// Environment variable holding the LifeUp API request timeout in milliseconds
pub const ENV_TIMEOUT: &str = "LIFEUP_TIMEOUT";
/// Environment variable holding how often the server retries a LifeUp API call
pub const ENV_RETRY_COUNT: &str = "LIFEUP_RETRY_COUNT";
/// Environment variable enabling verbose output when set to `true`
pub const ENV_DEBUG: &str = "DEBUG";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 13276;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRY_COUNT: u32 = 3;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Connection settings for the LifeUp app, before environment overrides
    #[serde(default)]
    pub lifeup: LifeUpConfig,

    /// How to launch the MCP server under test
    #[serde(default)]
    pub server: ServerConfig,

    /// Tools and arguments used by the smoke scenario
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// `[lifeup]` section. Every field is optional so the environment and the
/// defaults can fill in whatever the file leaves out.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LifeUpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_token: Option<String>,
    /// Overrides the `http://{host}:{port}` derivation
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retry_count: Option<u32>,
    pub debug: Option<bool>,
}

/// `[server]` section
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Executable name (looked up on PATH) or path
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments passed to the server executable
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
        }
    }
}

fn default_command() -> String {
    "node".to_string()
}

fn default_args() -> Vec<String> {
    vec!["build/index.js".to_string()]
}

impl ServerConfig {
    /// Human-readable command line, for logging
    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one the default config file is
    /// used if present, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Fully resolved runtime settings for the LifeUp client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub host: String,
    pub port: u16,
    #[serde(serialize_with = "serialize_masked")]
    pub api_token: Option<String>,
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_count: u32,
    pub debug: bool,
}

impl Settings {
    /// Resolve settings from the process environment and the config file
    pub fn from_env(file: &LifeUpConfig) -> Result<Self> {
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an arbitrary environment lookup
    pub fn resolve<F>(file: &LifeUpConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = non_blank(env(ENV_HOST))
            .or_else(|| non_blank(file.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match non_blank(env(ENV_PORT)) {
            Some(raw) => parse_port(&raw)?,
            None => match file.port {
                Some(0) => return Err(Error::Config("Port 0 is not a valid LifeUp port".into())),
                Some(port) => port,
                None => DEFAULT_PORT,
            },
        };

        let api_token = non_blank(env(ENV_API_TOKEN)).or_else(|| non_blank(file.api_token.clone()));

        let base_url = non_blank(file.base_url.clone())
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{}:{}", host, port));

        let debug = match env(ENV_DEBUG) {
            Some(value) => value == "true",
            None => file.debug.unwrap_or(false),
        };

        Ok(Self {
            host,
            port,
            api_token,
            base_url,
            timeout_ms: parse_env(&env, ENV_TIMEOUT)?
                .or(file.timeout_ms)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            retry_count: parse_env(&env, ENV_RETRY_COUNT)?
                .or(file.retry_count)
                .unwrap_or(DEFAULT_RETRY_COUNT),
            debug,
        })
    }

    /// Environment handed to the MCP server subprocess
    pub fn child_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            (ENV_HOST.to_string(), self.host.clone()),
            (ENV_PORT.to_string(), self.port.to_string()),
            (ENV_TIMEOUT.to_string(), self.timeout_ms.to_string()),
            (ENV_RETRY_COUNT.to_string(), self.retry_count.to_string()),
            (ENV_DEBUG.to_string(), self.debug.to_string()),
        ];
        if let Some(token) = &self.api_token {
            env.push((ENV_API_TOKEN.to_string(), token.clone()));
        }
        env
    }

    /// Token suitable for display
    pub fn masked_token(&self) -> Option<String> {
        self.api_token.as_deref().map(mask)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<F, T>(env: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_blank(env(key)) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid {} '{}': expected a whole number", key, raw))),
        None => Ok(None),
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::Config(format!(
            "Invalid {} '{}': expected a port number between 1 and 65535",
            ENV_PORT, raw
        ))),
        Ok(port) => Ok(port),
    }
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

fn serialize_masked<S: Serializer>(token: &Option<String>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match token {
        Some(token) => s.serialize_some(&mask(token)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env_or_file() {
        let settings = Settings::resolve(&LifeUpConfig::default(), env_of(&[])).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 13276);
        assert_eq!(settings.base_url, "http://127.0.0.1:13276");
        assert_eq!(settings.api_token, None);
        assert_eq!(settings.timeout_ms, 10_000);
        assert_eq!(settings.retry_count, 3);
        assert!(!settings.debug);
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = LifeUpConfig {
            host: Some("10.0.0.2".to_string()),
            port: Some(9000),
            ..Default::default()
        };
        let env = env_of(&[(ENV_HOST, "192.168.1.5"), (ENV_PORT, "13277")]);

        let settings = Settings::resolve(&file, env).unwrap();
        assert_eq!(settings.host, "192.168.1.5");
        assert_eq!(settings.port, 13277);
        assert_eq!(settings.base_url, "http://192.168.1.5:13277");
    }

    #[test]
    fn test_file_wins_over_defaults() {
        let file = LifeUpConfig {
            host: Some("phone.local".to_string()),
            timeout_ms: Some(2_500),
            retry_count: Some(0),
            debug: Some(true),
            ..Default::default()
        };

        let settings = Settings::resolve(&file, env_of(&[])).unwrap();
        assert_eq!(settings.host, "phone.local");
        assert_eq!(settings.port, 13276);
        assert_eq!(settings.timeout_ms, 2_500);
        assert_eq!(settings.retry_count, 0);
        assert!(settings.debug);
    }

    #[test]
    fn test_timeout_and_retries_reach_child() {
        let file = LifeUpConfig {
            timeout_ms: Some(2_500),
            retry_count: Some(1),
            ..Default::default()
        };
        let env = env_of(&[(ENV_RETRY_COUNT, "5")]);

        let settings = Settings::resolve(&file, env).unwrap();
        assert_eq!(settings.timeout_ms, 2_500);
        assert_eq!(settings.retry_count, 5);

        let child = settings.child_env();
        assert!(child.contains(&(ENV_TIMEOUT.to_string(), "2500".to_string())));
        assert!(child.contains(&(ENV_RETRY_COUNT.to_string(), "5".to_string())));

        let bad = Settings::resolve(&file, env_of(&[(ENV_TIMEOUT, "soon")]));
        assert!(matches!(bad, Err(Error::Config(_))));
    }

    #[test]
    fn test_whitespace_token_is_absent() {
        let env = env_of(&[(ENV_API_TOKEN, "   \t")]);
        let settings = Settings::resolve(&LifeUpConfig::default(), env).unwrap();
        assert_eq!(settings.api_token, None);
        assert!(settings.child_env().iter().all(|(k, _)| k != ENV_API_TOKEN));

        let env = env_of(&[(ENV_API_TOKEN, "")]);
        let settings = Settings::resolve(&LifeUpConfig::default(), env).unwrap();
        assert_eq!(settings.api_token, None);
    }

    #[test]
    fn test_token_is_passed_to_child() {
        let env = env_of(&[(ENV_API_TOKEN, "secret-token-123")]);
        let settings = Settings::resolve(&LifeUpConfig::default(), env).unwrap();
        assert_eq!(settings.api_token.as_deref(), Some("secret-token-123"));
        assert!(settings
            .child_env()
            .contains(&(ENV_API_TOKEN.to_string(), "secret-token-123".to_string())));
        assert_eq!(settings.masked_token().as_deref(), Some("secr****"));
    }

    #[test]
    fn test_base_url_override() {
        let file = LifeUpConfig {
            base_url: Some("https://lifeup.example.com/".to_string()),
            ..Default::default()
        };
        let env = env_of(&[(ENV_HOST, "1.2.3.4")]);
        let settings = Settings::resolve(&file, env).unwrap();
        assert_eq!(settings.base_url, "https://lifeup.example.com");
        assert_eq!(settings.host, "1.2.3.4");
    }

    #[test]
    fn test_debug_only_for_literal_true() {
        let on = Settings::resolve(&LifeUpConfig::default(), env_of(&[(ENV_DEBUG, "true")])).unwrap();
        assert!(on.debug);

        let off = Settings::resolve(&LifeUpConfig::default(), env_of(&[(ENV_DEBUG, "1")])).unwrap();
        assert!(!off.debug);

        let file = LifeUpConfig {
            debug: Some(true),
            ..Default::default()
        };
        let env_off = Settings::resolve(&file, env_of(&[(ENV_DEBUG, "false")])).unwrap();
        assert!(!env_off.debug);
    }

    #[test]
    fn test_invalid_port_rejected() {
        for raw in ["abc", "0", "70000", "-1"] {
            let result = Settings::resolve(&LifeUpConfig::default(), env_of(&[(ENV_PORT, raw)]));
            assert!(matches!(result, Err(Error::Config(_))), "port {raw} accepted");
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[lifeup]
host = "10.1.1.1"
port = 8080

[server]
command = "/opt/lifeup/server"
args = ["--stdio"]

[scenario]
read_tool = "get_user_info"
settle_ms = 0
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.lifeup.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(config.lifeup.port, Some(8080));
        assert_eq!(config.server.command, "/opt/lifeup/server");
        assert_eq!(config.server.args, vec!["--stdio".to_string()]);
        assert_eq!(config.scenario.read_tool, "get_user_info");
        assert_eq!(config.scenario.create_tool, "create_task");
        assert_eq!(config.scenario.settle_ms, 0);
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[test]
    fn test_malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lifeup]\nport = \"not a number\"\n").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_server_display() {
        assert_eq!(ServerConfig::default().display(), "node build/index.js");
    }
}
