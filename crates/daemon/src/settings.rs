//! Daemon settings
//!
//! Layered: built-in defaults, then an optional TOML file, then `VPCE_*`
//! environment variables.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use vpce_core::application::constants::{
    DEFAULT_AWS_CLI_TIMEOUT, DEFAULT_AWS_PROFILE, DEFAULT_AWS_REGION, DEFAULT_SCRIPT_TIMEOUT,
};
use vpce_core::domain::ids;
use vpce_infra_system::{InterpreterPaths, DEFAULT_ENV_ALLOWLIST};

const ENV_PREFIX: &str = "VPCE";
const CONFIG_FILE_ENV: &str = "VPCE_CONFIG";
const CONFIG_FILE_NAME: &str = "vpce.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub aws_profile: String,
    pub aws_region: String,
    pub aws_cli_path: String,
    pub aws_cli_timeout_secs: u64,
    pub powershell_path: String,
    pub bash_path: String,
    pub script_timeout_secs: u64,
    pub scratch_dir: Option<String>,
    pub env_allowlist: Vec<String>,
    pub log_format: LogFormat,
    pub log_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let http = vpce_api_http::HttpServerConfig::default();
        let interpreters = InterpreterPaths::default();
        Self {
            host: http.host,
            port: http.port,
            cors_origins: http.cors_origins,
            aws_profile: DEFAULT_AWS_PROFILE.to_string(),
            aws_region: DEFAULT_AWS_REGION.to_string(),
            aws_cli_path: "aws".to_string(),
            aws_cli_timeout_secs: DEFAULT_AWS_CLI_TIMEOUT.as_secs(),
            powershell_path: interpreters.powershell,
            bash_path: interpreters.bash,
            script_timeout_secs: DEFAULT_SCRIPT_TIMEOUT.as_secs(),
            scratch_dir: None,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|v| v.to_string()).collect(),
            log_format: LogFormat::default(),
            log_dir: None,
        }
    }
}

impl Settings {
    /// Load from the process environment and the default config file location
    pub fn load() -> Result<Self> {
        Self::load_from(config_file_path(), None)
    }

    /// Load from an explicit file and, when given, an explicit environment map
    /// instead of the process environment
    pub fn load_from(file: Option<PathBuf>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = &file {
            builder = builder.add_source(
                File::new(&path.to_string_lossy(), FileFormat::Toml).required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors_origins")
                .with_list_parse_key("env_allowlist")
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to load configuration")?;

        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        if self.script_timeout_secs == 0 {
            bail!("script_timeout_secs must be greater than zero");
        }
        if self.aws_cli_timeout_secs == 0 {
            bail!("aws_cli_timeout_secs must be greater than zero");
        }
        if !ids::is_region(&self.aws_region) {
            bail!("aws_region is not a valid region: {}", self.aws_region);
        }
        if self.aws_profile.trim().is_empty() {
            bail!("aws_profile must not be empty");
        }
        Ok(())
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_secs(self.script_timeout_secs)
    }

    pub fn aws_cli_timeout(&self) -> Duration {
        Duration::from_secs(self.aws_cli_timeout_secs)
    }

    /// Scratch directory for script files (`~` expanded)
    pub fn scratch_dir(&self) -> PathBuf {
        match &self.scratch_dir {
            Some(dir) if !dir.trim().is_empty() => {
                PathBuf::from(shellexpand::tilde(dir).into_owned())
            }
            _ => std::env::temp_dir(),
        }
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(shellexpand::tilde(d).into_owned()))
    }

    pub fn interpreters(&self) -> InterpreterPaths {
        InterpreterPaths {
            powershell: self.powershell_path.clone(),
            bash: self.bash_path.clone(),
        }
    }
}

/// `VPCE_CONFIG`, else `<config dir>/vpce/vpce.toml`
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        return Some(PathBuf::from(shellexpand::tilde(&path).into_owned()));
    }
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("vpce").join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write_toml(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vpce-settings-{}-{}.toml", std::process::id(), name));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(None, env(&[])).unwrap();

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.aws_profile, "default");
        assert_eq!(settings.aws_region, "ap-southeast-1");
        assert_eq!(settings.script_timeout(), Duration::from_secs(60));
        assert_eq!(settings.aws_cli_timeout(), Duration::from_secs(30));
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.scratch_dir(), std::env::temp_dir());
        assert!(settings.env_allowlist.iter().any(|v| v == "AWS_*"));
        assert!(settings.log_dir().is_none());
    }

    #[test]
    fn test_file_then_env_layering() {
        let file = write_toml(
            "layering",
            r#"
port = 9000
aws_profile = "from-file"
script_timeout_secs = 10
log_format = "json"
"#,
        );

        let settings = Settings::load_from(
            Some(file),
            env(&[
                ("VPCE_PORT", "9100"),
                ("VPCE_CORS_ORIGINS", "http://a.example,http://b.example"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.port, 9100);
        assert_eq!(settings.aws_profile, "from-file");
        assert_eq!(settings.script_timeout_secs, 10);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(
            settings.cors_origins,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let settings =
            Settings::load_from(Some(PathBuf::from("/nonexistent/vpce.toml")), env(&[])).unwrap();
        assert_eq!(settings.port, 8000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Settings::load_from(None, env(&[("VPCE_SCRIPT_TIMEOUT_SECS", "0")])).is_err());
        assert!(Settings::load_from(None, env(&[("VPCE_AWS_REGION", "Mars")])).is_err());
        assert!(Settings::load_from(None, env(&[("VPCE_PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn test_scratch_dir_expands_tilde() {
        let settings = Settings::load_from(None, env(&[("VPCE_SCRATCH_DIR", "~/vpce-scratch")])).unwrap();
        let dir = settings.scratch_dir();
        assert!(dir.ends_with("vpce-scratch"));
        assert!(!dir.to_string_lossy().starts_with('~'));
    }
}
