use crate::auth::Credentials;
use crate::cli::{Cli, VerbosityLevel};
use crate::validator::{DEFAULT_JENKINSFILE, DEFAULT_SERVER, ValidationSettings};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub project: ProjectConfig,
    pub network: NetworkConfig,
    pub output: OutputConfig,
}

/// Jenkins server connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Jenkins base URL, including any context path
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Accept any certificate and hostname
    pub insecure_ssl: bool,
}

/// Where the Jenkinsfile lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub basedir: PathBuf,
    pub jenkinsfile: PathBuf,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub debug: bool,
    /// Errors only
    pub quiet: bool,
    /// Prefix error messages with the time they were reported
    pub timestamps: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER.to_string(),
            username: None,
            password: None,
            insecure_ssl: false,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("."),
            jenkinsfile: PathBuf::from(DEFAULT_JENKINSFILE),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.debug {
            VerbosityLevel::Debug
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Credentials, only when both username and password are configured
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.server.username, &self.server.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            (Some(_), None) => {
                tracing::warn!("username given without a password; authentication disabled");
                None
            }
            (None, Some(_)) => {
                tracing::warn!("password given without a username; authentication disabled");
                None
            }
            (None, None) => None,
        }
    }

    /// Settings for one validation run
    pub fn settings(&self) -> ValidationSettings {
        ValidationSettings {
            basedir: self.project.basedir.clone(),
            jenkinsfile: self.project.jenkinsfile.clone(),
            server: self.server.url.clone(),
            credentials: self.credentials(),
            insecure_ssl: self.server.insecure_ssl,
            timeout_seconds: self.network.timeout_seconds,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    /// Same as [`ConfigManager::load_config`] with a custom environment provider
    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "validate-jenkinsfile.toml",
            "validate-jenkinsfile.json",
            ".validate-jenkinsfile.toml",
            ".validate-jenkinsfile.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("validate-jenkinsfile");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        // Server settings
        if let Some(url) = env.get("VALIDATE_JENKINSFILE_SERVER") {
            config.server.url = url;
        }

        if let Some(username) = env.get("VALIDATE_JENKINSFILE_USERNAME") {
            config.server.username = Some(username);
        }

        if let Some(password) = env.get("VALIDATE_JENKINSFILE_PASSWORD") {
            config.server.password = Some(password);
        }

        if let Some(insecure) = env.get("VALIDATE_JENKINSFILE_INSECURE_SSL") {
            config.server.insecure_ssl = parse_bool("VALIDATE_JENKINSFILE_INSECURE_SSL", &insecure)?;
        }

        // Project settings
        if let Some(jenkinsfile) = env.get("VALIDATE_JENKINSFILE_FILE") {
            config.project.jenkinsfile = PathBuf::from(jenkinsfile);
        }

        if let Some(basedir) = env.get("VALIDATE_JENKINSFILE_BASEDIR") {
            config.project.basedir = PathBuf::from(basedir);
        }

        // Network settings
        if let Some(timeout) = env.get("VALIDATE_JENKINSFILE_TIMEOUT") {
            config.network.timeout_seconds = timeout.parse().map_err(|_| {
                ConfigError::Environment(format!(
                    "Invalid VALIDATE_JENKINSFILE_TIMEOUT value: {}",
                    timeout
                ))
            })?;
        }

        // Output settings
        if let Some(verbose) = env.get("VALIDATE_JENKINSFILE_VERBOSE") {
            config.output.verbose = parse_bool("VALIDATE_JENKINSFILE_VERBOSE", &verbose)?;
        }

        if let Some(quiet) = env.get("VALIDATE_JENKINSFILE_QUIET") {
            config.output.quiet = parse_bool("VALIDATE_JENKINSFILE_QUIET", &quiet)?;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(server) = &cli.server {
            config.server.url = server.clone();
        }
        if cli.username.is_some() {
            config.server.username = cli.username.clone();
        }
        if cli.password.is_some() {
            config.server.password = cli.password.clone();
        }
        if cli.insecure_ssl {
            config.server.insecure_ssl = true;
        }

        if let Some(jenkinsfile) = &cli.jenkinsfile {
            config.project.jenkinsfile = jenkinsfile.clone();
        }
        if let Some(basedir) = &cli.basedir {
            config.project.basedir = basedir.clone();
        }

        if let Some(timeout) = cli.timeout {
            config.network.timeout_seconds = timeout;
        }

        if cli.timestamps {
            config.output.timestamps = true;
        }

        match cli.verbosity() {
            VerbosityLevel::Quiet => {
                config.output.quiet = true;
                config.output.verbose = false;
                config.output.debug = false;
            }
            VerbosityLevel::Normal => {}
            VerbosityLevel::Verbose => {
                config.output.verbose = true;
                config.output.quiet = false;
            }
            VerbosityLevel::Debug => {
                config.output.verbose = true;
                config.output.debug = true;
                config.output.quiet = false;
            }
        }

        config
    }

    /// Merge two configurations (second takes precedence for non-None values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        // Server settings
        base.server.url = override_config.server.url;
        if override_config.server.username.is_some() {
            base.server.username = override_config.server.username;
        }
        if override_config.server.password.is_some() {
            base.server.password = override_config.server.password;
        }
        base.server.insecure_ssl = override_config.server.insecure_ssl;

        // Project settings
        base.project = override_config.project;

        // Network settings
        base.network.timeout_seconds = override_config.network.timeout_seconds;

        // Output settings
        base.output = override_config.output;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        let url = Url::parse(&config.server.url).map_err(|e| {
            ConfigError::Validation(format!(
                "Invalid Jenkins server URL '{}': {}",
                config.server.url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "Jenkins server URL must use http or https: {}",
                config.server.url
            )));
        }

        if config.project.jenkinsfile.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Jenkinsfile path must not be empty".to_string(),
            ));
        }

        if config.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Mock environment variable provider for testing
    #[derive(Default)]
    struct MockEnvProvider {
        vars: HashMap<String, String>,
    }

    impl MockEnvProvider {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
            self.vars.insert(key.into(), value.into());
        }
    }

    impl EnvProvider for MockEnvProvider {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("validate-jenkinsfile").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.url, "http://localhost:8080/jenkins");
        assert_eq!(config.server.username, None);
        assert_eq!(config.server.password, None);
        assert!(!config.server.insecure_ssl);

        assert_eq!(config.project.basedir, PathBuf::from("."));
        assert_eq!(config.project.jenkinsfile, PathBuf::from("Jenkinsfile"));

        assert_eq!(config.network.timeout_seconds, 30);

        assert!(!config.output.verbose);
        assert!(!config.output.quiet);
        assert_eq!(config.verbosity(), VerbosityLevel::Normal);
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let toml_content = r#"
[server]
url = "https://ci.example.com/jenkins"
username = "deployer"
password = "api-token"
insecure_ssl = true

[project]
basedir = "/srv/app"
jenkinsfile = "ci/Jenkinsfile"

[network]
timeout_seconds = 60

[output]
verbose = true
quiet = false
timestamps = true
"#;

        fs::write(&config_path, toml_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.server.url, "https://ci.example.com/jenkins");
        assert_eq!(config.server.username.as_deref(), Some("deployer"));
        assert_eq!(config.server.password.as_deref(), Some("api-token"));
        assert!(config.server.insecure_ssl);

        assert_eq!(config.project.basedir, PathBuf::from("/srv/app"));
        assert_eq!(config.project.jenkinsfile, PathBuf::from("ci/Jenkinsfile"));

        assert_eq!(config.network.timeout_seconds, 60);
        assert_eq!(config.verbosity(), VerbosityLevel::Verbose);
        assert!(config.output.timestamps);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json_content = r#"{
  "server": {
    "url": "http://jenkins.internal:8080",
    "insecure_ssl": false
  },
  "network": {
    "timeout_seconds": 15
  }
}"#;

        fs::write(&config_path, json_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.server.url, "http://jenkins.internal:8080");
        assert_eq!(config.network.timeout_seconds, 15);
        // Sections left out fall back to defaults
        assert_eq!(config.project, ProjectConfig::default());
        assert_eq!(config.output, OutputConfig::default());
    }

    #[tokio::test]
    async fn test_load_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "server: {}").unwrap();

        let result = ConfigManager::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }

    #[tokio::test]
    async fn test_load_config_with_explicit_file_and_cli_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validate.toml");
        fs::write(
            &config_path,
            "[server]\nurl = \"http://from-file:8080/jenkins\"\n[network]\ntimeout_seconds = 12\n",
        )
        .unwrap();

        let config_arg = config_path.to_str().unwrap();
        let cli = cli(&["--config", config_arg, "--server", "http://from-cli/jenkins"]);
        let config = ConfigManager::load_config_with(&MockEnvProvider::new(), &cli)
            .await
            .unwrap();

        assert_eq!(config.server.url, "http://from-cli/jenkins");
        assert_eq!(config.network.timeout_seconds, 12);
    }

    #[test]
    fn test_environment_overrides() {
        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_JENKINSFILE_SERVER", "https://env.example.com");
        env.set("VALIDATE_JENKINSFILE_USERNAME", "env-user");
        env.set("VALIDATE_JENKINSFILE_PASSWORD", "env-pass");
        env.set("VALIDATE_JENKINSFILE_INSECURE_SSL", "true");
        env.set("VALIDATE_JENKINSFILE_FILE", "Jenkinsfile.ci");
        env.set("VALIDATE_JENKINSFILE_TIMEOUT", "45");
        env.set("VALIDATE_JENKINSFILE_QUIET", "true");

        let config =
            ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

        assert_eq!(config.server.url, "https://env.example.com");
        assert_eq!(config.server.username.as_deref(), Some("env-user"));
        assert_eq!(config.server.password.as_deref(), Some("env-pass"));
        assert!(config.server.insecure_ssl);
        assert_eq!(config.project.jenkinsfile, PathBuf::from("Jenkinsfile.ci"));
        assert_eq!(config.network.timeout_seconds, 45);
        assert!(config.output.quiet);
    }

    #[test]
    fn test_invalid_environment_values() {
        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_JENKINSFILE_TIMEOUT", "soon");
        let result = ConfigManager::apply_environment_overrides_with(&env, Config::default());
        assert!(matches!(result, Err(ConfigError::Environment(_))));

        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_JENKINSFILE_INSECURE_SSL", "yes please");
        let result = ConfigManager::apply_environment_overrides_with(&env, Config::default());
        assert!(matches!(result, Err(ConfigError::Environment(_))));
    }

    #[test]
    fn test_cli_takes_precedence() {
        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_JENKINSFILE_SERVER", "https://env.example.com");
        env.set("VALIDATE_JENKINSFILE_USERNAME", "env-user");
        let config =
            ConfigManager::apply_environment_overrides_with(&env, Config::default()).unwrap();

        let cli = cli(&[
            "-s",
            "https://cli.example.com",
            "-f",
            "other/Jenkinsfile",
            "-k",
            "-v",
            "--timestamps",
        ]);
        let config = ConfigManager::merge_with_cli(config, &cli);
        assert!(config.output.timestamps);

        assert_eq!(config.server.url, "https://cli.example.com");
        assert_eq!(config.server.username.as_deref(), Some("env-user"));
        assert_eq!(config.project.jenkinsfile, PathBuf::from("other/Jenkinsfile"));
        assert!(config.server.insecure_ssl);
        assert_eq!(config.verbosity(), VerbosityLevel::Verbose);
    }

    #[test]
    fn test_validate_config_rejects_bad_values() {
        let mut config = Config::default();
        config.server.url = "not a url".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = Config::default();
        config.server.url = "ftp://jenkins.example.com".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = Config::default();
        config.network.timeout_seconds = 0;
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = Config::default();
        config.project.jenkinsfile = PathBuf::new();
        assert!(ConfigManager::validate_config(&config).is_err());

        let mut config = Config::default();
        config.output.verbose = true;
        config.output.quiet = true;
        assert!(ConfigManager::validate_config(&config).is_err());

        assert!(ConfigManager::validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let mut config = Config::default();
        assert!(config.credentials().is_none());

        config.server.username = Some("admin".to_string());
        assert!(config.credentials().is_none());

        config.server.password = Some("secret".to_string());
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username(), "admin");
        assert_eq!(credentials.password(), "secret");
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.server.url = "https://ci.example.com/".to_string();
        config.server.insecure_ssl = true;
        config.project.basedir = PathBuf::from("/srv/app");
        config.network.timeout_seconds = 5;

        let settings = config.settings();

        assert_eq!(settings.server, "https://ci.example.com/");
        assert!(settings.insecure_ssl);
        assert_eq!(settings.basedir, PathBuf::from("/srv/app"));
        assert_eq!(settings.jenkinsfile, PathBuf::from("Jenkinsfile"));
        assert_eq!(settings.timeout_seconds, 5);
        assert!(settings.credentials.is_none());
    }
}
