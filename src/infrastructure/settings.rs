//! Layered application settings.
//!
//! Built-in defaults are overridden by an optional TOML file and then by
//! `CLUBVOTE_`-prefixed environment variables, e.g.
//! `CLUBVOTE_WORKFLOW__VOTE_DELAY_MS=500`. Dev accounts are given as a
//! comma-separated list: `CLUBVOTE_PROVIDER__DEV_ACCOUNTS=0xaaaa,0xbbbb`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use directories::ProjectDirs;
use serde::Deserialize;

use super::dev_wallet::DevWallet;
use super::provider::{ProviderResult, WalletProvider};
use super::rpc::HttpProvider;

pub const CONFIG_FILE: &str = "clubvote.toml";
const ENV_PREFIX: &str = "CLUBVOTE";
const ENV_LIST_KEYS: &[&str] = &["provider.dev_accounts"];

/// Which wallet provider the application talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process wallet with the configured dev accounts.
    Dev,
    /// JSON-RPC endpoint at `provider.rpc_url`.
    Rpc,
    /// No provider installed.
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub submit_delay_ms: u64,
    pub vote_delay_ms: u64,
    pub max_description_chars: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            submit_delay_ms: 1000,
            vote_delay_ms: 1500,
            max_description_chars: crate::domain::MAX_DESCRIPTION_CHARS,
        }
    }
}

impl WorkflowSettings {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn vote_delay(&self) -> Duration {
        Duration::from_millis(self.vote_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub rpc_url: String,
    pub poll_interval_ms: u64,
    pub dev_accounts: Vec<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Dev,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            poll_interval_ms: 2000,
            dev_accounts: vec![
                "0x71c7656ec7ab88b098defb751b7401b5f6d8976f".to_string(),
                "0x2546bcd3c84621e976d8185a91a922ae77ecec30".to_string(),
            ],
        }
    }
}

impl ProviderSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Creates the configured provider, or `None` when no wallet is installed.
    ///
    /// Must not be called from inside an async runtime: the rpc provider
    /// owns a blocking HTTP client.
    pub fn build(&self) -> ProviderResult<Option<Arc<dyn WalletProvider>>> {
        Ok(match self.kind {
            ProviderKind::Dev => Some(Arc::new(DevWallet::new(self.dev_accounts.clone()))),
            ProviderKind::Rpc => Some(Arc::new(HttpProvider::new(
                self.rpc_url.clone(),
                self.poll_interval(),
            )?)),
            ProviderKind::None => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub tick_ms: u64,
    pub toast_ms: u64,
    pub seed_demo_proposals: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            toast_ms: 4000,
            seed_demo_proposals: true,
        }
    }
}

impl UiSettings {
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log directory; the platform data dir when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workflow: WorkflowSettings,
    pub provider: ProviderSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Loads settings from `path`, or from the default config file if present.
    ///
    /// # Errors
    ///
    /// Fails if an explicitly given file is missing, or if any source holds
    /// values of the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_dir().join(CONFIG_FILE));
        let environment = ENV_LIST_KEYS.iter().fold(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |environment, key| environment.with_list_parse_key(key),
        );
        config::Config::builder()
            .add_source(
                config::File::from(file)
                    .format(config::FileFormat::Toml)
                    .required(path.is_some()),
            )
            .add_source(environment.source(env))
            .build()?
            .try_deserialize()
    }

    pub fn log_directory(&self) -> PathBuf {
        self.logging.directory.clone().unwrap_or_else(data_dir)
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "ClubVote", "clubvote")
}

pub fn config_dir() -> PathBuf {
    project_directory()
        .map(|dirs| dirs.config_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

pub fn data_dir() -> PathBuf {
    project_directory()
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(".data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::RpcMethod;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.workflow.submit_delay(), Duration::from_millis(1000));
        assert_eq!(settings.workflow.vote_delay(), Duration::from_millis(1500));
        assert_eq!(settings.workflow.max_description_chars, 500);
        assert_eq!(settings.provider.kind, ProviderKind::Dev);
        assert!(settings.ui.seed_demo_proposals);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clubvote.toml");
        fs::write(
            &path,
            r#"
[workflow]
vote_delay_ms = 20

[provider]
kind = "rpc"
rpc_url = "http://localhost:9000"

[logging]
directory = "/tmp/clubvote-logs"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.workflow.vote_delay_ms, 20);
        assert_eq!(settings.workflow.submit_delay_ms, 1000);
        assert_eq!(settings.provider.kind, ProviderKind::Rpc);
        assert_eq!(settings.provider.rpc_url, "http://localhost:9000");
        assert_eq!(settings.ui, UiSettings::default());
        assert_eq!(settings.log_directory(), PathBuf::from("/tmp/clubvote-logs"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clubvote.toml");
        fs::write(&path, "[provider]\nkind = \"carrier-pigeon\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clubvote.toml");
        fs::write(&path, "[workflow]\nvote_delay_ms = 20\n").unwrap();

        let settings = Settings::load_with_env(
            Some(&path),
            env(&[
                ("CLUBVOTE_WORKFLOW__VOTE_DELAY_MS", "500"),
                ("CLUBVOTE_UI__SEED_DEMO_PROPOSALS", "false"),
                ("CLUBVOTE_PROVIDER__KIND", "none"),
                ("OTHER_WORKFLOW__VOTE_DELAY_MS", "7"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.workflow.vote_delay_ms, 500);
        assert!(!settings.ui.seed_demo_proposals);
        assert_eq!(settings.provider.kind, ProviderKind::None);
    }

    #[test]
    fn test_env_dev_accounts_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clubvote.toml");
        fs::write(&path, "").unwrap();

        let settings = Settings::load_with_env(
            Some(&path),
            env(&[
                ("CLUBVOTE_PROVIDER__DEV_ACCOUNTS", "0xaaaa,0xbbbb"),
                ("CLUBVOTE_PROVIDER__RPC_URL", "http://localhost:8545/a,b"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.provider.dev_accounts, vec!["0xaaaa", "0xbbbb"]);
        assert_eq!(settings.provider.rpc_url, "http://localhost:8545/a,b");
    }

    #[test]
    fn test_build_providers() {
        let mut provider = ProviderSettings::default();
        let wallet = provider.build().unwrap().unwrap();
        assert!(wallet.request(RpcMethod::ChainId).is_ok());

        provider.kind = ProviderKind::None;
        assert!(provider.build().unwrap().is_none());
    }
}
