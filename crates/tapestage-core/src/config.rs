//! tapestage.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Placeholder in `[stage].args` replaced by the file-list artifact path.
pub const LIST_PLACEHOLDER: &str = "{list}";

/// Placeholder in `[listing]` args replaced by the file or folder to list.
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub readers: ReadersConfig,
    pub balance: BalanceConfig,
    pub listing: ListingConfig,
    pub stage: StageCommandConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadersConfig {
    pub count: u32,
    pub max: u32,
}

impl Default for ReadersConfig {
    fn default() -> Self {
        Self { count: 3, max: 4 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    LeastLoaded,
    SizeBudget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub strategy: StrategyKind,
    /// Per-worker budget in bytes for `size-budget`; 0 derives total / N.
    pub max_worker_size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingFormat {
    /// HPSS long listing (`ghi_ls -le`), one `H` line per file.
    #[default]
    Hpss,
    /// `ls -l` style listing restricted to `./*.tar` entries.
    TarLong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub program: String,
    pub file_args: Vec<String>,
    pub folder_args: Vec<String>,
    pub format: ListingFormat,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            program: "ghi_ls".to_string(),
            file_args: vec!["-leu".into(), "-f".into(), PATH_PLACEHOLDER.into()],
            folder_args: vec!["-leRu".into(), PATH_PLACEHOLDER.into()],
            format: ListingFormat::Hpss,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCommandConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Overall deadline in seconds; 0 disables it.
    pub deadline_secs: u64,
}

impl Default for StageCommandConfig {
    fn default() -> Self {
        Self {
            program: "ghi_stage".to_string(),
            args: vec!["-v".into(), "-f".into(), LIST_PLACEHOLDER.into()],
            deadline_secs: 0,
        }
    }
}

impl StageCommandConfig {
    /// Argument template with the `{list}` placeholder guaranteed present.
    pub fn args_with_list(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if !args.iter().any(|a| a.contains(LIST_PLACEHOLDER)) {
            args.push(LIST_PLACEHOLDER.to_string());
        }
        args
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_prefix: "tapestage.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl StageConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(?path, "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: StageConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.readers.max == 0 {
            return Err(ConfigError::Invalid("readers.max must be at least 1".into()));
        }
        if self.readers.count == 0 || self.readers.count > self.readers.max {
            return Err(ConfigError::Invalid(format!(
                "readers.count must be within 1..={}, got {}",
                self.readers.max, self.readers.count
            )));
        }
        if self.stage.program.trim().is_empty() {
            return Err(ConfigError::Invalid("stage.program is empty".into()));
        }
        if self.listing.program.trim().is_empty() {
            return Err(ConfigError::Invalid("listing.program is empty".into()));
        }
        Ok(())
    }
}
