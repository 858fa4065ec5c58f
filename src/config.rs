use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::advice::BackoffPolicy;
use crate::export::ExportFormat;
use crate::load_model::LoadModelConfig;
use crate::logging::LogConfig;
use crate::stress::{HeartRateProfile, StressError, StressScorer, TrimpWeighting};
use crate::summary::ProjectTargets;
use crate::windows::LookbackWindow;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,

    /// Fitness and fatigue time constants
    #[serde(default)]
    pub load_model: LoadModelConfig,

    /// Heart rate anchors for stress scoring
    #[serde(default)]
    pub heart_rate: HeartRateSettings,

    /// Coaching advice settings
    #[serde(default)]
    pub advice: AdviceSettings,

    /// Yearly project targets for the activity summary
    #[serde(default)]
    pub targets: ProjectTargets,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Data directory (advice cache lives here)
    pub data_dir: PathBuf,

    /// Activity export read when no file is given on the command line
    pub activities_file: Option<PathBuf>,

    /// Lookback window used when no range is given, e.g. "1Y" or "30D"
    pub default_window: String,

    /// Output format for series listings
    pub output_format: ExportFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: default_base_dir().join("data"),
            activities_file: None,
            default_window: LookbackWindow::OneYear.to_string(),
            output_format: ExportFormat::Table,
        }
    }
}

impl AppSettings {
    pub fn lookback_window(&self) -> Result<LookbackWindow> {
        self.default_window
            .parse::<LookbackWindow>()
            .map_err(|e| anyhow!(e))
    }
}

/// Heart rate settings for TRIMP scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartRateSettings {
    pub resting_hr: u16,
    pub max_hr: u16,
    pub weighting: TrimpWeighting,
}

impl Default for HeartRateSettings {
    fn default() -> Self {
        let profile = HeartRateProfile::default();
        HeartRateSettings {
            resting_hr: profile.resting_hr,
            max_hr: profile.max_hr,
            weighting: TrimpWeighting::default(),
        }
    }
}

impl HeartRateSettings {
    pub fn scorer(&self) -> std::result::Result<StressScorer, StressError> {
        let profile = HeartRateProfile::new(self.resting_hr, self.max_hr)?;
        StressScorer::new(profile, self.weighting)
    }
}

/// Coaching advice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceSettings {
    /// Models tried in order until one answers
    pub models: Vec<String>,

    /// Training goals included in every prompt
    pub goals: Option<String>,

    /// How long generated advice stays cached
    pub cache_ttl_hours: u32,

    /// Retry attempts for rate-limited requests (including the first)
    pub max_attempts: u32,

    /// First retry delay in seconds
    pub initial_backoff_secs: u64,

    /// Upper bound on any retry delay in seconds
    pub max_backoff_secs: u64,
}

impl Default for AdviceSettings {
    fn default() -> Self {
        let backoff = BackoffPolicy::default();
        AdviceSettings {
            models: vec![crate::advice::rules::RULE_BASED_MODEL.to_string()],
            goals: None,
            cache_ttl_hours: 6,
            max_attempts: backoff.max_attempts,
            initial_backoff_secs: backoff.initial_delay.as_secs(),
            max_backoff_secs: backoff.max_delay.as_secs(),
        }
    }
}

impl AdviceSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.cache_ttl_hours))
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: std::time::Duration::from_secs(self.initial_backoff_secs),
            max_delay: std::time::Duration::from_secs(self.max_backoff_secs),
            max_attempts: self.max_attempts,
            ..BackoffPolicy::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            load_model: LoadModelConfig::default(),
            heart_rate: HeartRateSettings::default(),
            advice: AdviceSettings::default(),
            targets: ProjectTargets::default(),
            logging: LogConfig::default(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trainload")
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        default_base_dir().join("config.toml")
    }

    /// Load configuration from `path` (or the default location), falling
    /// back to defaults when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_file(&config_path)
    }

    /// Check values that serde alone cannot
    pub fn validate(&self) -> Result<()> {
        self.load_model.validate()?;
        self.heart_rate.scorer()?;
        self.settings.lookback_window()?;
        Ok(())
    }

    /// Advice cache file under the data directory
    pub fn advice_cache_path(&self) -> PathBuf {
        self.settings.data_dir.join("advice_cache.json")
    }

    /// Read a value by dotted key, e.g. `load_model.fitness_time_constant`
    pub fn get_value(&self, key: &str) -> Result<String> {
        let root = toml::Value::try_from(self)?;
        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }

        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value by dotted key; the whole config is re-validated
    pub fn set_value(&mut self, key: &str, raw_value: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self)?;
        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };

        let mut table = root
            .as_table_mut()
            .ok_or_else(|| anyhow!("Configuration root is not a table"))?;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                table = table
                    .get_mut(part)
                    .and_then(toml::Value::as_table_mut)
                    .ok_or_else(|| anyhow!("Unknown configuration section: {}", part))?;
            }
        }

        if table.contains_key(leaf) || is_optional_key(key) {
            table.insert(leaf.to_string(), parse_config_value(raw_value));
        } else {
            bail!("Unknown configuration key: {}", key);
        }

        let updated: AppConfig = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw_value))?;
        updated.validate()?;

        *self = updated;
        Ok(())
    }
}

/// Keys that are absent from serialized TOML while unset
fn is_optional_key(key: &str) -> bool {
    matches!(
        key,
        "settings.activities_file" | "advice.goals" | "logging.file_path"
    )
}

/// Interpret a command-line value as the most specific TOML scalar
fn parse_config_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else if raw.starts_with('[') {
        toml::from_str::<toml::Table>(&format!("v = {}", raw))
            .ok()
            .and_then(|mut t| t.remove("v"))
            .unwrap_or_else(|| toml::Value::String(raw.to_string()))
    } else {
        toml::Value::String(raw.to_string())
    }
}
