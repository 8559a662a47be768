//! Configuration management for pricescout
//!
//! Config stored at: ~/.config/pricescout/config.json

use pricescout_domain::DEFAULT_CURRENCY_SYMBOL;
use pricescout_types::{ConditionScale, ConfigError, OutputFormat, Result, SliderValues};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Local model runner, e.g. `python3 ~/models/classify.py --model mobilenet_v2.tflite`
    #[serde(default)]
    pub classifier_command: Option<String>,

    /// Predictions below this confidence are treated as "Unknown"
    #[serde(default)]
    pub min_confidence: Option<f64>,

    /// Enable classification caching
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache directory override
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Condition slider scale (five, ten)
    #[serde(default)]
    pub condition_scale: ConditionScale,

    /// Prefix for formatted prices
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_condition")]
    pub default_condition: i32,

    #[serde(default = "default_age_months")]
    pub default_age_months: f64,

    #[serde(default = "default_warranty_months")]
    pub default_warranty_months: f64,
}

fn default_true() -> bool {
    true
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn default_condition() -> i32 {
    SliderValues::default().condition
}

fn default_age_months() -> f64 {
    SliderValues::default().age_months
}

fn default_warranty_months() -> f64 {
    SliderValues::default().warranty_months
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier_command: None,
            min_confidence: None,
            cache_enabled: true,
            cache_dir: None,
            output_format: OutputFormat::default(),
            condition_scale: ConditionScale::default(),
            currency_symbol: default_currency_symbol(),
            default_condition: default_condition(),
            default_age_months: default_age_months(),
            default_warranty_months: default_warranty_months(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("pricescout");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or(ConfigError::NotFound)?
            .join("pricescout");
        Ok(cache_dir)
    }

    /// Slider positions used when the command line leaves them out
    pub fn default_sliders(&self) -> SliderValues {
        SliderValues {
            condition: self.default_condition,
            age_months: self.default_age_months,
            warranty_months: self.default_warranty_months,
        }
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a specific path, or default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PriceScout Configuration")?;
        writeln!(f, "========================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Classifier cmd:   {}",
            self.classifier_command.as_deref().unwrap_or("(not set)")
        )?;
        match self.min_confidence {
            Some(min) => writeln!(f, "Min confidence:   {:.0}%", min * 100.0)?,
            None => writeln!(f, "Min confidence:   (none)")?,
        }
        writeln!(f, "Cache enabled:    {}", self.cache_enabled)?;
        writeln!(
            f,
            "Cache dir:        {}",
            self.cache_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;
        writeln!(
            f,
            "Condition scale:  {} ({})",
            self.condition_scale,
            self.condition_scale.label()
        )?;
        writeln!(f, "Currency symbol:  {}", self.currency_symbol)?;
        writeln!(
            f,
            "Default sliders:  condition {}, age {} mo, warranty {} mo",
            self.default_condition, self.default_age_months, self.default_warranty_months
        )?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}
