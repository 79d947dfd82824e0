//! Configuration handling for form defaults

use crate::forms::FormOptions;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "SCHEMAFORM_CONFIG";

/// User configuration for forms
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormConfig {
    /// Validate fields on every input/change event
    pub validate_on_change: Option<bool>,
    /// Validate fields when they lose focus
    pub validate_on_blur: Option<bool>,
    /// Forget touched state on reset
    pub reset_clears_touched: Option<bool>,
    /// Message shown when a submit handler fails without one
    pub submit_error_fallback: Option<String>,
    /// Tracing filter directive for the binary
    pub log_filter: Option<String>,
}

impl FormConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("io", "schemaform", "schemaform")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a file, falling back to defaults when it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: FormConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Form options with unset keys taken from the engine defaults
    pub fn form_options(&self) -> FormOptions {
        let defaults = FormOptions::default();
        FormOptions {
            validate_on_change: self
                .validate_on_change
                .unwrap_or(defaults.validate_on_change),
            validate_on_blur: self.validate_on_blur.unwrap_or(defaults.validate_on_blur),
            reset_clears_touched: self
                .reset_clears_touched
                .unwrap_or(defaults.reset_clears_touched),
            submit_error_fallback: self
                .submit_error_fallback
                .clone()
                .unwrap_or(defaults.submit_error_fallback),
        }
    }
}
