//! Editor configuration
//!
//! Settings are grouped in sections:
//! - History (undo depth)
//! - Interaction (click threshold, grid snapping, minimum shape size)
//! - Sequence diagrams (message spacing and lifeline sizing)
//!
//! Files may be JSON or TOML; the format is chosen from the extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Undo/redo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps kept per scope
    pub max_history_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_history_size: 50 }
    }
}

/// Pointer interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel (screen px) below which a background press counts as a click
    pub click_threshold_px: f64,
    /// Snap dragged positions to the grid
    pub snap_to_grid: bool,
    /// Grid cell size in canvas units
    pub grid_size: f64,
    /// Smallest width/height a resize may produce
    pub min_shape_size: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
            snap_to_grid: true,
            grid_size: 10.0,
            min_shape_size: 10.0,
        }
    }
}

/// Sequence diagram sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Vertical distance between consecutive messages without an explicit position
    pub message_spacing: f64,
    /// Height of the lifeline header box
    pub header_height: f64,
    /// Lifelines never get shorter than this
    pub min_lifeline_height: f64,
    /// Space kept below the last message
    pub bottom_padding: f64,
    /// Extension of activation bars above and below their messages
    pub activation_padding: f64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            message_spacing: 50.0,
            header_height: 60.0,
            min_lifeline_height: 400.0,
            bottom_padding: 40.0,
            activation_padding: 10.0,
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub interaction: InteractionConfig,
    pub sequence: SequenceConfig,
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl EditorConfig {
    /// Load configuration from a `.json` or `.toml` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_history_size == 0 {
            return Err(invalid("history.max_history_size", "must be at least 1"));
        }
        if !(self.interaction.click_threshold_px >= 0.0) {
            return Err(invalid("interaction.click_threshold_px", "must be non-negative"));
        }
        if !(self.interaction.grid_size > 0.0) {
            return Err(invalid("interaction.grid_size", "must be positive"));
        }
        if !(self.interaction.min_shape_size > 0.0) {
            return Err(invalid("interaction.min_shape_size", "must be positive"));
        }
        if !(self.sequence.message_spacing > 0.0) {
            return Err(invalid("sequence.message_spacing", "must be positive"));
        }
        if !(self.sequence.min_lifeline_height >= 0.0) {
            return Err(invalid("sequence.min_lifeline_height", "must be non-negative"));
        }
        Ok(())
    }
}
