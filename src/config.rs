//! Application configuration.
//!
//! The configuration is loaded from a JSON file at
//! `$XDG_CONFIG_HOME/gridjump/config.json`. The top-level schema is split
//! into an `"engine"` section (consumed by the coordinator) and an
//! `"overlay"` section (presentation values passed through to the overlay
//! collaborator untouched), so the file can grow additional sections
//! without breaking backward compatibility.
//!
//! # Example
//!
//! ```json
//! {
//!   "engine": {
//!     "target_cell_side": 60.0,
//!     "scheme": "emacs"
//!   },
//!   "overlay": {
//!     "primary_color": "#1c7ed6",
//!     "secondary_color": "#f8f9fa",
//!     "show_grid_lines": true,
//!     "show_grid_labels": true,
//!     "grid_contrast": 0.0,
//!     "element_contrast": 0.0
//!   }
//! }
//! ```

use crate::coordinator::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
///
/// Every field is optional — a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Engine settings (cell size, keybinding scheme).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Overlay presentation settings. Not consumed by the engine; handed
    /// to the overlay collaborator as-is.
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Presentation settings for the overlay collaborator.
///
/// Colors are CSS-style hex strings; contrast values are offsets in
/// `[-1.0, 1.0]` applied by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub primary_color: String,
    pub secondary_color: String,
    pub show_grid_lines: bool,
    pub show_grid_labels: bool,
    pub grid_contrast: f64,
    pub element_contrast: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            primary_color: "#1c7ed6".into(),
            secondary_color: "#f8f9fa".into(),
            show_grid_lines: true,
            show_grid_labels: true,
            grid_contrast: 0.0,
            element_contrast: 0.0,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

//  Tests
