//! Config - tunables for text measurement, dispatch and the frame driver.
//!
//! Every section has a serde default, so a partial JSON document only needs
//! to name the values it overrides:
//!
//! ```ignore
//! let config = Config::from_json_str(r#"{ "dispatch": { "double_click_ms": 300 } }"#)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Font;

/// Text collaborator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    /// Advance of one narrow cell as a fraction of the font size, used by
    /// the monospace measurer.
    pub char_width_ratio: f32,
    /// Entries kept in the width cache.
    pub cache_capacity: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 14.0,
            line_height: 1.4,
            char_width_ratio: 0.6,
            cache_capacity: 1024,
        }
    }
}

impl TextConfig {
    pub fn font(&self) -> Font {
        Font {
            family: self.font_family.clone(),
            size: self.font_size,
            line_height: self.line_height,
        }
    }
}

/// Event dispatcher tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub double_click_ms: u64,
    pub double_click_distance: f32,
    pub dropdown_option_height: f32,
    pub dropdown_gap: f32,
    /// Pixels scrolled per wheel line.
    pub wheel_line_px: f32,
    /// Pixel size of one terminal cell for the crossterm bridge.
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 500,
            double_click_distance: 5.0,
            dropdown_option_height: 32.0,
            dropdown_gap: 4.0,
            wheel_line_px: 16.0,
            cell_width: 8.0,
            cell_height: 16.0,
        }
    }
}

impl DispatchConfig {
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

/// Frame driver tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub async_queue_capacity: usize,
    /// Force a redraw at least this often even when idle.
    pub idle_redraw_ms: Option<u64>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            async_queue_capacity: 64,
            idle_redraw_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub text: TextConfig,
    pub dispatch: DispatchConfig,
    pub frame: FrameConfig,
}

impl Config {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("text.font_size", self.text.font_size),
            ("text.line_height", self.text.line_height),
            ("text.char_width_ratio", self.text.char_width_ratio),
            ("dispatch.dropdown_option_height", self.dispatch.dropdown_option_height),
            ("dispatch.wheel_line_px", self.dispatch.wheel_line_px),
            ("dispatch.cell_width", self.dispatch.cell_width),
            ("dispatch.cell_height", self.dispatch.cell_height),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.dispatch.double_click_distance < 0.0 || self.dispatch.dropdown_gap < 0.0 {
            return Err(Error::InvalidConfig("dispatch distances must not be negative".into()));
        }
        if self.text.cache_capacity == 0 {
            return Err(Error::InvalidConfig("text.cache_capacity must be non-zero".into()));
        }
        if self.frame.async_queue_capacity == 0 {
            return Err(Error::InvalidConfig("frame.async_queue_capacity must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = Config::from_json_str(r#"{ "dispatch": { "double_click_ms": 300 } }"#).unwrap();
        assert_eq!(config.dispatch.double_click_ms, 300);
        assert_eq!(config.dispatch.double_click_distance, 5.0);
        assert_eq!(config.text, TextConfig::default());
        assert_eq!(config.frame, FrameConfig::default());
    }

    #[test]
    fn test_roundtrip_default() {
        let json = Config::default().to_json_string().unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Config::from_json_str(r#"{ "text": { "font_size": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::from_json_str(r#"{ "frame": { "async_queue_capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_font_from_text_section() {
        let font = Config::default().text.font();
        assert_eq!(font, Font::default());
    }
}
