// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor configuration.
//!
//! A [`CompositorConfig`] is loaded from TOML with
//! [`CompositorConfig::from_toml_str`]. Every section is optional; the
//! [`Default`] value is a usable headless setup.
//!
//! ```toml
//! debug = true
//!
//! [cursor]
//! theme = "Adwaita"
//! size = 24
//!
//! [keyboard]
//! layout = "de"
//! repeat_rate = 30
//!
//! [[outputs]]
//! name = "eDP-1"
//! scale = 2.0
//! transform = "90"
//! position = { x = 0, y = 0 }
//! mode = { width = 2560, height = 1600, refresh_mhz = 60000 }
//! ```

use serde::Deserialize;

use crate::error::ConfigError;
use crate::output::Transform;

/// Smallest scale that is applied as configured; anything below is derived
/// from the physical DPI instead.
pub const MIN_CONFIGURED_SCALE: f64 = 0.1;

/// Physical DPI above which an unconfigured output gets scale 2.
pub const HIDPI_THRESHOLD: f64 = 182.0;

/// Width used for a custom mode when none is configured.
pub const FALLBACK_MODE_WIDTH: i32 = 1920;

/// Height used for a custom mode when none is configured.
pub const FALLBACK_MODE_HEIGHT: i32 = 1280;

/// Top-level compositor configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorConfig {
    /// Enables verbose logging and the debug dump key.
    pub debug: bool,
    /// Per-output settings, matched by output name.
    pub outputs: Vec<OutputConfig>,
    /// Cursor theme settings.
    pub cursor: CursorConfig,
    /// Keyboard settings handed to keymap compilation.
    pub keyboard: KeyboardConfig,
}

impl CompositorConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents,
    /// [`ConfigError::DuplicateOutput`] if two output sections share a name,
    /// and [`ConfigError::InvalidScale`] for non-finite scales.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, output) in self.outputs.iter().enumerate() {
            if self.outputs[..i].iter().any(|o| o.name == output.name) {
                return Err(ConfigError::DuplicateOutput(output.name.clone()));
            }
            if let Some(scale) = output.scale
                && !scale.is_finite()
            {
                return Err(ConfigError::InvalidScale {
                    name: output.name.clone(),
                    scale,
                });
            }
        }
        Ok(())
    }

    /// Looks up the section for an output by name.
    #[must_use]
    pub fn find_output(&self, name: &str) -> Option<&OutputConfig> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// Settings for one output.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output name as reported by the backend (e.g. `"HDMI-A-1"`).
    pub name: String,
    /// Fixed layout position; `None` places the output automatically.
    #[serde(default)]
    pub position: Option<Position>,
    /// Requested mode.
    #[serde(default)]
    pub mode: Option<ModeConfig>,
    /// Requested scale; `None` or below [`MIN_CONFIGURED_SCALE`] derives it
    /// from the physical DPI.
    #[serde(default)]
    pub scale: Option<f64>,
    /// Output transform.
    #[serde(default)]
    pub transform: Transform,
}

/// A position in the global layout.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Position {
    /// Horizontal position in layout coordinates.
    pub x: i32,
    /// Vertical position in layout coordinates.
    pub y: i32,
}

/// A requested output mode.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ModeConfig {
    /// Width in pixels; zero means unspecified.
    pub width: i32,
    /// Height in pixels; zero means unspecified.
    pub height: i32,
    /// Refresh rate in millihertz; zero means unspecified.
    pub refresh_mhz: i32,
}

/// Cursor theme settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    /// Theme name; `None` uses the system default.
    pub theme: Option<String>,
    /// Nominal cursor size in logical pixels.
    pub size: u32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            theme: None,
            size: 24,
        }
    }
}

/// Keyboard settings.
///
/// The keymap names are passed through untouched; compiling them is the
/// backend's job.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KeyboardConfig {
    /// XKB model.
    pub model: Option<String>,
    /// XKB layout.
    pub layout: Option<String>,
    /// XKB variant.
    pub variant: Option<String>,
    /// XKB options.
    pub options: Option<String>,
    /// Key repeat rate in Hz.
    pub repeat_rate: i32,
    /// Delay before key repeat starts, in milliseconds.
    pub repeat_delay: i32,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            model: None,
            layout: None,
            variant: None,
            options: None,
            repeat_rate: 25,
            repeat_delay: 600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = CompositorConfig::from_toml_str("").unwrap();
        assert_eq!(config, CompositorConfig::default());
        assert_eq!(config.keyboard.repeat_rate, 25);
        assert_eq!(config.keyboard.repeat_delay, 600);
        assert_eq!(config.cursor.size, 24);
    }

    #[test]
    fn parses_output_sections() {
        let config = CompositorConfig::from_toml_str(
            r#"
            debug = true

            [[outputs]]
            name = "eDP-1"
            scale = 2.0
            transform = "flipped-90"
            position = { x = 0, y = 0 }
            mode = { width = 2560, height = 1600, refresh_mhz = 60000 }

            [[outputs]]
            name = "HDMI-A-1"
            "#,
        )
        .unwrap();

        assert!(config.debug);
        let edp = config.find_output("eDP-1").unwrap();
        assert_eq!(edp.scale, Some(2.0));
        assert_eq!(edp.transform, Transform::Flipped90);
        assert_eq!(edp.position, Some(Position { x: 0, y: 0 }));
        assert_eq!(edp.mode.map(|m| m.refresh_mhz), Some(60000));

        let hdmi = config.find_output("HDMI-A-1").unwrap();
        assert_eq!(hdmi.position, None, "absent position means auto placement");
        assert_eq!(hdmi.transform, Transform::Normal);
        assert!(config.find_output("DP-3").is_none());
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let err = CompositorConfig::from_toml_str(
            r#"
            [[outputs]]
            name = "DP-1"
            [[outputs]]
            name = "DP-1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOutput(name) if name == "DP-1"));
    }

    #[test]
    fn non_finite_scale_is_rejected() {
        let err = CompositorConfig::from_toml_str(
            r#"
            [[outputs]]
            name = "DP-1"
            scale = nan
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidScale { .. }));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = CompositorConfig::from_toml_str("refresh = 60").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
