//! Overlay configuration.
//!
//! All values have defaults matching the editor's inline-edit styling; hosts override them in
//! code (`with_*` setters) or from JSON settings via [`OverlayConfig::from_json`]. Missing JSON
//! fields keep their defaults.

use crate::measure::DEFAULT_MEASUREMENT_PADDING_PX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default padding around the overlay box, in pixels.
pub const DEFAULT_PADDING_PX: f64 = 2.0;
/// Default corner radius of the overlay box, in pixels.
pub const DEFAULT_BORDER_RADIUS_PX: f64 = 4.0;

/// Errors produced while loading an [`OverlayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings are not valid JSON or do not match the schema.
    #[error("invalid overlay settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A numeric setting is negative, NaN or infinite.
    #[error("invalid value for '{field}': {value}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// A theme color reference, resolved by the host's theme service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColor {
    /// Theme key, e.g. `inlineEdit.modifiedBorder`.
    pub id: String,
    /// Value used when the theme does not define `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ThemeColor {
    /// A theme color without fallback.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fallback: None,
        }
    }

    /// Set the fallback value.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// CSS custom-property reference, e.g. `var(--inlineEdit-modifiedBorder, transparent)`.
    pub fn to_css_var(&self) -> String {
        let name = self.id.replace('.', "-");
        match &self.fallback {
            Some(fallback) => format!("var(--{name}, {fallback})"),
            None => format!("var(--{name})"),
        }
    }
}

/// Visual style of the overlay outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Style class of the outline element.
    pub class_name: String,
    /// Fill color.
    pub fill: ThemeColor,
    /// Stroke color.
    pub stroke: ThemeColor,
    /// Stroke width in pixels.
    pub stroke_width_px: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            class_name: "originalOverlay".to_string(),
            fill: ThemeColor::new("inlineEdit.modifiedChangedLineBackground")
                .with_fallback("transparent"),
            stroke: ThemeColor::new("inlineEdit.modifiedBorder"),
            stroke_width_px: 1.0,
        }
    }
}

/// Tunables of the insertion overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Padding around the box.
    pub padding_px: f64,
    /// Corner radius of the box.
    pub border_radius_px: f64,
    /// Correction subtracted from every rendered line width.
    pub measurement_padding_px: f64,
    /// Outline style.
    pub style: OverlayStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            padding_px: DEFAULT_PADDING_PX,
            border_radius_px: DEFAULT_BORDER_RADIUS_PX,
            measurement_padding_px: DEFAULT_MEASUREMENT_PADDING_PX,
            style: OverlayStyle::default(),
        }
    }
}

impl OverlayConfig {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every numeric setting is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("padding_px", self.padding_px),
            ("border_radius_px", self.border_radius_px),
            ("measurement_padding_px", self.measurement_padding_px),
            ("style.stroke_width_px", self.style.stroke_width_px),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }

    /// Set the box padding.
    pub fn with_padding(mut self, padding_px: f64) -> Self {
        self.padding_px = padding_px;
        self
    }

    /// Set the corner radius.
    pub fn with_border_radius(mut self, border_radius_px: f64) -> Self {
        self.border_radius_px = border_radius_px;
        self
    }

    /// Set the measurement correction.
    pub fn with_measurement_padding(mut self, measurement_padding_px: f64) -> Self {
        self.measurement_padding_px = measurement_padding_px;
        self
    }

    /// Set the outline style.
    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }
}
