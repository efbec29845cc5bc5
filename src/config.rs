use std::{fmt, path::Path};

use anyhow::Context as _;

use crate::{
    color::{DEFAULT_COLOR, DEFAULT_COLOR_CSS, Rgba8},
    error::BackdropResult,
};

/// Which decorative animation an engine instance draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Variant {
    #[default]
    Grid,
    Dots,
    Waves,
}

impl Variant {
    /// Unrecognized names fall back to [`Variant::Grid`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "grid" => Self::Grid,
            "dots" => Self::Dots,
            "waves" => Self::Waves,
            other => {
                tracing::warn!(variant = other, "unknown variant, falling back to grid");
                Self::Grid
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Dots => "dots",
            Self::Waves => "waves",
        }
    }
}

impl From<String> for Variant {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Density and movement scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Strong,
}

impl Intensity {
    /// Unrecognized names fall back to [`Intensity::Medium`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::Light,
            "medium" => Self::Medium,
            "strong" => Self::Strong,
            other => {
                tracing::warn!(intensity = other, "unknown intensity, falling back to medium");
                Self::Medium
            }
        }
    }

    /// Always in `(0, 1]`.
    pub fn factor(self) -> f64 {
        match self {
            Self::Light => 0.3,
            Self::Medium => 0.6,
            Self::Strong => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }
}

impl From<String> for Intensity {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    pub variant: Variant,
    /// CSS-like color string, see [`Rgba8::parse_css`].
    pub color: String,
    pub intensity: Intensity,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            color: DEFAULT_COLOR_CSS.to_string(),
            intensity: Intensity::default(),
        }
    }
}

impl BackdropConfig {
    pub fn new(variant: Variant, color: impl Into<String>, intensity: Intensity) -> Self {
        Self {
            variant,
            color: color.into(),
            intensity,
        }
    }

    pub fn from_json_str(json: &str) -> BackdropResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> BackdropResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parses `color`, falling back to the default color when it cannot be parsed.
    pub fn resolved_color(&self) -> Rgba8 {
        match Rgba8::parse_css(&self.color) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(color = %self.color, %err, "unusable color, using default");
                DEFAULT_COLOR
            }
        }
    }
}
