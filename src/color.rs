use std::{fmt, str::FromStr};

use crate::error::{BackdropError, BackdropResult};

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Used when the configured color is missing or unparseable.
pub const DEFAULT_COLOR: Rgba8 = Rgba8 {
    r: 148,
    g: 163,
    b: 184,
    a: 102,
};

pub const DEFAULT_COLOR_CSS: &str = "rgba(148, 163, 184, 0.4)";

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    ///
    /// Channel values are 0-255; the functional alpha is 0-1.
    pub fn parse_css(input: &str) -> BackdropResult<Self> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| {
                BackdropError::validation(format!("invalid hex color '{input}'"))
            });
        }

        let args = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| BackdropError::validation(format!("unsupported color '{input}'")))?;

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(BackdropError::validation(format!(
                "color '{input}' must have 3 or 4 components"
            )));
        }

        let channel = |v: &str| -> BackdropResult<u8> {
            let f: f64 = v.parse().map_err(|_| {
                BackdropError::validation(format!("invalid color channel '{v}' in '{input}'"))
            })?;
            if !f.is_finite() || !(0.0..=255.0).contains(&f) {
                return Err(BackdropError::validation(format!(
                    "color channel '{v}' out of range 0-255"
                )));
            }
            Ok(f.round() as u8)
        };

        let r = channel(parts[0])?;
        let g = channel(parts[1])?;
        let b = channel(parts[2])?;
        let a = match parts.get(3) {
            Some(v) => {
                let f: f64 = v.parse().map_err(|_| {
                    BackdropError::validation(format!("invalid alpha '{v}' in '{input}'"))
                })?;
                if !f.is_finite() || !(0.0..=1.0).contains(&f) {
                    return Err(BackdropError::validation(format!(
                        "alpha '{v}' out of range 0-1"
                    )));
                }
                (f * 255.0).round() as u8
            }
            None => 255,
        };

        Ok(Self { r, g, b, a })
    }

    /// Same hue, alpha multiplied by `factor` (clamped to `[0,1]`).
    pub fn with_alpha_scaled(self, factor: f64) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a: (f64::from(self.a) * factor).round() as u8,
            ..self
        }
    }

    pub fn alpha_f32(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

impl FromStr for Rgba8 {
    type Err = BackdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_css(s)
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = f64::from(self.a) / 255.0;
        write!(f, "rgba({}, {}, {}, {alpha:.3})", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    match hex.len() {
        3 => Some(Rgba8::opaque(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Rgba8::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}
