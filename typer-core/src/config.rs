//! Typer configuration.
//!
//! All timing fields are in seconds, mirroring how designers author them.
//! Use the `Duration` accessors when scheduling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TyperError};

/// RGBA color, 0-255 per channel. Passed through to the renderer untouched.
pub type Rgba = [u8; 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "default".to_string(),
            size: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TyperConfig {
    // -- Font --
    pub font: FontSpec,
    pub color: Rgba,

    // -- Layout --
    pub line_spacing: f32,
    pub center_horizontally: bool,
    pub center_vertically: bool,

    // -- Caret --
    /// Glyph drawn after the last revealed character. Empty disables the caret.
    pub caret: String,
    pub caret_blink_time: f64,
    /// Blink target used for the pause after the last line.
    pub final_caret_blink_times: i32,

    // -- Timing --
    pub typing_speed: f64,
    pub start_delay: f64,
    pub pre_fadeout_time: f64,
    pub fadeout_time: f64,

    // -- Text --
    /// Fallback text for `Typer::init("")`.
    pub text: String,
}

impl Default for TyperConfig {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            color: [255, 255, 255, 255],
            line_spacing: 30.0,
            center_horizontally: false,
            center_vertically: false,
            caret: String::new(),
            caret_blink_time: 0.2,
            final_caret_blink_times: 3,
            typing_speed: 0.05,
            start_delay: 1.0,
            pre_fadeout_time: 1.0,
            fadeout_time: 1.0,
            text: String::new(),
        }
    }
}

impl TyperConfig {
    /// Decode a JSON document and validate it. Missing fields take their defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(doc)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let timings = [
            ("typing_speed", self.typing_speed),
            ("start_delay", self.start_delay),
            ("caret_blink_time", self.caret_blink_time),
            ("pre_fadeout_time", self.pre_fadeout_time),
            ("fadeout_time", self.fadeout_time),
        ];

        for (name, secs) in timings {
            if !secs.is_finite() || secs < 0.0 {
                return Err(TyperError::Config(format!(
                    "{name} must be a finite, non-negative number of seconds (got {secs})"
                )));
            }
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(TyperError::Config(format!(
                    "{name} is too large to schedule (got {secs} seconds)"
                )));
            }
        }

        if !self.line_spacing.is_finite() || self.line_spacing < 0.0 {
            return Err(TyperError::Config(format!(
                "line_spacing must be finite and non-negative (got {})",
                self.line_spacing
            )));
        }

        if self.font.size == 0 {
            return Err(TyperError::Config("font.size must be positive".to_string()));
        }

        Ok(())
    }

    pub fn typing_interval(&self) -> Duration {
        secs(self.typing_speed)
    }

    pub fn start_delay(&self) -> Duration {
        secs(self.start_delay)
    }

    pub fn caret_blink_interval(&self) -> Duration {
        secs(self.caret_blink_time)
    }

    pub fn pre_fade_delay(&self) -> Duration {
        secs(self.pre_fadeout_time)
    }

    pub fn fade_duration(&self) -> Duration {
        secs(self.fadeout_time)
    }
}

// Validation rejects these, but a hand-built config may skip it.
// Negative or NaN waits nothing; anything past `Duration::MAX` waits forever.
fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
