//! Capabilities the engine calls into.
//!
//! The host owns fonts, audio and visuals. The engine only sees these traits.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FontSpec;

/// Measured extent of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Font metrics provider. Must be pure: the same input always measures the same.
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, font: &FontSpec) -> Result<TextSize>;
}

/// Fire-and-forget click played for every revealed character.
pub trait TypingSound: Send + Sync {
    fn play(&self);
}

/// Visual fade applied to the whole block when a run finishes.
#[async_trait]
pub trait FadeEffect: Send + Sync {
    /// Resolve once the fade has completed.
    async fn fade_out(&self, duration: Duration) -> Result<()>;
}

/// The injected collaborators for one `Typer`.
#[derive(Clone)]
pub struct Services {
    pub measurer: Arc<dyn TextMeasurer>,
    pub sound: Option<Arc<dyn TypingSound>>,
    pub fade: Option<Arc<dyn FadeEffect>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("measurer", &"Arc<dyn TextMeasurer>")
            .field("sound", &self.sound.is_some())
            .field("fade", &self.fade.is_some())
            .finish()
    }
}

impl Services {
    /// Measurement only: silent, and the fade completes instantly.
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            measurer,
            sound: None,
            fade: None,
        }
    }

    pub fn with_sound(mut self, sound: Arc<dyn TypingSound>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn with_fade(mut self, fade: Arc<dyn FadeEffect>) -> Self {
        self.fade = Some(fade);
        self
    }
}

/// Every char is `advance * font.size` wide and `font.size` tall.
/// Good enough for terminals, tests and headless previews.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasurer {
    pub advance: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> Result<TextSize> {
        if font.size == 0 {
            anyhow::bail!("font '{}' has zero size", font.family);
        }

        let size = font.size as f32;
        Ok(TextSize {
            width: text.chars().count() as f32 * self.advance * size,
            height: size,
        })
    }
}
