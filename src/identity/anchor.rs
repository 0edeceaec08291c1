use std::path::Path;

use tracing::info;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{ReelError, ReelResult};
use crate::synth::capability::{GenerationParams, ImageSynthesizer, TextToImageRequest};

/// A character's fixed visual identity: seed, descriptive text and canonical reference image.
///
/// Immutable once created. The same seed and reference are handed to every frame generation
/// call of a session, which is what keeps the character recognizable across scenes.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterIdentity {
    seed: u64,
    prompt: String,
    style: String,
    reference: PixelBuffer,
}

impl CharacterIdentity {
    /// Adopt an existing reference image (for example one persisted by an earlier run).
    pub fn from_reference(
        prompt: impl Into<String>,
        style: impl Into<String>,
        seed: u64,
        reference: PixelBuffer,
    ) -> Self {
        Self {
            seed,
            prompt: prompt.into(),
            style: style.into(),
            reference,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn reference(&self) -> &PixelBuffer {
        &self.reference
    }

    /// `prompt, style`: the text the reference image was generated from.
    pub fn conditioning(&self) -> String {
        join_conditioning(&[&self.prompt, &self.style])
    }

    /// `description, prompt, style`: scene text first so scene intent leads.
    pub fn frame_conditioning(&self, description: &str) -> String {
        join_conditioning(&[description, &self.prompt, &self.style])
    }

    pub fn save_reference(&self, path: &Path) -> ReelResult<()> {
        self.reference.save_png(path)
    }
}

/// Creates [`CharacterIdentity`] values.
pub struct IdentityAnchor;

impl IdentityAnchor {
    /// Generate the reference image with exactly one seeded text-to-image call.
    ///
    /// Any failure is returned as [`ReelError::Setup`]; there is no fallback identity.
    #[tracing::instrument(skip(synth, params), fields(backend = synth.name()))]
    pub fn create(
        synth: &mut dyn ImageSynthesizer,
        prompt: &str,
        style: &str,
        seed: u64,
        params: &GenerationParams,
    ) -> ReelResult<CharacterIdentity> {
        if prompt.trim().is_empty() {
            return Err(ReelError::setup("character prompt is empty"));
        }
        params
            .validate()
            .map_err(|e| ReelError::setup(format!("invalid generation parameters: {e}")))?;

        let conditioning = join_conditioning(&[prompt, style]);
        let req = TextToImageRequest {
            prompt: &conditioning,
            seed,
            params,
        };
        let reference = synth.text_to_image(&req).map_err(|e| {
            ReelError::setup(format!("reference image generation failed: {e}"))
        })?;

        info!(
            width = reference.width,
            height = reference.height,
            "character reference image created"
        );
        Ok(CharacterIdentity::from_reference(
            prompt, style, seed, reference,
        ))
    }
}

/// Join non-empty text parts with `", "`.
pub(crate) fn join_conditioning(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "../../tests/unit/identity/anchor.rs"]
mod tests;
