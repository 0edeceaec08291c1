use tracing::{debug, warn};

use crate::foundation::core::{FrameTag, PixelBuffer};
use crate::foundation::error::{ReelError, ReelResult};
use crate::identity::anchor::CharacterIdentity;
use crate::schedule::strength::BlendStrength;
use crate::synth::capability::{GenerationParams, ImageSynthesizer, ImageToImageRequest};

/// One synthesized frame. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub tag: FrameTag,
    pub strength: BlendStrength,
    pub pixels: PixelBuffer,
}

/// Produces frames anchored to a [`CharacterIdentity`].
pub struct FrameSynthesizer {
    synth: Box<dyn ImageSynthesizer>,
    params: GenerationParams,
    retries: u32,
}

impl FrameSynthesizer {
    pub fn new(synth: Box<dyn ImageSynthesizer>, params: GenerationParams) -> Self {
        Self {
            synth,
            params,
            retries: 0,
        }
    }

    /// Re-issue a failed call up to `retries` more times before reporting it.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Borrow the capability, e.g. to create the identity with the same backend.
    pub fn capability_mut(&mut self) -> &mut dyn ImageSynthesizer {
        self.synth.as_mut()
    }

    /// Generate one frame for `description` at `strength`.
    ///
    /// Every call is seeded with `identity.seed()` and conditioned on `identity.reference()`;
    /// the seed is never advanced, so a fixed `(description, strength)` always yields the same
    /// pixels from a seed-honoring capability.
    pub fn generate_frame(
        &mut self,
        identity: &CharacterIdentity,
        description: &str,
        strength: BlendStrength,
        tag: FrameTag,
    ) -> ReelResult<Frame> {
        let prompt = identity.frame_conditioning(description);
        let req = ImageToImageRequest {
            prompt: &prompt,
            source: identity.reference(),
            strength: strength.get(),
            seed: identity.seed(),
            params: &self.params,
        };

        let mut attempt = 0u32;
        loop {
            match self.synth.image_to_image(&req) {
                Ok(pixels) => {
                    debug!(
                        scene = tag.scene,
                        position = tag.position,
                        strength = strength.get(),
                        "frame synthesized"
                    );
                    return Ok(Frame {
                        tag,
                        strength,
                        pixels,
                    });
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        scene = tag.scene,
                        position = tag.position,
                        attempt,
                        error = %e,
                        "frame synthesis failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(ReelError::synthesis(format!(
                        "scene {} frame {} (strength {:.3}): {}",
                        tag.scene,
                        tag.position,
                        strength.get(),
                        detail(e)
                    )));
                }
            }
        }
    }
}

fn detail(e: ReelError) -> String {
    match e {
        ReelError::Synthesis(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/synth/frame.rs"]
mod tests;
