use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{ReelError, ReelResult};

/// Seeded generation parameters shared by text-to-image and image-to-image calls.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationParams {
    /// Denoising step count.
    pub steps: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            steps: 25,
            guidance_scale: 7.5,
            width: 512,
            height: 512,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> ReelResult<()> {
        if self.steps == 0 {
            return Err(ReelError::validation("generation steps must be > 0"));
        }
        if !self.guidance_scale.is_finite() || self.guidance_scale <= 0.0 {
            return Err(ReelError::validation(
                "generation guidance_scale must be finite and > 0",
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation(
                "generation width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // Frames end up in a yuv420p video.
            return Err(ReelError::validation(
                "generation width/height must be even",
            ));
        }
        Ok(())
    }
}

/// Input to a text-to-image call.
#[derive(Clone, Copy, Debug)]
pub struct TextToImageRequest<'a> {
    pub prompt: &'a str,
    pub seed: u64,
    pub params: &'a GenerationParams,
}

/// Input to an image-conditioned image-to-image call.
#[derive(Clone, Copy, Debug)]
pub struct ImageToImageRequest<'a> {
    pub prompt: &'a str,
    pub source: &'a PixelBuffer,
    /// How far the output may depart from `source`, in `[0, 1]`.
    pub strength: f64,
    pub seed: u64,
    pub params: &'a GenerationParams,
}

/// The generative image capability.
///
/// Implementations must honor the seed contract: identical requests produce identical pixels.
/// Calls are issued one at a time.
pub trait ImageSynthesizer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn text_to_image(&mut self, req: &TextToImageRequest<'_>) -> ReelResult<PixelBuffer>;

    fn image_to_image(&mut self, req: &ImageToImageRequest<'_>) -> ReelResult<PixelBuffer>;
}

/// Which capability implementation to construct.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesizerConfig {
    /// Offline, hash-seeded pixels.
    #[default]
    Procedural,
    /// Stable Diffusion WebUI-compatible HTTP API.
    Http {
        endpoint: String,
        #[serde(default = "default_http_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_http_timeout_secs() -> u64 {
    600
}

impl SynthesizerConfig {
    pub fn http(endpoint: impl Into<String>) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

pub fn create_synthesizer(cfg: &SynthesizerConfig) -> ReelResult<Box<dyn ImageSynthesizer>> {
    match cfg {
        SynthesizerConfig::Procedural => {
            Ok(Box::new(crate::synth::procedural::ProceduralSynthesizer::new()))
        }
        SynthesizerConfig::Http {
            endpoint,
            timeout_secs,
        } => Ok(Box::new(crate::synth::http::HttpSynthesizer::new(
            endpoint.clone(),
            std::time::Duration::from_secs(*timeout_secs),
        )?)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/synth/capability.rs"]
mod tests;
