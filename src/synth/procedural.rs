use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{ReelError, ReelResult};
use crate::synth::capability::{
    GenerationParams, ImageSynthesizer, ImageToImageRequest, TextToImageRequest,
};

/// Offline capability that derives pixels from an xxh3 hash of the request.
///
/// Text-to-image paints a two-color gradient with per-pixel grain, both keyed by
/// `(prompt, seed, steps, guidance)`. Image-to-image lerps the source toward the field for its
/// own prompt by `strength`, so `strength == 0` returns the source unchanged.
#[derive(Debug, Default)]
pub struct ProceduralSynthesizer {
    calls: u64,
}

impl ProceduralSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of capability calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl ImageSynthesizer for ProceduralSynthesizer {
    fn name(&self) -> &'static str {
        "procedural"
    }

    fn text_to_image(&mut self, req: &TextToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        req.params.validate()?;
        self.calls += 1;
        field(req.prompt, req.seed, req.params, req.params.width, req.params.height)
    }

    fn image_to_image(&mut self, req: &ImageToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        req.params.validate()?;
        if !req.strength.is_finite() || !(0.0..=1.0).contains(&req.strength) {
            return Err(ReelError::validation(format!(
                "image-to-image strength must be in [0, 1], got {}",
                req.strength
            )));
        }
        self.calls += 1;

        let src = req.source;
        let target = field(req.prompt, req.seed, req.params, src.width, src.height)?;
        let s = req.strength as f32;
        let data = src
            .data
            .iter()
            .zip(target.data.iter())
            .map(|(&a, &b)| {
                let v = f32::from(a) + (f32::from(b) - f32::from(a)) * s;
                v.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        PixelBuffer::new(src.width, src.height, data)
    }
}

fn request_key(prompt: &str, seed: u64, params: &GenerationParams) -> u64 {
    let mut bytes = Vec::with_capacity(prompt.len() + 8);
    bytes.extend_from_slice(prompt.as_bytes());
    bytes.extend_from_slice(&params.steps.to_le_bytes());
    bytes.extend_from_slice(&params.guidance_scale.to_bits().to_le_bytes());
    xxh3_64_with_seed(&bytes, seed)
}

fn field(
    prompt: &str,
    seed: u64,
    params: &GenerationParams,
    width: u32,
    height: u32,
) -> ReelResult<PixelBuffer> {
    let key = request_key(prompt, seed, params);
    let kb = key.to_le_bytes();
    let c0 = [kb[0], kb[1], kb[2]];
    let c1 = [kb[3], kb[4], kb[5]];
    let horizontal = kb[6] & 1 == 0;

    let extent = if horizontal { width } else { height };
    let span = extent.saturating_sub(1).max(1) as f32;
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            let pos = if horizontal { x } else { y };
            let t = pos as f32 / span;
            let idx = u64::from(y) * u64::from(width) + u64::from(x);
            let grain = (xxh3_64_with_seed(&idx.to_le_bytes(), key) & 0x1f) as i16 - 16;
            for c in 0..3 {
                let base = f32::from(c0[c]) + (f32::from(c1[c]) - f32::from(c0[c])) * t;
                data.push((base.round() as i16 + grain).clamp(0, 255) as u8);
            }
            data.push(255);
        }
    }
    PixelBuffer::new(width, height, data)
}

#[cfg(test)]
#[path = "../../tests/unit/synth/procedural.rs"]
mod tests;
