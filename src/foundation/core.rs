use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Integer frames-per-second of the output timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Fps(u32);

impl Fps {
    pub fn new(fps: u32) -> ReelResult<Self> {
        if fps == 0 {
            return Err(ReelError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// `floor(secs * fps)`; negative or non-finite inputs produce zero frames.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        if !secs.is_finite() {
            return 0;
        }
        (secs * self.as_f64()).floor().max(0.0) as u64
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        frames as f64 / self.as_f64()
    }
}

impl Default for Fps {
    /// Eight frames per second: diffusion frames are expensive.
    fn default() -> Self {
        Self(8)
    }
}

impl TryFrom<u32> for Fps {
    type Error = ReelError;

    fn try_from(v: u32) -> ReelResult<Self> {
        Self::new(v)
    }
}

impl From<Fps> for u32 {
    fn from(v: Fps) -> u32 {
        v.0
    }
}

/// Position of a frame in the script: scene index plus 0-based position inside the scene.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameTag {
    pub scene: usize,
    pub position: usize,
}

/// Straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::validation("pixel buffer width/height must be non-zero"));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(ReelError::validation(format!(
                "pixel buffer data length {} does not match {width}x{height}x4 = {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ReelResult<Self> {
        let n = (width as usize) * (height as usize);
        Self::new(width, height, rgba.repeat(n))
    }

    pub fn from_image(img: image::DynamicImage) -> Self {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    pub fn decode(bytes: &[u8]) -> ReelResult<Self> {
        let img = image::load_from_memory(bytes).context("decode image bytes")?;
        Ok(Self::from_image(img))
    }

    pub fn load(path: &Path) -> ReelResult<Self> {
        let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Ok(Self::from_image(img))
    }

    pub fn encode_png(&self) -> ReelResult<Vec<u8>> {
        use image::ImageEncoder as _;

        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(
                &self.data,
                self.width,
                self.height,
                image::ExtendedColorType::Rgba8,
            )
            .context("encode png")?;
        Ok(out)
    }

    pub fn save_png(&self, path: &Path) -> ReelResult<()> {
        ensure_parent_dir(path)?;
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
