use crate::foundation::error::{ReelError, ReelResult};

/// Strength of the first frame of every scene.
pub const RAMP_START: f64 = 0.5;
/// Distance the ramp covers over a full scene; the last frame stays below `RAMP_START + RAMP_SPAN`.
pub const RAMP_SPAN: f64 = 0.3;

/// How far an image-to-image call may depart from the identity's reference image, in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BlendStrength(f64);

impl BlendStrength {
    pub fn new(v: f64) -> ReelResult<Self> {
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            return Err(ReelError::validation(format!(
                "blend strength must be a finite value in [0, 1], got {v}"
            )));
        }
        Ok(Self(v))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for BlendStrength {
    type Error = ReelError;

    fn try_from(v: f64) -> ReelResult<Self> {
        Self::new(v)
    }
}

impl From<BlendStrength> for f64 {
    fn from(v: BlendStrength) -> f64 {
        v.0
    }
}

/// The full per-frame strength ramp of one scene, in frame order: frame `j` of `n` gets
/// `0.5 + 0.3 * (j / n)`.
pub fn strength_ramp(frame_count: u64) -> impl Iterator<Item = BlendStrength> {
    (0..frame_count).map(move |j| {
        // position < frame_count and the result lies in [0.5, 0.8).
        BlendStrength(RAMP_START + RAMP_SPAN * (j as f64 / frame_count as f64))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/strength.rs"]
mod tests;
