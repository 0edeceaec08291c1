use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// One script entry: what happens on screen and for how long.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub description: String,
    /// Seconds; zero is allowed and yields no frames.
    pub duration: f64,
    /// Narration line spoken over this scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}

impl Scene {
    pub fn new(description: impl Into<String>, duration: f64) -> Self {
        Self {
            description: description.into(),
            duration,
            narration: None,
        }
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = Some(narration.into());
        self
    }

    /// `floor(duration * fps)`.
    pub fn frame_count(&self, fps: Fps) -> u64 {
        fps.secs_to_frames_floor(self.duration)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.description.trim().is_empty() {
            return Err(ReelError::validation("scene description is empty"));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ReelError::validation(format!(
                "scene duration must be finite and >= 0, got {}",
                self.duration
            )));
        }
        Ok(())
    }
}

/// Ordered scenes; order is playback order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Script {
    scenes: Vec<Scene>,
}

impl Script {
    pub fn new(scenes: Vec<Scene>) -> ReelResult<Self> {
        let script = Self { scenes };
        script.validate()?;
        Ok(script)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.scenes.is_empty() {
            return Err(ReelError::validation("script has no scenes"));
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            scene
                .validate()
                .map_err(|e| ReelError::validation(format!("scene {i}: {e}")))?;
        }
        Ok(())
    }

    pub fn frame_counts(&self, fps: Fps) -> Vec<u64> {
        self.scenes.iter().map(|s| s.frame_count(fps)).collect()
    }

    /// Frames the whole script yields at `fps`; errors instead of wrapping on absurd durations.
    pub fn total_frames(&self, fps: Fps) -> ReelResult<u64> {
        self.scenes.iter().enumerate().try_fold(0u64, |acc, (i, scene)| {
            acc.checked_add(scene.frame_count(fps)).ok_or_else(|| {
                ReelError::validation(format!(
                    "scene {i}: total frame count overflows at {} fps (duration {})",
                    fps.get(),
                    scene.duration
                ))
            })
        })
    }

    /// Scene narration lines joined with a space, or `None` when no scene has one.
    pub fn narration_text(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .scenes
            .iter()
            .filter_map(|s| s.narration.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" "))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/script.rs"]
mod tests;
