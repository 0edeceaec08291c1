use crate::foundation::core::Fps;

/// Where one scene's frames sit in the concatenated output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TimelineEntry {
    pub scene: usize,
    pub first_frame: u64,
    pub frame_count: u64,
}

/// Ordered concatenation of all scenes' frames at a fixed frame rate.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    fps: Fps,
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Build from per-scene frame counts in scene order.
    pub fn from_counts(fps: Fps, counts: impl IntoIterator<Item = u64>) -> Self {
        let mut first_frame = 0u64;
        let entries = counts
            .into_iter()
            .enumerate()
            .map(|(scene, frame_count)| {
                let entry = TimelineEntry {
                    scene,
                    first_frame,
                    frame_count,
                };
                first_frame += frame_count;
                entry
            })
            .collect();
        Self { fps, entries }
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn total_frames(&self) -> u64 {
        self.entries.iter().map(|e| e.frame_count).sum()
    }

    /// Sum of per-scene `frame_count / fps`.
    pub fn duration_secs(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| self.fps.frames_to_secs(e.frame_count))
            .sum()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/timeline.rs"]
mod tests;
