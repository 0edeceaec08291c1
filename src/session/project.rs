use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assemble::naming::{FrameNaming, MIN_NAMING_WIDTH};
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::schedule::scheduler::OnFrameFailure;
use crate::schedule::script::Script;
use crate::synth::capability::{GenerationParams, SynthesizerConfig};

/// Project file: one character, one script, and how to render them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub character: CharacterSpec,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default)]
    pub fps: Fps,
    pub scenes: Script,
    /// Narration for the whole video; falls back to the scenes' narration lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(default)]
    pub synthesizer: SynthesizerConfig,
    #[serde(default)]
    pub frames: FramePolicy,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterSpec {
    pub prompt: String,
    #[serde(default)]
    pub style: String,
    pub seed: u64,
    /// Reuse this image as the reference instead of generating one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FramePolicy {
    pub retries: u32,
    pub on_failure: OnFrameFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub work_dir: PathBuf,
    pub video: PathBuf,
    pub naming_width: usize,
    /// Use an existing audio file as the narration track instead of synthesizing one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration_audio: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("storyreel_work"),
            video: PathBuf::from("storyreel.mp4"),
            naming_width: MIN_NAMING_WIDTH,
            narration_audio: None,
        }
    }
}

impl Project {
    /// Load a project file. Relative `reference` and `narration_audio` paths resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
        let mut project: Project = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ReelError::serde(format!("parse project '{}': {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(p) = project.character.reference.as_mut() {
            *p = rebase(base, p);
        }
        if let Some(p) = project.output.narration_audio.as_mut() {
            *p = rebase(base, p);
        }

        project.validate()?;
        Ok(project)
    }

    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        let project: Project = serde_json::from_str(json)?;
        project.validate()?;
        Ok(project)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.character.prompt.trim().is_empty() {
            return Err(ReelError::validation("character prompt is empty"));
        }
        self.generation.validate()?;
        self.scenes.validate()?;
        self.naming()?
            .check_capacity(self.scenes.total_frames(self.fps)?)?;
        Ok(())
    }

    pub fn naming(&self) -> ReelResult<FrameNaming> {
        FrameNaming::with_width(self.output.naming_width)
    }

    /// Text for the narration track, if there is any.
    pub fn narration_text(&self) -> Option<String> {
        match self.narration.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.to_string()),
            _ => self.scenes.narration_text(),
        }
    }

    pub fn reference_path(&self) -> PathBuf {
        self.output.work_dir.join("reference.png")
    }

    pub fn silent_video_path(&self) -> PathBuf {
        self.output.work_dir.join("silent.mp4")
    }

    pub fn narration_path(&self, extension: &str) -> PathBuf {
        self.output
            .work_dir
            .join(format!("narration.{extension}"))
    }
}

fn rebase(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/project.rs"]
mod tests;
