use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::assemble::assembler::MediaAssembler;
use crate::assemble::ffmpeg::VideoEncoder;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{ReelError, ReelResult};
use crate::identity::anchor::{CharacterIdentity, IdentityAnchor};
use crate::narration::{NarrationProvider, for_current_platform};
use crate::schedule::scheduler::{CancelToken, FrameFailure, Progress, SceneScheduler};
use crate::schedule::timeline::Timeline;
use crate::session::project::Project;
use crate::synth::capability::{ImageSynthesizer, create_synthesizer};
use crate::synth::frame::FrameSynthesizer;

/// Result of one stage that is allowed to fail without ending the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Done(T),
    Skipped(String),
    Failed(String),
}

impl<T> StageOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn done(&self) -> Option<&T> {
        match self {
            Self::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// Everything a run produced, stage by stage.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub reference: PathBuf,
    pub planned_frames: u64,
    pub frames_generated: usize,
    pub failures: Vec<FrameFailure>,
    pub cancelled: bool,
    pub timeline: Timeline,
    /// Directory holding the per-frame images, when they were written.
    pub frames_dir: StageOutcome<PathBuf>,
    pub silent_video: StageOutcome<PathBuf>,
    pub narration: StageOutcome<PathBuf>,
    pub final_video: StageOutcome<PathBuf>,
}

impl SessionReport {
    /// The most complete video produced: the narrated one, else the silent one.
    pub fn final_artifact(&self) -> Option<&Path> {
        self.final_video
            .done()
            .or_else(|| self.silent_video.done())
            .map(PathBuf::as_path)
    }
}

enum NarrationChoice {
    Platform,
    Provider(Box<dyn NarrationProvider>),
    Disabled,
}

/// Runs a [`Project`] end to end: identity, frames, silent video, narration, mux.
///
/// Only identity creation and an aborted frame run are fatal; an abort still writes the frames
/// finished before it. Later stages record their failure in the [`SessionReport`] and the
/// session keeps whatever was already produced.
pub struct ReelSession<'p> {
    project: Project,
    synth: Option<Box<dyn ImageSynthesizer>>,
    encoder: Option<Box<dyn VideoEncoder>>,
    narration: NarrationChoice,
    cancel: CancelToken,
    progress: Option<Box<dyn FnMut(&Progress) + 'p>>,
}

impl<'p> ReelSession<'p> {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            synth: None,
            encoder: None,
            narration: NarrationChoice::Platform,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Use this capability instead of the one configured in the project.
    pub fn with_synthesizer(mut self, synth: Box<dyn ImageSynthesizer>) -> Self {
        self.synth = Some(synth);
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn VideoEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_narrator(mut self, narrator: Box<dyn NarrationProvider>) -> Self {
        self.narration = NarrationChoice::Provider(narrator);
        self
    }

    pub fn without_narration(mut self) -> Self {
        self.narration = NarrationChoice::Disabled;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, observer: impl FnMut(&Progress) + 'p) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    #[tracing::instrument(skip_all, fields(work_dir = %self.project.output.work_dir.display()))]
    pub fn run(mut self) -> ReelResult<SessionReport> {
        self.project.validate()?;
        if self.cancel.is_cancelled() {
            return Err(ReelError::cancelled(
                "session cancelled before the character identity was created",
            ));
        }
        let project = &self.project;
        let fps = project.fps;

        let synth = match self.synth.take() {
            Some(s) => s,
            None => create_synthesizer(&project.synthesizer)
                .map_err(|e| ReelError::setup(format!("image capability unavailable: {e}")))?,
        };
        let mut frame_synth = FrameSynthesizer::new(synth, project.generation.clone())
            .with_retries(project.frames.retries);

        // Stage 1: identity (fatal).
        let identity = build_identity(project, frame_synth.capability_mut())?;
        let reference = project.reference_path();
        identity.save_reference(&reference).map_err(|e| {
            ReelError::setup(format!(
                "failed to persist reference '{}': {e}",
                reference.display()
            ))
        })?;
        info!(path = %reference.display(), "reference image saved");

        let mut assembler =
            MediaAssembler::new(&project.output.work_dir).with_naming(project.naming()?);
        if let Some(encoder) = self.encoder.take() {
            assembler = assembler.with_encoder(encoder);
        }

        // Stage 2: frames.
        let planned_frames = project.scenes.total_frames(fps)?;
        let mut scheduler = SceneScheduler::new(frame_synth)
            .on_failure(project.frames.on_failure)
            .with_naming(project.naming()?)
            .with_cancel(self.cancel.clone());
        if let Some(observer) = self.progress.take() {
            scheduler = scheduler.with_progress(observer);
        }
        let outcome = match scheduler.run_until_abort(&identity, &project.scenes, fps)? {
            (partial, Some(err)) => {
                let frames = partial.flatten();
                if !frames.is_empty() {
                    match assembler.write_frames(&frames) {
                        Ok(paths) => warn!(
                            kept = paths.len(),
                            dir = %assembler.frames_dir().display(),
                            "run aborted; finished frames are kept on disk"
                        ),
                        Err(e) => warn!(error = %e, "run aborted; writing finished frames failed"),
                    }
                }
                return Err(err);
            }
            (outcome, None) => outcome,
        };
        let failures = outcome.failures.clone();
        let cancelled = outcome.cancelled;
        let timeline = outcome.timeline.clone();
        let frames = outcome.flatten();
        let frames_generated = frames.len();
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                generated = frames_generated,
                "some frames could not be generated"
            );
        }

        // Stage 3: silent video.
        let silent_path = project.silent_video_path();

        let (frames_dir, silent_video) = match assembler.write_frames(&frames) {
            Err(e) => {
                warn!(error = %e, "writing frames failed");
                (
                    StageOutcome::Failed(e.to_string()),
                    StageOutcome::Skipped("frames were not written".to_string()),
                )
            }
            Ok(_) if cancelled => (
                StageOutcome::Done(assembler.frames_dir()),
                StageOutcome::Skipped("run cancelled".to_string()),
            ),
            Ok(_) => {
                let silent = match assembler.encode_frames(frames.len(), fps, &silent_path) {
                    Ok(path) => StageOutcome::Done(path),
                    Err(e) => {
                        warn!(error = %e, "video encoding failed; frames are kept on disk");
                        StageOutcome::Failed(e.to_string())
                    }
                };
                (StageOutcome::Done(assembler.frames_dir()), silent)
            }
        };
        drop(frames);

        // Stage 4: narration, independent of the video stages.
        let narration = if cancelled {
            StageOutcome::Skipped("run cancelled".to_string())
        } else {
            narrate(project, self.narration)
        };
        if let StageOutcome::Failed(e) = &narration {
            warn!(error = %e, "narration failed; the silent video is kept");
        }

        // Stage 5: mux.
        let final_video = match (&silent_video, &narration) {
            (StageOutcome::Done(video), StageOutcome::Done(audio)) => {
                match assembler.mux_audio(video, audio, &project.output.video) {
                    Ok(path) => StageOutcome::Done(path),
                    Err(e) => {
                        warn!(error = %e, "mux failed; the silent video is kept");
                        StageOutcome::Failed(e.to_string())
                    }
                }
            }
            (StageOutcome::Done(_), _) => StageOutcome::Skipped("no narration track".to_string()),
            _ => StageOutcome::Skipped("no silent video".to_string()),
        };

        let report = SessionReport {
            reference,
            planned_frames,
            frames_generated,
            failures,
            cancelled,
            timeline,
            frames_dir,
            silent_video,
            narration,
            final_video,
        };
        match report.final_artifact() {
            Some(path) => info!(artifact = %path.display(), "session finished"),
            None => warn!("session finished without a video"),
        }
        Ok(report)
    }
}

/// Create the project's identity: adopt the configured reference image or generate one.
pub fn build_identity(
    project: &Project,
    synth: &mut dyn ImageSynthesizer,
) -> ReelResult<CharacterIdentity> {
    let character = &project.character;
    match &character.reference {
        Some(path) => {
            let reference = PixelBuffer::load(path).map_err(|e| {
                ReelError::setup(format!("failed to load reference '{}': {e}", path.display()))
            })?;
            info!(path = %path.display(), "using existing reference image");
            Ok(CharacterIdentity::from_reference(
                &character.prompt,
                &character.style,
                character.seed,
                reference,
            ))
        }
        None => IdentityAnchor::create(
            synth,
            &character.prompt,
            &character.style,
            character.seed,
            &project.generation,
        ),
    }
}

fn narrate(project: &Project, choice: NarrationChoice) -> StageOutcome<PathBuf> {
    let injected = match choice {
        NarrationChoice::Disabled => {
            return StageOutcome::Skipped("narration disabled".to_string());
        }
        NarrationChoice::Provider(p) => Some(p),
        NarrationChoice::Platform => None,
    };
    if let Some(path) = &project.output.narration_audio {
        return if path.is_file() {
            StageOutcome::Done(path.clone())
        } else {
            StageOutcome::Failed(format!("narration audio '{}' does not exist", path.display()))
        };
    }

    let provider = match injected {
        Some(p) => p,
        None => match for_current_platform() {
            Ok(p) => p,
            Err(e) => return StageOutcome::Failed(e.to_string()),
        },
    };
    let Some(text) = project.narration_text() else {
        return StageOutcome::Skipped("project has no narration text".to_string());
    };

    let out = project.narration_path(provider.file_extension());
    match provider.synthesize(&text, &out) {
        Ok(path) => StageOutcome::Done(path),
        Err(e) => StageOutcome::Failed(format!("{} narration failed: {e}", provider.name())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/reel_session.rs"]
mod tests;
