use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::assemble::naming::FrameNaming;
use crate::foundation::core::{Fps, FrameTag};
use crate::foundation::error::{ReelError, ReelResult};
use crate::identity::anchor::CharacterIdentity;
use crate::schedule::script::Script;
use crate::schedule::strength::{BlendStrength, strength_ramp};
use crate::schedule::timeline::Timeline;
use crate::synth::frame::{Frame, FrameSynthesizer};

/// What the scheduler does when a frame still fails after the synthesizer's retries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFrameFailure {
    /// Record the failure and continue with the next frame.
    #[default]
    Skip,
    /// Stop the run and return the error. Frames finished before the failure are still handed
    /// to the caller of [`SceneScheduler::run_until_abort`].
    Abort,
}

/// Shared flag checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reported after every attempted frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
    pub tag: FrameTag,
    pub failed: bool,
}

/// A frame that could not be produced, with enough context to regenerate it by hand.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameFailure {
    pub tag: FrameTag,
    pub strength: BlendStrength,
    pub message: String,
}

/// Ordered frames of one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneFrames {
    pub scene: usize,
    pub frames: Vec<Frame>,
}

#[derive(Clone, Debug)]
pub struct ScheduleOutcome {
    /// One entry per scene reached, in script order.
    pub scenes: Vec<SceneFrames>,
    /// Built from the frames actually produced.
    pub timeline: Timeline,
    pub failures: Vec<FrameFailure>,
    pub cancelled: bool,
}

impl ScheduleOutcome {
    pub fn frame_count(&self) -> usize {
        self.scenes.iter().map(|s| s.frames.len()).sum()
    }

    /// All frames in playback order: scene order, then position within the scene.
    pub fn flatten(self) -> Vec<Frame> {
        self.scenes.into_iter().flat_map(|s| s.frames).collect()
    }
}

/// One entry of a dry-run schedule.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PlannedFrame {
    pub tag: FrameTag,
    pub strength: BlendStrength,
}

/// The `(scene, position, strength)` sequence a run would generate, without generating it.
///
/// Fails when the script yields more frames than `naming` can name.
pub fn plan(script: &Script, fps: Fps, naming: &FrameNaming) -> ReelResult<Vec<PlannedFrame>> {
    script.validate()?;
    let total = script.total_frames(fps)?;
    naming.check_capacity(total)?;
    let mut out = Vec::with_capacity(total.min(4096) as usize);
    for (scene, count) in script.frame_counts(fps).into_iter().enumerate() {
        out.extend(
            strength_ramp(count)
                .enumerate()
                .map(|(position, strength)| PlannedFrame {
                    tag: FrameTag { scene, position },
                    strength,
                }),
        );
    }
    Ok(out)
}

/// Expands a script into per-frame strengths and drives a [`FrameSynthesizer`] over it,
/// one frame at a time.
pub struct SceneScheduler<'p> {
    synth: FrameSynthesizer,
    on_failure: OnFrameFailure,
    naming: FrameNaming,
    cancel: CancelToken,
    progress: Option<Box<dyn FnMut(&Progress) + 'p>>,
}

impl<'p> SceneScheduler<'p> {
    pub fn new(synth: FrameSynthesizer) -> Self {
        Self {
            synth,
            on_failure: OnFrameFailure::default(),
            naming: FrameNaming::default(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn on_failure(mut self, policy: OnFrameFailure) -> Self {
        self.on_failure = policy;
        self
    }

    /// Naming scheme the frames will be written under; a script it cannot hold is rejected
    /// before the first frame is generated.
    pub fn with_naming(mut self, naming: FrameNaming) -> Self {
        self.naming = naming;
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

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn synthesizer_mut(&mut self) -> &mut FrameSynthesizer {
        &mut self.synth
    }

    pub fn run(
        &mut self,
        identity: &CharacterIdentity,
        script: &Script,
        fps: Fps,
    ) -> ReelResult<ScheduleOutcome> {
        match self.run_until_abort(identity, script, fps)? {
            (_, Some(err)) => Err(err),
            (outcome, None) => Ok(outcome),
        }
    }

    /// Like [`SceneScheduler::run`], but an `Abort` failure comes back next to the frames
    /// produced before it instead of replacing them.
    #[tracing::instrument(skip_all, fields(scenes = script.len(), fps = fps.get()))]
    pub fn run_until_abort(
        &mut self,
        identity: &CharacterIdentity,
        script: &Script,
        fps: Fps,
    ) -> ReelResult<(ScheduleOutcome, Option<ReelError>)> {
        script.validate()?;

        let counts = script.frame_counts(fps);
        let total = script.total_frames(fps)?;
        self.naming.check_capacity(total)?;
        info!(total_frames = total, "scheduling frames");

        let mut scenes = Vec::with_capacity(script.len());
        let mut failures = Vec::new();
        let mut completed = 0u64;
        let mut cancelled = false;
        let mut aborted = None;

        'scenes: for (i, (scene, &count)) in script.scenes().iter().zip(&counts).enumerate() {
            let mut seq = SceneFrames {
                scene: i,
                frames: Vec::with_capacity(count.min(4096) as usize),
            };
            if count == 0 {
                debug!(scene = i, duration = scene.duration, "scene yields no frames");
            }

            for (j, strength) in strength_ramp(count).enumerate() {
                if self.cancel.is_cancelled() {
                    warn!(scene = i, position = j, completed, "run cancelled");
                    cancelled = true;
                    scenes.push(seq);
                    break 'scenes;
                }

                let tag = FrameTag {
                    scene: i,
                    position: j,
                };
                let failed = match self
                    .synth
                    .generate_frame(identity, &scene.description, strength, tag)
                {
                    Ok(frame) => {
                        seq.frames.push(frame);
                        false
                    }
                    Err(e) => match self.on_failure {
                        OnFrameFailure::Abort => {
                            warn!(scene = i, position = j, error = %e, "aborting run");
                            aborted = Some(e);
                            scenes.push(seq);
                            break 'scenes;
                        }
                        OnFrameFailure::Skip => {
                            warn!(scene = i, position = j, error = %e, "skipping frame");
                            failures.push(FrameFailure {
                                tag,
                                strength,
                                message: e.to_string(),
                            });
                            true
                        }
                    },
                };

                completed += 1;
                if let Some(observer) = self.progress.as_mut() {
                    observer(&Progress {
                        completed,
                        total,
                        tag,
                        failed,
                    });
                }
            }

            info!(
                scene = i,
                frames = seq.frames.len(),
                planned = count,
                "scene finished"
            );
            scenes.push(seq);
        }

        let timeline = Timeline::from_counts(fps, scenes.iter().map(|s| s.frames.len() as u64));
        let outcome = ScheduleOutcome {
            scenes,
            timeline,
            failures,
            cancelled,
        };
        Ok((outcome, aborted))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
