//! Storyreel turns a character description and an ordered script of scenes into a narrated
//! video whose frames all show the same character.
//!
//! The pipeline is session-oriented:
//!
//! - Load and validate a [`Project`]
//! - Anchor the character once as a [`CharacterIdentity`] (seed + reference image)
//! - Expand the script into per-frame blend strengths and synthesize frames with a
//!   [`SceneScheduler`]
//! - Encode a silent video with a [`MediaAssembler`], narrate it with a [`NarrationProvider`]
//!   and mux the two
//!
//! [`ReelSession`] runs all of it and reports what each stage produced.
#![forbid(unsafe_code)]

mod assemble;
mod foundation;
mod identity;
mod narration;
mod schedule;
mod session;
mod synth;

pub use crate::foundation::core::{Fps, FrameTag, PixelBuffer, ensure_parent_dir};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::identity::anchor::{CharacterIdentity, IdentityAnchor};

pub use crate::synth::capability::{
    GenerationParams, ImageSynthesizer, ImageToImageRequest, SynthesizerConfig,
    TextToImageRequest, create_synthesizer,
};
pub use crate::synth::frame::{Frame, FrameSynthesizer};
pub use crate::synth::http::HttpSynthesizer;
pub use crate::synth::procedural::ProceduralSynthesizer;

pub use crate::schedule::scheduler::{
    CancelToken, FrameFailure, OnFrameFailure, PlannedFrame, Progress, SceneFrames,
    SceneScheduler, ScheduleOutcome, plan,
};
pub use crate::schedule::script::{Scene, Script};
pub use crate::schedule::strength::{BlendStrength, RAMP_SPAN, RAMP_START, strength_ramp};
pub use crate::schedule::timeline::{Timeline, TimelineEntry};

pub use crate::assemble::assembler::MediaAssembler;
pub use crate::assemble::ffmpeg::{
    FfmpegEncoder, MuxJob, SequenceJob, VideoEncoder, VideoInfo, is_ffmpeg_on_path,
    is_ffprobe_on_path, probe_video,
};
pub use crate::assemble::naming::{FrameNaming, MAX_NAMING_WIDTH, MIN_NAMING_WIDTH};

pub use crate::narration::{
    EspeakNarrator, NarrationProvider, SapiNarrator, SayNarrator, for_current_platform,
};

pub use crate::session::project::{CharacterSpec, FramePolicy, OutputConfig, Project};
pub use crate::session::reel_session::{ReelSession, SessionReport, StageOutcome, build_identity};
