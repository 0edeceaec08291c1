use super::*;

use std::cell::RefCell;

use crate::assemble::naming::FrameNaming;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::ReelError;
use crate::schedule::script::Scene;
use crate::synth::capability::{
    GenerationParams, ImageSynthesizer, ImageToImageRequest, TextToImageRequest,
};
use crate::synth::procedural::ProceduralSynthesizer;

/// Procedural backend that fails image-to-image calls whose prompt contains `fail_on`.
struct Picky {
    inner: ProceduralSynthesizer,
    fail_on: &'static str,
}

impl ImageSynthesizer for Picky {
    fn name(&self) -> &'static str {
        "picky"
    }

    fn text_to_image(&mut self, req: &TextToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        self.inner.text_to_image(req)
    }

    fn image_to_image(&mut self, req: &ImageToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        if req.prompt.contains(self.fail_on) {
            return Err(ReelError::synthesis("refused"));
        }
        self.inner.image_to_image(req)
    }
}

fn params() -> GenerationParams {
    GenerationParams {
        width: 4,
        height: 4,
        ..GenerationParams::default()
    }
}

fn identity() -> CharacterIdentity {
    CharacterIdentity::from_reference(
        "a fox",
        "",
        5,
        PixelBuffer::solid(4, 4, [1, 2, 3, 255]).unwrap(),
    )
}

fn synth(fail_on: &'static str) -> FrameSynthesizer {
    FrameSynthesizer::new(
        Box::new(Picky {
            inner: ProceduralSynthesizer::new(),
            fail_on,
        }),
        params(),
    )
}

fn script() -> Script {
    Script::new(vec![
        Scene::new("walks", 0.2),
        Scene::new("pauses", 0.0),
        Scene::new("runs", 0.3),
    ])
    .unwrap()
}

fn ten() -> Fps {
    Fps::new(10).unwrap()
}

#[test]
fn frames_follow_scene_then_position_order() {
    let mut s = SceneScheduler::new(synth("never"));
    let out = s.run(&identity(), &script(), ten()).unwrap();

    assert!(!out.cancelled);
    assert!(out.failures.is_empty());
    assert_eq!(out.scenes.len(), 3);
    assert!(out.scenes[1].frames.is_empty());
    assert_eq!(out.timeline.total_frames(), 5);

    let tags: Vec<(usize, usize)> = out
        .flatten()
        .iter()
        .map(|f| (f.tag.scene, f.tag.position))
        .collect();
    assert_eq!(tags, vec![(0, 0), (0, 1), (2, 0), (2, 1), (2, 2)]);
}

#[test]
fn strengths_restart_each_scene() {
    let mut s = SceneScheduler::new(synth("never"));
    let out = s.run(&identity(), &script(), ten()).unwrap();
    let runs: Vec<f64> = out.scenes[2]
        .frames
        .iter()
        .map(|f| f.strength.get())
        .collect();
    assert!((runs[0] - 0.5).abs() < 1e-9);
    assert!((runs[1] - 0.6).abs() < 1e-9);
    assert!((runs[2] - 0.7).abs() < 1e-9);
    assert!((out.scenes[0].frames[1].strength.get() - 0.65).abs() < 1e-9);
}

#[test]
fn plan_matches_run() {
    let planned = plan(&script(), ten(), &FrameNaming::default()).unwrap();
    let mut s = SceneScheduler::new(synth("never"));
    let frames = s.run(&identity(), &script(), ten()).unwrap().flatten();
    assert_eq!(planned.len(), frames.len());
    for (p, f) in planned.iter().zip(&frames) {
        assert_eq!(p.tag, f.tag);
        assert_eq!(p.strength, f.strength);
    }
}

#[test]
fn skip_policy_records_failures_and_continues() {
    let mut s = SceneScheduler::new(synth("walks"));
    let out = s.run(&identity(), &script(), ten()).unwrap();
    assert_eq!(out.failures.len(), 2);
    assert_eq!(out.failures[0].tag, FrameTag { scene: 0, position: 0 });
    assert!(out.failures[1].message.contains("refused"));
    assert_eq!(out.frame_count(), 3);
    assert_eq!(out.timeline.entries()[0].frame_count, 0);
    assert_eq!(out.timeline.entries()[2].first_frame, 0);
}

#[test]
fn abort_policy_stops_on_first_failure() {
    let mut s = SceneScheduler::new(synth("runs")).on_failure(OnFrameFailure::Abort);
    let err = s.run(&identity(), &script(), ten()).unwrap_err();
    assert!(matches!(err, ReelError::Synthesis(_)));
    assert!(err.to_string().contains("scene 2 frame 0"), "{err}");
}

#[test]
fn abort_hands_back_frames_finished_before_the_failure() {
    let mut s = SceneScheduler::new(synth("runs")).on_failure(OnFrameFailure::Abort);
    let (partial, err) = s.run_until_abort(&identity(), &script(), ten()).unwrap();
    let err = err.expect("run should abort");
    assert!(err.to_string().contains("scene 2 frame 0"), "{err}");
    assert!(partial.failures.is_empty());
    let tags: Vec<(usize, usize)> = partial
        .flatten()
        .iter()
        .map(|f| (f.tag.scene, f.tag.position))
        .collect();
    assert_eq!(tags, vec![(0, 0), (0, 1)]);
}

/// Counts every capability call so tests can tell whether generation started.
struct Counting(std::rc::Rc<std::cell::Cell<u32>>);

impl ImageSynthesizer for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn text_to_image(&mut self, req: &TextToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        self.0.set(self.0.get() + 1);
        PixelBuffer::solid(req.params.width, req.params.height, [0, 0, 0, 255])
    }

    fn image_to_image(&mut self, req: &ImageToImageRequest<'_>) -> ReelResult<PixelBuffer> {
        self.0.set(self.0.get() + 1);
        PixelBuffer::solid(req.params.width, req.params.height, [0, 0, 0, 255])
    }
}

#[test]
fn script_beyond_naming_capacity_is_rejected_before_generating() {
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut s = SceneScheduler::new(FrameSynthesizer::new(
        Box::new(Counting(calls.clone())),
        params(),
    ))
    .with_naming(FrameNaming::default());
    let script = Script::new(vec![Scene::new("walks", 100.01)]).unwrap();
    let fps = Fps::new(100).unwrap();

    let err = s.run(&identity(), &script, fps).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)), "{err}");
    assert!(err.to_string().contains("10001 frames"), "{err}");
    assert_eq!(calls.get(), 0);
    assert!(plan(&script, fps, &FrameNaming::default()).is_err());

    let wide = FrameNaming::with_width(5).unwrap();
    assert_eq!(plan(&script, fps, &wide).unwrap().len(), 10001);
}

#[test]
fn absurd_durations_fail_instead_of_overflowing() {
    let script = Script::new(vec![Scene::new("a", 1e300), Scene::new("b", 1e300)]).unwrap();
    let widest = FrameNaming::with_width(crate::assemble::naming::MAX_NAMING_WIDTH).unwrap();

    let err = plan(&script, ten(), &widest).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)), "{err}");

    let mut s = SceneScheduler::new(synth("never")).with_naming(widest);
    assert!(s.run(&identity(), &script, ten()).is_err());
}

#[test]
fn progress_reports_every_attempt() {
    let seen = RefCell::new(Vec::new());
    {
        let mut s = SceneScheduler::new(synth("walks")).with_progress(|p| {
            seen.borrow_mut().push(*p);
        });
        s.run(&identity(), &script(), ten()).unwrap();
    }
    let seen = seen.into_inner();
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|p| p.total == 5));
    assert_eq!(
        seen.iter().map(|p| p.completed).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(seen.iter().filter(|p| p.failed).count(), 2);
}

#[test]
fn cancellation_stops_between_frames() {
    let token = CancelToken::new();
    let observer_token = token.clone();
    let mut s = SceneScheduler::new(synth("never"))
        .with_cancel(token)
        .with_progress(move |p| {
            if p.completed == 3 {
                observer_token.cancel();
            }
        });
    let out = s.run(&identity(), &script(), ten()).unwrap();
    assert!(out.cancelled);
    assert_eq!(out.frame_count(), 3);
    assert_eq!(out.timeline.total_frames(), 3);
    assert!(s.cancel_token().is_cancelled());
}

#[test]
fn all_zero_duration_script_produces_nothing() {
    let script = Script::new(vec![Scene::new("a", 0.0), Scene::new("b", 0.05)]).unwrap();
    let mut s = SceneScheduler::new(synth("never"));
    let out = s.run(&identity(), &script, ten()).unwrap();
    assert_eq!(out.frame_count(), 0);
    assert_eq!(out.scenes.len(), 2);
}
