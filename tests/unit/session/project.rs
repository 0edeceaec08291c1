use super::*;

const MINIMAL: &str = r#"{
    "character": { "prompt": "a red fox", "seed": 42 },
    "scenes": [ { "description": "walks", "duration": 1.0 } ]
}"#;

#[test]
fn minimal_project_uses_defaults() {
    let p = Project::from_json_str(MINIMAL).unwrap();
    assert_eq!(p.fps.get(), 8);
    assert_eq!(p.generation, GenerationParams::default());
    assert_eq!(p.synthesizer, SynthesizerConfig::Procedural);
    assert_eq!(p.frames, FramePolicy::default());
    assert_eq!(p.frames.on_failure, OnFrameFailure::Skip);
    assert_eq!(p.output, OutputConfig::default());
    assert_eq!(p.character.style, "");
    assert_eq!(p.reference_path(), PathBuf::from("storyreel_work/reference.png"));
    assert_eq!(p.narration_path("wav"), PathBuf::from("storyreel_work/narration.wav"));
}

#[test]
fn full_project_parses() {
    let p = Project::from_json_str(
        r#"{
            "character": { "prompt": "a red fox", "style": "watercolor", "seed": 7 },
            "generation": { "steps": 30, "guidance_scale": 6.0, "width": 640, "height": 384 },
            "fps": 12,
            "scenes": [
                { "description": "walks", "duration": 2.0, "narration": "A fox walks." },
                { "description": "sleeps", "duration": 0.0 }
            ],
            "narration": null,
            "synthesizer": { "kind": "http", "endpoint": "http://127.0.0.1:7860" },
            "frames": { "retries": 2, "on_failure": "abort" },
            "output": { "work_dir": "w", "video": "out.mp4", "naming_width": 5 }
        }"#,
    )
    .unwrap();
    assert_eq!(p.fps.get(), 12);
    assert_eq!(p.frames.retries, 2);
    assert_eq!(p.frames.on_failure, OnFrameFailure::Abort);
    assert_eq!(p.naming().unwrap().width(), 5);
    assert_eq!(p.scenes.frame_counts(p.fps), vec![24, 0]);
    assert_eq!(p.narration_text().as_deref(), Some("A fox walks."));
}

#[test]
fn project_narration_wins_over_scene_lines() {
    let mut p = Project::from_json_str(MINIMAL).unwrap();
    assert_eq!(p.narration_text(), None);
    p.narration = Some("  Whole story.  ".to_string());
    assert_eq!(p.narration_text().as_deref(), Some("Whole story."));
    p.narration = Some("   ".to_string());
    assert_eq!(p.narration_text(), None);
}

#[test]
fn invalid_projects_are_rejected() {
    let unknown = MINIMAL.replace("\"seed\": 42", "\"seed\": 42, \"colour\": \"red\"");
    assert!(matches!(
        Project::from_json_str(&unknown),
        Err(ReelError::Serde(_))
    ));

    let no_scenes = r#"{ "character": { "prompt": "a", "seed": 1 }, "scenes": [] }"#;
    assert!(matches!(
        Project::from_json_str(no_scenes),
        Err(ReelError::Validation(_))
    ));

    let zero_fps = MINIMAL.replace("\"scenes\"", "\"fps\": 0, \"scenes\"");
    assert!(Project::from_json_str(&zero_fps).is_err());

    let odd = MINIMAL.replace("\"scenes\"", "\"generation\": { \"width\": 511 }, \"scenes\"");
    assert!(Project::from_json_str(&odd).is_err());

    let narrow = MINIMAL.replace("\"scenes\"", "\"output\": { \"naming_width\": 2 }, \"scenes\"");
    assert!(Project::from_json_str(&narrow).is_err());
}

#[test]
fn frame_total_must_fit_the_naming_width() {
    let long = r#"{
        "character": { "prompt": "a red fox", "seed": 42 },
        "fps": 100,
        "scenes": [ { "description": "walks", "duration": 100.01 } ]
    }"#;
    let err = Project::from_json_str(long).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)), "{err}");
    assert!(err.to_string().contains("10001 frames"), "{err}");

    let wider = long.replace("\"fps\"", "\"output\": { \"naming_width\": 5 }, \"fps\"");
    assert!(Project::from_json_str(&wider).is_ok());
}

#[test]
fn absurd_durations_are_rejected_without_overflow() {
    let mut p = Project::from_json_str(MINIMAL).unwrap();
    p.output.naming_width = crate::assemble::naming::MAX_NAMING_WIDTH;
    p.scenes = Script::new(vec![
        crate::schedule::script::Scene::new("a", 1e300),
        crate::schedule::script::Scene::new("b", 1e300),
    ])
    .unwrap();
    assert!(matches!(p.validate(), Err(ReelError::Validation(_))));
}

#[test]
fn load_resolves_paths_against_project_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    std::fs::write(
        &path,
        r#"{
            "character": { "prompt": "a red fox", "seed": 1, "reference": "ref.png" },
            "scenes": [ { "description": "walks", "duration": 1.0 } ],
            "output": { "narration_audio": "voice.wav" }
        }"#,
    )
    .unwrap();

    let p = Project::load(&path).unwrap();
    assert_eq!(p.character.reference, Some(dir.path().join("ref.png")));
    assert_eq!(p.output.narration_audio, Some(dir.path().join("voice.wav")));
    // Work dir stays relative to the caller.
    assert_eq!(p.output.work_dir, PathBuf::from("storyreel_work"));
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Project::load(&dir.path().join("nope.json")).is_err());
}
