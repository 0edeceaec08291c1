use super::*;

#[test]
fn default_params_are_valid() {
    let p = GenerationParams::default();
    p.validate().unwrap();
    assert_eq!((p.width, p.height), (512, 512));
}

#[test]
fn params_reject_odd_or_zero_sizes() {
    let odd = GenerationParams {
        width: 511,
        ..GenerationParams::default()
    };
    assert!(matches!(odd.validate(), Err(ReelError::Validation(_))));

    let zero = GenerationParams {
        height: 0,
        ..GenerationParams::default()
    };
    assert!(zero.validate().is_err());

    let no_steps = GenerationParams {
        steps: 0,
        ..GenerationParams::default()
    };
    assert!(no_steps.validate().is_err());
}

#[test]
fn config_defaults_to_procedural() {
    let cfg: SynthesizerConfig = serde_json::from_str(r#"{"kind":"procedural"}"#).unwrap();
    assert_eq!(cfg, SynthesizerConfig::Procedural);
    assert_eq!(SynthesizerConfig::default(), SynthesizerConfig::Procedural);
}

#[test]
fn http_config_fills_timeout() {
    let cfg: SynthesizerConfig =
        serde_json::from_str(r#"{"kind":"http","endpoint":"http://127.0.0.1:7860"}"#).unwrap();
    assert_eq!(cfg, SynthesizerConfig::http("http://127.0.0.1:7860"));
}

#[test]
fn factory_builds_requested_backend() {
    let synth = create_synthesizer(&SynthesizerConfig::Procedural).unwrap();
    assert_eq!(synth.name(), "procedural");

    let synth = create_synthesizer(&SynthesizerConfig::http("http://localhost:7860/")).unwrap();
    assert_eq!(synth.name(), "http");

    assert!(create_synthesizer(&SynthesizerConfig::http("  ")).is_err());
}
