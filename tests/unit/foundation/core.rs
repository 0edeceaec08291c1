use super::*;

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0).is_err());
    assert_eq!(Fps::new(24).unwrap().get(), 24);
}

#[test]
fn fps_floor_conversion() {
    let fps = Fps::new(10).unwrap();
    assert_eq!(fps.secs_to_frames_floor(0.0), 0);
    assert_eq!(fps.secs_to_frames_floor(0.09), 0);
    assert_eq!(fps.secs_to_frames_floor(0.25), 2);
    assert_eq!(fps.secs_to_frames_floor(1.0), 10);
    assert_eq!(fps.secs_to_frames_floor(-3.0), 0);
    assert_eq!(fps.secs_to_frames_floor(f64::NAN), 0);
    assert!((fps.frames_to_secs(25) - 2.5).abs() < 1e-12);
}

#[test]
fn fps_deserialize_validates() {
    assert!(serde_json::from_str::<Fps>("0").is_err());
    assert_eq!(serde_json::from_str::<Fps>("12").unwrap().get(), 12);
}

#[test]
fn pixel_buffer_checks_length() {
    assert!(PixelBuffer::new(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::new(0, 2, vec![]).is_err());
    let px = PixelBuffer::solid(2, 3, [1, 2, 3, 255]).unwrap();
    assert_eq!(px.data.len(), 24);
    assert_eq!(&px.data[20..24], &[1, 2, 3, 255]);
}

#[test]
fn png_encode_decode_preserves_pixels() {
    let px = PixelBuffer::new(
        2,
        1,
        vec![255, 0, 0, 255, 0, 128, 255, 255],
    )
    .unwrap();
    let bytes = px.encode_png().unwrap();
    assert_eq!(PixelBuffer::decode(&bytes).unwrap(), px);
}

#[test]
fn save_png_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ref.png");
    let px = PixelBuffer::solid(4, 4, [10, 20, 30, 255]).unwrap();
    px.save_png(&path).unwrap();
    assert_eq!(PixelBuffer::load(&path).unwrap(), px);
}
