use super::*;

#[test]
fn entries_are_contiguous() {
    let fps = Fps::new(10).unwrap();
    let t = Timeline::from_counts(fps, [2, 0, 3]);
    let firsts: Vec<u64> = t.entries().iter().map(|e| e.first_frame).collect();
    assert_eq!(firsts, vec![0, 2, 2]);
    assert_eq!(t.total_frames(), 5);
    assert!((t.duration_secs() - 0.5).abs() < 1e-12);
    assert_eq!(t.fps(), fps);
}

#[test]
fn duration_is_sum_of_scene_durations() {
    let fps = Fps::new(8).unwrap();
    let t = Timeline::from_counts(fps, [16, 4, 1]);
    assert!((t.duration_secs() - (2.0 + 0.5 + 0.125)).abs() < 1e-12);
}

#[test]
fn empty_timeline() {
    let t = Timeline::from_counts(Fps::default(), std::iter::empty());
    assert_eq!(t.total_frames(), 0);
    assert_eq!(t.duration_secs(), 0.0);
}
