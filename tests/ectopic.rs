use hrmon::ectopic::{is_anomalous, DEFAULT_WINDOW};
use hrmon::{EctopicDetector, SampleWindow};

fn history(values: &[f64]) -> SampleWindow<f64> {
    let mut window = SampleWindow::new(60);
    window.extend(values.iter().copied());
    window
}

#[test]
fn steady_rhythm_is_not_flagged() {
    let history = history(&[0.8; 15]);
    assert!(!is_anomalous(&history, 0.9, DEFAULT_WINDOW));
    assert!(!is_anomalous(&history, 0.7, DEFAULT_WINDOW));
}

#[test]
fn short_beat_is_flagged() {
    let history = history(&[0.8; 15]);
    assert!(is_anomalous(&history, 0.6, DEFAULT_WINDOW));
}

#[test]
fn short_history_is_never_flagged() {
    let history = history(&[0.8; 10]);
    assert!(!is_anomalous(&history, 0.1, DEFAULT_WINDOW));
}

#[test]
fn exactly_ratio_shorter_is_not_flagged() {
    // 1.0 - 0.75 = 0.25 vs 0.25 * 1.0
    let detector = EctopicDetector { window: 4, ratio: 0.25 };
    let history = history(&[1.0; 5]);
    assert!(!detector.check(&history, 0.75));
    assert!(detector.check(&history, 0.74));
}

#[test]
fn median_skips_the_newest_interval() {
    let detector = EctopicDetector { window: 3, ratio: 0.2 };
    // newest (9.0) excluded, median of [1.0, 2.0, 3.0]
    let window = history(&[5.0, 1.0, 2.0, 3.0, 9.0]);
    assert_eq!(detector.reference_median(&window), Some(2.0));
}

#[test]
fn median_of_even_count_averages_middle_pair() {
    let detector = EctopicDetector { window: 4, ratio: 0.2 };
    // only four recorded, newest excluded: [1.0, 2.0, 4.0]
    assert_eq!(detector.reference_median(&history(&[4.0, 1.0, 2.0, 7.0])), Some(2.0));
    // [1.0, 2.0, 4.0, 6.0]
    assert_eq!(detector.reference_median(&history(&[6.0, 4.0, 1.0, 2.0, 7.0])), Some(3.0));
}

#[test]
fn disabled_window_never_flags() {
    let detector = EctopicDetector { window: 0, ratio: 0.2 };
    assert_eq!(detector.reference_median(&history(&[1.0; 20])), None);
    assert!(!detector.check(&history(&[1.0; 20]), 0.1));
}
