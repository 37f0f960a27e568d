use hrmon::status::DEFAULT_CAPACITY;
use hrmon::SampleWindow;

#[test]
fn evicts_oldest_when_full() {
    let mut window = SampleWindow::new(DEFAULT_CAPACITY);
    for x in 0..DEFAULT_CAPACITY as u16 {
        assert_eq!(window.push(x), None);
    }
    assert_eq!(window.push(60), Some(0));

    assert_eq!(window.len(), 60);
    let snapshot = window.snapshot();
    assert_eq!(snapshot.first(), Some(&1));
    assert_eq!(snapshot.last(), Some(&60));
}

#[test]
fn snapshot_is_oldest_first() {
    let mut window = SampleWindow::new(3);
    window.extend([1.0, 2.0, 3.0, 4.0]);
    assert_eq!(window.snapshot(), vec![2.0, 3.0, 4.0]);
    assert_eq!(window.iter().rev().copied().collect::<Vec<_>>(), vec![4.0, 3.0, 2.0]);
    assert_eq!(window.capacity(), 3);
}

#[test]
fn snapshot_is_a_copy() {
    let mut window = SampleWindow::new(2);
    window.push(1u16);
    let before = window.snapshot();
    window.push(2);
    assert_eq!(before, vec![1]);
    assert!(!window.is_empty());
}

#[test]
#[should_panic]
fn zero_capacity_panics() {
    let _ = SampleWindow::<u16>::new(0);
}
