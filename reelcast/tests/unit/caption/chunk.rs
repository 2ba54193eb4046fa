use super::*;

#[test]
fn word_duration_has_a_floor() {
    assert_eq!(word_duration(10.0, 5), 2.0);
    assert_eq!(word_duration(1.0, 100), MIN_WORD_SECS);
    assert_eq!(word_duration(f64::NAN, 3), MIN_WORD_SECS);
    assert_eq!(word_duration(3.0, 0), 3.0);
}

#[test]
fn chunk_index_follows_words_per_chunk() {
    // 10 words over 10 s, 3 words per chunk.
    assert_eq!(chunk_index(0.0, 1.0, 3, 10), 0);
    assert_eq!(chunk_index(2.9, 1.0, 3, 10), 0);
    assert_eq!(chunk_index(3.0, 1.0, 3, 10), 1);
    assert_eq!(chunk_index(9.5, 1.0, 3, 10), 3);
    assert_eq!(chunk_index(50.0, 1.0, 3, 10), 3);
    assert_eq!(chunk_index(-1.0, 1.0, 3, 10), 0);
}

#[test]
fn chunk_index_is_monotonic_in_elapsed_time() {
    let wd = word_duration(7.3, 17);
    let mut last = 0;
    let mut t = 0.0;
    while t < 10.0 {
        let c = chunk_index(t, wd, 4, 17);
        assert!(c >= last, "chunk went backwards at {t}");
        last = c;
        t += 0.013;
    }
    assert_eq!(last, 4);
}

#[test]
fn word_states_progress_in_order() {
    assert_eq!(word_state(0, 2, 0.1), WordState::Settled);
    assert_eq!(word_state(3, 2, 0.1), WordState::Inactive);
    assert_eq!(word_state(2, 2, 0.5), WordState::Active);
    match word_state(2, 2, 0.15) {
        WordState::Entering { progress } => assert!((progress - 0.5).abs() < 1e-9),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn word_clock_reports_progress() {
    let c = WordClock::at(2.5, 10.0, 5, 2);
    assert_eq!(c.word_duration, 2.0);
    assert_eq!(c.current_word, 1);
    assert_eq!(c.chunk, 0);
    assert!((c.word_time - 0.5).abs() < 1e-9);
    assert!((c.word_progress - 0.25).abs() < 1e-9);
    assert_eq!(c.state_of(0), WordState::Settled);
}
