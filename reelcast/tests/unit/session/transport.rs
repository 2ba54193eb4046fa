use super::*;

#[test]
fn pause_resume_stop_are_idempotent() {
    let mut t = Transport::new();
    assert_eq!(t.state(), TransportState::Running);
    assert!(t.pause());
    assert!(!t.pause());
    assert_eq!(t.state(), TransportState::Paused);
    assert!(t.resume());
    assert!(!t.resume());
    assert!(t.stop());
    assert!(!t.stop());
    assert_eq!(t.state(), TransportState::Stopped);
}

#[test]
fn seek_to_current_time_is_a_no_op() {
    let mut t = Transport::new();
    assert!(!t.seek(3.0, 3.0));
    assert_eq!(t.state(), TransportState::Running);
    assert!(t.seek(5.0, 3.0));
    assert!(!t.seek(5.0, 3.0));
    assert_eq!(t.state(), TransportState::Seeking);
    assert_eq!(t.take_seek(), Some(5.0));
    assert_eq!(t.take_seek(), None);
    assert_eq!(t.state(), TransportState::Running);
}

#[test]
fn seek_while_paused_stays_paused() {
    let mut t = Transport::new();
    t.pause();
    assert!(t.seek(1.0, 0.0));
    t.take_seek();
    assert_eq!(t.state(), TransportState::Paused);
}

#[test]
fn stopped_is_terminal() {
    let mut t = Transport::new();
    t.seek(4.0, 0.0);
    t.stop();
    assert!(!t.pause());
    assert!(!t.resume());
    assert!(!t.seek(1.0, 0.0));
    assert!(!t.restart());
    assert_eq!(t.take_seek(), None);
}

#[test]
fn restart_clears_pause_and_pending_seek() {
    let mut t = Transport::new();
    t.pause();
    t.seek(9.0, 0.0);
    assert!(t.restart());
    assert_eq!(t.state(), TransportState::Running);
}
