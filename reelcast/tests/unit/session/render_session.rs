use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::encode::sink::InMemorySink;

fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reelcast-session-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_tone(path: &Path, secs: f64) {
    let frames = (secs * 48_000.0) as usize;
    let mut bytes = Vec::with_capacity(frames * 8);
    for i in 0..frames {
        let v = (i as f32 * 0.05).sin() * 0.25;
        bytes.extend_from_slice(&v.to_le_bytes());
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn project(scenes: serde_json::Value) -> Project {
    serde_json::from_value(serde_json::json!({
        "scenes": scenes,
        "canvas": { "width": 16, "height": 16 },
        "fps": { "num": 10, "den": 1 },
    }))
    .unwrap()
}

fn silent_session(tag: &str, scenes: serde_json::Value) -> RenderSession {
    let root = temp_root(tag);
    RenderSession::new(project(scenes), &AssetResolver::new(root), SessionOpts::default()).unwrap()
}

fn frame_time(r: FrameResult) -> f64 {
    match r {
        FrameResult::Frame(f) => f.time,
        other => panic!("expected a frame, got {other:?}"),
    }
}

struct FailingSink;

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> ReelResult<()> {
        Ok(())
    }

    fn end(&mut self) -> ReelResult<Vec<u8>> {
        Err(crate::foundation::error::ReelError::evaluation("disk full"))
    }
}

#[test]
fn missing_images_are_reported_not_fatal() {
    let s = silent_session("issues", serde_json::json!([{ "imageUrl": "nope.png" }]));
    assert_eq!(s.issues().len(), 1);
    assert!(!s.has_audio());
    assert_eq!(s.total_duration(), 4.0);
}

#[test]
fn wall_clock_pause_resume_and_seek() {
    let mut s = silent_session(
        "transport",
        serde_json::json!([{ "imageUrl": "a.png", "duration": 20.0 }]),
    );
    let ticks = std::sync::Arc::new(AtomicUsize::new(0));
    let counter = std::sync::Arc::clone(&ticks);
    s.on_progress(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(frame_time(s.tick(100.0).unwrap()), 0.0);
    assert!((frame_time(s.tick(101.5).unwrap()) - 1.5).abs() < 1e-9);

    s.pause(102.0);
    s.pause(102.5);
    assert_eq!(s.state(), TransportState::Paused);
    assert_eq!(s.tick(105.0).unwrap(), FrameResult::Paused { time: 2.0 });
    s.resume(106.0);
    assert!((frame_time(s.tick(107.0).unwrap()) - 3.0).abs() < 1e-9);

    s.seek(10.0);
    assert_eq!(s.state(), TransportState::Seeking);
    assert!((frame_time(s.tick(108.0).unwrap()) - 10.0).abs() < 1e-9);
    assert!((frame_time(s.tick(109.0).unwrap()) - 11.0).abs() < 1e-9);

    assert_eq!(ticks.load(Ordering::SeqCst), 6);
}

#[test]
fn seek_while_paused_reads_back_the_target() {
    let mut s = silent_session("pausedseek", serde_json::json!([{ "imageUrl": "a.png", "duration": 20.0 }]));
    s.tick(0.0).unwrap();
    s.pause(1.0);
    s.seek(7.0);
    assert_eq!(s.tick(3.0).unwrap(), FrameResult::Paused { time: 7.0 });
    s.resume(4.0);
    assert!((frame_time(s.tick(4.5).unwrap()) - 7.5).abs() < 1e-9);
}

#[test]
fn preview_wraps_at_the_end() {
    let mut s = silent_session("wrap", serde_json::json!([{ "imageUrl": "a.png" }]));
    s.tick(0.0).unwrap();
    assert!((frame_time(s.tick(5.0).unwrap()) - 1.0).abs() < 1e-9);
}

#[test]
fn scene_changes_are_logged() {
    let mut s = silent_session(
        "log",
        serde_json::json!([
            { "imageUrl": "a.png", "transition": "none" },
            { "imageUrl": "b.png", "transition": "none" }
        ]),
    );
    for t in [0.0, 1.0, 4.5, 6.0] {
        s.tick(t).unwrap();
    }
    let log = s.log().join("\n");
    assert!(log.contains("scene 0 enter"), "{log}");
    assert!(log.contains("scene 0 exit"), "{log}");
    assert!(log.contains("scene 1 enter"), "{log}");
}

#[test]
fn stop_is_terminal_and_idempotent() {
    let mut s = silent_session("stop", serde_json::json!([{ "imageUrl": "a.png" }]));
    s.tick(0.0).unwrap();
    assert_eq!(s.stop().unwrap(), None);
    assert_eq!(s.stop().unwrap(), None);
    assert_eq!(s.state(), TransportState::Stopped);
    assert_eq!(s.tick(1.0).unwrap(), FrameResult::Stopped);
}

#[test]
fn restart_returns_to_zero() {
    let mut s = silent_session("restart", serde_json::json!([{ "imageUrl": "a.png", "duration": 10.0 }]));
    s.tick(0.0).unwrap();
    s.tick(3.0).unwrap();
    s.pause(3.0);
    s.restart(5.0);
    assert_eq!(s.state(), TransportState::Running);
    assert_eq!(s.progress(), 0.0);
    assert!((frame_time(s.tick(6.0).unwrap()) - 1.0).abs() < 1e-9);
}

#[test]
fn capture_finalizes_on_stop() {
    let mut s = silent_session("capture", serde_json::json!([{ "imageUrl": "a.png" }]));
    s.capture(Box::new(InMemorySink::new())).unwrap();
    s.tick(0.0).unwrap();
    s.tick(0.1).unwrap();
    let bytes = s.stop().unwrap().unwrap();
    assert_eq!(bytes.len(), 2 * 16 * 16 * 4);
}

#[test]
fn sink_failure_surfaces_with_the_session_log() {
    let mut s = silent_session("fail", serde_json::json!([{ "imageUrl": "a.png" }]));
    s.capture(Box::new(FailingSink)).unwrap();
    s.tick(0.0).unwrap();
    match s.stop() {
        Err(crate::foundation::error::ReelError::Encoder { message, log }) => {
            assert!(message.contains("disk full"));
            assert!(log.iter().any(|l| l.contains("scene 0 enter")));
        }
        other => panic!("expected encoder failure, got {other:?}"),
    }
}

#[test]
fn export_mode_runs_on_the_audio_clock() {
    let root = temp_root("audioclock");
    write_tone(&root.join("n.f32le"), 1.0);
    let p = project(serde_json::json!([{ "imageUrl": "a.png", "audioUrl": "n.f32le" }]));
    let opts = SessionOpts {
        mode: SessionMode::Export,
        ..SessionOpts::default()
    };
    let mut s = RenderSession::new(p, &AssetResolver::new(root), opts).unwrap();
    assert!(s.has_audio());
    assert_eq!(s.total_duration(), 4.0);

    // Wall time passed to tick is ignored; each frame advances exactly 1/fps of audio.
    assert_eq!(frame_time(s.tick(50.0).unwrap()), 0.0);
    assert!((frame_time(s.tick(0.0).unwrap()) - 0.1).abs() < 1e-9);
    assert!((frame_time(s.tick(99.0).unwrap()) - 0.2).abs() < 1e-9);
}

#[test]
fn export_mode_finishes_at_total_duration() {
    let opts = SessionOpts {
        mode: SessionMode::Export,
        ..SessionOpts::default()
    };
    let mut s = RenderSession::new(
        project(serde_json::json!([{ "imageUrl": "a.png" }])),
        &AssetResolver::new(temp_root("finish")),
        opts,
    )
    .unwrap();
    s.tick(0.0).unwrap();
    assert_eq!(s.tick(4.0).unwrap(), FrameResult::Finished);
    assert_eq!(s.progress(), 4.0);
}

fn preview_with_narration(tag: &str) -> RenderSession {
    let root = temp_root(tag);
    write_tone(&root.join("n.f32le"), 1.0);
    let p = project(serde_json::json!([{ "imageUrl": "a.png", "audioUrl": "n.f32le" }]));
    let s = RenderSession::new(p, &AssetResolver::new(root), SessionOpts::default()).unwrap();
    assert!(s.has_audio());
    assert_eq!(s.total_duration(), 4.0);
    s
}

fn pull_secs(s: &mut RenderSession, secs: f64) {
    let mix = s.mix.as_ref().unwrap();
    let frames = (secs * f64::from(mix.sample_rate())).round() as usize;
    let mut out = vec![0.0f32; frames * usize::from(mix.channels())];
    assert_eq!(s.pull_audio(&mut out), frames);
}

fn mix_time(s: &RenderSession) -> f64 {
    s.mix.as_ref().unwrap().timeline_time()
}

#[test]
fn preview_restart_realigns_the_mix_to_zero() {
    let mut s = preview_with_narration("restartmix");
    assert_eq!(frame_time(s.tick(100.0).unwrap()), 0.0);
    pull_secs(&mut s, 2.0);
    assert!((mix_time(&s) - 2.0).abs() < 1e-6);

    s.restart(102.0);
    assert!(mix_time(&s).abs() < 1e-6);

    pull_secs(&mut s, 1.0);
    assert!((frame_time(s.tick(103.0).unwrap()) - 1.0).abs() < 1e-9);
    assert!((mix_time(&s) - 1.0).abs() < 1e-6);
}

#[test]
fn preview_loop_moves_the_mix_back_with_the_pictures() {
    let mut s = preview_with_narration("loopmix");
    s.tick(0.0).unwrap();
    pull_secs(&mut s, 5.0);
    let time = frame_time(s.tick(5.0).unwrap());
    assert!((time - 1.0).abs() < 1e-9);
    assert!((mix_time(&s) - time).abs() < 1e-6);

    // Staying inside the same loop does not realign again.
    pull_secs(&mut s, 0.5);
    let time = frame_time(s.tick(5.5).unwrap());
    assert!((mix_time(&s) - time).abs() < 1e-6);

    pull_secs(&mut s, 4.0);
    let time = frame_time(s.tick(9.5).unwrap());
    assert!((time - 1.5).abs() < 1e-9);
    assert!((mix_time(&s) - time).abs() < 1e-6);
}

#[test]
fn preview_seek_moves_the_mix_with_the_pictures() {
    let mut s = preview_with_narration("seekmix");
    s.tick(0.0).unwrap();
    pull_secs(&mut s, 1.0);
    s.seek(2.5);
    let time = frame_time(s.tick(1.0).unwrap());
    assert!((time - 2.5).abs() < 1e-9);
    assert!((mix_time(&s) - 2.5).abs() < 1e-6);

    // The first wrap after a seek still realigns.
    pull_secs(&mut s, 3.0);
    let time = frame_time(s.tick(4.0).unwrap());
    assert!((time - 1.5).abs() < 1e-9);
    assert!((mix_time(&s) - time).abs() < 1e-6);
}

#[test]
fn last_frame_holds_the_pixels_of_the_latest_tick() {
    let mut s = silent_session("lastframe", serde_json::json!([{ "imageUrl": "a.png" }]));
    s.tick(0.0).unwrap();
    let frame = s.last_frame();
    assert_eq!((frame.width, frame.height), (16, 16));
    assert_eq!(frame.data.len(), 16 * 16 * 4);
    let ptr = frame.data.as_ptr();
    s.tick(0.1).unwrap();
    assert_eq!(s.last_frame().data.as_ptr(), ptr);
}
