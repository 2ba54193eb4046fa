use std::path::{Path, PathBuf};

use super::*;
use crate::audio::mix::ClipRole;
use crate::timeline::builder::{TimelineOpts, build_timeline};
use crate::timeline::caption_layout::ApproxMeasure;

fn temp_root(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reelcast-prepare-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Stereo 48 kHz sine written as raw f32le.
fn write_tone(path: &Path, secs: f64) {
    let frames = (secs * 48_000.0) as usize;
    let mut bytes = Vec::with_capacity(frames * 8);
    for i in 0..frames {
        let v = (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin() * 0.5;
        bytes.extend_from_slice(&v.to_le_bytes());
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn project(json: serde_json::Value) -> Project {
    serde_json::from_value(json).unwrap()
}

#[test]
fn decodes_scales_and_reports_failures() {
    let root = temp_root("decode");
    write_tone(&root.join("a.f32le"), 1.0);
    let p = project(serde_json::json!({
        "scenes": [
            { "imageUrl": "a.png", "audioUrl": "a.f32le",
              "narrationSettings": { "speed": 2.0, "volume": 0.5 } },
            { "imageUrl": "b.png", "audioUrl": "missing.f32le" },
            { "imageUrl": "c.png" }
        ]
    }));

    let audio = PreparedAudio::prepare(&p, &AssetResolver::new(&root));
    assert_eq!(audio.narration.len(), 3);
    let clip = audio.narration[0].as_ref().unwrap();
    assert!((clip.source_secs - 1.0).abs() < 1e-9);
    assert!((clip.buffer.duration_secs() - 0.5).abs() < 0.07);
    assert_eq!(clip.gain, 0.5);
    assert!(audio.narration[1].is_none());
    assert!(audio.narration[2].is_none());
    assert_eq!(audio.issues.len(), 1);
    assert_eq!(audio.issues[0].url, "missing.f32le");
    assert_eq!(audio.issues[0].kind, AssetKind::Audio);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn missing_durations_come_from_decoded_length() {
    let root = temp_root("fill");
    write_tone(&root.join("a.f32le"), 0.5);
    let mut p = project(serde_json::json!({
        "scenes": [{ "imageUrl": "a.png", "audioUrl": "a.f32le" }]
    }));
    let audio = PreparedAudio::prepare(&p, &AssetResolver::new(&root));
    audio.fill_missing_durations(&mut p);
    assert_eq!(p.scenes[0].audio_duration, Some(0.5));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn narration_lands_at_trigger_times() {
    let tone = Arc::new(AudioBuffer::silence(MIX_SAMPLE_RATE, 2, 1.0));
    let p = project(serde_json::json!({
        "scenes": [
            { "imageUrl": "a.png", "audioUrl": "a", "audioDuration": 1.0 },
            { "imageUrl": "b.png", "audioUrl": "b", "audioDuration": 1.0 }
        ],
        "intro": { "url": "i.png", "duration": 2.0 }
    }));
    let audio = PreparedAudio {
        narration: vec![
            Some(SceneAudio { buffer: Arc::clone(&tone), source_secs: 1.0, gain: 1.0 }),
            Some(SceneAudio { buffer: tone, source_secs: 1.0, gain: 1.0 }),
        ],
        music: None,
        issues: Vec::new(),
    };
    let timeline = build_timeline(&p.scenes, &TimelineOpts::from_project(&p), &mut ApproxMeasure::default());
    let schedule = audio.schedule(&timeline, &p);

    assert_eq!(schedule.narration_count(), 2);
    // Intro 2 s; scene 0 visible at 0, narrates at 1; scene 1 visible at 4 - 1 = 3, narrates at 4.
    let starts: Vec<u64> = schedule.clips.iter().map(|c| c.start_sample).collect();
    assert_eq!(starts, [3 * 48_000, 6 * 48_000]);
    assert!((schedule.duration_secs() - timeline.total_duration).abs() < 1e-3);
}

#[test]
fn music_spans_programme_with_ducking() {
    let p = project(serde_json::json!({
        "scenes": [{ "imageUrl": "a.png" }],
        "backgroundMusic": { "url": "m.f32le", "volume": 0.4, "ducking": 0.5 }
    }));
    let audio = PreparedAudio {
        narration: vec![None],
        music: Some(Arc::new(AudioBuffer::silence(MIX_SAMPLE_RATE, 2, 1.0))),
        issues: Vec::new(),
    };
    let timeline = build_timeline(&p.scenes, &TimelineOpts::from_project(&p), &mut ApproxMeasure::default());
    let schedule = audio.schedule(&timeline, &p);
    let music = &schedule.clips[0];
    assert_eq!(music.role, ClipRole::Music);
    assert!(music.looping);
    assert_eq!(music.end_sample, schedule.total_samples);
    assert_eq!(schedule.ducking, 0.5);
}
