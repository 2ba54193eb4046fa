use super::*;
use serde_json::json;

#[test]
fn transition_aliases_collapse_to_canonical_names() {
    let t: Transition = serde_json::from_value(json!("slide")).unwrap();
    assert_eq!(t, Transition::SlideLeft);
    let t: Transition = serde_json::from_value(json!("zoom")).unwrap();
    assert_eq!(t, Transition::ScaleUp);
    assert_eq!(serde_json::to_value(t).unwrap(), json!("scale_up"));
    assert!(serde_json::from_value::<Transition>(json!("sparkle")).is_err());
}

#[test]
fn every_transition_roundtrips_its_canonical_name() {
    for t in Transition::ALL {
        let v = serde_json::to_value(t).unwrap();
        assert_eq!(serde_json::from_value::<Transition>(v).unwrap(), t);
    }
}

#[test]
fn transition_families() {
    assert_eq!(Transition::None.kind(), TransitionKind::Cut);
    assert_eq!(Transition::None.overlap_secs(), 0.0);
    assert_eq!(Transition::Glitch.kind(), TransitionKind::Entrance);
    assert_eq!(Transition::Panorama.kind(), TransitionKind::Continuous);
    assert_eq!(Transition::Shake.overlap_secs(), 1.0);
}

#[test]
fn every_transition_belongs_to_one_family() {
    let count = |k: TransitionKind| Transition::ALL.iter().filter(|t| t.kind() == k).count();
    assert_eq!(count(TransitionKind::Cut), 1);
    assert_eq!(count(TransitionKind::Continuous), 6);
    assert_eq!(count(TransitionKind::Entrance), 18);
    for t in Transition::ALL {
        let expected = if t == Transition::None { 0.0 } else { 1.0 };
        assert_eq!(t.overlap_secs(), expected, "{t:?}");
    }
}

#[test]
fn scene_fields_are_camel_case_with_defaults() {
    let s: Scene = serde_json::from_value(json!({
        "imageUrl": "a.png",
        "audioUrl": "a.wav",
        "audioDuration": 6.0,
        "narrationSettings": {"speed": 1.5, "voiceId": "v"}
    }))
    .unwrap();
    assert_eq!(s.transition, Transition::Fade);
    assert_eq!(s.duration, 0.0);
    assert_eq!(s.audio_secs(), 6.0);
    let n = s.narration_settings.unwrap();
    assert_eq!(n.speed, Some(1.5));
    assert_eq!(n.pitch, None);
}

#[test]
fn caption_config_parses_enums() {
    let c: CaptionConfig = serde_json::from_value(json!({
        "mode": "dynamic",
        "animation": "karaoke_v2",
        "layout": {"wordsPerLine": 4, "verticalPosition": 0.6},
        "highlightColor": "#00ff00",
        "narrationExit": "slide_down"
    }))
    .unwrap();
    assert_eq!(c.mode, CaptionMode::Dynamic);
    assert_eq!(c.animation, DynamicAnimation::KaraokeV2);
    assert_eq!(c.layout.words_per_line, 4);
    assert_eq!(c.highlight_color, Color::rgba(0.0, 1.0, 0.0, 1.0));
    assert_eq!(c.narration_exit, StaticCaptionAnimation::SlideDown);
    assert_eq!(c.font_size, 64.0);
}

#[test]
fn overlay_blocks_parse() {
    let p: Project = serde_json::from_value(json!({
        "scenes": [{"imageUrl": "a.png"}],
        "intro": {"url": "intro.mp4", "type": "video", "duration": 2.5},
        "backgroundMusic": {"url": "bg.mp3", "loop": false},
        "vfx": {"grain": {"enabled": true, "intensity": 2.0}, "throttled": true},
        "watermark": {"url": "wm.png", "position": "top-right"},
        "qr": {"url": "qr.png", "label": "scan me", "position": "custom", "x": 0.1, "y": 0.2}
    }))
    .unwrap();
    let intro = p.intro.as_ref().unwrap();
    assert_eq!(intro.kind, MediaKind::Video);
    assert!(!p.background_music.as_ref().unwrap().looping);
    assert_eq!(p.vfx.grain.level(), 1.0);
    assert_eq!(p.vfx.dust.level(), 0.0);
    assert_eq!(p.watermark.as_ref().unwrap().position, Position::TopRight);
    assert_eq!(p.qr.as_ref().unwrap().position, Position::Custom);
    assert_eq!(p.background_color, Color::BLACK);
}
