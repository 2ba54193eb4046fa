use super::*;
use crate::scene::model::{NarrationSettings, Scene, Settings};

fn project(scenes: Vec<Scene>) -> Project {
    Project::from_json_str(r#"{"scenes": []}"#)
        .map(|mut p| {
            p.scenes = scenes;
            p
        })
        .unwrap()
}

fn scene(url: &str) -> Scene {
    Scene {
        image_url: url.to_owned(),
        text: String::new(),
        subtitle: String::new(),
        duration: 4.0,
        transition: Default::default(),
        audio_url: None,
        audio_duration: None,
        narration_settings: None,
    }
}

#[test]
fn sanitize_speed_falls_back_and_clamps() {
    assert_eq!(sanitize_speed(f64::NAN), 1.0);
    assert_eq!(sanitize_speed(0.0), 1.0);
    assert_eq!(sanitize_speed(-2.0), 1.0);
    assert_eq!(sanitize_speed(10.0), MAX_SPEED);
    assert_eq!(sanitize_speed(0.1), MIN_SPEED);
    assert_eq!(sanitize_speed(1.5), 1.5);
}

#[test]
fn validate_rejects_structural_problems() {
    assert!(project(vec![]).validate().is_err());
    assert!(project(vec![scene("  ")]).validate().is_err());
    let mut p = project(vec![scene("a.png")]);
    assert!(p.validate().is_ok());
    p.fps.den = 0;
    assert!(matches!(p.validate(), Err(ReelError::Validation(_))));
}

#[test]
fn scene_overrides_take_precedence() {
    let mut s = scene("a.png");
    s.narration_settings = Some(NarrationSettings {
        speed: Some(2.0),
        volume: Some(0.5),
        ..Default::default()
    });
    let mut p = project(vec![s, scene("b.png")]);
    p.settings = Settings {
        speed: 1.25,
        pitch: 2.0,
        ..Default::default()
    };
    assert_eq!(p.effective_speed(0), 2.0);
    assert_eq!(p.effective_speed(1), 1.25);
    assert_eq!(p.effective_volume(0), 0.5);
    assert_eq!(p.effective_volume(1), 1.0);
    assert_eq!(p.effective_pitch(0), 2.0);
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        Project::from_json_str("{\"scenes\": [{}]}"),
        Err(ReelError::Serde(_))
    ));
}
