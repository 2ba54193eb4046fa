use super::*;
use crate::scene::model::EffectToggle;

fn on(intensity: f64) -> EffectToggle {
    EffectToggle {
        enabled: true,
        intensity,
    }
}

fn gray(w: u32, h: u32) -> Vec<u8> {
    [128u8, 128, 128, 255].repeat((w * h) as usize)
}

#[test]
fn disabled_config_leaves_frame_untouched() {
    let mut frame = gray(16, 16);
    VfxLayer::new().apply(&mut frame, 16, 16, &VfxConfig::default(), 1.0);
    assert_eq!(frame, gray(16, 16));
}

#[test]
fn vignette_darkens_corners_not_center() {
    let cfg = VfxConfig {
        vignette: on(1.0),
        ..VfxConfig::default()
    };
    let mut frame = gray(64, 64);
    let mut layer = VfxLayer::new();
    layer.apply(&mut frame, 64, 64, &cfg, 0.0);
    let center = ((32 * 64 + 32) * 4) as usize;
    assert_eq!(frame[center], 128);
    assert!(frame[0] < 60);
    assert_eq!(frame[3], 255);

    // Cached mask reused for the same geometry.
    let mut again = gray(64, 64);
    layer.apply(&mut again, 64, 64, &cfg, 5.0);
    assert_eq!(frame, again);
}

#[test]
fn grain_is_deterministic_per_time() {
    let cfg = VfxConfig {
        grain: on(0.8),
        ..VfxConfig::default()
    };
    let mut a = gray(48, 32);
    let mut b = gray(48, 32);
    VfxLayer::new().apply(&mut a, 48, 32, &cfg, 2.5);
    VfxLayer::new().apply(&mut b, 48, 32, &cfg, 2.5);
    assert_eq!(a, b);
    assert_ne!(a, gray(48, 32));
}

#[test]
fn throttled_grain_touches_fewer_pixels() {
    let changed = |throttled: bool| {
        let cfg = VfxConfig {
            grain: on(1.0),
            throttled,
            ..VfxConfig::default()
        };
        let mut f = gray(128, 128);
        VfxLayer::new().apply(&mut f, 128, 128, &cfg, 0.3);
        f.chunks_exact(4).filter(|p| p[0] != 128).count()
    };
    assert!(changed(true) < changed(false));
}

#[test]
fn light_leaks_only_brighten() {
    let cfg = VfxConfig {
        light_leaks: on(1.0),
        ..VfxConfig::default()
    };
    let mut f = gray(40, 30);
    VfxLayer::new().apply(&mut f, 40, 30, &cfg, 3.0);
    assert!(f.iter().all(|&v| v >= 128));
    assert!(f.chunks_exact(4).any(|p| p[0] > 128));
}

#[test]
fn dust_draws_something() {
    let cfg = VfxConfig {
        dust: on(1.0),
        ..VfxConfig::default()
    };
    let mut f = [20u8, 20, 20, 255].repeat(200 * 120);
    VfxLayer::new().apply(&mut f, 200, 120, &cfg, 1.0);
    assert!(f.chunks_exact(4).any(|p| p[0] > 20));
}
