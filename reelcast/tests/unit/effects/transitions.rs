use super::*;
use crate::foundation::core::Point;

fn input(local: f64) -> TransitionInput {
    TransitionInput {
        frame: Rect::new(0.0, 0.0, 640.0, 360.0),
        base: Rect::new(0.0, 0.0, 640.0, 360.0),
        local,
        duration: 5.0,
        seed: 7,
    }
}

#[test]
fn entrances_settle_to_rest_after_one_second() {
    for t in Transition::ALL {
        if t.kind() != TransitionKind::Entrance {
            continue;
        }
        let op = transition_op(t, &input(1.0));
        assert!(op.is_rest(), "{t:?} not at rest: {op:?}");
        assert!(transition_op(t, &input(3.7)).is_rest());
    }
}

#[test]
fn cut_is_always_rest() {
    assert!(transition_op(Transition::None, &input(0.0)).is_rest());
}

#[test]
fn fade_ramps_opacity() {
    let start = transition_op(Transition::Fade, &input(0.0));
    let mid = transition_op(Transition::Fade, &input(0.5));
    assert_eq!(start.draws[0].opacity, 0.0);
    assert!((mid.draws[0].opacity - 0.5).abs() < 1e-9);
}

#[test]
fn slide_left_enters_from_the_right() {
    let op = transition_op(Transition::SlideLeft, &input(0.0));
    let p = op.draws[0].transform * Point::new(0.0, 0.0);
    assert!((p.x - 640.0).abs() < 1e-9);
    let later = transition_op(Transition::SlideLeft, &input(0.5));
    let q = later.draws[0].transform * Point::new(0.0, 0.0);
    assert!(q.x > 0.0 && q.x < 640.0);
}

#[test]
fn wipe_right_reveals_from_the_left_edge() {
    let op = transition_op(Transition::WipeRight, &input(0.5));
    let clip = op.draws[0].clip.unwrap();
    assert_eq!(clip.x0, 0.0);
    assert!(clip.x1 > 0.0 && clip.x1 < 640.0);
    assert_eq!(clip.height(), 360.0);
}

#[test]
fn zoom_blur_uses_additive_passes() {
    let op = transition_op(Transition::ZoomBlur, &input(0.3));
    assert_eq!(op.draws.len(), 1 + ZOOM_BLUR_PASSES);
    assert!(op.draws[1..].iter().all(|d| d.blend == BlendMode::Add));
}

#[test]
fn motion_wipe_draws_ghosts_before_the_lead() {
    let op = transition_op(Transition::MotionWipe, &input(0.3));
    assert_eq!(op.draws.len(), MOTION_GHOSTS + 1);
    let lead = op.draws.last().unwrap();
    assert_eq!(lead.opacity, 1.0);
    assert!(op.draws[..MOTION_GHOSTS].iter().all(|d| d.opacity < 1.0));
}

#[test]
fn luma_and_glitch_attach_post_passes() {
    let luma = transition_op(Transition::LumaFade, &input(0.4));
    assert!(matches!(luma.post, Some(PostFx::LumaDissolve { .. })));
    let glitch = transition_op(Transition::Glitch, &input(0.4));
    assert!(matches!(glitch.post, Some(PostFx::Glitch { .. })));
}

#[test]
fn continuous_effects_move_across_the_whole_entry() {
    let early = transition_op(Transition::ZoomIn, &input(2.0));
    let late = transition_op(Transition::ZoomIn, &input(4.5));
    assert_ne!(early.draws[0].transform, late.draws[0].transform);
    assert_eq!(late.draws[0].opacity, 1.0);

    let a = transition_op(Transition::PanLeft, &input(1.5)).draws[0].transform * Point::ORIGIN;
    let b = transition_op(Transition::PanLeft, &input(4.5)).draws[0].transform * Point::ORIGIN;
    assert!(b.x < a.x);
}

#[test]
fn shake_is_deterministic_in_time() {
    let a = transition_op(Transition::Shake, &input(2.34));
    let b = transition_op(Transition::Shake, &input(2.34));
    assert_eq!(a, b);
}

#[test]
fn luma_dissolve_endpoints() {
    let mut buf = vec![200u8; 48 * 48 * 4];
    apply_luma_dissolve(&mut buf, 48, 48, 0.0, 24, 1);
    assert!(buf.iter().all(|&v| v == 0));

    let mut buf = vec![200u8; 48 * 48 * 4];
    apply_luma_dissolve(&mut buf, 48, 48, 1.0, 24, 1);
    assert!(buf.iter().all(|&v| v == 200));
}

#[test]
fn luma_dissolve_keeps_whole_cells() {
    let mut buf = vec![200u8; 48 * 48 * 4];
    apply_luma_dissolve(&mut buf, 48, 48, 0.5, 24, 3);
    for cy in 0..2u32 {
        for cx in 0..2u32 {
            let corner = ((cy * 24 * 48 + cx * 24) * 4) as usize;
            let far = (((cy * 24 + 23) * 48 + cx * 24 + 23) * 4) as usize;
            assert_eq!(buf[corner], buf[far]);
        }
    }
}

#[test]
fn glitch_keeps_premultiplied_invariant() {
    let (w, h) = (32u32, 16u32);
    let mut buf = Vec::with_capacity((w * h * 4) as usize);
    for i in 0..w * h {
        let a = if i % 3 == 0 { 0 } else { 255 };
        buf.extend_from_slice(&[(i % 251) as u8 & a, 90 & a, 30 & a, a]);
    }
    let mut scratch = Vec::new();
    apply_glitch(&mut buf, &mut scratch, w, h, 1.0, 3, 99);
    for px in buf.chunks_exact(4) {
        assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
    }
}
