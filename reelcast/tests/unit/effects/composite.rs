use super::*;

#[test]
fn over_opaque_replaces_and_transparent_keeps() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over(dst, [200, 100, 50, 255], 1.0), [200, 100, 50, 255]);
    assert_eq!(over(dst, [200, 100, 50, 0], 1.0), dst);
    assert_eq!(over(dst, [200, 100, 50, 255], 0.0), dst);
}

#[test]
fn over_half_opacity_mixes() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert!(out[0] >= 127 && out[0] <= 129);
    assert_eq!(out[3], 255);
}

#[test]
fn screen_never_darkens() {
    let dst = [100, 50, 200, 255];
    let out = screen(dst, [80, 80, 80, 255], 1.0);
    for i in 0..3 {
        assert!(out[i] >= dst[i]);
    }
    assert_eq!(screen(dst, [0, 0, 0, 255], 1.0), dst);
    assert_eq!(screen([0, 0, 0, 255], [255, 255, 255, 255], 1.0), [255, 255, 255, 255]);
}

#[test]
fn add_saturates() {
    assert_eq!(add([200, 10, 0, 255], [100, 10, 0, 255], 1.0), [255, 20, 0, 255]);
}

#[test]
fn blend_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(blend_in_place(&mut dst, &[0u8; 4], 1.0, BlendMode::Normal).is_err());
    let src = [255u8, 0, 0, 255, 0, 0, 0, 0];
    blend_in_place(&mut dst, &src, 1.0, BlendMode::Add).unwrap();
    assert_eq!(dst, [255, 0, 0, 255, 0, 0, 0, 0]);
}

#[test]
fn fill_writes_every_pixel() {
    let mut buf = vec![0u8; 8];
    fill(&mut buf, [255, 128, 0, 255]);
    assert_eq!(buf, [255, 128, 0, 255, 255, 128, 0, 255]);
}

#[test]
fn blend_region_only_touches_the_box() {
    let (w, h) = (4u32, 3u32);
    let mut dst = vec![0u8; (w * h * 4) as usize];
    let src = vec![255u8; (w * h * 4) as usize];
    blend_region(&mut dst, &src, w, [1, 1, 3, 9], 1.0, BlendMode::Normal).unwrap();
    for y in 0..h {
        for x in 0..w {
            let inside = (1..3).contains(&x) && y >= 1;
            let v = dst[((y * w + x) * 4) as usize];
            assert_eq!(v == 255, inside, "pixel {x},{y}");
        }
    }
}
