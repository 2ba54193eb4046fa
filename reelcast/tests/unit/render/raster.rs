use super::*;

fn px(buf: &[u8], w: u32, x: u32, y: u32) -> [u8; 4] {
    let o = ((y * w + x) * 4) as usize;
    [buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]
}

fn red_image(w: u32, h: u32) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new([255u8, 0, 0, 255].repeat((w * h) as usize)),
    }
}

#[test]
fn image_draw_covers_its_transformed_rect() {
    let mut raster = Raster::new(Canvas { width: 16, height: 16 }).unwrap();
    let paint = ImagePaint::from_prepared(&red_image(4, 4)).unwrap();
    raster.begin();
    raster.image(&paint, Affine::translate((8.0, 8.0)), 1.0);
    let layer = raster.finish();

    let inside = px(layer, 16, 10, 10);
    assert!(inside[0] >= 250 && inside[3] >= 250, "{inside:?}");
    assert_eq!(px(layer, 16, 2, 2), [0, 0, 0, 0]);
}

#[test]
fn finish_starts_from_a_transparent_layer() {
    let mut raster = Raster::new(Canvas { width: 8, height: 8 }).unwrap();
    raster.begin();
    raster.rect(Rect::new(0.0, 0.0, 8.0, 8.0), Affine::IDENTITY, [0, 0, 255, 255], 1.0);
    assert!(raster.finish()[3] > 0);

    raster.begin();
    assert!(raster.finish().iter().all(|&v| v == 0));
}

#[test]
fn half_opacity_rect_is_half_alpha() {
    let mut raster = Raster::new(Canvas { width: 8, height: 8 }).unwrap();
    raster.begin();
    raster.rect(Rect::new(0.0, 0.0, 8.0, 8.0), Affine::IDENTITY, [255, 255, 255, 255], 0.5);
    let a = px(raster.finish(), 8, 4, 4)[3];
    assert!((120..=135).contains(&a), "alpha {a}");
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(Raster::new(Canvas { width: 70_000, height: 10 }).is_err());
}

#[test]
fn pixel_box_clamps() {
    let b = pixel_box(Rect::new(-3.0, 1.2, 9.5, 40.0), 8, 8);
    assert_eq!(b, [0, 1, 8, 8]);
}
