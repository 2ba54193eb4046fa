use super::*;

#[test]
fn straight_conversion_undoes_premultiplication() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 32, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    let s = frame.to_straight_rgba8();
    assert_eq!(&s[..4], &[128, 64, 0, 128]);
    assert_eq!(&s[4..], &[10, 20, 30, 255]);
}
