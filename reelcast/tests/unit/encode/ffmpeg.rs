use super::*;

#[test]
fn flatten_transparent_pixel_returns_background() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_opaque_pixel_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_half_alpha_mixes_with_background() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[128, 0, 0, 128], [0, 0, 254, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn begin_rejects_odd_dimensions_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let err = sink
        .begin(SinkConfig {
            width: 3,
            height: 2,
            fps: Fps::default(),
            audio: None,
        })
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn push_before_begin_is_an_encoder_failure() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(matches!(
        sink.push_frame(FrameIndex(0), &frame),
        Err(ReelError::Encoder { .. })
    ));
    assert!(sink.end().is_err());
}
