use super::*;

fn cfg(audio: bool) -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: Fps::default(),
        audio: audio.then_some(AudioStreamConfig {
            sample_rate: 48_000,
            channels: 2,
        }),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: vec![v; 8],
        premultiplied: true,
    }
}

#[test]
fn collects_frames_and_returns_them_on_end() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(false)).unwrap();
    sink.push_frame(FrameIndex(0), &frame(1)).unwrap();
    sink.push_frame(FrameIndex(1), &frame(2)).unwrap();
    sink.push_audio(&[0.5, 0.5]).unwrap();

    let blob = sink.end().unwrap();
    assert_eq!(blob.len(), 16);
    assert_eq!(&blob[8..], &[2; 8]);
    assert!(sink.audio().is_empty());
    assert!(sink.is_finished());
}

#[test]
fn rejects_out_of_order_and_late_frames() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame(0)).is_err());
    sink.begin(cfg(true)).unwrap();
    sink.push_frame(FrameIndex(3), &frame(0)).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame(0)).is_err());
    sink.push_audio(&[0.1, 0.2]).unwrap();
    assert_eq!(sink.audio(), &[0.1, 0.2]);
    sink.end().unwrap();
    assert!(matches!(
        sink.push_frame(FrameIndex(4), &frame(0)),
        Err(ReelError::Encoder { .. })
    ));
}
