use super::*;

fn sine(sample_rate: u32, channels: u16, secs: f64, hz: f64) -> AudioBuffer {
    let frames = (secs * f64::from(sample_rate)).round() as usize;
    let mut samples = Vec::with_capacity(frames * usize::from(channels));
    for i in 0..frames {
        let v = (2.0 * std::f64::consts::PI * hz * i as f64 / f64::from(sample_rate)).sin() as f32;
        for _ in 0..channels {
            samples.push(0.5 * v);
        }
    }
    AudioBuffer::new(sample_rate, channels, samples)
}

fn zero_crossings(samples: &[f32]) -> usize {
    samples
        .windows(2)
        .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
        .count()
}

#[test]
fn stretch_at_unit_speed_is_identity() {
    let b = sine(24_000, 1, 0.5, 220.0);
    assert_eq!(stretch_audio(b.clone(), 1.0), b);
    assert_eq!(stretch_audio(b.clone(), 1.005), b);
}

#[test]
fn shift_pitch_zero_is_identity() {
    let b = sine(24_000, 2, 0.5, 220.0);
    assert_eq!(shift_pitch(b.clone(), 0.0), b);
}

#[test]
fn degenerate_inputs_are_returned_unchanged() {
    let short = sine(24_000, 1, 0.01, 220.0);
    assert_eq!(stretch_audio(short.clone(), 2.0), short);

    let b = sine(24_000, 1, 0.2, 220.0);
    assert_eq!(stretch_audio(b.clone(), f64::NAN), b);
    assert_eq!(stretch_audio(b.clone(), -1.0), b);
    assert_eq!(resample_buffer(b.clone(), 0.0), b);
    assert_eq!(resample_buffer(b.clone(), f64::INFINITY), b);

    let no_channels = AudioBuffer::new(24_000, 0, vec![]);
    assert_eq!(stretch_audio(no_channels.clone(), 1.5), no_channels);
}

#[test]
fn stretch_length_tracks_speed_within_one_frame() {
    let b = sine(24_000, 1, 1.0, 330.0);
    let w = SolaParams::for_rate(24_000).frame as f64;
    for speed in [0.5, 0.75, 1.25, 1.5, 2.0, 3.0] {
        let out = stretch_audio(b.clone(), speed);
        let ideal = b.frames() as f64 / speed;
        assert!(
            (out.frames() as f64 - ideal).abs() <= w,
            "speed {speed}: got {} frames, ideal {ideal}",
            out.frames()
        );
    }
}

#[test]
fn stretch_one_and_a_half_on_one_second_mono() {
    let b = sine(24_000, 1, 1.0, 440.0);
    let out = stretch_audio(b, 1.5);
    assert!((out.duration_secs() - 0.6667).abs() <= SOLA_FRAME_SECS);
    assert_eq!(out.sample_rate, 24_000);
    assert_eq!(out.channels, 1);
}

#[test]
fn stretch_preserves_pitch_of_a_tone() {
    let b = sine(24_000, 1, 1.0, 440.0);
    let out = stretch_audio(b, 1.5);
    let crossings_per_sec = zero_crossings(&out.samples) as f64 / out.duration_secs();
    // A 440 Hz tone crosses zero 880 times per second.
    assert!(
        (crossings_per_sec - 880.0).abs() / 880.0 < 0.08,
        "crossings/s = {crossings_per_sec}"
    );
}

#[test]
fn stretch_keeps_channel_layout() {
    let b = sine(48_000, 2, 0.5, 300.0);
    let out = stretch_audio(b, 0.8);
    assert_eq!(out.channels, 2);
    assert_eq!(out.samples.len() % 2, 0);
    assert_eq!(out.frames(), (24_000f64 / 0.8).round() as usize);
}

#[test]
fn stretch_is_deterministic() {
    let b = sine(24_000, 1, 0.7, 180.0);
    assert_eq!(stretch_audio(b.clone(), 1.3), stretch_audio(b, 1.3));
}

#[test]
fn resample_changes_duration_and_pitch_together() {
    let b = sine(24_000, 1, 1.0, 440.0);
    let in_crossings = zero_crossings(&b.samples);
    let out = resample_buffer(b, 2.0);
    assert_eq!(out.frames(), 12_000);
    let out_crossings = zero_crossings(&out.samples);
    assert!(in_crossings.abs_diff(out_crossings) <= 2);
}

#[test]
fn resample_to_rate_preserves_duration() {
    let b = sine(24_000, 1, 1.0, 440.0);
    let out = resample_to_rate(b, 48_000);
    assert_eq!(out.sample_rate, 48_000);
    assert_eq!(out.frames(), 48_000);
    let crossings = zero_crossings(&out.samples);
    assert!(crossings.abs_diff(880) <= 2);
}

#[test]
fn pitch_round_trip_keeps_length() {
    let b = sine(24_000, 1, 1.0, 300.0);
    let w = SolaParams::for_rate(24_000).frame;
    let up = shift_pitch(b.clone(), 3.0);
    assert!(up.frames().abs_diff(b.frames()) <= w);
    let back = shift_pitch(up, -3.0);
    assert!(back.frames().abs_diff(b.frames()) <= w);
}

#[test]
fn gain_scales_samples() {
    let b = AudioBuffer::new(8_000, 1, vec![0.5, -0.25]);
    assert_eq!(b.apply_gain(2.0).samples, vec![1.0, -0.5]);
}
