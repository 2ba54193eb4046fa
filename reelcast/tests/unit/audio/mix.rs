use super::*;

fn constant(sample_rate: u32, channels: u16, secs: f64, value: f32) -> Arc<AudioBuffer> {
    let frames = (secs * f64::from(sample_rate)).round() as usize;
    Arc::new(AudioBuffer::new(
        sample_rate,
        channels,
        vec![value; frames * usize::from(channels)],
    ))
}

fn frame_at(mix: &[f32], secs: f64) -> (f32, f32) {
    let i = (secs * f64::from(MIX_SAMPLE_RATE)) as usize * 2;
    (mix[i], mix[i + 1])
}

#[test]
fn narration_plays_at_its_scheduled_time() {
    let mut schedule = MixSchedule::new(3.0);
    schedule.schedule_narration(1.0, constant(MIX_SAMPLE_RATE, 1, 1.0, 0.5), 1.0);
    let graph = MixGraph::new(schedule).unwrap();
    let mix = graph.mix_all();
    assert_eq!(mix.len(), 3 * MIX_SAMPLE_RATE as usize * 2);
    assert_eq!(frame_at(&mix, 0.5), (0.0, 0.0));
    assert_eq!(frame_at(&mix, 1.5), (0.5, 0.5));
    assert_eq!(frame_at(&mix, 2.5), (0.0, 0.0));
}

#[test]
fn foreign_rate_clips_are_stretched_to_the_mix_rate() {
    let mut schedule = MixSchedule::new(2.0);
    schedule.schedule_narration(0.0, constant(24_000, 2, 1.0, 0.25), 2.0);
    let graph = MixGraph::new(schedule).unwrap();
    let mix = graph.mix_all();
    assert_eq!(frame_at(&mix, 0.9), (0.5, 0.5));
    assert_eq!(frame_at(&mix, 1.1), (0.0, 0.0));
}

#[test]
fn music_loops_and_ducks_under_narration() {
    let mut schedule = MixSchedule::new(4.0);
    schedule.ducking = 0.5;
    schedule.schedule_music(constant(MIX_SAMPLE_RATE, 1, 1.0, 0.4), 1.0, true, 0.0);
    schedule.schedule_narration(2.0, constant(MIX_SAMPLE_RATE, 1, 1.0, 0.1), 1.0);
    let graph = MixGraph::new(schedule).unwrap();
    let mix = graph.mix_all();
    assert!((frame_at(&mix, 3.5).0 - 0.4).abs() < 1e-6);
    assert!((frame_at(&mix, 2.5).0 - 0.3).abs() < 1e-6);
}

#[test]
fn music_fade_out_reaches_silence_at_the_end() {
    let mut schedule = MixSchedule::new(2.0);
    schedule.schedule_music(constant(MIX_SAMPLE_RATE, 1, 4.0, 0.5), 1.0, false, 1.0);
    let graph = MixGraph::new(schedule).unwrap();
    let mix = graph.mix_all();
    assert!((frame_at(&mix, 0.5).0 - 0.5).abs() < 1e-6);
    assert!((frame_at(&mix, 1.5).0 - 0.25).abs() < 1e-3);
    assert!(mix[mix.len() - 2].abs() < 1e-3);
}

#[test]
fn output_is_clamped() {
    let mut schedule = MixSchedule::new(1.0);
    schedule.schedule_narration(0.0, constant(MIX_SAMPLE_RATE, 1, 1.0, 0.8), 1.0);
    schedule.schedule_narration(0.0, constant(MIX_SAMPLE_RATE, 1, 1.0, 0.8), 1.0);
    let mix = MixGraph::new(schedule).unwrap().mix_all();
    assert_eq!(frame_at(&mix, 0.5), (1.0, 1.0));
}

#[test]
fn suspended_graph_is_silent_and_frozen() {
    let mut schedule = MixSchedule::new(2.0);
    schedule.schedule_narration(0.0, constant(MIX_SAMPLE_RATE, 1, 2.0, 0.5), 1.0);
    let mut graph = MixGraph::new(schedule).unwrap();

    assert_eq!(graph.render_frames(4_800).len(), 9_600);
    assert!((graph.current_time() - 0.1).abs() < 1e-9);

    graph.suspend();
    let block = graph.render_frames(4_800);
    assert!(block.iter().all(|&s| s == 0.0));
    assert!((graph.current_time() - 0.1).abs() < 1e-9);

    graph.resume();
    graph.suspend();
    graph.suspend();
    assert_eq!(graph.state(), GraphState::Suspended);
    graph.resume();
    assert_eq!(graph.state(), GraphState::Running);
    assert!(graph.render_frames(10).iter().all(|&s| s == 0.5));
}

#[test]
fn align_timeline_shifts_playback() {
    let mut schedule = MixSchedule::new(2.0);
    schedule.schedule_narration(1.0, constant(MIX_SAMPLE_RATE, 1, 0.5, 0.5), 1.0);
    let mut graph = MixGraph::new(schedule).unwrap();
    graph.render_frames(4_800);
    // Make context now (0.1 s) correspond to timeline 1.2 s.
    graph.align_timeline(graph.current_time() - 1.2);
    assert!((graph.timeline_time() - 1.2).abs() < 1e-9);
    assert!(graph.render_frames(10).iter().all(|&s| s == 0.5));
}

#[test]
fn closed_graph_stays_closed() {
    let mut graph = MixGraph::new(MixSchedule::new(1.0)).unwrap();
    graph.close();
    graph.resume();
    assert_eq!(graph.state(), GraphState::Closed);
    assert_eq!(graph.render_block(&mut [1.0; 8]), 0);
}

#[test]
fn invalid_schedule_is_an_audio_graph_error() {
    let mut schedule = MixSchedule::new(1.0);
    schedule.channels = 6;
    let err = MixGraph::new(schedule).unwrap_err();
    assert!(matches!(err, ReelError::AudioGraph(_)));
}

#[test]
fn write_f32le_roundtrips_bytes() {
    let dir = std::env::temp_dir().join(format!("reelcast_mix_{}", std::process::id()));
    let path = dir.join("mix.f32le");
    write_mix_to_f32le_file(&[0.25, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 0.25);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn frame_to_sample_rounds() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(frame_to_sample(30, fps, 48_000), 48_000);
    assert_eq!(frame_to_sample(1, fps, 48_000), 1_600);
}
