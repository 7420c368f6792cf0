//! Engine lifecycle integration tests

use crate::helpers::tolerances::*;
use crate::helpers::*;
use octafold::prelude::*;
use octafold::Error;

#[test]
fn test_default_engine_derives_threshold() {
    let engine = OctafoldEngine::builder().build().unwrap();

    assert_eq!(engine.sample_rate(), 44100.0);
    assert_eq!(engine.config().block_size, 512);
    // floor(3000 * 512 / 22050)
    assert_eq!(engine.bin_threshold(), 69);
    assert!(!engine.is_running());
}

#[test]
fn test_invalid_config_fails_at_build() {
    let result = OctafoldEngine::builder().block_size(0).build();
    assert!(matches!(
        result,
        Err(Error::Core(octafold::core::Error::InvalidConfig(_)))
    ));

    // Threshold at Nyquist puts T == N
    let result = OctafoldEngine::builder()
        .sample_rate(48_000.0)
        .threshold_hz(24_000.0)
        .build();
    assert!(result.is_err());
}

#[test]
fn test_whole_config_replaces_builder_defaults() {
    let config = PipelineConfig {
        block_size: 256,
        fold_mode: FoldMode::Move,
        mute_mode: MuteMode::Freeze,
        ..Default::default()
    };
    let engine = OctafoldEngine::builder().config(config).build().unwrap();
    assert_eq!(engine.config().fold_mode, FoldMode::Move);
    assert_eq!(engine.config().mute_mode, MuteMode::Freeze);
    // floor(3000 * 256 / 22050)
    assert_eq!(engine.bin_threshold(), 34);
}

#[test]
fn test_feed_while_stopped_is_ignored() {
    let engine = OctafoldEngine::builder().build().unwrap();

    engine.feed(&generate_sine(440.0, TEST_SAMPLE_RATE, 2048)).unwrap();
    let stats = engine.stats();
    assert_eq!(stats.raw_len, 0);
    assert_eq!(stats.capture_blocks, 0);

    let mut output = vec![1.0; 64];
    engine.render(&mut output, 2);
    assert_is_silent(&output, 0.0, "stopped engine");
}

#[test]
fn test_stop_discards_pending_audio() {
    let engine = test_engine();

    engine.feed(&generate_sine(440.0, TEST_SAMPLE_RATE, 4096)).unwrap();
    assert!(engine.flush());
    assert!(engine.stats().processed_len > 0);

    engine.stop();
    assert!(!engine.is_running());
    assert_eq!(engine.stats().lag_samples(), 0);

    engine.start().unwrap();
    let mut output = vec![1.0; 256];
    engine.render(&mut output, 1);
    assert_is_silent(&output, 0.0, "restarted engine");
    assert_eq!(engine.stats().underflows, 256);
}

#[test]
fn test_repeated_restart_keeps_invariants() {
    let engine = OctafoldEngine::builder().bypass(true).build().unwrap();

    for round in 0..10 {
        engine.start().unwrap();
        let input = generate_ramp(-0.5, 0.5, TEST_BLOCK_SIZE * 3);
        let output = process_offline(&engine, &input);
        assert_signals_equal(&output, &input, FLOAT_EPSILON, &format!("round {round}"));

        let stats = engine.stats();
        assert_eq!(stats.blocks_processed, 3);
        assert_eq!(stats.lag_samples(), 0);
        engine.stop();
    }
}

#[test]
fn test_stats_survive_stop() {
    let engine = test_engine();
    engine.feed(&[0.25; TEST_BLOCK_SIZE * 2]).unwrap();
    assert!(engine.flush());
    engine.stop();

    let stats = engine.stats();
    assert_eq!(stats.blocks_processed, 2);
    assert_eq!(stats.capture_blocks, 1);

    engine.start().unwrap();
    assert_eq!(engine.stats().blocks_processed, 0);
}

#[test]
fn test_feed_interleaved_keeps_first_channel() {
    let engine = OctafoldEngine::builder()
        .block_size(4)
        .bypass(true)
        .build()
        .unwrap();
    engine.start().unwrap();

    let interleaved = [0.1, -9.0, 0.2, -9.0, 0.3, -9.0, 0.4, -9.0];
    engine.feed_interleaved(&interleaved, 2).unwrap();
    assert!(engine.flush());

    let mut left = [0.0; 4];
    let mut right = [0.0; 4];
    let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
    engine.render_planar(&mut channels);
    assert_eq!(left, [0.1, 0.2, 0.3, 0.4]);
    assert_eq!(right, left);
}
