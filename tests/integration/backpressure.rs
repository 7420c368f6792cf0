//! Backlog ceiling, underflow and mute behavior.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use octafold::prelude::*;

#[test]
fn test_backlog_bounded_without_playback() {
    let engine = OctafoldEngine::builder()
        .block_size(256)
        .max_backlog_samples(1000)
        .bypass(true)
        .build()
        .unwrap();
    engine.start().unwrap();

    let input = generate_staircase(256 * 20);
    for chunk in input.chunks(256) {
        engine.feed(chunk).unwrap();
    }
    assert!(engine.flush());

    let stats = engine.stats();
    assert!(stats.processed_len <= 1000);
    assert_eq!(
        stats.dropped_samples + stats.processed_len as u64,
        input.len() as u64
    );

    // Oldest samples went first; what is left is the newest tail, in order
    let output = drain(&engine);
    assert_eq!(output, input[input.len() - output.len()..].to_vec());
}

#[test]
fn test_backlog_bound_holds_across_many_activations() {
    let engine = OctafoldEngine::builder()
        .block_size(128)
        .max_backlog_samples(300)
        .build()
        .unwrap();
    engine.start().unwrap();

    for seed in 0..50 {
        engine.feed(&generate_noise(128 * 3, seed)).unwrap();
        assert!(engine.flush());
        assert!(engine.stats().processed_len <= 300, "seed {seed}");
    }
}

#[test]
fn test_underflow_renders_silence() {
    let engine = test_engine();

    let mut output = vec![1.0; 128];
    engine.render(&mut output, 2);
    assert_is_silent(&output, 0.0, "empty processed queue");
    assert_eq!(engine.stats().underflows, 64);
}

#[test]
fn test_partial_underflow_mid_buffer() {
    let engine = OctafoldEngine::builder().block_size(64).bypass(true).build().unwrap();
    engine.start().unwrap();

    engine.feed(&generate_staircase(64)).unwrap();
    assert!(engine.flush());

    let mut output = vec![-1.0; 100];
    engine.render(&mut output, 1);
    assert_eq!(output[..64].to_vec(), generate_staircase(64));
    assert_is_silent(&output[64..], 0.0, "after queue ran dry");
    assert_eq!(engine.stats().underflows, 36);
}

#[test]
fn test_muted_drain_keeps_queue_moving() {
    let engine = OctafoldEngine::builder().bypass(true).build().unwrap();
    engine.start().unwrap();
    engine.set_listening(false);

    engine.feed(&generate_sine(1000.0, TEST_SAMPLE_RATE, TEST_BLOCK_SIZE * 2)).unwrap();
    assert!(engine.flush());

    let mut output = vec![0.5; TEST_BLOCK_SIZE];
    engine.render(&mut output, 1);
    assert_is_silent(&output, SILENCE_THRESHOLD, "muted drain");
    assert_eq!(engine.stats().processed_len, TEST_BLOCK_SIZE);
    // Muted pulls are not underflows
    assert_eq!(engine.stats().underflows, 0);

    // Unmuting resumes from the second block
    engine.set_listening(true);
    let input = generate_sine(1000.0, TEST_SAMPLE_RATE, TEST_BLOCK_SIZE * 2);
    let mut resumed = vec![0.0; TEST_BLOCK_SIZE];
    engine.render(&mut resumed, 1);
    assert_signals_equal(&resumed, &input[TEST_BLOCK_SIZE..], FLOAT_EPSILON, "resumed");
}

#[test]
fn test_muted_freeze_leaves_queue() {
    let engine = OctafoldEngine::builder()
        .bypass(true)
        .mute_mode(MuteMode::Freeze)
        .build()
        .unwrap();
    engine.start().unwrap();
    engine.set_listening(false);

    let input = generate_staircase(TEST_BLOCK_SIZE);
    engine.feed(&input).unwrap();
    assert!(engine.flush());

    let mut output = vec![0.5; TEST_BLOCK_SIZE];
    engine.render(&mut output, 1);
    assert_is_silent(&output, 0.0, "muted freeze");
    assert_eq!(engine.stats().processed_len, TEST_BLOCK_SIZE);

    engine.set_listening(true);
    assert_eq!(drain(&engine), input);
}

#[test]
fn test_raw_overflow_is_counted() {
    let engine = OctafoldEngine::builder()
        .block_size(64)
        .raw_capacity(64)
        .bypass(true)
        .build()
        .unwrap();
    // Feeding while stopped does not count; start first
    engine.start().unwrap();

    engine.feed(&generate_staircase(100)).unwrap();
    assert!(engine.flush());

    let stats = engine.stats();
    assert_eq!(stats.raw_overflows, 36);
    assert_eq!(stats.blocks_processed, 1);
    assert_eq!(drain(&engine), generate_staircase(64));
}
