//! # Offline Fold
//!
//! Push a rising sine sweep through the pipeline without audio hardware and write
//! the folded result to a WAV file, next to the bypassed version for comparison.
//!
//! **Concepts:** `feed()`, `flush()`, `render()`, `FoldMode`, pipeline stats
//!
//! ```bash
//! RUST_LOG=debug cargo run --example offline_fold
//! ```

use octafold::prelude::*;
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f64 = 44100.0;
const HARDWARE_BUFFER: usize = 441;

fn sweep(seconds: f64) -> Vec<f32> {
    let len = (seconds * SAMPLE_RATE) as usize;
    let (start, end) = (200.0_f64, 12_000.0_f64);
    let mut phase = 0.0_f64;
    (0..len)
        .map(|i| {
            let t = i as f64 / len as f64;
            let freq = start * (end / start).powf(t);
            phase += 2.0 * std::f64::consts::PI * freq / SAMPLE_RATE;
            (phase.sin() * 0.5) as f32
        })
        .collect()
}

/// Feed in hardware-sized chunks and collect everything the pipeline produces.
fn run(engine: &OctafoldEngine, input: &[f32]) -> octafold::Result<Vec<f32>> {
    engine.start()?;
    let mut output = Vec::with_capacity(input.len());
    let mut buffer = vec![0.0; HARDWARE_BUFFER];

    for chunk in input.chunks(HARDWARE_BUFFER) {
        engine.feed(chunk)?;
        engine.flush();
        let available = engine.stats().processed_len.min(buffer.len());
        engine.render(&mut buffer[..available], 1);
        output.extend_from_slice(&buffer[..available]);
    }
    engine.flush();
    let mut tail = vec![0.0; engine.stats().processed_len];
    engine.render(&mut tail, 1);
    output.extend_from_slice(&tail);

    let stats = engine.stats();
    println!(
        "  blocks={} dropped={} underflows={} left in raw queue={}",
        stats.blocks_processed, stats.dropped_samples, stats.underflows, stats.raw_len
    );
    engine.stop();
    Ok(output)
}

fn write_wav(path: &str, samples: &[f32]) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let input = sweep(4.0);

    let folded = OctafoldEngine::builder()
        .sample_rate(SAMPLE_RATE)
        .threshold_hz(3000.0)
        .max_backlog_samples(input.len())
        .build()?;
    println!("Folding above bin {} (3000 Hz):", folded.bin_threshold());
    let output = run(&folded, &input)?;
    write_wav("/tmp/octafold_folded.wav", &output)?;
    println!("Wrote /tmp/octafold_folded.wav ({} samples)", output.len());

    let moved = OctafoldEngine::builder()
        .sample_rate(SAMPLE_RATE)
        .fold_mode(FoldMode::Move)
        .max_backlog_samples(input.len())
        .build()?;
    println!("Folding with source bins cleared:");
    let output = run(&moved, &input)?;
    write_wav("/tmp/octafold_moved.wav", &output)?;
    println!("Wrote /tmp/octafold_moved.wav ({} samples)", output.len());

    let bypass = OctafoldEngine::builder()
        .sample_rate(SAMPLE_RATE)
        .bypass(true)
        .max_backlog_samples(input.len())
        .build()?;
    println!("Bypass:");
    let output = run(&bypass, &input)?;
    write_wav("/tmp/octafold_bypass.wav", &output)?;
    println!("Wrote /tmp/octafold_bypass.wav ({} samples)", output.len());

    Ok(())
}
