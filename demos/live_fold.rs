//! # Live Fold
//!
//! Fold the default microphone into the default speakers for ten seconds, printing
//! pipeline stats once a second. Use headphones.
//!
//! **Concepts:** device feature, `DeviceConfig`, listening toggle, live stats
//!
//! ```bash
//! cargo run --example live_fold --features device
//! ```

use octafold::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> octafold::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Inputs:");
    for name in octafold::list_input_devices()? {
        println!("  {name}");
    }
    println!("Outputs:");
    for name in octafold::list_output_devices()? {
        println!("  {name}");
    }

    let engine = OctafoldEngine::builder()
        .threshold_hz(3000.0)
        .devices(DeviceConfig::default())
        .build()?;
    println!(
        "Running at {} Hz, folding above bin {}",
        engine.sample_rate(),
        engine.bin_threshold()
    );

    engine.start()?;
    for second in 1..=10 {
        std::thread::sleep(Duration::from_secs(1));

        // Mute for seconds 5-6 to hear the queue keep draining
        engine.set_listening(!(5..=6).contains(&second));

        let stats = engine.stats();
        println!(
            "{second:>2}s  lag={:>5} underflows={:>6} dropped={:>6} stream_errors={}",
            stats.lag_samples(),
            stats.underflows,
            stats.dropped_samples,
            stats.stream_errors
        );
    }
    engine.stop();

    Ok(())
}
