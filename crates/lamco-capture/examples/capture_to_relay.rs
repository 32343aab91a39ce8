//! Capture into a processing thread
//!
//! This example wires the pieces of lamco-capture together:
//! - PatternSource as a device-free frame source
//! - CaptureSession driving it on a capture thread
//! - FrameRelay handing frames to a slow processing thread
//! - LatestFrame keeping the newest frame for display
//!
//! Run with `RUST_LOG=debug` to see the session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use lamco_capture::{
    CaptureConfig, CaptureEvent, CaptureSession, FrameRelay, LatestFrame, PatternSource, RelayPolicy,
};
use lamco_frame::PixelFormat;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("lamco-capture v{}", lamco_capture::VERSION);
    println!();

    let config = CaptureConfig::builder()
        .poll_interval_ms(5)
        .relay_policy(RelayPolicy::SkipIfBusy)
        .convert_16bit(true)
        .build();

    // Processing is slower than capture, so some frames get skipped
    let relay = Arc::new(FrameRelay::from_config(&config, |frame| {
        std::thread::sleep(Duration::from_millis(20));
        println!(
            "  processed {}x{} {} frame, first byte {}",
            frame.width(),
            frame.height(),
            frame.format(),
            frame.row(0)[0]
        );
    })?);
    let latest = Arc::new(LatestFrame::new());

    let source = PatternSource::new("pattern", 320, 240, PixelFormat::Rgb48)?.end_after(50);
    let relay_in = Arc::clone(&relay);
    let latest_in = Arc::clone(&latest);
    let mut session = CaptureSession::start(source, config, move |frame| {
        latest_in.store(&frame)?;
        relay_in.offer(&frame)?;
        Ok(())
    })?;
    let mut events = session.take_events().ok_or("event receiver already taken")?;

    println!("Capturing from {}:", session.name());
    let reason = session.wait_for_stop(Duration::from_secs(10))?;
    relay.shutdown();
    println!();

    while let Ok(event) = events.try_recv() {
        match event {
            CaptureEvent::Finished(reason) => println!("Finished: {reason}"),
            other => println!("Event: {other:?}"),
        }
    }

    let stats = relay.stats();
    println!("Session ended: {}", reason);
    println!("  Frames received: {}", session.frames_received());
    println!("  Bytes received: {}", session.bytes_received());
    println!("  Relayed: {}, dropped: {}", stats.relayed, stats.dropped);

    if let Some(frame) = latest.snapshot()? {
        println!(
            "  Latest frame: {}x{} {} stride {}",
            frame.width(),
            frame.height(),
            frame.format(),
            frame.stride()
        );
    }

    Ok(())
}
