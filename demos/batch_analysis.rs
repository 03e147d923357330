//! Example of analysing a season of rides at once.
//!
//! Run with: cargo run --example batch_analysis --features parallel

use cycle_tracks::{analyse_tracks, analyse_tracks_parallel, AnalysisRequest, Track, TrackPoint};
use std::time::Instant;

fn main() {
    println!("Batch Analysis Example\n");

    // 200 rides of ~1 hour each, one every day
    let tracks: Vec<Track> = (0..200)
        .map(|day| synthetic_ride(day, 3600))
        .collect();

    let request = AnalysisRequest {
        tracks,
        ..Default::default()
    };

    println!("Created {} tracks\n", request.tracks.len());

    let start = Instant::now();
    let sequential = analyse_tracks(&request);
    let sequential_elapsed = start.elapsed();

    let start = Instant::now();
    let parallel = analyse_tracks_parallel(&request);
    let parallel_elapsed = start.elapsed();

    println!("Sequential: {:?}", sequential_elapsed);
    println!("Parallel:   {:?}", parallel_elapsed);
    println!("Identical:  {}\n", sequential == parallel);

    if let Some(result) = parallel {
        println!("Stats:");
        println!("  Stride: {}", result.stride);
        println!("  Series points: {}", result.series.len());
        println!("  Discarded: {}", result.discarded.len());
        println!("  {}", result.summary());
    }
}

/// A ride wandering around Frankfurt, with a little GPS noise.
fn synthetic_ride(day: i64, seconds: i64) -> Track {
    let heading = (day as f64 * 0.7).sin();
    let points = (0..seconds)
        .map(|i| {
            let noise = ((i * 7919) % 13) as f64 * 1e-6;
            TrackPoint::new(
                1_577_836_800 + day * 86_400 + i,
                50.11 + i as f64 * 0.00004 * heading + noise,
                8.68 + i as f64 * 0.00006 + noise,
                100.0 + (i as f64 / 300.0).sin() * 25.0,
            )
        })
        .collect();
    Track::new(format!("2020-day-{:03}.gpx", day), points)
}
