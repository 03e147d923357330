//! Basic example of analysing two rides.
//!
//! Run with: cargo run --example basic_analysis

use cycle_tracks::{analyse_tracks, AnalysisRequest, NamedPlace, NoGoArea, Track, TrackPoint};

fn main() {
    // Morning ride: leaves home (Frankfurt area) and heads east
    let morning: Vec<TrackPoint> = (0..900)
        .map(|i| {
            let climb = (i as f64 / 150.0).sin() * 40.0;
            TrackPoint::new(1_600_000_000 + i, 50.1109, 8.6821 + i as f64 * 0.00012, 110.0 + climb)
        })
        .collect();

    // Evening ride with a 10 minute stop halfway
    let evening: Vec<TrackPoint> = (0..600)
        .map(|i| {
            let t = 1_600_040_000 + i + if i >= 300 { 600 } else { 0 };
            TrackPoint::new(t, 50.1200 + i as f64 * 0.0001, 8.7500, 105.0)
        })
        .collect();

    let request = AnalysisRequest {
        tracks: vec![
            Track::new("2020-09-13_evening.gpx", evening),
            Track::new("2020-09-13_morning.gpx", morning),
        ],
        no_go_areas: vec![NoGoArea::new("home", 50.1109, 8.6821, 0.3)],
        places: vec![
            NamedPlace::new("Offenbach", 50.1055, 8.7623, 2.0),
            NamedPlace::new("Fechenheim", 50.1250, 8.7540, 1.0),
        ],
        ..Default::default()
    };

    println!("Track Analysis Example\n");

    let Some(result) = analyse_tracks(&request) else {
        println!("No usable tracks");
        return;
    };

    println!("Summary: {}\n", result.summary());

    println!("Tracks (chronological):");
    for track in &result.tracks {
        println!(
            "  {}: {} positions, {}s",
            track.name,
            track.positions.len(),
            track.end - track.start
        );
    }

    println!("\nViewport:");
    println!(
        "  center ({:.4}, {:.4}), zoom {}",
        result.viewport.center.latitude, result.viewport.center.longitude, result.viewport.zoom
    );

    println!("\nPlaces passed:");
    for label in &result.place_labels {
        println!("  {:>6.2} km  {}", label.cumulative_distance, label.name);
    }

    let fast = result
        .series
        .rolling_speed_5
        .iter()
        .flatten()
        .fold(0.0f64, |a, &b| a.max(b));
    println!("\nFastest 5-point speed: {:.1} km/h", fast);
}
