//! Example of the JSON request/response boundary.
//!
//! Run with: cargo run --example analyse_json --features json

use cycle_tracks::{analyse_tracks, AnalysisRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<String> = (0..60)
        .map(|i| {
            format!(
                r#"{{"time": {}, "latitude": 48.137, "longitude": {}, "elevation": 519.0}}"#,
                1_600_000_000 + i,
                11.575 + i as f64 * 0.0002
            )
        })
        .collect();

    // Parameters left out of the request take their defaults
    let json = format!(
        r#"{{
            "tracks": [{{"name": "munich.gpx", "points": [{}]}}],
            "places": [{{"name": "Marienplatz", "latitude": 48.1374, "longitude": 11.5755, "radius_km": 0.3}}],
            "config": {{"place_sample_step": 5}}
        }}"#,
        points.join(",")
    );

    let request = AnalysisRequest::from_json(&json)?;
    println!("Request: {} tracks, config {:?}\n", request.tracks.len(), request.config);

    match analyse_tracks(&request) {
        Some(result) => {
            println!("{}\n", result.summary());
            let out = result.to_json()?;
            println!("Response: {} bytes", out.len());
        }
        None => println!("No usable tracks"),
    }

    Ok(())
}
