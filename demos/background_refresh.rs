//! Example of the background refresh scheduler.
//!
//! Run with: cargo run --example background_refresh --features refresh

use cycle_tracks::{BackgroundRefresher, RefreshError, RefreshSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Pretends to reload weather data; the table shows up after two passes.
struct WeatherTable {
    calls: AtomicUsize,
}

impl RefreshSource for WeatherTable {
    fn name(&self) -> &str {
        "weather"
    }

    fn refresh(&self) -> Result<usize, RefreshError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < 2 {
            return Err(RefreshError::MissingTable("weather".to_string()));
        }
        std::thread::sleep(Duration::from_millis(20));
        Ok(24)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Background Refresh Example\n");

    let lock_path = std::env::temp_dir().join("cycle-tracks-refresh.pid");

    let refresher = BackgroundRefresher::new(Duration::from_millis(250)).with_source(WeatherTable {
        calls: AtomicUsize::new(0),
    });

    let Some(handle) = refresher.start(&lock_path)? else {
        println!("Another process is already refreshing ({})", lock_path.display());
        return Ok(());
    };

    println!("Refreshing for 2 seconds, lock at {}", lock_path.display());
    tokio::time::sleep(Duration::from_secs(2)).await;

    let stats = handle.stop().await?;
    println!("\nStats:");
    println!("  Passes: {}", stats.passes);
    println!("  Rows refreshed: {}", stats.refreshed);
    println!("  Skipped runs: {}", stats.skipped);

    Ok(())
}
