//! Ride totals for display.

use std::fmt;

use crate::timefmt::format_duration;
use crate::AnalysisResult;

/// Totals of one analysis, ready to print.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct RideSummary {
    pub track_count: usize,
    pub distance_km: f64,
    pub moving_seconds: u64,
    pub average_speed_kmh: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
}

impl RideSummary {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            track_count: result.tracks.len(),
            distance_km: result.series.total_distance(),
            moving_seconds: result.series.total_duration().max(0.0).round() as u64,
            average_speed_kmh: result.series.average_speed(),
            ascent_m: result.elevation.ascent_m,
            descent_m: result.elevation.descent_m,
        }
    }
}

impl fmt::Display for RideSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tracks, {:.1} km in {} ({:.1} km/h), +{:.0} m / -{:.0} m",
            self.track_count,
            self.distance_km,
            format_duration(self.moving_seconds),
            self.average_speed_kmh,
            self.ascent_m,
            self.descent_m
        )
    }
}
