//! # Aggregation
//!
//! Combines the derived tracks of one request into the series that get
//! plotted, plus the summary values shown next to them:
//!
//! - [`AggregateSeries`]: valid points of all tracks with cumulative distance,
//!   duration and speed
//! - [`ElevationSummary`]: ascent/descent from a rolling median of elevation
//! - [`Viewport`]: map center and zoom level

use crate::geo_utils::union_bounds;
use crate::metrics::{DerivedPoint, DerivedTrack};
use crate::rolling::rolling_median_centered;
use crate::{Bounds, GpsPoint};

/// Largest zoom level a viewport reports.
pub const MAX_ZOOM: u8 = 18;

/// Column-oriented series over the valid points of all tracks, in order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregateSeries {
    pub times: Vec<i64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub elevation: Vec<Option<f64>>,
    pub reference_elevation: Vec<Option<f64>>,
    /// km since the previous point
    pub distance: Vec<f64>,
    /// Seconds since the previous point
    pub duration: Vec<f64>,
    pub rolling_speed_5: Vec<Option<f64>>,
    pub rolling_speed_50: Vec<Option<f64>>,
    pub cumulative_distance: Vec<f64>,
    pub cumulative_duration: Vec<f64>,
    /// km/h, `0.0` while no time has accumulated
    pub cumulative_speed: Vec<f64>,
    /// Index into the request's accepted tracks for every point
    pub track_index: Vec<usize>,
}

impl AggregateSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Total distance in km.
    pub fn total_distance(&self) -> f64 {
        self.cumulative_distance.last().copied().unwrap_or(0.0)
    }

    /// Total moving time in seconds.
    pub fn total_duration(&self) -> f64 {
        self.cumulative_duration.last().copied().unwrap_or(0.0)
    }

    /// Average speed over the whole series in km/h.
    pub fn average_speed(&self) -> f64 {
        self.cumulative_speed.last().copied().unwrap_or(0.0)
    }

    fn push(&mut self, track_index: usize, p: &DerivedPoint, distance: f64, duration: f64) {
        let cum_dist = self.total_distance() + distance;
        let cum_dur = self.total_duration() + duration;

        self.times.push(p.time);
        self.latitudes.push(p.latitude);
        self.longitudes.push(p.longitude);
        self.elevation.push(p.elevation);
        self.reference_elevation.push(p.reference_elevation);
        self.distance.push(distance);
        self.duration.push(duration);
        self.rolling_speed_5.push(p.rolling_speed_5);
        self.rolling_speed_50.push(p.rolling_speed_50);
        self.cumulative_distance.push(cum_dist);
        self.cumulative_duration.push(cum_dur);
        self.cumulative_speed.push(if cum_dur > 0.0 { cum_dist / cum_dur * 3600.0 } else { 0.0 });
        self.track_index.push(track_index);
    }
}

/// Total climb and drop in metres. Both are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevationSummary {
    pub ascent_m: f64,
    pub descent_m: f64,
}

/// Map center and zoom level covering every track of a request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub center: GpsPoint,
    pub zoom: u8,
    pub bounds: Bounds,
}

/// Concatenate the valid points of chronologically ordered tracks.
pub fn aggregate_tracks(tracks: &[DerivedTrack]) -> AggregateSeries {
    let mut series = AggregateSeries::default();

    for (index, track) in tracks.iter().enumerate() {
        for p in track.points.iter() {
            if let (Some(duration), Some(distance)) = (p.duration, p.distance) {
                series.push(index, p, distance, duration);
            }
        }
    }

    series
}

/// Ascent and descent over all tracks.
///
/// Each track's elevation is smoothed with a centered rolling median of
/// `window` points before taking first differences. Tracks are handled one
/// by one, so the step between the end of one ride and the start of the next
/// is not counted. Returns `None` if no track has two elevation samples.
pub fn elevation_change<F>(tracks: &[DerivedTrack], window: usize, elevation_of: F) -> Option<ElevationSummary>
where
    F: Fn(&DerivedPoint) -> Option<f64>,
{
    let mut summary = ElevationSummary::default();
    let mut any = false;

    for track in tracks {
        let elevations: Vec<Option<f64>> = track.valid_points().map(&elevation_of).collect();
        let smoothed: Vec<f64> = rolling_median_centered(&elevations, window, 1)
            .into_iter()
            .flatten()
            .collect();

        if smoothed.len() < 2 {
            continue;
        }
        any = true;

        for w in smoothed.windows(2) {
            let diff = w[1] - w[0];
            if diff > 0.0 {
                summary.ascent_m += diff;
            } else {
                summary.descent_m -= diff;
            }
        }
    }

    any.then_some(summary)
}

/// Viewport covering all of the given track extents.
pub fn compute_viewport<'a>(extents: impl IntoIterator<Item = &'a Bounds>) -> Option<Viewport> {
    let bounds = union_bounds(extents)?;
    Some(Viewport {
        center: bounds.center(),
        zoom: zoom_level(&bounds),
        bounds,
    })
}

/// Empirical tile zoom level for a bounding box.
///
/// `round(-3.2 · log10(max(Δlat, Δlon · sin(center_lat))) + 8.9)`, clamped
/// to `0..=MAX_ZOOM`. The constants were fitted by eye against a tile provider
/// and are a heuristic, not geometry. A single-point extent gets `MAX_ZOOM`.
pub fn zoom_level(bounds: &Bounds) -> u8 {
    let center_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
    let d_lat = bounds.max_lat - bounds.min_lat;
    let d_lng = bounds.max_lng - bounds.min_lng;
    let extent = d_lat.max(d_lng * center_lat.to_radians().sin());

    if !(extent > 0.0) {
        return MAX_ZOOM;
    }

    let zoom = (-3.2 * extent.log10() + 8.9).round();
    zoom.clamp(0.0, MAX_ZOOM as f64) as u8
}
