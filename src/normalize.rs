//! Track loading and normalization.
//!
//! Turns a raw [`Track`] into a [`NormalizedTrack`]:
//! 1. Drop sentinel points (`|latitude| == 90`, or non-finite coordinates)
//! 2. Discard the track if too few points remain
//! 3. Record the extent of the cleaned points (used for the map viewport)
//! 4. Decimate with a uniform stride
//! 5. Precompute the trig terms every later stage needs

use crate::geo_utils::{compute_bounds, SphericalPoint};
use crate::{AnalysisConfig, Bounds, GpsPoint, Track, TrackPoint};
use log::debug;

/// A track point with its trig terms precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` when the device reported a non-finite elevation
    pub elevation: Option<f64>,
    pub reference_elevation: Option<f64>,
    pub position: SphericalPoint,
}

impl NormalizedPoint {
    fn from_track_point(p: &TrackPoint) -> Self {
        Self {
            time: p.time,
            latitude: p.latitude,
            longitude: p.longitude,
            elevation: Some(p.elevation).filter(|e| e.is_finite()),
            reference_elevation: p.reference_elevation.filter(|e| e.is_finite()),
            position: SphericalPoint::from_degrees(p.latitude, p.longitude),
        }
    }

    pub fn gps_point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A cleaned, possibly decimated track ready for no-go filtering.
#[derive(Debug, Clone)]
pub struct NormalizedTrack {
    pub name: String,
    pub points: Vec<NormalizedPoint>,
    /// Bounding box of all cleaned points before decimation and no-go trimming
    pub extent: Bounds,
}

impl NormalizedTrack {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// True for placeholder coordinates that some devices log before a fix.
#[inline]
pub fn is_sentinel(p: &TrackPoint) -> bool {
    !p.latitude.is_finite() || !p.longitude.is_finite() || p.latitude.abs() == 90.0
}

/// Decimation stride for a request covering `track_count` tracks.
///
/// Requests up to `decimation_track_threshold` tracks keep every point. Larger
/// requests keep every k-th point with `k = max(2, min(max_stride, n/60 + 1))`.
///
/// # Example
///
/// ```rust
/// use cycle_tracks::{AnalysisConfig, normalize::decimation_stride};
///
/// let config = AnalysisConfig::default();
/// assert_eq!(decimation_stride(5, &config), 1);
/// assert_eq!(decimation_stride(25, &config), 2);
/// assert_eq!(decimation_stride(300, &config), 6);
/// assert_eq!(decimation_stride(5000, &config), 10);
/// ```
pub fn decimation_stride(track_count: usize, config: &AnalysisConfig) -> usize {
    if track_count <= config.decimation_track_threshold {
        return 1;
    }
    let max_stride = config.max_decimation_stride.max(2);
    (track_count / 60 + 1).min(max_stride).max(2)
}

/// Normalize one track.
///
/// Returns `None` when fewer than `config.min_track_points` points survive the
/// sentinel filter.
pub fn normalize_track(track: &Track, stride: usize, config: &AnalysisConfig) -> Option<NormalizedTrack> {
    let cleaned: Vec<&TrackPoint> = track.points.iter().filter(|p| !is_sentinel(p)).collect();

    if cleaned.len() < config.min_track_points {
        debug!(
            "[Normalize] Discarding {}: {} usable points (of {})",
            track.name,
            cleaned.len(),
            track.points.len()
        );
        return None;
    }

    let positions: Vec<GpsPoint> = cleaned
        .iter()
        .map(|p| GpsPoint::new(p.latitude, p.longitude))
        .collect();
    let extent = compute_bounds(&positions)?;

    let points: Vec<NormalizedPoint> = cleaned
        .iter()
        .step_by(stride.max(1))
        .map(|p| NormalizedPoint::from_track_point(p))
        .collect();

    Some(NormalizedTrack {
        name: track.name.clone(),
        points,
        extent,
    })
}
