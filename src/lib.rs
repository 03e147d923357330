//! # Cycle Tracks
//!
//! GPS trajectory analysis for a personal cycling log.
//!
//! This library provides:
//! - Track normalization (sentinel removal, decimation for large requests)
//! - Privacy trimming of ride starts and finishes inside no-go areas
//! - Pause- and outlier-aware distance, duration and rolling speed
//! - Cumulative series, ascent/descent and a map viewport over many rides
//! - Labels for the named places a ride passes
//!
//! ## Features
//!
//! - **`parallel`** - Run the per-track stages with rayon
//! - **`json`** - Serde derives on requests and results, plus JSON helpers
//! - **`refresh`** - Background refresh scheduler on tokio
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use cycle_tracks::{analyse_tracks, AnalysisRequest, Track, TrackPoint};
//!
//! // One point per second heading east at 50N
//! let points: Vec<TrackPoint> = (0..60)
//!     .map(|i| TrackPoint::new(1_600_000_000 + i, 50.0, 8.0 + i as f64 * 0.0001, 120.0))
//!     .collect();
//!
//! let request = AnalysisRequest {
//!     tracks: vec![Track::new("2020-09-13_morning.gpx", points)],
//!     ..Default::default()
//! };
//!
//! if let Some(result) = analyse_tracks(&request) {
//!     println!("{}", result.summary());
//!     println!("zoom {} around {:?}", result.viewport.zoom, result.viewport.center);
//! }
//! ```

use log::{debug, info};
use thiserror::Error;

pub mod geo_utils;
pub mod rolling;

// Pipeline stages, in the order a request runs through them
pub mod normalize;
pub mod nogo;
pub mod metrics;
pub mod aggregate;
pub mod places;

pub mod summary;
pub mod timefmt;

// Background refresh of external data sets
#[cfg(feature = "refresh")]
pub mod refresh;

#[cfg(feature = "refresh")]
pub use refresh::{BackgroundRefresher, InstanceLock, RefreshError, RefreshHandle, RefreshSource, RefreshStats};

pub use aggregate::{AggregateSeries, ElevationSummary, Viewport};
pub use metrics::{DerivedPoint, DerivedTrack};
pub use places::PlaceLabel;
pub use summary::RideSummary;
pub use timefmt::{format_duration, parse_duration, DurationParseError};

use geo_utils::compute_bounds;
use metrics::derive_metrics;
use nogo::NoGoFilter;
use normalize::{decimation_stride, normalize_track};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use cycle_tracks::GpsPoint;
/// let point = GpsPoint::new(50.1109, 8.6821); // Frankfurt
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. `None` for empty input.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        compute_bounds(points)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One recorded fix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPoint {
    /// Unix epoch seconds
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Device elevation in metres
    pub elevation: f64,
    /// Elevation looked up from a terrain model, if available
    #[cfg_attr(feature = "json", serde(default))]
    pub reference_elevation: Option<f64>,
}

impl TrackPoint {
    pub fn new(time: i64, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            time,
            latitude,
            longitude,
            elevation,
            reference_elevation: None,
        }
    }

    pub fn with_reference_elevation(mut self, elevation: f64) -> Self {
        self.reference_elevation = Some(elevation);
        self
    }
}

/// Errors building a [`Track`] from raw columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("column {column} has {found} values, expected {expected}")]
    ColumnLengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },
}

/// One recording session, named after its source file.
///
/// Points are in time order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    pub name: String,
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(name: impl Into<String>, points: Vec<TrackPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Build a track from parallel columns as stored on disk.
    ///
    /// # Example
    /// ```
    /// use cycle_tracks::{Track, TrackError};
    ///
    /// let track = Track::from_columns("ride.gpx", &[0, 1], &[50.0, 50.0], &[8.0, 8.001], &[110.0, 111.0], None)?;
    /// assert_eq!(track.end(), Some(1));
    ///
    /// let err = Track::from_columns("bad.gpx", &[0, 1], &[50.0], &[8.0, 8.001], &[110.0, 111.0], None);
    /// assert!(matches!(err, Err(TrackError::ColumnLengthMismatch { column: "latitude", .. })));
    /// # Ok::<(), TrackError>(())
    /// ```
    pub fn from_columns(
        name: &str,
        times: &[i64],
        latitudes: &[f64],
        longitudes: &[f64],
        elevations: &[f64],
        reference_elevations: Option<&[f64]>,
    ) -> Result<Self, TrackError> {
        let expected = times.len();
        let check = |column: &'static str, found: usize| {
            if found == expected {
                Ok(())
            } else {
                Err(TrackError::ColumnLengthMismatch { column, expected, found })
            }
        };
        check("latitude", latitudes.len())?;
        check("longitude", longitudes.len())?;
        check("elevation", elevations.len())?;
        if let Some(reference) = reference_elevations {
            check("reference_elevation", reference.len())?;
        }

        let points = (0..expected)
            .map(|i| TrackPoint {
                time: times[i],
                latitude: latitudes[i],
                longitude: longitudes[i],
                elevation: elevations[i],
                reference_elevation: reference_elevations.map(|r| r[i]),
            })
            .collect();

        Ok(Self::new(name, points))
    }

    /// Time of the first point.
    pub fn start(&self) -> Option<i64> {
        self.points.first().map(|p| p.time)
    }

    /// Time of the last point.
    pub fn end(&self) -> Option<i64> {
        self.points.last().map(|p| p.time)
    }
}

/// A circle around a private location. Ride starts and finishes inside it
/// are removed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct NoGoArea {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl NoGoArea {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            radius_km,
        }
    }
}

/// A named place with the radius within which a ride counts as passing it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl NamedPlace {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            radius_km,
        }
    }
}

/// Tuning parameters for the analysis pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct AnalysisConfig {
    /// Tracks with fewer usable points are discarded.
    /// Default: 20
    pub min_track_points: usize,

    /// Requests with more tracks than this are decimated.
    /// Default: 20
    pub decimation_track_threshold: usize,

    /// Upper bound for the decimation stride.
    /// Default: 10
    pub max_decimation_stride: usize,

    /// Points per chunk when trimming no-go areas.
    /// Default: 10
    pub no_go_chunk_size: usize,

    /// Gaps longer than this (times the stride) are pauses, in seconds.
    /// Default: 30.0
    pub pause_seconds: f64,

    /// Centered window for the duration median used in outlier detection.
    /// Default: 50
    pub outlier_window: usize,

    /// Durations above this multiple of their local median are outliers.
    /// Default: 3.0
    pub outlier_factor: f64,

    /// Gaps separated by fewer valid points are merged.
    /// Default: 10
    pub min_consecutive_points: usize,

    /// Trailing window of the short rolling speed.
    /// Default: 5
    pub short_speed_window: usize,

    /// Trailing window of the long rolling speed.
    /// Default: 50
    pub long_speed_window: usize,

    /// Valid samples a rolling speed window needs.
    /// Default: 3
    pub min_speed_samples: usize,

    /// Centered median window applied to elevation before ascent/descent.
    /// Default: 5
    pub elevation_median_window: usize,

    /// Every n-th series point is checked against named places.
    /// Default: 10
    pub place_sample_step: usize,

    /// Maximum number of place labels per request.
    /// Default: 40
    pub max_place_labels: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_track_points: 20,
            decimation_track_threshold: 20,
            max_decimation_stride: 10,
            no_go_chunk_size: 10,
            pause_seconds: 30.0,
            outlier_window: 50,
            outlier_factor: 3.0,
            min_consecutive_points: 10,
            short_speed_window: 5,
            long_speed_window: 50,
            min_speed_samples: 3,
            elevation_median_window: 5,
            place_sample_step: 10,
            max_place_labels: 40,
        }
    }
}

/// Everything one analysis needs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct AnalysisRequest {
    pub tracks: Vec<Track>,
    pub no_go_areas: Vec<NoGoArea>,
    pub places: Vec<NamedPlace>,
    /// Skip no-go trimming (trusted caller)
    pub bypass_no_go: bool,
    pub config: AnalysisConfig,
}

/// Marker positions of one accepted track.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackPositions {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub positions: Vec<GpsPoint>,
}

/// Output of [`analyse_tracks`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisResult {
    /// Accepted tracks in chronological order
    pub tracks: Vec<TrackPositions>,
    /// Names of tracks dropped for having too few points
    pub discarded: Vec<String>,
    pub viewport: Viewport,
    pub series: AggregateSeries,
    pub elevation: ElevationSummary,
    pub reference_elevation: Option<ElevationSummary>,
    pub place_labels: Vec<PlaceLabel>,
    /// Decimation stride applied to every track
    pub stride: usize,
}

impl AnalysisResult {
    pub fn summary(&self) -> RideSummary {
        RideSummary::from_result(self)
    }
}

#[cfg(feature = "json")]
impl AnalysisRequest {
    /// Parse a request. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(feature = "json")]
impl AnalysisResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// A track after the per-track stages, with its viewport extent.
struct PreparedTrack {
    extent: Bounds,
    derived: DerivedTrack,
}

/// Normalize, trim and derive metrics for one track.
///
/// Returns `None` if the track has too few points before or after
/// decimation and trimming.
fn prepare_track(
    track: &Track,
    stride: usize,
    filter: Option<&NoGoFilter>,
    config: &AnalysisConfig,
) -> Option<PreparedTrack> {
    let mut normalized = normalize_track(track, stride, config)?;

    if let Some(filter) = filter {
        normalized = filter.apply(normalized);
    }

    // Decimation and trimming both shrink the track
    if normalized.len() < config.min_track_points {
        debug!(
            "[CycleTracks] Discarding {}: {} points left after decimation and no-go trimming",
            track.name,
            normalized.len()
        );
        return None;
    }

    Some(PreparedTrack {
        extent: normalized.extent,
        derived: derive_metrics(&normalized, stride, config),
    })
}

fn no_go_filter(request: &AnalysisRequest) -> Option<NoGoFilter> {
    if request.bypass_no_go || request.no_go_areas.is_empty() {
        return None;
    }
    Some(NoGoFilter::new(&request.no_go_areas, request.config.no_go_chunk_size))
}

/// Combine prepared tracks into a result. `None` if nothing survived.
fn assemble(
    request: &AnalysisRequest,
    stride: usize,
    prepared: Vec<Option<PreparedTrack>>,
) -> Option<AnalysisResult> {
    let config = &request.config;

    let mut discarded = Vec::new();
    let mut accepted = Vec::new();
    for (track, outcome) in request.tracks.iter().zip(prepared) {
        match outcome {
            Some(p) => accepted.push(p),
            None => discarded.push(track.name.clone()),
        }
    }

    if accepted.is_empty() {
        info!("[CycleTracks] No usable tracks among {}", request.tracks.len());
        return None;
    }

    accepted.sort_by_key(|p| p.derived.start());

    let viewport = aggregate::compute_viewport(accepted.iter().map(|p| &p.extent))?;
    let derived: Vec<DerivedTrack> = accepted.into_iter().map(|p| p.derived).collect();

    let series = aggregate::aggregate_tracks(&derived);
    let window = config.elevation_median_window;
    let elevation = aggregate::elevation_change(&derived, window, |p| p.elevation).unwrap_or_default();
    let reference_elevation = aggregate::elevation_change(&derived, window, |p| p.reference_elevation);
    let place_labels = places::annotate(&series, &request.places, config);

    let tracks = derived
        .iter()
        .filter_map(|t| {
            Some(TrackPositions {
                name: t.name.clone(),
                start: t.start()?,
                end: t.end()?,
                positions: t.points.iter().map(|p| p.gps_point()).collect(),
            })
        })
        .collect();

    info!(
        "[CycleTracks] {} tracks ({} discarded, stride {}): {:.1} km, {} points",
        derived.len(),
        discarded.len(),
        stride,
        series.total_distance(),
        series.len()
    );

    Some(AnalysisResult {
        tracks,
        discarded,
        viewport,
        series,
        elevation,
        reference_elevation,
        place_labels,
        stride,
    })
}

/// Run the full pipeline over a request.
///
/// normalize → no-go trim → metrics → sort by start → aggregate → annotate.
///
/// Returns `None` for an empty request or when no track has enough points.
///
/// # Example
/// ```
/// use cycle_tracks::{analyse_tracks, AnalysisRequest};
///
/// assert!(analyse_tracks(&AnalysisRequest::default()).is_none());
/// ```
pub fn analyse_tracks(request: &AnalysisRequest) -> Option<AnalysisResult> {
    if request.tracks.is_empty() {
        return None;
    }

    let stride = decimation_stride(request.tracks.len(), &request.config);
    let filter = no_go_filter(request);

    let prepared: Vec<Option<PreparedTrack>> = request
        .tracks
        .iter()
        .map(|t| prepare_track(t, stride, filter.as_ref(), &request.config))
        .collect();

    assemble(request, stride, prepared)
}

/// Same as [`analyse_tracks`], with the per-track stages run on rayon.
///
/// Recommended for multi-year requests (hundreds of tracks). The result is
/// identical to the sequential version.
#[cfg(feature = "parallel")]
pub fn analyse_tracks_parallel(request: &AnalysisRequest) -> Option<AnalysisResult> {
    use rayon::prelude::*;

    if request.tracks.is_empty() {
        return None;
    }

    let stride = decimation_stride(request.tracks.len(), &request.config);
    let filter = no_go_filter(request);

    let prepared: Vec<Option<PreparedTrack>> = request
        .tracks
        .par_iter()
        .map(|t| prepare_track(t, stride, filter.as_ref(), &request.config))
        .collect();

    assemble(request, stride, prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::KM_PER_DEGREE;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// `n` points one second apart heading east from (lat, lon).
    fn eastward(name: &str, start: i64, n: usize, lat: f64, lon: f64, step_deg: f64) -> Track {
        let points = (0..n)
            .map(|i| TrackPoint::new(start + i as i64, lat, lon + i as f64 * step_deg, 100.0))
            .collect();
        Track::new(name, points)
    }

    fn request(tracks: Vec<Track>) -> AnalysisRequest {
        AnalysisRequest {
            tracks,
            ..Default::default()
        }
    }

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(50.1109, 8.6821).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_track_from_columns() {
        let track = Track::from_columns(
            "ride.gpx",
            &[10, 11, 12],
            &[50.0, 50.1, 50.2],
            &[8.0, 8.1, 8.2],
            &[100.0, 101.0, 102.0],
            Some(&[99.0, 100.0, 101.0]),
        )
        .unwrap();

        assert_eq!(track.start(), Some(10));
        assert_eq!(track.end(), Some(12));
        assert_eq!(track.points[1].reference_elevation, Some(100.0));

        let err = Track::from_columns("x", &[1, 2], &[50.0, 50.0], &[8.0, 8.0], &[1.0, 2.0], Some(&[1.0]));
        assert_eq!(
            err,
            Err(TrackError::ColumnLengthMismatch {
                column: "reference_elevation",
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_empty_request() {
        assert!(analyse_tracks(&AnalysisRequest::default()).is_none());
    }

    #[test]
    fn test_only_short_tracks() {
        let result = analyse_tracks(&request(vec![eastward("short.gpx", 0, 10, 50.0, 8.0, 0.001)]));
        assert!(result.is_none());
    }

    #[test]
    fn test_one_degree_of_longitude() {
        // 25 points, 1 s apart, covering 1 degree of longitude at 50N
        let track = eastward("long.gpx", 1_000, 25, 50.0, 8.0, 1.0 / 24.0);
        let result = analyse_tracks(&request(vec![track])).unwrap();

        let expected_km = KM_PER_DEGREE * 50f64.to_radians().cos();
        assert!(approx_eq(expected_km, 71.5, 0.1));

        let total = result.series.total_distance();
        assert!(approx_eq(total, expected_km, 0.01), "got {total}");
        assert_eq!(result.series.total_duration(), 24.0);
        assert!(approx_eq(result.series.average_speed(), total / 24.0 * 3600.0, 1e-9));

        assert_eq!(result.stride, 1);
        assert_eq!(result.tracks.len(), 1);
        assert_eq!(result.tracks[0].positions.len(), 25);
        assert_eq!(result.elevation, ElevationSummary::default());
        assert!(result.reference_elevation.is_none());
    }

    #[test]
    fn test_tracks_sorted_chronologically() {
        let late = eastward("late.gpx", 50_000, 30, 50.0, 8.0, 0.0002);
        let early = eastward("early.gpx", 10_000, 30, 50.1, 8.0, 0.0002);
        let short = eastward("short.gpx", 0, 5, 50.0, 8.0, 0.0002);

        let result = analyse_tracks(&request(vec![late, short, early])).unwrap();
        let names: Vec<&str> = result.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["early.gpx", "late.gpx"]);
        assert_eq!(result.discarded, vec!["short.gpx".to_string()]);

        assert!(result.series.times.windows(2).all(|w| w[1] > w[0]));
        assert!(result
            .series
            .cumulative_distance
            .windows(2)
            .all(|w| w[1] >= w[0]));

        // Viewport spans both rides
        assert!(approx_eq(result.viewport.center.latitude, 50.05, 1e-9));
    }

    #[test]
    fn test_large_requests_are_decimated() {
        let tracks: Vec<Track> = (0..25)
            .map(|k| eastward(&format!("t{k}.gpx"), k * 10_000, 100, 50.0, 8.0, 0.0001))
            .collect();
        let result = analyse_tracks(&request(tracks.clone())).unwrap();

        assert_eq!(result.stride, 2);
        assert_eq!(result.series.len(), 25 * 50);
        assert!(result.tracks.iter().all(|t| t.positions.len() == 50));

        // The same tracks in a small request keep every point
        let single = analyse_tracks(&request(tracks[..1].to_vec())).unwrap();
        assert_eq!(single.series.len(), 100);
    }

    #[test]
    fn test_no_go_trimming_and_bypass() {
        // Starts at home and rides away
        let track = eastward("home.gpx", 0, 60, 50.0, 8.0, 0.0016);
        let mut req = request(vec![track]);
        req.no_go_areas = vec![NoGoArea::new("home", 50.0, 8.0, 0.5)];

        let trimmed = analyse_tracks(&req).unwrap();
        let first = trimmed.tracks[0].positions[0];
        assert!(geo_utils::great_circle_distance(50.0, 8.0, first.latitude, first.longitude) >= 0.5);
        assert_eq!(trimmed.tracks[0].positions.len(), 50);

        req.bypass_no_go = true;
        let full = analyse_tracks(&req).unwrap();
        assert_eq!(full.tracks[0].positions.len(), 60);

        // The viewport ignores trimming either way
        assert_eq!(trimmed.viewport, full.viewport);
    }

    #[test]
    fn test_minimum_length_applies_after_decimation() {
        // 30 points each, 15 after stride 2
        let tracks: Vec<Track> = (0..25)
            .map(|k| eastward(&format!("t{k}.gpx"), k * 10_000, 30, 50.0, 8.0, 0.0001))
            .collect();
        let mut req = request(tracks);
        assert!(analyse_tracks(&req).is_none());

        // An unrelated no-go area, trimming nothing, gives the same answer
        req.no_go_areas = vec![NoGoArea::new("far", -30.0, 100.0, 1.0)];
        assert!(analyse_tracks(&req).is_none());

        req.bypass_no_go = true;
        assert!(analyse_tracks(&req).is_none());

        // Long enough tracks among them survive either way
        req.tracks[3] = eastward("long.gpx", 30_000, 60, 50.0, 8.0, 0.0001);
        for bypass in [false, true] {
            req.bypass_no_go = bypass;
            let result = analyse_tracks(&req).unwrap();
            assert_eq!(result.stride, 2);
            assert_eq!(result.tracks.len(), 1);
            assert_eq!(result.tracks[0].positions.len(), 30);
            assert_eq!(result.discarded.len(), 24);
        }
    }

    #[test]
    fn test_track_emptied_by_no_go_is_discarded() {
        let mut req = request(vec![eastward("home.gpx", 0, 30, 50.0, 8.0, 0.00001)]);
        req.no_go_areas = vec![NoGoArea::new("home", 50.0, 8.0, 1.0)];
        assert!(analyse_tracks(&req).is_none());
    }

    #[test]
    fn test_place_labels_and_reference_elevation() {
        let points: Vec<TrackPoint> = (0..100)
            .map(|i| {
                TrackPoint::new(i, 50.0, 8.0 + i as f64 * 0.0014, 100.0 + i as f64)
                    .with_reference_elevation(90.0 + i as f64)
            })
            .collect();
        let mut req = request(vec![Track::new("climb.gpx", points)]);
        req.places = vec![NamedPlace::new("Dorf", 50.0, 8.07, 0.5)];

        let result = analyse_tracks(&req).unwrap();
        assert_eq!(result.place_labels.len(), 1);
        assert_eq!(result.place_labels[0].name, "Dorf");

        // 100 -> 199 m smoothed at both ends
        assert!(approx_eq(result.elevation.ascent_m, 97.0, 1e-9));
        assert_eq!(result.elevation.descent_m, 0.0);
        let reference = result.reference_elevation.unwrap();
        assert!(approx_eq(reference.ascent_m, 97.0, 1e-9));
    }

    #[test]
    fn test_summary() {
        let track = eastward("ride.gpx", 0, 3601, 50.0, 8.0, 0.0001);
        let summary = analyse_tracks(&request(vec![track])).unwrap().summary();
        assert_eq!(summary.track_count, 1);
        assert_eq!(summary.moving_seconds, 3600);
        assert!(summary.to_string().contains("01:00:00"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let tracks: Vec<Track> = (0..30)
            .map(|k| eastward(&format!("t{k}.gpx"), (30 - k) * 10_000, 80, 50.0 + k as f64 * 0.01, 8.0, 0.0001))
            .collect();
        let req = request(tracks);
        assert_eq!(analyse_tracks(&req), analyse_tracks_parallel(&req));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_request_defaults() {
        let json = r#"{
            "tracks": [{"name": "a.gpx", "points": [
                {"time": 0, "latitude": 50.0, "longitude": 8.0, "elevation": 100.0}
            ]}],
            "config": {"max_place_labels": 5}
        }"#;
        let req = AnalysisRequest::from_json(json).unwrap();
        assert_eq!(req.tracks[0].points[0].reference_elevation, None);
        assert!(!req.bypass_no_go);
        assert_eq!(req.config.max_place_labels, 5);
        assert_eq!(req.config.min_track_points, 20);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_result_roundtrip() {
        let track = eastward("ride.gpx", 0, 40, 50.0, 8.0, 0.0001);
        let result = analyse_tracks(&request(vec![track])).unwrap();
        let json = result.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stride"], 1);
        assert_eq!(value["tracks"][0]["name"], "ride.gpx");
    }
}
