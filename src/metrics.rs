//! # Per-Track Derived Metrics
//!
//! Computes duration, distance and rolling speed for every point of a
//! normalized (and no-go trimmed) track.
//!
//! Consumer GPS logs contain sleep/resume gaps and jitter while standing
//! still. Summing raw distances would count that jitter as riding, so
//! suspicious intervals are marked missing and excluded from every sum:
//!
//! 1. `duration[i] = time[i] - time[i-1]`, `duration[0] = 0`
//! 2. Durations longer than `pause_seconds × stride` are pauses
//! 3. Durations above `outlier_factor ×` their centered rolling median are outliers
//! 4. Missing runs near either end are extended to the boundary, and gaps
//!    separated by fewer than `min_consecutive_points` valid points are merged
//! 5. Elevation is dropped wherever duration is missing
//! 6. `distance[i]` is the great-circle distance to the previous point
//! 7. Rolling speeds over trailing windows of 5 and 50 points

use crate::geo_utils::distance_km;
use crate::normalize::NormalizedTrack;
use crate::rolling::{rolling_median_centered, rolling_sum_trailing};
use crate::{AnalysisConfig, GpsPoint};

/// One point of a track with its derived fields.
///
/// `duration` and `distance` are `None` for points inside a pause or outlier
/// region. Both are `Some(0.0)` on the first point of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPoint {
    pub time: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub reference_elevation: Option<f64>,
    /// Seconds since the previous point
    pub duration: Option<f64>,
    /// Kilometres since the previous point
    pub distance: Option<f64>,
    /// km/h over the trailing short window
    pub rolling_speed_5: Option<f64>,
    /// km/h over the trailing long window
    pub rolling_speed_50: Option<f64>,
}

impl DerivedPoint {
    /// A point takes part in aggregation only if its duration survived filtering.
    pub fn is_valid(&self) -> bool {
        self.duration.is_some()
    }

    pub fn gps_point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A track after the derived-metric pipeline.
#[derive(Debug, Clone)]
pub struct DerivedTrack {
    pub name: String,
    pub points: Vec<DerivedPoint>,
}

impl DerivedTrack {
    /// Time of the first point.
    pub fn start(&self) -> Option<i64> {
        self.points.first().map(|p| p.time)
    }

    /// Time of the last point.
    pub fn end(&self) -> Option<i64> {
        self.points.last().map(|p| p.time)
    }

    pub fn valid_points(&self) -> impl Iterator<Item = &DerivedPoint> {
        self.points.iter().filter(|p| p.is_valid())
    }
}

/// Run the full pipeline over one track.
pub fn derive_metrics(track: &NormalizedTrack, stride: usize, config: &AnalysisConfig) -> DerivedTrack {
    let times: Vec<i64> = track.points.iter().map(|p| p.time).collect();

    let mut durations = point_durations(&times);
    suppress_pauses(&mut durations, config.pause_seconds * stride.max(1) as f64);
    suppress_outliers(&mut durations, config.outlier_window, config.outlier_factor);
    merge_gaps(&mut durations, config.min_consecutive_points);

    let distances: Vec<Option<f64>> = track
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            durations[i]?;
            if i == 0 {
                return Some(0.0);
            }
            Some(distance_km(&track.points[i - 1].position, &p.position))
        })
        .collect();

    let speed_short = rolling_speed(&distances, &durations, config.short_speed_window, config.min_speed_samples);
    let speed_long = rolling_speed(&distances, &durations, config.long_speed_window, config.min_speed_samples);

    let points = track
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let valid = durations[i].is_some();
            DerivedPoint {
                time: p.time,
                latitude: p.latitude,
                longitude: p.longitude,
                elevation: p.elevation.filter(|_| valid),
                reference_elevation: p.reference_elevation.filter(|_| valid),
                duration: durations[i],
                distance: distances[i],
                rolling_speed_5: speed_short[i],
                rolling_speed_50: speed_long[i],
            }
        })
        .collect();

    DerivedTrack {
        name: track.name.clone(),
        points,
    }
}

/// Seconds since the previous point, with `0` for the first point.
pub fn point_durations(times: &[i64]) -> Vec<Option<f64>> {
    let mut durations = Vec::with_capacity(times.len());
    if let Some(&first) = times.first() {
        durations.push(Some(0.0));
        let mut prev = first;
        for &t in &times[1..] {
            durations.push(Some((t - prev) as f64));
            prev = t;
        }
    }
    durations
}

/// Mark every duration longer than `paused_after` seconds as missing.
pub fn suppress_pauses(durations: &mut [Option<f64>], paused_after: f64) {
    for d in durations.iter_mut() {
        if matches!(d, Some(v) if *v > paused_after) {
            *d = None;
        }
    }
}

/// Mark durations above `factor ×` their centered rolling median as missing.
///
/// The median needs 10% of `window` valid samples. Without it the duration is kept.
pub fn suppress_outliers(durations: &mut [Option<f64>], window: usize, factor: f64) {
    let min_periods = (window / 10).max(1);
    let medians = rolling_median_centered(durations, window, min_periods);

    for (d, median) in durations.iter_mut().zip(medians) {
        if let (Some(v), Some(m)) = (*d, median) {
            if v > factor * m {
                *d = None;
            }
        }
    }
}

/// Merge missing regions that are separated by fewer than `min_consecutive`
/// valid points, and extend missing regions that start or end that close to a
/// track boundary all the way to the boundary.
pub fn merge_gaps(durations: &mut [Option<f64>], min_consecutive: usize) {
    let n = durations.len();
    let gaps: Vec<usize> = durations
        .iter()
        .enumerate()
        .filter(|(_, d)| d.is_none())
        .map(|(i, _)| i)
        .collect();
    if gaps.is_empty() {
        return;
    }

    // The track boundaries behave like gaps just outside the track
    let mut prev: Option<usize> = None;
    for gap in gaps.iter().copied().map(Some).chain(std::iter::once(None)) {
        let from = prev.map_or(0, |p| p + 1);
        let to = gap.unwrap_or(n);
        let valid_between = to - from;

        if valid_between > 0 && valid_between < min_consecutive {
            for d in &mut durations[from..to] {
                *d = None;
            }
        }
        prev = gap;
    }
}

/// Rolling speed in km/h: Σdistance / Σduration × 3600 over a trailing window.
fn rolling_speed(
    distances: &[Option<f64>],
    durations: &[Option<f64>],
    window: usize,
    min_samples: usize,
) -> Vec<Option<f64>> {
    let dist_sums = rolling_sum_trailing(distances, window, min_samples);
    let dur_sums = rolling_sum_trailing(durations, window, min_samples);

    dist_sums
        .into_iter()
        .zip(dur_sums)
        .map(|(dist, dur)| match (dist, dur) {
            (Some(km), Some(s)) if s > 0.0 => Some(km / s * 3600.0),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_track;
    use crate::{Track, TrackPoint};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// `n` points heading east at 50N, one every `dt` seconds, ~10 m apart.
    fn synthetic_track(n: usize, dt: i64) -> Track {
        Track {
            name: "synthetic".to_string(),
            points: (0..n)
                .map(|i| TrackPoint::new(i as i64 * dt, 50.0, 8.0 + i as f64 * 0.00014, 100.0 + i as f64))
                .collect(),
        }
    }

    fn derive(track: &Track) -> DerivedTrack {
        let config = AnalysisConfig::default();
        let normalized = normalize_track(track, 1, &config).unwrap();
        derive_metrics(&normalized, 1, &config)
    }

    #[test]
    fn test_point_durations() {
        assert_eq!(point_durations(&[]), vec![]);
        assert_eq!(
            point_durations(&[10, 11, 13, 20]),
            vec![Some(0.0), Some(1.0), Some(2.0), Some(7.0)]
        );
    }

    #[test]
    fn test_suppress_pauses() {
        let mut d = vec![Some(0.0), Some(30.0), Some(31.0), Some(5.0)];
        suppress_pauses(&mut d, 30.0);
        assert_eq!(d, vec![Some(0.0), Some(30.0), None, Some(5.0)]);
    }

    #[test]
    fn test_suppress_outliers_adapts_to_local_rate() {
        // 1 Hz for the first half, 5 s interval for the second half
        let mut d: Vec<Option<f64>> = (0..100).map(|i| Some(if i < 50 { 1.0 } else { 5.0 })).collect();
        d[20] = Some(4.0); // 4x local median
        d[80] = Some(12.0); // 2.4x local median
        suppress_outliers(&mut d, 50, 3.0);

        assert_eq!(d[20], None);
        assert_eq!(d[80], Some(12.0));
        assert_eq!(d.iter().filter(|v| v.is_none()).count(), 1);
    }

    #[test]
    fn test_merge_gaps_between_close_gaps() {
        let mut d: Vec<Option<f64>> = vec![Some(1.0); 60];
        d[30] = None;
        d[35] = None;
        merge_gaps(&mut d, 10);

        assert!((30..=35).all(|i| d[i].is_none()));
        assert_eq!(d.iter().filter(|v| v.is_none()).count(), 6);
    }

    #[test]
    fn test_merge_gaps_extends_to_boundaries() {
        let mut d: Vec<Option<f64>> = vec![Some(1.0); 60];
        d[4] = None;
        d[52] = None;
        merge_gaps(&mut d, 10);

        assert!((0..=4).all(|i| d[i].is_none()));
        assert!((52..60).all(|i| d[i].is_none()));
        assert!((5..52).all(|i| d[i].is_some()));
    }

    #[test]
    fn test_merge_gaps_leaves_isolated_gap() {
        let mut d: Vec<Option<f64>> = vec![Some(1.0); 60];
        d[30] = None;
        merge_gaps(&mut d, 10);
        assert_eq!(d.iter().filter(|v| v.is_none()).count(), 1);
    }

    #[test]
    fn test_single_pause_marked_exactly_once() {
        let mut track = synthetic_track(60, 1);
        // A 10 minute stop before point 30
        for p in track.points.iter_mut().skip(30) {
            p.time += 600;
        }

        let derived = derive(&track);

        for (i, p) in derived.points.iter().enumerate() {
            if i == 30 {
                assert_eq!(p.duration, None);
                assert_eq!(p.distance, None);
                assert_eq!(p.elevation, None);
            } else {
                assert!(p.duration.is_some(), "duration missing at {}", i);
                assert!(p.distance.is_some(), "distance missing at {}", i);
            }
        }

        // Rolling speeds spanning the pause only sum the moving samples
        let step_km = derived.points[1].distance.unwrap();
        let expected = step_km * 3600.0;
        for i in 31..35 {
            let speed = derived.points[i].rolling_speed_5.unwrap();
            assert!(approx_eq(speed, expected, expected * 1e-3), "speed {} at {}", speed, i);
        }
        let long = derived.points[59].rolling_speed_50.unwrap();
        assert!(approx_eq(long, expected, expected * 1e-3));
    }

    #[test]
    fn test_rolling_speed_needs_three_samples() {
        let derived = derive(&synthetic_track(30, 1));

        // The first point has zero duration, so speeds start at index 2
        assert_eq!(derived.points[0].rolling_speed_5, None);
        assert_eq!(derived.points[1].rolling_speed_5, None);
        assert!(derived.points[2].rolling_speed_5.is_some());
        assert!(derived.points[2].rolling_speed_50.is_some());
    }

    #[test]
    fn test_first_point_conventions() {
        let derived = derive(&synthetic_track(30, 2));
        assert_eq!(derived.points[0].duration, Some(0.0));
        assert_eq!(derived.points[0].distance, Some(0.0));
        assert_eq!(derived.start(), Some(0));
        assert_eq!(derived.end(), Some(58));
        assert_eq!(derived.valid_points().count(), 30);
    }

    #[test]
    fn test_pause_threshold_scales_with_stride() {
        let config = AnalysisConfig::default();
        // 40 s between points: a pause at stride 1 but not at stride 2
        let track = synthetic_track(40, 40);
        let normalized = normalize_track(&track, 1, &config).unwrap();

        let strided = derive_metrics(&normalized, 2, &config);
        assert_eq!(strided.valid_points().count(), 40);

        let unstrided = derive_metrics(&normalized, 1, &config);
        assert_eq!(unstrided.valid_points().count(), 0);
    }
}
