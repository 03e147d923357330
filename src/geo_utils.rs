//! # Geographic Utilities
//!
//! Geodesic primitives shared by every stage of the track analysis.
//!
//! All great-circle math uses the spherical law of cosines on a sphere of radius
//! [`EARTH_RADIUS_KM`], and all distances are in kilometres. Hot loops work on
//! [`SphericalPoint`]s, which carry `sin(lat)`, `cos(lat)` and the longitude in
//! radians so each point is converted exactly once.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`great_circle_distance`] | Distance in km between two lat/lon pairs given in degrees |
//! | [`central_angle`] | Angle in radians between two precomputed points |
//! | [`angular_radius`] | Convert a radius in km to radians for containment tests |
//! | [`compute_bounds`] | Bounding box of a set of GPS points |
//! | [`km_to_degrees`] | Convert km to approximate degrees at a latitude |
//!
//! ## Example
//!
//! ```rust
//! use cycle_tracks::geo_utils;
//!
//! // One degree of longitude along the 50th parallel
//! let d = geo_utils::great_circle_distance(50.0, 8.0, 50.0, 9.0);
//! assert!((d - 71.47).abs() < 0.1);
//!
//! // Identical points are exactly zero apart
//! assert_eq!(geo_utils::great_circle_distance(50.0, 8.0, 50.0, 8.0), 0.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! The law of cosines loses precision for points a few metres apart and its
//! `acos` argument can leave `[-1, 1]` by rounding error when two points
//! coincide. The argument is clamped, so coincident points give `0.0` instead
//! of `NaN`.

use geo::{BoundingRect, MultiPoint, Point};
use crate::{GpsPoint, Bounds};

/// Mean Earth radius in kilometres used by every geodesic computation.
pub const EARTH_RADIUS_KM: f64 = 6371.009;

/// Kilometres spanned by one degree of latitude on the [`EARTH_RADIUS_KM`] sphere.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

// =============================================================================
// Precomputed Points
// =============================================================================

/// A position with its trigonometric terms precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalPoint {
    pub sin_lat: f64,
    pub cos_lat: f64,
    pub lon_rad: f64,
}

impl SphericalPoint {
    /// Precompute the trig terms for a latitude/longitude given in degrees.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        let lat_rad = latitude.to_radians();
        Self {
            sin_lat: lat_rad.sin(),
            cos_lat: lat_rad.cos(),
            lon_rad: longitude.to_radians(),
        }
    }
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Central angle in radians between two precomputed points.
///
/// The `acos` argument is clamped to `[-1, 1]`.
#[inline]
pub fn central_angle(a: &SphericalPoint, b: &SphericalPoint) -> f64 {
    if a == b {
        return 0.0;
    }
    let cos_angle = a.sin_lat * b.sin_lat + a.cos_lat * b.cos_lat * (a.lon_rad - b.lon_rad).cos();
    cos_angle.clamp(-1.0, 1.0).acos()
}

/// Great-circle distance in kilometres between two precomputed points.
#[inline]
pub fn distance_km(a: &SphericalPoint, b: &SphericalPoint) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_KM
}

/// Calculate the great-circle distance between two positions using the
/// spherical law of cosines.
///
/// # Arguments
///
/// * `lat1`, `lon1` - First position in degrees
/// * `lat2`, `lon2` - Second position in degrees
///
/// # Returns
///
/// Distance in kilometres along the surface of a sphere with radius
/// [`EARTH_RADIUS_KM`].
///
/// # Example
///
/// ```rust
/// use cycle_tracks::geo_utils::{great_circle_distance, EARTH_RADIUS_KM};
///
/// // Antipodal points are half the circumference apart
/// let d = great_circle_distance(0.0, 0.0, 0.0, 180.0);
/// assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
/// ```
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance_km(
        &SphericalPoint::from_degrees(lat1, lon1),
        &SphericalPoint::from_degrees(lat2, lon2),
    )
}

/// Convert a radius in kilometres into an angle in radians.
///
/// Comparing [`central_angle`] against this avoids a multiplication per point
/// in containment tests.
#[inline]
pub fn angular_radius(radius_km: f64) -> f64 {
    radius_km / EARTH_RADIUS_KM
}

/// Convert kilometres to approximate degrees of longitude at a latitude.
///
/// Degrees of longitude shrink with `cos(latitude)`, so this is never smaller
/// than the equivalent in degrees of latitude. That makes it safe to use for
/// square search envelopes. Close to the poles the value saturates at 180°.
#[inline]
pub fn km_to_degrees(km: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().abs();
    if cos_lat < 1e-6 {
        return 180.0;
    }
    (km / (KM_PER_DEGREE * cos_lat)).min(180.0)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a set of GPS points.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use cycle_tracks::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect();
    let rect = multi.bounding_rect()?;

    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Smallest box enclosing all of the given boxes. `None` for empty input.
pub fn union_bounds<'a>(bounds: impl IntoIterator<Item = &'a Bounds>) -> Option<Bounds> {
    bounds.into_iter().fold(None, |acc: Option<Bounds>, b| {
        Some(match acc {
            None => *b,
            Some(a) => Bounds {
                min_lat: a.min_lat.min(b.min_lat),
                max_lat: a.max_lat.max(b.max_lat),
                min_lng: a.min_lng.min(b.min_lng),
                max_lng: a.max_lng.max(b.max_lng),
            },
        })
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
