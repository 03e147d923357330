//! # No-Go Filtering
//!
//! Hides the start and finish of a ride when they lie inside a private area
//! (typically around home).
//!
//! ## Algorithm
//! 1. Split the track into chunks of `chunk_size` points, starting at the first point
//! 2. Walk forward: drop every chunk that has at least one point inside any zone
//! 3. Stop at the first chunk with no point inside a zone
//! 4. Repeat from the last point walking backwards over what is left
//!
//! Only a prefix and a suffix are ever removed. A ride that passes through a
//! zone halfway keeps those points. Because whole chunks are dropped, up to
//! `chunk_size - 1` points outside any zone can be removed with their chunk.

use std::ops::Range;

use crate::geo_utils::{angular_radius, central_angle, SphericalPoint};
use crate::normalize::{NormalizedPoint, NormalizedTrack};
use crate::NoGoArea;
use log::debug;

/// A [`NoGoArea`] prepared for containment tests.
#[derive(Debug, Clone, Copy)]
pub struct NoGoZone {
    center: SphericalPoint,
    angular_radius: f64,
}

impl NoGoZone {
    pub fn from_area(area: &NoGoArea) -> Self {
        Self {
            center: SphericalPoint::from_degrees(area.latitude, area.longitude),
            angular_radius: angular_radius(area.radius_km),
        }
    }

    /// True if the point lies strictly inside the zone.
    #[inline]
    pub fn contains(&self, p: &SphericalPoint) -> bool {
        central_angle(&self.center, p) < self.angular_radius
    }
}

/// Chunked head/tail filter over a set of zones.
#[derive(Debug, Clone)]
pub struct NoGoFilter {
    zones: Vec<NoGoZone>,
    chunk_size: usize,
}

impl NoGoFilter {
    pub fn new(areas: &[NoGoArea], chunk_size: usize) -> Self {
        Self {
            zones: areas.iter().map(NoGoZone::from_area).collect(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[inline]
    pub fn in_any_zone(&self, p: &SphericalPoint) -> bool {
        self.zones.iter().any(|z| z.contains(p))
    }

    fn chunk_excluded(&self, chunk: &[NormalizedPoint]) -> bool {
        chunk.iter().any(|p| self.in_any_zone(&p.position))
    }

    /// Index range of the points that survive head and tail trimming.
    ///
    /// The range is empty when every chunk touches a zone.
    pub fn retained_range(&self, points: &[NormalizedPoint]) -> Range<usize> {
        if self.zones.is_empty() {
            return 0..points.len();
        }

        let mut start = 0;
        for chunk in points.chunks(self.chunk_size) {
            if !self.chunk_excluded(chunk) {
                break;
            }
            start += chunk.len();
        }

        let mut end = points.len();
        for chunk in points[start..].rchunks(self.chunk_size) {
            if !self.chunk_excluded(chunk) {
                break;
            }
            end -= chunk.len();
        }

        start..end
    }

    /// Trim the head and tail of a track.
    pub fn apply(&self, mut track: NormalizedTrack) -> NormalizedTrack {
        let range = self.retained_range(&track.points);
        let before = track.points.len();

        if range.start > 0 || range.end < before {
            track.points.truncate(range.end);
            track.points.drain(..range.start);
            debug!(
                "[NoGo] {}: trimmed {} leading and {} trailing points",
                track.name,
                range.start,
                before - range.end
            );
        }

        track
    }
}
