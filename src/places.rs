//! # Place Annotation
//!
//! Labels an aggregate series with the named places it passes.
//!
//! Every `place_sample_step`-th point of the series is matched against an
//! R-tree of place envelopes. A point matches a place when it lies within the
//! place's radius, and the closest place wins where radii overlap.
//!
//! Labels are then thinned along the ride: the series is split into buckets
//! of `total distance / max_place_labels` km, and a candidate is only kept if
//! no closer-matching label was already kept within one bucket of it.
//! Candidates at the same cumulative distance always collide.

use rstar::{RTree, RTreeObject, AABB};

use crate::aggregate::AggregateSeries;
use crate::geo_utils::{great_circle_distance, km_to_degrees, KM_PER_DEGREE};
use crate::{AnalysisConfig, NamedPlace};
use log::debug;

/// A named place shown next to the ride.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceLabel {
    pub name: String,
    /// Position of the series point the label is attached to
    pub latitude: f64,
    pub longitude: f64,
    pub time: i64,
    /// Cumulative ride distance at the label, km
    pub cumulative_distance: f64,
    /// Distance from the series point to the place, km
    pub distance_to_place: f64,
}

/// One longitude span of a place's search envelope, stored in the R-tree.
///
/// Envelopes that cross the antimeridian are split into one entry per side.
#[derive(Debug, Clone)]
struct PlaceEntry {
    index: usize,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl PlaceEntry {
    fn entries(index: usize, place: &NamedPlace) -> Vec<Self> {
        let d_lat = (place.radius_km / KM_PER_DEGREE).min(90.0);
        let d_lng = km_to_degrees(place.radius_km, place.latitude);
        let west = place.longitude - d_lng;
        let east = place.longitude + d_lng;

        let mut spans = vec![(west.max(-180.0), east.min(180.0))];
        if west < -180.0 {
            spans.push((west + 360.0, 180.0));
        }
        if east > 180.0 {
            spans.push((-180.0, east - 360.0));
        }

        spans
            .into_iter()
            .map(|(min_lng, max_lng)| Self {
                index,
                latitude: place.latitude,
                longitude: place.longitude,
                radius_km: place.radius_km,
                min_lat: place.latitude - d_lat,
                max_lat: place.latitude + d_lat,
                min_lng,
                max_lng,
            })
            .collect()
    }
}

impl RTreeObject for PlaceEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// Spatial index over named places.
pub struct PlaceIndex<'a> {
    places: &'a [NamedPlace],
    tree: RTree<PlaceEntry>,
}

impl<'a> PlaceIndex<'a> {
    pub fn new(places: &'a [NamedPlace]) -> Self {
        let entries: Vec<PlaceEntry> = places
            .iter()
            .enumerate()
            .filter(|(_, p)| p.radius_km > 0.0 && p.latitude.is_finite() && p.longitude.is_finite())
            .flat_map(|(i, p)| PlaceEntry::entries(i, p))
            .collect();

        Self {
            places,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Closest place whose radius covers the position, with its distance in km.
    pub fn nearest_within_radius(&self, latitude: f64, longitude: f64) -> Option<(&'a NamedPlace, f64)> {
        let query = AABB::from_point([longitude, latitude]);

        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter_map(|entry| {
                let d = great_circle_distance(latitude, longitude, entry.latitude, entry.longitude);
                (d <= entry.radius_km).then_some((entry.index, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, d)| (&self.places[index], d))
    }
}

/// Label the series with nearby places, sorted by cumulative distance.
pub fn annotate(series: &AggregateSeries, places: &[NamedPlace], config: &AnalysisConfig) -> Vec<PlaceLabel> {
    if series.is_empty() || places.is_empty() || config.max_place_labels == 0 {
        return Vec::new();
    }

    let index = PlaceIndex::new(places);
    if index.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<PlaceLabel> = (0..series.len())
        .step_by(config.place_sample_step.max(1))
        .filter_map(|i| {
            let (place, d) = index.nearest_within_radius(series.latitudes[i], series.longitudes[i])?;
            Some(PlaceLabel {
                name: place.name.clone(),
                latitude: series.latitudes[i],
                longitude: series.longitudes[i],
                time: series.times[i],
                cumulative_distance: series.cumulative_distance[i],
                distance_to_place: d,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance_to_place.total_cmp(&b.distance_to_place));

    let bucket = series.total_distance() / config.max_place_labels as f64;
    let mut labels: Vec<PlaceLabel> = Vec::new();

    for candidate in candidates {
        if labels.len() >= config.max_place_labels {
            break;
        }
        // A ride that never moves has a zero bucket; equal distances still collide
        let crowded = labels
            .iter()
            .any(|l| (l.cumulative_distance - candidate.cumulative_distance).abs() <= bucket);
        if !crowded {
            labels.push(candidate);
        }
    }

    labels.sort_by(|a, b| a.cumulative_distance.total_cmp(&b.cumulative_distance));

    debug!("[Places] {} labels from {} places", labels.len(), places.len());
    labels
}
