use geo::{Area, BooleanOps};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{geom::Geometries, mapping::{MappingEntry, MappingMethod}, Error, Result};

/// Relative slack under which a remainder counts as zero.
const REMAINDER_EPSILON: f64 = 1e-9;

/// Relative overshoot beyond which intersections exceeding a unit's area are reported.
const OVERSHOOT_WARNING: f64 = 1e-6;

/// Build mapping entries between two partitions with the given method.
pub fn build_entries(method: MappingMethod, units_from: &Geometries, units_to: &Geometries) -> Result<Vec<MappingEntry>> {
    match method {
        MappingMethod::IntersectionArea => Ok(intersection_area(units_from, units_to)),
        MappingMethod::CentroidDistance => centroid_distance(units_from, units_to),
    }
}

/// Weight every overlapping pair of units by the area of their intersection,
/// then add a gap entry for the part of each unit the other partition misses.
pub fn intersection_area(units_from: &Geometries, units_to: &Geometries) -> Vec<MappingEntry> {
    let overlaps: Vec<(usize, Vec<(usize, f64)>)> = (0..units_from.len()).into_par_iter()
        .map(|i| {
            let shape = units_from.shape(i);
            let candidates = units_to.candidates(shape);
            let overlaps = candidates.iter()
                .filter_map(|&j| {
                    let area = shape.intersection(units_to.shape(j)).unsigned_area();
                    (area > 0.0).then_some((j, area))
                })
                .collect();
            (candidates.len(), overlaps)
        })
        .collect();

    debug!(
        units_from = units_from.len(),
        units_to = units_to.len(),
        candidate_pairs = overlaps.iter().map(|(n, _)| n).sum::<usize>(),
        overlapping_pairs = overlaps.iter().map(|(_, o)| o.len()).sum::<usize>(),
        "computed intersections"
    );

    let mut entries = Vec::new();
    let mut covered_to = vec![0.0; units_to.len()];

    for (i, (_, row)) in overlaps.into_iter().enumerate() {
        let unit = units_from.id(i);
        let mut covered = 0.0;
        for (j, area) in row {
            entries.push(MappingEntry::new(Some(unit.to_string()), Some(units_to.id(j).to_string()), area));
            covered += area;
            covered_to[j] += area;
        }
        if let Some(rest) = remainder(unit, units_from.area(i), covered) {
            entries.push(MappingEntry::new(Some(unit.to_string()), None, rest));
        }
    }

    for (j, covered) in covered_to.into_iter().enumerate() {
        let unit = units_to.id(j);
        if let Some(rest) = remainder(unit, units_to.area(j), covered) {
            entries.push(MappingEntry::new(None, Some(unit.to_string()), rest));
        }
    }

    entries
}

/// Area of `unit` not covered by any intersection, if it is meaningfully positive.
fn remainder(unit: &str, area: f64, covered: f64) -> Option<f64> {
    let rest = area - covered;
    if rest < -OVERSHOOT_WARNING * area {
        warn!(unit, area, covered, "intersections exceed unit area, clipping remainder to zero");
    }
    (rest > REMAINDER_EPSILON * area).then_some(rest)
}

/// Weight pairs of units by the distance between their centroids.
pub fn centroid_distance(_units_from: &Geometries, _units_to: &Geometries) -> Result<Vec<MappingEntry>> {
    Err(Error::NotImplemented("centroid_distance mapping".into()))
}
