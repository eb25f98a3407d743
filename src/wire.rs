//! Sagging wire generation and the broken-wire consistency check.
//!
//! Wires run between the connection points of two paired anchors. Each wire
//! is a polyline sampled along the straight segment between its endpoints
//! with a vertical sag profile added, authored local to the source point so
//! it follows that point when it moves.

use bevy::prelude::*;
use thiserror::Error;

/// Invalid configuration surfaced by [`build_wires`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireBuildError {
    /// A wire needs at least its start and end sample.
    #[error("wire sample count must be at least 2, got {got}")]
    InsufficientSampleCount {
        /// The rejected sample count.
        got: usize,
    },
}

/// A generated wire path, local to its source connection point.
#[derive(Debug, Clone, PartialEq)]
pub struct WirePolyline {
    /// Ordered samples from the source point (always the local origin) to
    /// the destination point.
    pub points: Vec<Vec3>,
}

/// Builds one sagging polyline per matched connection point pair.
///
/// Points are paired by index, `from_points[i]` with `to_points[i]`, and
/// iteration stops at the shorter list; surplus points on the longer side
/// simply get no wire. Each polyline has exactly `sample_count` samples:
/// a linear sweep from the source point to the destination expressed in
/// the source point's local frame, with `profile(t)` added to the vertical
/// coordinate at each normalized parameter `t`.
///
/// Spawn each polyline as a child of its source point with an identity
/// local transform and it re-levels automatically when the point moves.
pub fn build_wires(
    from_points: &[GlobalTransform],
    to_points: &[GlobalTransform],
    sample_count: usize,
    profile: impl Fn(f32) -> f32,
) -> Result<Vec<WirePolyline>, WireBuildError> {
    if sample_count < 2 {
        return Err(WireBuildError::InsufficientSampleCount { got: sample_count });
    }

    let pair_count = from_points.len().min(to_points.len());
    let mut wires = Vec::with_capacity(pair_count);

    // zip stops at the shorter list: surplus points get no wire.
    for (from, to) in from_points.iter().zip(to_points.iter()) {
        let destination = from
            .affine()
            .inverse()
            .transform_point3(to.translation());

        let mut points = Vec::with_capacity(sample_count);
        for j in 0..sample_count {
            let t = j as f32 / (sample_count - 1) as f32;
            let mut point = Vec3::ZERO.lerp(destination, t);
            point.y += profile(t);
            points.push(point);
        }
        wires.push(WirePolyline { points });
    }

    Ok(wires)
}

/// World-space endpoints of an existing wire, for the broken-wire check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireSpan {
    /// First sample of the wire, in world space.
    pub start: Vec3,
    /// Last sample of the wire, in world space.
    pub end: Vec3,
}

/// Finds wires that are no longer anchored within `tolerance`.
///
/// A wire survives only when both of its endpoints lie within `tolerance`
/// of *some* current connection point, not necessarily the pair it was
/// built from; that keeps wires alive across small point perturbations
/// while discarding any wire whose anchor was deleted or moved away.
/// Surviving wires are left untouched, drifted paths and all; re-routing
/// them is the caller's decision. Returns indices into `spans` to remove.
pub fn broken_wire_indices(
    spans: &[WireSpan],
    connection_points: &[Vec3],
    tolerance: f32,
) -> Vec<usize> {
    let tolerance_squared = tolerance * tolerance;
    let near_any = |endpoint: Vec3| {
        connection_points
            .iter()
            .any(|point| endpoint.distance_squared(*point) <= tolerance_squared)
    };

    spans
        .iter()
        .enumerate()
        .filter(|(_, span)| !near_any(span.start) || !near_any(span.end))
        .map(|(i, _)| i)
        .collect()
}
