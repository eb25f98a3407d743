//! Designer feedback rendering.
//!
//! This module draws the placer's overlay with Bevy's `Gizmos` API: wire
//! polylines, connection point markers, and highlights for the chain's
//! armed and held anchors.

use bevy::prelude::*;

use crate::types::{
    Anchor, ChainPlacerState, ChainPlacerStyle, ConnectionPoint, PlacementMode, Wire,
};

/// Draw wires and, while a mode is active, the editing overlay.
///
/// Wires are scene content and render regardless of mode; connection point
/// markers and anchor highlights only appear while the tool is active.
pub fn draw_overlay(
    mut gizmos: Gizmos,
    state: Res<ChainPlacerState>,
    style: Res<ChainPlacerStyle>,
    wires: Query<(&Wire, &GlobalTransform)>,
    points: Query<&GlobalTransform, With<ConnectionPoint>>,
    anchors: Query<&GlobalTransform, With<Anchor>>,
) {
    if style.show_wires {
        for (wire, global) in wires.iter() {
            for pair in wire.points.windows(2) {
                gizmos.line(
                    global.transform_point(pair[0]),
                    global.transform_point(pair[1]),
                    style.wire_color,
                );
            }
        }
    }

    if state.mode == PlacementMode::Inactive {
        return;
    }

    if style.show_connection_points {
        for transform in points.iter() {
            gizmos.sphere(
                transform.translation(),
                style.connection_point_radius,
                style.connection_point_color,
            );
        }
    }

    if !style.show_session_highlight {
        return;
    }

    // Arrow dropping onto the armed anchor, so the designer can see what
    // the next placement will link back to.
    if let Some(previous) = state.session.previous() {
        if let Ok(transform) = anchors.get(previous) {
            let tip = transform.translation();
            gizmos.arrow(
                tip + Vec3::Y * style.highlight_length,
                tip,
                style.highlight_color,
            );
        }
    }

    if let Some(held) = state.held {
        if let Ok(transform) = anchors.get(held) {
            let tip = transform.translation();
            gizmos.arrow(tip + Vec3::Y * style.highlight_length, tip, style.held_color);
        }
    }
}
