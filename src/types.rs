//! Core types for the chain placer plugin.
//!
//! This module contains all the public components, resources, and
//! configuration types used by the placement controller and the
//! connector-geometry builders.

use bevy::prelude::*;
use std::fmt;

/// What the placement controller is currently doing.
///
/// This is the plugin's "edit status": while `Inactive` the plugin ignores
/// all pointer input, so it can coexist with other tools on the same camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// The tool is switched off; pointer input is ignored.
    #[default]
    Inactive,
    /// Click-drag places anchors and connects consecutive placements.
    Placing,
    /// Clicks only link existing anchors with wires; nothing is spawned.
    WiresOnly,
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementMode::Inactive => f.write_str("Inactive"),
            PlacementMode::Placing => f.write_str("Placing"),
            PlacementMode::WiresOnly => f.write_str("Wires Only"),
        }
    }
}

/// Which connector geometry gets synthesized between two paired anchors.
///
/// The placement controller is a single state machine parameterized by this
/// strategy; the variants only differ in what gets spawned when two anchors
/// are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorKind {
    /// Stretch a quad mesh between the two anchors (fence panel).
    #[default]
    Fence,
    /// Run sagging wire polylines between paired connection points.
    Wire,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorKind::Fence => f.write_str("Fence"),
            ConnectorKind::Wire => f.write_str("Wire"),
        }
    }
}

/// Marker component for cameras used by the chain placer.
///
/// Add this to the camera whose view should be used for placement input.
///
/// # Example
///
/// ```ignore
/// commands.spawn((
///     Camera3d::default(),
///     Transform::from_xyz(0.0, 8.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
///     ChainPlacerCamera,
/// ));
/// ```
#[derive(Component)]
pub struct ChainPlacerCamera;

/// A placed chain anchor (fence post, utility pole).
///
/// Anchors are the endpoints the connector builders stretch geometry
/// between. When `template` points at a shared template entity, that
/// entity's subtree supplies the reference bounding volume instead of the
/// instance's own, so connector height stays stable across per-instance
/// variations (broken posts, scaled duplicates).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Anchor {
    /// Optional template entity whose geometry defines this anchor's
    /// reference bounds.
    pub template: Option<Entity>,
}

/// Typed role marker for a wire attachment point on an anchor.
///
/// Wire connectors pair the `ConnectionPoint` children of two anchors by
/// child order, so insulator layout should match between pole variants
/// that are meant to link up.
#[derive(Component)]
pub struct ConnectionPoint;

/// Marker for a generated connector quad entity.
///
/// Connector entities are children of the first anchor of their pair and
/// carry the stretched quad mesh.
#[derive(Component)]
pub struct Connector;

/// A generated sagging wire.
///
/// `points` are local to the parent [`ConnectionPoint`], so the wire
/// re-levels automatically when its source point moves. The first point is
/// always the local origin.
#[derive(Component, Debug, Clone)]
pub struct Wire {
    /// Polyline samples, local to the parent connection point.
    pub points: Vec<Vec3>,
}

/// Explicit state of an in-progress placement chain.
///
/// This replaces an implicit "previous instance" field with a state enum so
/// the transitions (first click arms the chain, every further placement
/// links back to the previous one) are visible and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementSession {
    /// No anchor armed; the next placement starts a new chain.
    #[default]
    Idle,
    /// One anchor armed; the next placement connects back to it.
    AwaitingSecondAnchor {
        /// The anchor the next connector starts from.
        previous: Entity,
    },
}

impl PlacementSession {
    /// The armed anchor, if any.
    pub fn previous(&self) -> Option<Entity> {
        match *self {
            PlacementSession::Idle => None,
            PlacementSession::AwaitingSecondAnchor { previous } => Some(previous),
        }
    }
}

/// Vertical sag profile for wire polylines.
///
/// Evaluated over the normalized wire parameter `t` in `[0, 1]`; the
/// result is added to the Y coordinate of each sample. Negative values
/// sag downward.
#[derive(Debug, Clone, PartialEq)]
pub enum SagProfile {
    /// No sag; wires are straight segments.
    Flat,
    /// Parabolic dip reaching `depth` at the midpoint.
    Parabolic {
        /// Vertical offset at `t = 0.5`; negative sags down.
        depth: f32,
    },
    /// Piecewise-linear keyframes `(t, offset)`, sorted by `t`.
    Keyframes(Vec<Vec2>),
}

impl SagProfile {
    /// Sample the profile at normalized parameter `t`.
    ///
    /// Keyframe profiles clamp outside their key range; an empty key list
    /// evaluates to zero.
    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            SagProfile::Flat => 0.0,
            SagProfile::Parabolic { depth } => depth * 4.0 * t * (1.0 - t),
            SagProfile::Keyframes(keys) => {
                let Some(first) = keys.first() else {
                    return 0.0;
                };
                if t <= first.x {
                    return first.y;
                }
                for pair in keys.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    if t <= b.x {
                        let span = b.x - a.x;
                        if span <= f32::EPSILON {
                            return b.y;
                        }
                        return a.y + (b.y - a.y) * ((t - a.x) / span);
                    }
                }
                keys.last().map(|k| k.y).unwrap_or(0.0)
            }
        }
    }
}

impl Default for SagProfile {
    fn default() -> Self {
        SagProfile::Parabolic { depth: -0.4 }
    }
}

/// Recipe for spawning a new anchor when the designer clicks empty ground.
///
/// This stands in for a prefab: the spawned anchor gets the mesh and
/// material, plus one [`ConnectionPoint`] child per local offset.
#[derive(Debug, Clone)]
pub struct AnchorBlueprint {
    /// Mesh for the anchor body.
    pub mesh: Handle<Mesh>,
    /// Material for the anchor body.
    pub material: Handle<StandardMaterial>,
    /// Local positions of the anchor's connection points.
    pub connection_points: Vec<Vec3>,
}

/// Global state for the placement controller.
#[derive(Resource, Clone, Default)]
pub struct ChainPlacerState {
    /// Current edit mode.
    pub mode: PlacementMode,
    /// State of the in-progress chain.
    pub session: PlacementSession,
    /// Anchor currently being dragged, if any.
    pub held: Option<Entity>,
    /// Anchor pairs whose connector geometry still needs to be spawned.
    ///
    /// Input systems only record pairs here; a dedicated system applies
    /// them, so everything that creates or destroys scene objects sits in
    /// one place a host undo layer can wrap.
    pub pending_pairs: Vec<(Entity, Entity)>,
    /// Set to run the broken-wire check on the next update.
    pub prune_requested: bool,
}

/// Configuration for placement and connector generation.
#[derive(Resource, Clone)]
pub struct ChainPlacerConfig {
    /// Which connector geometry to build between paired anchors.
    pub kind: ConnectorKind,
    /// Fraction of an anchor's bounding height used for fence quads,
    /// in `[0, 1]`.
    pub height_fraction: f32,
    /// Samples per wire polyline. Must be at least 2.
    pub sample_count: usize,
    /// World-space distance within which a wire endpoint still counts as
    /// anchored to a connection point.
    pub prune_tolerance: f32,
    /// Snap dragged anchors to whole world units, and to the previous
    /// anchor's dominant axis while chaining.
    pub snap: bool,
    /// Vertical sag applied to wire samples.
    pub sag: SagProfile,
    /// Picking radius around an anchor's origin for click selection.
    pub pick_radius: f32,
    /// Rotation applied per Q/E press while dragging, in radians.
    pub rotate_step: f32,
    /// What to spawn when the designer clicks empty ground. With `None`,
    /// only existing anchors can be linked.
    pub blueprint: Option<AnchorBlueprint>,
    /// Material for generated fence quads.
    pub connector_material: Option<Handle<StandardMaterial>>,
}

impl Default for ChainPlacerConfig {
    fn default() -> Self {
        Self {
            kind: ConnectorKind::Fence,
            height_fraction: 1.0,
            sample_count: 8,
            prune_tolerance: 0.5,
            snap: false,
            sag: SagProfile::default(),
            pick_radius: 0.75,
            rotate_step: 15f32.to_radians(),
            blueprint: None,
            connector_material: None,
        }
    }
}

/// Visual style for the placer's gizmo feedback.
///
/// Modify this resource at runtime to customize the overlay.
#[derive(Resource, Clone)]
pub struct ChainPlacerStyle {
    /// Line width for gizmo rendering (in pixels).
    pub line_width: f32,
    /// Depth bias to draw the overlay on top of scene geometry.
    /// Negative values bring it closer to the camera.
    pub depth_bias: f32,
    /// Whether to draw wire polylines.
    pub show_wires: bool,
    /// Color for wire polylines.
    pub wire_color: Color,
    /// Whether to draw connection point markers.
    pub show_connection_points: bool,
    /// Radius of connection point marker spheres.
    pub connection_point_radius: f32,
    /// Color for connection point markers.
    pub connection_point_color: Color,
    /// Whether to highlight the session's armed anchor.
    pub show_session_highlight: bool,
    /// Length of the arrow drawn over the armed anchor.
    pub highlight_length: f32,
    /// Color of the armed-anchor arrow.
    pub highlight_color: Color,
    /// Color of the held-anchor arrow while dragging.
    pub held_color: Color,
}

impl Default for ChainPlacerStyle {
    fn default() -> Self {
        Self {
            line_width: 3.0,
            depth_bias: -0.5,
            show_wires: true,
            wire_color: Color::srgb(0.1, 0.1, 0.12),
            show_connection_points: true,
            connection_point_radius: 0.08,
            connection_point_color: Color::srgb(0.95, 0.8, 0.2),
            show_session_highlight: true,
            highlight_length: 2.0,
            highlight_color: Color::srgb(1.0, 0.9, 0.2),
            held_color: Color::srgb(0.4, 0.9, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_profile_is_zero_everywhere() {
        let profile = SagProfile::Flat;
        for i in 0..=10 {
            assert_eq!(profile.evaluate(i as f32 / 10.0), 0.0);
        }
    }

    #[test]
    fn parabolic_profile_dips_to_depth_at_midpoint() {
        let profile = SagProfile::Parabolic { depth: -0.8 };
        assert_relative_eq!(profile.evaluate(0.0), 0.0);
        assert_relative_eq!(profile.evaluate(0.5), -0.8);
        assert_relative_eq!(profile.evaluate(1.0), 0.0);
        // Symmetric about the midpoint.
        assert_relative_eq!(profile.evaluate(0.25), profile.evaluate(0.75));
    }

    #[test]
    fn keyframe_profile_interpolates_and_clamps() {
        let profile = SagProfile::Keyframes(vec![
            Vec2::new(0.2, 0.0),
            Vec2::new(0.5, -1.0),
            Vec2::new(0.8, 0.0),
        ]);
        // Clamped outside the key range.
        assert_relative_eq!(profile.evaluate(0.0), 0.0);
        assert_relative_eq!(profile.evaluate(1.0), 0.0);
        // Exact keys and midpoints.
        assert_relative_eq!(profile.evaluate(0.5), -1.0);
        assert_relative_eq!(profile.evaluate(0.35), -0.5);
        assert_relative_eq!(profile.evaluate(0.65), -0.5);
    }

    #[test]
    fn empty_keyframes_evaluate_to_zero() {
        assert_eq!(SagProfile::Keyframes(Vec::new()).evaluate(0.5), 0.0);
    }

    #[test]
    fn session_previous_reports_armed_anchor() {
        assert_eq!(PlacementSession::Idle.previous(), None);
        let e = Entity::PLACEHOLDER;
        let session = PlacementSession::AwaitingSecondAnchor { previous: e };
        assert_eq!(session.previous(), Some(e));
    }
}
