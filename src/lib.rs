//! Chained-object placement plugin for Bevy 0.18.x.
//!
//! This crate lets a designer click-drag in the 3D view to place chained
//! anchors (fence posts, utility poles) and synthesizes connector geometry
//! between consecutive placements: stretched quad meshes for fences, and
//! sagging wire polylines between paired connection points for pole runs.
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_chain_placer::{
//!     AnchorBlueprint, ChainPlacerCamera, ChainPlacerConfig, ChainPlacerPlugin,
//! };
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(ChainPlacerPlugin)
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(
//!     mut commands: Commands,
//!     mut config: ResMut<ChainPlacerConfig>,
//!     mut meshes: ResMut<Assets<Mesh>>,
//!     mut materials: ResMut<Assets<StandardMaterial>>,
//! ) {
//!     // Camera used for placement input
//!     commands.spawn((
//!         Camera3d::default(),
//!         Transform::from_xyz(0.0, 8.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
//!         ChainPlacerCamera,
//!     ));
//!
//!     // What a click on empty ground spawns
//!     config.blueprint = Some(AnchorBlueprint {
//!         mesh: meshes.add(Cuboid::new(0.2, 2.0, 0.2)),
//!         material: materials.add(Color::srgb(0.5, 0.35, 0.2)),
//!         connection_points: vec![Vec3::new(0.0, 2.0, 0.0)],
//!     });
//! }
//! ```
//!
//! # Controls
//!
//! - **P**: placing mode; click-drag drops anchors, and consecutive
//!   placements get connected
//! - **W**: wires-only mode; clicks link existing anchors without
//!   spawning
//! - **Q / E**: rotate the held anchor while dragging
//! - **B**: remove wires that are no longer anchored within tolerance
//! - **Escape**: turn the tool off
//!
//! # Configuration
//!
//! - [`ChainPlacerConfig`]: connector kind, height fraction, wire sample
//!   count, sag profile, snapping, prune tolerance, anchor blueprint
//! - [`ChainPlacerState`]: current mode and chain session
//! - [`ChainPlacerStyle`]: overlay appearance
//!
//! The geometry builders ([`build_connector`], [`build_wires`],
//! [`broken_wire_indices`]) are plain functions over transforms and can be
//! used without the plugin.

#![warn(missing_docs)]

use bevy::prelude::*;
use bevy::transform::TransformSystems;

mod bounds;
mod draw;
mod interaction;
mod math;
mod mesh;
mod types;
mod wire;

// Re-export all public types
pub use bounds::{anchor_bounds_height, merged_bounds};
pub use mesh::{build_connector, ConnectorAnchor, ConnectorQuad};
pub use types::{
    Anchor, AnchorBlueprint, ChainPlacerCamera, ChainPlacerConfig, ChainPlacerState,
    ChainPlacerStyle, ConnectionPoint, Connector, ConnectorKind, PlacementMode, PlacementSession,
    SagProfile, Wire,
};
pub use wire::{broken_wire_indices, build_wires, WireBuildError, WirePolyline, WireSpan};

use crate::draw::draw_overlay;
use crate::interaction::{
    apply_connections, begin_placement, configure_gizmos, drag_placement, end_placement,
    handle_mode_keys, prune_broken_wires,
};

/// Plugin that enables chained placement and connector generation.
///
/// Add this plugin to your Bevy app, tag the editing camera with
/// [`ChainPlacerCamera`], and configure an [`AnchorBlueprint`] in
/// [`ChainPlacerConfig`] to start placing.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_chain_placer::ChainPlacerPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(ChainPlacerPlugin)
///     .run();
/// ```
pub struct ChainPlacerPlugin;

impl Plugin for ChainPlacerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChainPlacerState>()
            .init_resource::<ChainPlacerConfig>()
            .init_resource::<ChainPlacerStyle>()
            .add_systems(Startup, configure_gizmos)
            .add_systems(
                Update,
                (
                    handle_mode_keys,
                    begin_placement,
                    drag_placement,
                    end_placement,
                    draw_overlay,
                )
                    .chain(),
            )
            // Connector geometry reads GlobalTransform, which for anchors
            // spawned this frame is only valid after propagation; a
            // same-tick press/release would otherwise pair an anchor still
            // at the identity.
            .add_systems(
                PostUpdate,
                (apply_connections, prune_broken_wires)
                    .chain()
                    .after(TransformSystems::Propagate),
            );
    }
}
