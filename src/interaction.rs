//! Placement interaction and input handling.
//!
//! This module contains the systems that turn pointer input into anchor
//! placements and connector requests: picking anchors under the cursor,
//! dragging freshly spawned anchors along the ground, pairing consecutive
//! placements, and applying the requested connector geometry.

use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfigStore};
use bevy::input::mouse::MouseButton;
use bevy::input::ButtonInput;
use bevy::math::Ray3d;
use bevy::prelude::*;
use bevy::camera::primitives::Aabb;
use bevy::window::PrimaryWindow;

use crate::bounds::anchor_bounds_height;
use crate::math::{ray_ground_intersection, ray_sphere_intersection};
use crate::mesh::{build_connector, ConnectorAnchor};
use crate::types::{
    Anchor, AnchorBlueprint, ChainPlacerCamera, ChainPlacerConfig, ChainPlacerState,
    ChainPlacerStyle, ConnectionPoint, Connector, ConnectorKind, PlacementMode, PlacementSession,
    Wire,
};
use crate::wire::{broken_wire_indices, build_wires, WireSpan};

/// Configure Bevy's built-in gizmo renderer using our style resource.
pub fn configure_gizmos(mut config_store: ResMut<GizmoConfigStore>, style: Res<ChainPlacerStyle>) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = style.line_width;
    config.depth_bias = style.depth_bias;
}

/// Switch edit modes and request maintenance actions from the keyboard.
///
/// `P` enters placing mode, `W` enters wires-only mode, `Escape` turns the
/// tool off, and `B` requests a broken-wire sweep. Switching modes always
/// resets the chain session.
pub fn handle_mode_keys(keys: Res<ButtonInput<KeyCode>>, mut state: ResMut<ChainPlacerState>) {
    if keys.just_pressed(KeyCode::KeyP) {
        state.mode = PlacementMode::Placing;
        state.session = PlacementSession::Idle;
        state.held = None;
    }
    if keys.just_pressed(KeyCode::KeyW) {
        state.mode = PlacementMode::WiresOnly;
        state.session = PlacementSession::Idle;
        state.held = None;
    }
    if keys.just_pressed(KeyCode::Escape) {
        state.mode = PlacementMode::Inactive;
        state.session = PlacementSession::Idle;
        state.held = None;
    }
    if keys.just_pressed(KeyCode::KeyB) {
        state.prune_requested = true;
    }
}

/// The pick ray under the cursor, if the camera and cursor are available.
fn cursor_ray(
    cameras: &Query<(&Camera, &GlobalTransform), With<ChainPlacerCamera>>,
    windows: &Query<&Window, With<PrimaryWindow>>,
) -> Option<Ray3d> {
    let (camera, camera_transform) = cameras.iter().next()?;
    let cursor_pos = windows.iter().next()?.cursor_position()?;
    camera.viewport_to_world(camera_transform, cursor_pos).ok()
}

/// The anchor whose pick sphere the ray hits first, if any.
fn pick_anchor(
    ray: &Ray3d,
    radius: f32,
    anchors: &Query<(Entity, &GlobalTransform), With<Anchor>>,
) -> Option<Entity> {
    let mut best_t = f32::MAX;
    let mut best = None;
    for (entity, transform) in anchors.iter() {
        if let Some(t) = ray_sphere_intersection(ray, transform.translation(), radius) {
            if t < best_t {
                best_t = t;
                best = Some(entity);
            }
        }
    }
    best
}

/// Spawns a blueprint anchor with its connection point children.
fn spawn_anchor(commands: &mut Commands, blueprint: &AnchorBlueprint, position: Vec3) -> Entity {
    let anchor = commands
        .spawn((
            Mesh3d(blueprint.mesh.clone()),
            MeshMaterial3d(blueprint.material.clone()),
            Transform::from_translation(position),
            Anchor::default(),
        ))
        .id();
    for offset in &blueprint.connection_points {
        commands.spawn((
            ConnectionPoint,
            Transform::from_translation(*offset),
            ChildOf(anchor),
        ));
    }
    anchor
}

/// Handle mouse-down: pick an existing anchor to link, or drop a new one.
///
/// Clicking an existing anchor arms it as the chain's previous anchor; if
/// the chain was already armed the pair is recorded for connection first,
/// so a run of clicks links anchor to anchor without spawning anything.
/// Clicking empty ground in placing mode spawns a blueprint anchor and
/// starts dragging it.
pub fn begin_placement(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    mut state: ResMut<ChainPlacerState>,
    config: Res<ChainPlacerConfig>,
    cameras: Query<(&Camera, &GlobalTransform), With<ChainPlacerCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    anchors: Query<(Entity, &GlobalTransform), With<Anchor>>,
) {
    if state.mode == PlacementMode::Inactive {
        return;
    }
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(ray) = cursor_ray(&cameras, &windows) else {
        return;
    };

    if let Some(hit_anchor) = pick_anchor(&ray, config.pick_radius, &anchors) {
        if let Some(previous) = state.session.previous() {
            if previous != hit_anchor {
                state.pending_pairs.push((previous, hit_anchor));
            }
        }
        state.session = PlacementSession::AwaitingSecondAnchor {
            previous: hit_anchor,
        };
        return;
    }

    if state.mode != PlacementMode::Placing {
        return;
    }
    let Some(blueprint) = config.blueprint.as_ref() else {
        warn!("no anchor blueprint configured; nothing to place");
        return;
    };
    let Some(hit) = ray_ground_intersection(&ray, 0.0) else {
        return;
    };

    state.held = Some(spawn_anchor(&mut commands, blueprint, hit));
}

/// Where a dragged anchor should land for a given ground hit.
///
/// Without snapping the anchor follows the cursor. With snapping and an
/// armed previous anchor, the drag locks to the previous anchor's dominant
/// axis (whichever of X/Z the cursor has strayed further along) with
/// whole-unit rounding, which keeps fence runs straight; otherwise it
/// rounds to whole world units.
pub fn drag_target_position(hit: Vec3, previous: Option<Vec3>, snap: bool) -> Vec3 {
    if !snap {
        return hit;
    }
    match previous {
        Some(prev) => {
            let x = (hit.x - prev.x).abs();
            let z = (hit.z - prev.z).abs();
            if x > z {
                Vec3::new(hit.x.round(), prev.y.round(), prev.z.round())
            } else {
                Vec3::new(prev.x.round(), prev.y.round(), hit.z.round())
            }
        }
        None => hit.round(),
    }
}

/// Handle mouse-drag: move the held anchor along the ground.
///
/// `Q`/`E` rotate the held anchor about its up axis in configured steps.
pub fn drag_placement(
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<ChainPlacerState>,
    config: Res<ChainPlacerConfig>,
    cameras: Query<(&Camera, &GlobalTransform), With<ChainPlacerCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    globals: Query<&GlobalTransform, With<Anchor>>,
    mut transforms: Query<&mut Transform, With<Anchor>>,
) {
    let Some(held) = state.held else {
        return;
    };
    if !buttons.pressed(MouseButton::Left) {
        return;
    }
    let Ok(mut transform) = transforms.get_mut(held) else {
        return;
    };

    if keys.just_pressed(KeyCode::KeyQ) {
        transform.rotate_local_y(config.rotate_step);
    }
    if keys.just_pressed(KeyCode::KeyE) {
        transform.rotate_local_y(-config.rotate_step);
    }

    let Some(ray) = cursor_ray(&cameras, &windows) else {
        return;
    };
    let Some(hit) = ray_ground_intersection(&ray, 0.0) else {
        return;
    };

    let previous = state
        .session
        .previous()
        .and_then(|e| globals.get(e).ok())
        .map(|g| g.translation());
    transform.translation = drag_target_position(hit, previous, config.snap);
}

/// Handle mouse-up: pair the dropped anchor with the chain's previous one.
///
/// The dropped anchor becomes the chain's new previous anchor, so each
/// further placement extends the run.
pub fn end_placement(buttons: Res<ButtonInput<MouseButton>>, mut state: ResMut<ChainPlacerState>) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    let Some(held) = state.held.take() else {
        return;
    };
    if let Some(previous) = state.session.previous() {
        state.pending_pairs.push((previous, held));
    }
    state.session = PlacementSession::AwaitingSecondAnchor { previous: held };
}

/// Connection point entities under `anchor`, in hierarchy order, with
/// their world transforms.
fn connection_points_of(
    anchor: Entity,
    children: &Query<&Children>,
    points: &Query<(), With<ConnectionPoint>>,
    transforms: &Query<&GlobalTransform>,
) -> Vec<(Entity, GlobalTransform)> {
    children
        .iter_descendants(anchor)
        .filter(|entity| points.get(*entity).is_ok())
        .filter_map(|entity| transforms.get(entity).ok().map(|t| (entity, *t)))
        .collect()
}

/// Spawn the requested connector geometry for every recorded anchor pair.
///
/// Fence pairs get a stretched quad parented under the first anchor; wire
/// pairs get one sagging polyline per index-matched connection point pair,
/// each parented under its source point.
pub fn apply_connections(
    mut commands: Commands,
    mut state: ResMut<ChainPlacerState>,
    config: Res<ChainPlacerConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    anchors: Query<&Anchor>,
    children: Query<&Children>,
    volumes: Query<(&Aabb, &GlobalTransform)>,
    transforms: Query<&GlobalTransform>,
    points: Query<(), With<ConnectionPoint>>,
) {
    if state.pending_pairs.is_empty() {
        return;
    }

    for (from, to) in std::mem::take(&mut state.pending_pairs) {
        let (Ok(from_transform), Ok(to_transform)) = (transforms.get(from), transforms.get(to))
        else {
            warn!("skipping connector for despawned anchor pair {from}/{to}");
            continue;
        };

        match config.kind {
            ConnectorKind::Fence => {
                let from_anchor = ConnectorAnchor::new(
                    *from_transform,
                    anchor_bounds_height(from, &anchors, &children, &volumes, &transforms),
                );
                let to_anchor = ConnectorAnchor::new(
                    *to_transform,
                    anchor_bounds_height(to, &anchors, &children, &volumes, &transforms),
                );
                let quad = build_connector(&from_anchor, &to_anchor, config.height_fraction);

                let connector = commands
                    .spawn((
                        Mesh3d(meshes.add(quad.to_mesh())),
                        Transform::IDENTITY,
                        Connector,
                        ChildOf(from),
                    ))
                    .id();
                if let Some(material) = config.connector_material.as_ref() {
                    commands
                        .entity(connector)
                        .insert(MeshMaterial3d(material.clone()));
                } else {
                    warn!("no connector material configured; fence quad will not render");
                }
            }
            ConnectorKind::Wire => {
                let from_points = connection_points_of(from, &children, &points, &transforms);
                let to_points = connection_points_of(to, &children, &points, &transforms);
                let from_transforms: Vec<_> = from_points.iter().map(|(_, t)| *t).collect();
                let to_transforms: Vec<_> = to_points.iter().map(|(_, t)| *t).collect();

                let wires = match build_wires(
                    &from_transforms,
                    &to_transforms,
                    config.sample_count,
                    |t| config.sag.evaluate(t),
                ) {
                    Ok(wires) => wires,
                    Err(err) => {
                        warn!("wire connector skipped: {err}");
                        continue;
                    }
                };

                for (polyline, (source, _)) in wires.into_iter().zip(from_points.iter()) {
                    commands.spawn((
                        Wire {
                            points: polyline.points,
                        },
                        Transform::IDENTITY,
                        ChildOf(*source),
                    ));
                }
            }
        }
    }
}

/// Despawn wires that are no longer anchored within tolerance.
///
/// Runs when a sweep was requested ([`handle_mode_keys`], `B`). A wire
/// survives only when both endpoints, in world space, lie near some
/// current connection point.
pub fn prune_broken_wires(
    mut commands: Commands,
    mut state: ResMut<ChainPlacerState>,
    config: Res<ChainPlacerConfig>,
    wires: Query<(Entity, &Wire, &GlobalTransform)>,
    points: Query<&GlobalTransform, With<ConnectionPoint>>,
) {
    if !state.prune_requested {
        return;
    }
    state.prune_requested = false;

    let current: Vec<Vec3> = points.iter().map(|t| t.translation()).collect();

    let mut entities = Vec::new();
    let mut spans = Vec::new();
    for (entity, wire, global) in wires.iter() {
        let (Some(first), Some(last)) = (wire.points.first(), wire.points.last()) else {
            continue;
        };
        entities.push(entity);
        spans.push(WireSpan {
            start: global.transform_point(*first),
            end: global.transform_point(*last),
        });
    }

    let broken = broken_wire_indices(&spans, &current, config.prune_tolerance);
    if !broken.is_empty() {
        info!("removing {} broken wire(s)", broken.len());
    }
    for index in broken {
        commands.entity(entities[index]).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unsnapped_drag_follows_the_cursor() {
        let hit = Vec3::new(3.7, 0.0, -1.2);
        assert_eq!(drag_target_position(hit, None, false), hit);
        assert_eq!(
            drag_target_position(hit, Some(Vec3::new(0.0, 0.0, 0.0)), false),
            hit
        );
    }

    #[test]
    fn snapped_drag_rounds_to_whole_units() {
        let hit = Vec3::new(3.7, 0.2, -1.2);
        let snapped = drag_target_position(hit, None, true);
        assert_eq!(snapped, Vec3::new(4.0, 0.0, -1.0));
    }

    #[test]
    fn snapped_drag_locks_to_the_previous_anchor_axis() {
        let prev = Vec3::new(2.0, 0.0, 5.0);
        // Strayed further along X: Z stays on the previous anchor.
        let along_x = drag_target_position(Vec3::new(7.3, 0.0, 5.8), Some(prev), true);
        assert_eq!(along_x, Vec3::new(7.0, 0.0, 5.0));
        // Strayed further along Z: X stays on the previous anchor.
        let along_z = drag_target_position(Vec3::new(2.4, 0.0, 9.6), Some(prev), true);
        assert_eq!(along_z, Vec3::new(2.0, 0.0, 10.0));
    }

    #[test]
    fn snapped_axis_lock_keeps_the_previous_height() {
        let prev = Vec3::new(0.0, 1.5, 0.0);
        let snapped = drag_target_position(Vec3::new(6.0, 0.0, 0.1), Some(prev), true);
        assert_relative_eq!(snapped.y, 2.0);
    }

    #[test]
    fn connectors_use_propagated_transforms_for_new_anchors() {
        use bevy::asset::AssetPlugin;
        use bevy::mesh::VertexAttributeValues;
        use bevy::transform::{TransformPlugin, TransformSystems};

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), TransformPlugin))
            .init_asset::<Mesh>()
            .init_resource::<ChainPlacerState>()
            .init_resource::<ChainPlacerConfig>()
            .add_systems(
                PostUpdate,
                apply_connections.after(TransformSystems::Propagate),
            );

        // Anchors spawned this frame only carry a fresh Transform; their
        // GlobalTransform stays the identity until propagation runs.
        let from = app
            .world_mut()
            .spawn((Anchor::default(), Transform::IDENTITY))
            .id();
        let to = app
            .world_mut()
            .spawn((Anchor::default(), Transform::from_xyz(10.0, 0.0, 0.0)))
            .id();
        app.world_mut()
            .resource_mut::<ChainPlacerState>()
            .pending_pairs
            .push((from, to));

        app.update();

        // The quad must reach the destination anchor's real position, not
        // the pre-propagation identity at the world origin.
        let mut connectors = app
            .world_mut()
            .query_filtered::<&Mesh3d, With<Connector>>();
        let handle = connectors.single(app.world()).unwrap().0.clone();
        let meshes = app.world().resource::<Assets<Mesh>>();
        let mesh = meshes.get(&handle).unwrap();
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(positions)) => {
                assert_eq!(positions[1], [10.0, 0.0, 0.0]);
            }
            other => panic!("unexpected position attribute: {other:?}"),
        }
    }
}
