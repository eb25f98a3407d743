//! Fence placement demo.
//!
//! Press P, then click-drag on the ground to place posts; every placement
//! after the first stretches a fence quad back to the previous post.
//! Press Escape to stop editing.

use bevy::prelude::*;
use bevy_chain_placer::{
    AnchorBlueprint, ChainPlacerCamera, ChainPlacerConfig, ChainPlacerPlugin, ChainPlacerState,
    ConnectorKind,
};

#[derive(Component)]
struct Hud;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(ChainPlacerPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, update_hud)
        .run();
}

fn setup(
    mut commands: Commands,
    mut config: ResMut<ChainPlacerConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(8.0, 10.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        ChainPlacerCamera,
    ));

    // Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 15.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Ground
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(20.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.2, 0.35, 0.18))),
    ));

    config.kind = ConnectorKind::Fence;
    config.snap = true;
    // The post mesh is centered on the anchor, so half the bounding height
    // matches the above-ground part of the post.
    config.height_fraction = 0.5;
    config.blueprint = Some(AnchorBlueprint {
        mesh: meshes.add(Cuboid::new(0.2, 2.0, 0.2)),
        material: materials.add(Color::srgb(0.45, 0.3, 0.15)),
        connection_points: Vec::new(),
    });
    // The quad emits both windings itself, so the default back-face
    // culling is fine here.
    config.connector_material = Some(materials.add(Color::srgb(0.6, 0.5, 0.35)));

    // HUD
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        ))
        .with_children(|p| {
            p.spawn((
                Text::new(""),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Hud,
            ));
        });
}

fn update_hud(state: Res<ChainPlacerState>, mut query: Query<&mut Text, With<Hud>>) {
    let Ok(mut text) = query.single_mut() else {
        return;
    };

    let link = match state.session.previous() {
        Some(anchor) => format!("{anchor}"),
        None => "none".to_string(),
    };
    text.0 = format!(
        "Mode: {} | Previous link: {}\n\n\
         [P] Place posts [Escape] Stop\n\
         [Q]/[E] Rotate while dragging",
        state.mode, link,
    );
}
