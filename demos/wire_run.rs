//! Utility pole and wire demo.
//!
//! Press P and click-drag to place poles; consecutive poles get sagging
//! wires between their connection points. Press W to link existing poles
//! without spawning, and B to sweep away wires whose anchor points were
//! deleted or moved.

use bevy::prelude::*;
use bevy_chain_placer::{
    AnchorBlueprint, ChainPlacerCamera, ChainPlacerConfig, ChainPlacerPlugin, ChainPlacerState,
    ConnectorKind, SagProfile,
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
        Transform::from_xyz(10.0, 12.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
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
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(25.0)))),
        MeshMaterial3d(materials.add(Color::srgb(0.25, 0.3, 0.2))),
    ));

    config.kind = ConnectorKind::Wire;
    config.sample_count = 12;
    config.sag = SagProfile::Parabolic { depth: -0.35 };
    config.prune_tolerance = 0.5;
    // Two insulators on a cross-arm near the top of the pole.
    config.blueprint = Some(AnchorBlueprint {
        mesh: meshes.add(Cuboid::new(0.25, 4.0, 0.25)),
        material: materials.add(Color::srgb(0.35, 0.25, 0.15)),
        connection_points: vec![Vec3::new(-0.6, 1.8, 0.0), Vec3::new(0.6, 1.8, 0.0)],
    });

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
         [P] Place poles [W] Wires only [Escape] Stop\n\
         [B] Remove broken wires",
        state.mode, link,
    );
}
