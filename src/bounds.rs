//! Reference bounding volume resolution for anchors.
//!
//! Connector height is derived from an anchor's merged bounding box: the
//! render bounds of the anchor entity and every descendant, expressed in
//! the anchor's local frame. Anchors that are instances of a shared
//! template measure the template's subtree instead, so one broken or
//! rescaled post doesn't change the fence height along the chain.

use bevy::prelude::*;
use bevy::camera::primitives::Aabb;

use crate::types::Anchor;

/// Merges axis-aligned boxes given as `(min, max)` corner pairs.
///
/// Returns `None` when `parts` is empty, which is how an anchor without
/// any discoverable render geometry shows up.
pub fn merged_bounds(parts: impl IntoIterator<Item = (Vec3, Vec3)>) -> Option<(Vec3, Vec3)> {
    parts
        .into_iter()
        .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))
}

/// All eight corners of an [`Aabb`].
fn aabb_corners(aabb: &Aabb) -> [Vec3; 8] {
    let min = Vec3::from(aabb.min());
    let max = Vec3::from(aabb.max());
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

/// Height of an anchor's merged reference bounding box, in the measured
/// root's local units.
///
/// When the anchor names a template entity, the template's subtree is
/// measured; otherwise the anchor's own. Every render [`Aabb`] in the
/// subtree is transformed into the measured root's frame and merged.
/// Anchors with no geometry anywhere in the subtree get height `0.0`
/// (degenerate flat connector) and a warning, never an error.
pub fn anchor_bounds_height(
    anchor: Entity,
    anchors: &Query<&Anchor>,
    children: &Query<&Children>,
    volumes: &Query<(&Aabb, &GlobalTransform)>,
    transforms: &Query<&GlobalTransform>,
) -> f32 {
    let root = anchors
        .get(anchor)
        .ok()
        .and_then(|a| a.template)
        .unwrap_or(anchor);

    let Ok(root_transform) = transforms.get(root) else {
        warn!("anchor {anchor} has no transform; connector height defaults to 0");
        return 0.0;
    };
    let to_root = root_transform.affine().inverse();

    let subtree = std::iter::once(root).chain(children.iter_descendants(root));
    let parts = subtree.filter_map(|entity| {
        let (aabb, global) = volumes.get(entity).ok()?;
        let corners = aabb_corners(aabb).map(|corner| {
            to_root.transform_point3(global.affine().transform_point3(corner))
        });
        let min = corners.iter().fold(Vec3::MAX, |m, c| m.min(*c));
        let max = corners.iter().fold(Vec3::MIN, |m, c| m.max(*c));
        Some((min, max))
    });

    match merged_bounds(parts) {
        Some((min, max)) => max.y - min.y,
        None => {
            warn!("anchor {anchor} has no render geometry; connector height defaults to 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::ecs::system::SystemState;

    #[test]
    fn merging_no_parts_is_none() {
        assert_eq!(merged_bounds(std::iter::empty()), None);
    }

    #[test]
    fn merging_encapsulates_all_parts() {
        let merged = merged_bounds([
            (Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)),
            (Vec3::new(-0.5, 1.5, -0.5), Vec3::new(0.5, 3.5, 0.5)),
        ])
        .unwrap();
        assert_eq!(merged.0, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(merged.1, Vec3::new(1.0, 3.5, 1.0));
    }

    type BoundsQueries<'w, 's> = (
        Query<'w, 's, &'static Anchor>,
        Query<'w, 's, &'static Children>,
        Query<'w, 's, (&'static Aabb, &'static GlobalTransform)>,
        Query<'w, 's, &'static GlobalTransform>,
    );

    fn height_of(world: &mut World, anchor: Entity) -> f32 {
        let mut state = SystemState::<BoundsQueries>::new(world);
        let (anchors, children, volumes, transforms) = state.get(world);
        anchor_bounds_height(anchor, &anchors, &children, &volumes, &transforms)
    }

    #[test]
    fn merges_descendant_bounds_into_anchor_frame() {
        let mut world = World::new();
        // Post body two units tall, with a cross-arm mounted higher up.
        let post = world
            .spawn((
                Anchor::default(),
                GlobalTransform::from_xyz(4.0, 0.0, 0.0),
                Aabb::from_min_max(Vec3::new(-0.1, 0.0, -0.1), Vec3::new(0.1, 2.0, 0.1)),
            ))
            .id();
        world.spawn((
            GlobalTransform::from_xyz(4.0, 2.5, 0.0),
            Aabb::from_min_max(Vec3::new(-0.5, -0.1, -0.1), Vec3::new(0.5, 0.1, 0.1)),
            ChildOf(post),
        ));

        assert_relative_eq!(height_of(&mut world, post), 2.6, epsilon = 1e-5);
    }

    #[test]
    fn instance_defers_to_its_template_bounds() {
        let mut world = World::new();
        let template = world
            .spawn((
                GlobalTransform::IDENTITY,
                Aabb::from_min_max(Vec3::new(-0.1, 0.0, -0.1), Vec3::new(0.1, 3.0, 0.1)),
            ))
            .id();
        // The instance's own geometry is shorter; the template wins.
        let instance = world
            .spawn((
                Anchor {
                    template: Some(template),
                },
                GlobalTransform::from_xyz(9.0, 0.0, 0.0),
                Aabb::from_min_max(Vec3::new(-0.1, 0.0, -0.1), Vec3::new(0.1, 1.0, 0.1)),
            ))
            .id();

        assert_relative_eq!(height_of(&mut world, instance), 3.0);
    }

    #[test]
    fn anchor_without_geometry_measures_zero() {
        let mut world = World::new();
        let bare = world
            .spawn((Anchor::default(), GlobalTransform::IDENTITY))
            .id();
        assert_eq!(height_of(&mut world, bare), 0.0);
    }
}
