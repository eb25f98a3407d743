//! Stretched connector quad generation.
//!
//! This module builds the quad mesh that spans two chained anchors (a fence
//! panel between two posts). The quad is authored in the first anchor's
//! local frame, so parenting the spawned mesh entity under that anchor with
//! an identity transform makes it follow the anchor's scale and rotation
//! for free.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::mesh::{Indices, PrimitiveTopology};

/// Below this quad height the UV tiling ratio is meaningless.
const DEGENERATE_HEIGHT: f32 = 1e-6;

/// One endpoint of a connector: the anchor's pose plus its resolved
/// reference bounding height.
///
/// Bounds resolution (template redirect, descendant merging) happens in
/// [`crate::bounds`]; the builder itself only needs the final height.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorAnchor {
    /// The anchor's world transform.
    pub transform: GlobalTransform,
    /// Height of the anchor's merged reference bounding box, in the
    /// anchor's local units. Zero for anchors without geometry.
    pub bounds_height: f32,
}

impl ConnectorAnchor {
    /// Bundles a pose with its resolved bounding height.
    pub fn new(transform: GlobalTransform, bounds_height: f32) -> Self {
        Self {
            transform,
            bounds_height,
        }
    }
}

/// A generated connector quad, authored in the source anchor's local frame.
///
/// Always exactly 4 vertices, 4 UVs, 4 normals, and 12 indices (a front
/// face plus its mirrored back winding, so the quad renders from both sides
/// without a double-sided material).
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorQuad {
    /// Quad corners: base of each anchor, then the top of each.
    pub vertices: [Vec3; 4],
    /// Texture coordinates, horizontally tiled by the span/height ratio.
    pub uvs: [Vec2; 4],
    /// Triangle indices, front winding then back winding.
    pub indices: [u32; 12],
    /// Uniform per-vertex normals along the local back axis.
    pub normals: [Vec3; 4],
}

impl ConnectorQuad {
    /// Converts the quad into a render [`Mesh`].
    pub fn to_mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self.vertices.iter().map(|v| v.to_array()).collect();
        let uvs: Vec<[f32; 2]> = self.uvs.iter().map(|uv| uv.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|n| n.to_array()).collect();

        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(self.indices.to_vec()))
    }
}

/// Builds the quad stretched from `from` to `to`.
///
/// The quad runs along the ground between the two anchor origins and up to
/// each anchor's bounding height scaled by `height_fraction`. Anchors
/// without geometry have zero bounding height and produce a degenerate
/// flat quad rather than failing; with `height_fraction == 0` the quad
/// collapses to a line, which is the caller's call to make.
///
/// ```text
/// 2------>3
/// ^__
///    \__
///       \
/// 0------>1
/// ```
pub fn build_connector(
    from: &ConnectorAnchor,
    to: &ConnectorAnchor,
    height_fraction: f32,
) -> ConnectorQuad {
    // Author everything in the source anchor's local frame; this picks up
    // the source's scale and rotation.
    let start = Vec3::ZERO;
    let end = from
        .transform
        .affine()
        .inverse()
        .transform_point3(to.transform.translation());

    let prev_height = from.bounds_height * height_fraction;
    let next_height = to.bounds_height * height_fraction;

    let vertices = [
        start,
        end,
        Vec3::new(start.x, prev_height, start.z),
        Vec3::new(end.x, next_height, end.z),
    ];

    // Recompute bounds from the emitted corners; the span/height ratio
    // keeps the texture tiling square regardless of panel proportions.
    let min = vertices.iter().fold(Vec3::MAX, |m, v| m.min(*v));
    let max = vertices.iter().fold(Vec3::MIN, |m, v| m.max(*v));
    let size = max - min;
    let uv_scale = if size.y > DEGENERATE_HEIGHT {
        (size.x + size.z) / size.y
    } else {
        1.0
    };

    let uvs = [
        Vec2::new(0.0, 0.0),
        Vec2::new(uv_scale, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(uv_scale, 1.0),
    ];

    ConnectorQuad {
        vertices,
        uvs,
        // Front face, then the mirrored winding for the back face.
        indices: [0, 2, 1, 2, 3, 1, 1, 2, 0, 1, 3, 2],
        normals: [Vec3::Z; 4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn anchor_at(x: f32, z: f32, bounds_height: f32) -> ConnectorAnchor {
        ConnectorAnchor::new(GlobalTransform::from_xyz(x, 0.0, z), bounds_height)
    }

    #[test]
    fn quad_has_fixed_counts() {
        let quad = build_connector(&anchor_at(0.0, 0.0, 2.0), &anchor_at(5.0, 3.0, 2.0), 0.8);
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.uvs.len(), 4);
        assert_eq!(quad.normals.len(), 4);
        assert_eq!(quad.indices.len(), 12);
    }

    #[test]
    fn ten_units_apart_scenario() {
        // Two anchors 10 units apart along X, both bounding height 2,
        // fraction 0.5: both tops at 1.0, uv scale (10 + 0) / 1 = 10.
        let quad = build_connector(&anchor_at(0.0, 0.0, 2.0), &anchor_at(10.0, 0.0, 2.0), 0.5);
        assert_eq!(quad.vertices[0], Vec3::ZERO);
        assert_eq!(quad.vertices[1], Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(quad.vertices[2].y, 1.0);
        assert_relative_eq!(quad.vertices[3].y, 1.0);
        assert_relative_eq!(quad.uvs[1].x, 10.0);
        assert_relative_eq!(quad.uvs[3].x, 10.0);
        assert_eq!(quad.uvs[0], Vec2::ZERO);
        assert_eq!(quad.uvs[2], Vec2::new(0.0, 1.0));
    }

    #[test]
    fn end_vertex_is_destination_in_source_frame() {
        // Source rotated a quarter turn about Y and uniformly scaled by 2;
        // the destination must come out in the source's scaled local frame.
        let from = ConnectorAnchor::new(
            GlobalTransform::from(
                Transform::from_xyz(1.0, 0.0, 1.0)
                    .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
                    .with_scale(Vec3::splat(2.0)),
            ),
            2.0,
        );
        let to = anchor_at(5.0, 1.0, 2.0);

        let expected = from
            .transform
            .affine()
            .inverse()
            .transform_point3(to.transform.translation());
        let quad = build_connector(&from, &to, 1.0);
        assert_eq!(quad.vertices[1], expected);
        // Top corner above the destination keeps its ground X/Z.
        assert_relative_eq!(quad.vertices[3].x, expected.x);
        assert_relative_eq!(quad.vertices[3].z, expected.z);
    }

    #[test]
    fn heights_scale_linearly_with_fraction() {
        let from = anchor_at(0.0, 0.0, 3.0);
        let to = anchor_at(4.0, 0.0, 5.0);
        for h in [0.0, 0.25, 0.5, 1.0] {
            let quad = build_connector(&from, &to, h);
            assert_relative_eq!(quad.vertices[2].y, 3.0 * h);
            assert_relative_eq!(quad.vertices[3].y, 5.0 * h);
        }
    }

    #[test]
    fn identical_inputs_are_idempotent() {
        let from = ConnectorAnchor::new(
            GlobalTransform::from(
                Transform::from_xyz(2.0, 1.0, -3.0).with_rotation(Quat::from_rotation_y(0.7)),
            ),
            1.7,
        );
        let to = anchor_at(-4.0, 6.0, 2.3);
        assert_eq!(
            build_connector(&from, &to, 0.6),
            build_connector(&from, &to, 0.6)
        );
    }

    #[test]
    fn missing_geometry_degenerates_to_flat_quad() {
        // Zero bounding height on both sides flattens the quad instead of
        // failing; uv scale falls back to 1.
        let quad = build_connector(&anchor_at(0.0, 0.0, 0.0), &anchor_at(6.0, 0.0, 0.0), 1.0);
        assert_relative_eq!(quad.vertices[2].y, 0.0);
        assert_relative_eq!(quad.vertices[3].y, 0.0);
        assert_relative_eq!(quad.uvs[1].x, 1.0);
    }

    #[test]
    fn quad_converts_to_triangle_list_mesh() {
        let quad = build_connector(&anchor_at(0.0, 0.0, 2.0), &anchor_at(3.0, 0.0, 2.0), 1.0);
        let mesh = quad.to_mesh();
        assert_eq!(mesh.count_vertices(), 4);
        match mesh.indices() {
            Some(Indices::U32(indices)) => assert_eq!(indices.len(), 12),
            other => panic!("unexpected index buffer: {other:?}"),
        }
    }
}
