//! Ray intersection helpers for placement picking.

use bevy::math::Ray3d;
use bevy::prelude::*;

/// Threshold for parallel plane/ray detection.
const PLANE_EPSILON: f32 = 1e-5;

/// Solve intersection between a ray and a sphere. Returns distance along the
/// ray if there is an intersection, otherwise `None`.
///
/// Used to pick existing anchors under the cursor.
pub fn ray_sphere_intersection(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let m = ray.origin - center;
    let b = m.dot(*ray.direction);
    let c = m.length_squared() - radius * radius;

    // Exit if ray origin is outside sphere (c > 0) and ray is pointing away
    // from sphere (b > 0).
    if c > 0.0 && b > 0.0 {
        return None;
    }

    let discr = b * b - c;
    if discr < 0.0 {
        return None;
    }

    let t = -b - discr.sqrt();
    if t < 0.0 {
        Some(0.0)
    } else {
        Some(t)
    }
}

/// Intersect a ray with a plane. Returns the intersection point, if any.
pub fn ray_plane_intersection(ray: &Ray3d, plane_origin: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(*ray.direction);
    if denom.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_origin - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        None
    } else {
        Some(ray.origin + *ray.direction * t)
    }
}

/// Intersect a ray with the horizontal plane at `height`.
///
/// This is the placement surface for anchors dropped on empty ground.
pub fn ray_ground_intersection(ray: &Ray3d, height: f32) -> Option<Vec3> {
    ray_plane_intersection(ray, Vec3::new(0.0, height, 0.0), Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 10.0, z), Dir3::NEG_Y)
    }

    #[test]
    fn ground_ray_hits_below_the_origin() {
        let hit = ray_ground_intersection(&down_ray(3.0, -2.0), 0.0).unwrap();
        assert_relative_eq!(hit.x, 3.0);
        assert_relative_eq!(hit.y, 0.0);
        assert_relative_eq!(hit.z, -2.0);
    }

    #[test]
    fn parallel_ray_misses_the_ground() {
        let ray = Ray3d::new(Vec3::new(0.0, 1.0, 0.0), Dir3::X);
        assert_eq!(ray_ground_intersection(&ray, 0.0), None);
    }

    #[test]
    fn ray_behind_the_plane_misses() {
        let ray = Ray3d::new(Vec3::new(0.0, -1.0, 0.0), Dir3::NEG_Y);
        assert_eq!(ray_ground_intersection(&ray, 0.0), None);
    }

    #[test]
    fn sphere_pick_reports_nearest_hit() {
        let t = ray_sphere_intersection(&down_ray(0.0, 0.0), Vec3::ZERO, 1.0).unwrap();
        assert_relative_eq!(t, 9.0);
    }

    #[test]
    fn sphere_pick_misses_offset_targets() {
        assert_eq!(
            ray_sphere_intersection(&down_ray(5.0, 0.0), Vec3::ZERO, 1.0),
            None
        );
    }
}
