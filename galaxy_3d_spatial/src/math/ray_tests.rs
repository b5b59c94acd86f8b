use glam::{Mat4, Vec2, Vec3};
use super::*;

fn unit_cube() -> AABB {
    AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5))
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_normalizes_direction() {
    let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
    assert_eq!(ray.direction, Vec3::NEG_Z);
    assert_eq!(ray.point_at(3.0), Vec3::new(0.0, 0.0, -3.0));
}

#[test]
fn test_zero_direction_is_degenerate() {
    let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
    assert!(ray.is_degenerate());
    assert!(ray.intersect_aabb(&unit_cube()).is_none());
    assert!(ray.intersect_sphere(&unit_cube().bounding_sphere()).is_none());
}

#[test]
fn test_transformed_translates_origin_only() {
    let ray = Ray::new(Vec3::ZERO, Vec3::X);
    let moved = ray.transformed(&Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
    assert_eq!(moved.origin, Vec3::new(0.0, 5.0, 0.0));
    assert!((moved.direction - Vec3::X).length() < 1e-6);
}

#[test]
fn test_from_screen_center_looks_forward() {
    let eye = Vec3::new(0.0, 0.0, 10.0);
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let inverse = (projection * view).inverse();

    let ray = Ray::from_screen(Vec2::ZERO, &inverse, eye);
    assert_eq!(ray.origin, eye);
    assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
}

// ============================================================================
// SLAB TEST
// ============================================================================

#[test]
fn test_aabb_hit_from_outside() {
    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
    let t = ray.intersect_aabb(&unit_cube()).unwrap();
    assert!((t - 4.5).abs() < 1e-5);
}

#[test]
fn test_aabb_origin_inside_returns_zero() {
    let ray = Ray::new(Vec3::ZERO, Vec3::X);
    assert_eq!(ray.intersect_aabb(&unit_cube()), Some(0.0));
}

#[test]
fn test_aabb_miss_and_behind() {
    let miss = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z);
    assert!(miss.intersect_aabb(&unit_cube()).is_none());

    let behind = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
    assert!(behind.intersect_aabb(&unit_cube()).is_none());
}

#[test]
fn test_aabb_parallel_axis() {
    let inside_slab = Ray::new(Vec3::new(0.2, 0.2, 5.0), Vec3::NEG_Z);
    assert!(inside_slab.intersect_aabb(&unit_cube()).is_some());

    let outside_slab = Ray::new(Vec3::new(0.7, 0.2, 5.0), Vec3::NEG_Z);
    assert!(outside_slab.intersect_aabb(&unit_cube()).is_none());
}

// ============================================================================
// SPHERE TEST
// ============================================================================

#[test]
fn test_sphere_hit_distance() {
    let sphere = BoundingSphere { center: Vec3::ZERO, radius: 1.0 };
    let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
    assert!((ray.intersect_sphere(&sphere).unwrap() - 4.0).abs() < 1e-5);
}

#[test]
fn test_sphere_origin_inside_returns_exit() {
    let sphere = BoundingSphere { center: Vec3::ZERO, radius: 2.0 };
    let ray = Ray::new(Vec3::ZERO, Vec3::X);
    assert!((ray.intersect_sphere(&sphere).unwrap() - 2.0).abs() < 1e-5);
}

#[test]
fn test_sphere_miss_and_behind() {
    let sphere = BoundingSphere { center: Vec3::ZERO, radius: 1.0 };
    assert!(Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z).intersect_sphere(&sphere).is_none());
    assert!(Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).intersect_sphere(&sphere).is_none());
}

// ============================================================================
// TRIANGLE TEST
// ============================================================================

#[test]
fn test_triangle_hit_and_miss() {
    let a = Vec3::new(-1.0, -1.0, 0.0);
    let b = Vec3::new(1.0, -1.0, 0.0);
    let c = Vec3::new(0.0, 1.0, 0.0);

    let hit = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
    assert!((hit.intersect_triangle(a, b, c).unwrap() - 3.0).abs() < 1e-5);

    let miss = Ray::new(Vec3::new(2.0, 0.0, 3.0), Vec3::NEG_Z);
    assert!(miss.intersect_triangle(a, b, c).is_none());

    let parallel = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::X);
    assert!(parallel.intersect_triangle(a, b, c).is_none());
}

#[test]
fn test_triangle_is_double_sided() {
    let a = Vec3::new(-1.0, -1.0, 0.0);
    let b = Vec3::new(1.0, -1.0, 0.0);
    let c = Vec3::new(0.0, 1.0, 0.0);
    let from_below = Ray::new(Vec3::new(0.0, 0.0, -2.0), Vec3::Z);
    assert!((from_below.intersect_triangle(a, b, c).unwrap() - 2.0).abs() < 1e-5);
}
