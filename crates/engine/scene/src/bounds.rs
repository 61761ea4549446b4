//! Bounding volumes used for culling and combined surface extents
//!
//! Both volumes are plain glam types so they can be computed on the render
//! side without touching the physics engine.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
///
/// Represents a box aligned to the world coordinate axes. All corners are axis-aligned,
/// making intersection tests simple min/max comparisons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered on the origin with the given half extents
    pub fn from_half_extents(half_extents: Vec3) -> Self {
        Self {
            min: -half_extents,
            max: half_extents,
        }
    }

    /// Smallest AABB containing every point, or `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut aabb = Self::new(first, first);
        for point in points {
            aabb.expand_to_include(*point);
        }
        Some(aabb)
    }

    /// Transform the box by an affine matrix
    ///
    /// This computes a tight AABB around the transformed box (OBB → AABB transformation).
    /// The resulting AABB may be larger than the original if the box is rotated.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut world_min = Vec3::splat(f32::MAX);
        let mut world_max = Vec3::splat(f32::MIN);

        for corner in corners {
            let world_corner = matrix.transform_point3(corner);
            world_min = world_min.min(world_corner);
            world_max = world_max.max(world_corner);
        }

        Self {
            min: world_min,
            max: world_max,
        }
    }

    /// Calculate the center point of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculate the size (extents) of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Calculate the half-size (half-extents) of the AABB
    pub fn half_size(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if a point is inside the AABB
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Create an AABB that encompasses both AABBs
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Bounding sphere, the volume the renderer culls instanced batches with
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere circumscribing an AABB
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            center: aabb.center(),
            radius: aabb.half_size().length(),
        }
    }

    /// Apply an affine transform; non-uniform scale grows the radius by the largest axis
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let (scale, _, _) = matrix.to_scale_rotation_translation();
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * scale.abs().max_element(),
        }
    }

    pub fn contains(&self, other: &BoundingSphere) -> bool {
        self.center.distance(other.center) + other.radius <= self.radius
    }

    /// Smallest sphere enclosing both spheres
    pub fn union(&self, other: &BoundingSphere) -> Self {
        if self.contains(other) {
            return *self;
        }
        if other.contains(self) {
            return *other;
        }

        let offset = other.center - self.center;
        let distance = offset.length();
        let radius = (distance + self.radius + other.radius) * 0.5;
        // distance > 0 here: coincident centers are handled by `contains`
        let center = self.center + offset * ((radius - self.radius) / distance);

        Self { center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_aabb_from_points() {
        let points = [
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, -4.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));

        assert!(Aabb::from_points(&Vec::<Vec3>::new()).is_none());
    }

    #[test]
    fn test_aabb_transformed_translation() {
        let local = Aabb::from_half_extents(Vec3::splat(0.5));
        let world = local.transformed(&Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));

        assert_eq!(world.min, Vec3::new(9.5, -0.5, -0.5));
        assert_eq!(world.max, Vec3::new(10.5, 0.5, 0.5));
    }

    #[test]
    fn test_aabb_transformed_rotation_45_degrees() {
        let local = Aabb::from_half_extents(Vec3::splat(0.5));
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let world = local.transformed(&Mat4::from_quat(rotation));

        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((world.max.x - expected).abs() < 1e-5);
        assert!((world.max.z - expected).abs() < 1e-5);
        assert!((world.max.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_aabb_union_and_contains() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(&b);

        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(3.0));
        assert!(!a.contains_point(Vec3::splat(2.5)));
        assert!(u.contains_point(Vec3::splat(1.5)));
    }

    #[test]
    fn test_sphere_union_disjoint() {
        let a = BoundingSphere::new(Vec3::ZERO, 1.0);
        let b = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
        let u = a.union(&b);

        assert!((u.radius - 3.0).abs() < 1e-6);
        assert!((u.center - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }

    #[test]
    fn test_sphere_union_nested() {
        let outer = BoundingSphere::new(Vec3::ZERO, 5.0);
        let inner = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(outer.union(&inner), outer);
        assert_eq!(inner.union(&outer), outer);
    }

    #[test]
    fn test_sphere_transformed_scale() {
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 2.0),
            Quat::IDENTITY,
            Vec3::new(0.0, 1.0, 0.0),
        );
        let moved = sphere.transformed(&matrix);
        assert!((moved.radius - 3.0).abs() < 1e-5);
        assert!((moved.center - Vec3::Y).length() < 1e-6);
    }
}
