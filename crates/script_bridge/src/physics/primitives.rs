//! Primitive geometric objects understood by native physics
//!
//! These mirror the engine's primitive layouts. Only identity and a few
//! cheap measurements are computed here; real queries run natively.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat3, Vec3};

/// Type of a geometry object as reported by native physics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// Triangle mesh
    TriangleMesh,
    /// Height field
    Heightfield,
    /// Cylinder
    Cylinder,
    /// Capsule
    Capsule,
    /// Ray
    Ray,
    /// Sphere
    Sphere,
    /// Box
    Box,
    /// Voxel grid built over a triangle mesh
    VoxelGrid,
    /// Infinite plane
    Plane,
}

impl GeometryType {
    /// Identifier native code uses for this type
    pub const fn id(self) -> i32 {
        match self {
            Self::TriangleMesh => 0,
            Self::Heightfield => 1,
            Self::Cylinder => 2,
            Self::Capsule => 3,
            Self::Ray => 4,
            Self::Sphere => 5,
            Self::Box => 6,
            Self::VoxelGrid => 7,
            Self::Plane => 8,
        }
    }
}

/// Sorted identifiers of the primitive types native code can build geometry from
pub const REGISTERED_PRIMITIVE_TYPES: [i32; 5] = [
    GeometryType::Cylinder.id(),
    GeometryType::Capsule.id(),
    GeometryType::Ray.id(),
    GeometryType::Sphere.id(),
    GeometryType::Box.id(),
];

/// Box, possibly oriented
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPrimitive {
    /// Rows are the box axes in world space
    pub axes: Mat3,
    /// Half of the box dimensions along its axes
    pub half_size: Vec3,
    /// Center of the box
    pub center: Vec3,
    /// Whether `axes` differ from identity
    pub oriented: bool,
}

impl BoxPrimitive {
    /// Axis-aligned box around `center`
    pub fn aligned(center: Vec3, half_size: Vec3) -> Self {
        Self {
            axes: Mat3::identity(),
            half_size,
            center,
            oriented: false,
        }
    }

    /// Axis-aligned box spanning `min`..`max`
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        Self::aligned((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Corner with the smallest coordinates of the axis-aligned bounds
    pub fn min(&self) -> Vec3 {
        self.center - self.extent()
    }

    /// Corner with the largest coordinates of the axis-aligned bounds
    pub fn max(&self) -> Vec3 {
        self.center + self.extent()
    }

    /// Half size of the axis-aligned box that encloses this one
    pub fn extent(&self) -> Vec3 {
        if !self.oriented {
            return self.half_size;
        }
        let abs_axes = self.axes.abs();
        abs_axes.transpose() * self.half_size
    }

    /// Enclosed volume
    pub fn volume(&self) -> f32 {
        8.0 * self.half_size.x * self.half_size.y * self.half_size.z
    }

    /// Whether `point` lies inside the axis-aligned bounds
    pub fn contains(&self, point: &Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        (0..3).all(|i| point[i] >= min[i] && point[i] <= max[i])
    }

    /// Point of the axis-aligned bounds closest to `point`
    pub fn clamp(&self, point: &Vec3) -> Vec3 {
        let (min, max) = (self.min(), self.max());
        Vec3::new(
            point.x.clamp(min.x, max.x),
            point.y.clamp(min.y, max.y),
            point.z.clamp(min.z, max.z),
        )
    }
}

/// Sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

/// Cylinder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// Center
    pub center: Vec3,
    /// Normalized axis
    pub axis: Vec3,
    /// Radius of the caps
    pub radius: f32,
    /// Half of the height
    pub half_height: f32,
}

/// Cylinder with hemispherical caps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Center
    pub center: Vec3,
    /// Normalized axis
    pub axis: Vec3,
    /// Radius of the caps
    pub radius: f32,
    /// Half of the height of the cylindrical part
    pub half_height: f32,
}

/// Ray segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction, the length of which is the segment length
    pub direction: Vec3,
}

impl Ray {
    /// Point at parameter `t` along the segment
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Infinite plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Normalized normal
    pub normal: Vec3,
    /// Any point on the plane
    pub origin: Vec3,
}

impl Plane {
    /// Plane through `origin` with the given normal
    pub fn new(normal: Vec3, origin: Vec3) -> Self {
        Self {
            normal: normal.normalize(),
            origin,
        }
    }

    /// Signed distance of `point` from the plane
    pub fn distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(&(point - self.origin))
    }
}

/// Triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertices
    pub points: [Vec3; 3],
    /// Normal (right-hand rule)
    pub normal: Vec3,
}

impl Triangle {
    /// Triangle over three points
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let normal = (v1 - v0).cross(&(v2 - v0)).normalize();
        Self {
            points: [v0, v1, v2],
            normal,
        }
    }
}

/// Any primitive geometric object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Box
    Box(BoxPrimitive),
    /// Sphere
    Sphere(Sphere),
    /// Cylinder
    Cylinder(Cylinder),
    /// Capsule
    Capsule(Capsule),
    /// Ray
    Ray(Ray),
    /// Plane
    Plane(Plane),
    /// Triangle
    Triangle(Triangle),
}

impl Primitive {
    /// Geometry type of this primitive
    pub const fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Box(_) => GeometryType::Box,
            Self::Sphere(_) => GeometryType::Sphere,
            Self::Cylinder(_) => GeometryType::Cylinder,
            Self::Capsule(_) => GeometryType::Capsule,
            Self::Ray(_) => GeometryType::Ray,
            Self::Plane(_) => GeometryType::Plane,
            Self::Triangle(_) => GeometryType::TriangleMesh,
        }
    }

    /// Whether native code can build a geometry object from this primitive
    pub fn is_registered(&self) -> bool {
        REGISTERED_PRIMITIVE_TYPES
            .binary_search(&self.geometry_type().id())
            .is_ok()
    }

    /// Axis-aligned bounds
    pub fn bounds(&self) -> BoxPrimitive {
        match self {
            Self::Box(b) => BoxPrimitive::aligned(b.center, b.extent()),
            Self::Sphere(s) => BoxPrimitive::aligned(s.center, Vec3::repeat(s.radius)),
            Self::Cylinder(c) => axial_bounds(c.center, c.axis, c.half_height, c.radius, 0.0),
            Self::Capsule(c) => axial_bounds(c.center, c.axis, c.half_height, c.radius, c.radius),
            Self::Ray(r) => {
                let end = r.point_at(1.0);
                BoxPrimitive::from_bounds(r.origin.inf(&end), r.origin.sup(&end))
            }
            Self::Plane(p) => BoxPrimitive::aligned(p.origin, Vec3::zeros()),
            Self::Triangle(t) => {
                let [a, b, c] = t.points;
                BoxPrimitive::from_bounds(a.inf(&b).inf(&c), a.sup(&b).sup(&c))
            }
        }
    }

    /// Enclosed volume; zero for flat and degenerate primitives
    pub fn volume(&self) -> f32 {
        match self {
            Self::Box(b) => b.volume(),
            Self::Sphere(s) => 4.0 / 3.0 * PI * s.radius.powi(3),
            Self::Cylinder(c) => PI * c.radius * c.radius * 2.0 * c.half_height,
            Self::Capsule(c) => {
                PI * c.radius * c.radius * 2.0 * c.half_height + 4.0 / 3.0 * PI * c.radius.powi(3)
            }
            Self::Ray(_) | Self::Plane(_) | Self::Triangle(_) => 0.0,
        }
    }

    /// Geometric center
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Box(b) => b.center,
            Self::Sphere(s) => s.center,
            Self::Cylinder(c) => c.center,
            Self::Capsule(c) => c.center,
            Self::Ray(r) => r.point_at(0.5),
            Self::Plane(p) => p.origin,
            Self::Triangle(t) => (t.points[0] + t.points[1] + t.points[2]) / 3.0,
        }
    }
}

fn axial_bounds(center: Vec3, axis: Vec3, half_height: f32, radius: f32, cap: f32) -> BoxPrimitive {
    let axis = axis.normalize();
    let extent = Vec3::from_fn(|i, _| {
        let along = axis[i].abs() * (half_height + cap);
        let across = (1.0 - axis[i] * axis[i]).max(0.0).sqrt() * radius;
        along + across
    });
    BoxPrimitive::aligned(center, extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_registered_types_are_sorted() {
        let mut sorted = REGISTERED_PRIMITIVE_TYPES;
        sorted.sort_unstable();
        assert_eq!(sorted, REGISTERED_PRIMITIVE_TYPES);
    }

    #[test]
    fn test_registration() {
        let sphere = Primitive::Sphere(Sphere {
            center: Vec3::zeros(),
            radius: 1.0,
        });
        let plane = Primitive::Plane(Plane::new(Vec3::z(), Vec3::zeros()));
        assert!(sphere.is_registered());
        assert!(!plane.is_registered());
        assert!(!Primitive::Triangle(Triangle::new(Vec3::zeros(), Vec3::x(), Vec3::y())).is_registered());
    }

    #[test]
    fn test_box_bounds_and_volume() {
        let b = BoxPrimitive::from_bounds(Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 2.0, 2.0));
        assert_relative_eq!(b.volume(), 16.0);
        assert!(b.contains(&Vec3::new(0.5, 1.0, 1.0)));
        assert!(!b.contains(&Vec3::new(0.5, 3.0, 1.0)));
        assert_eq!(b.clamp(&Vec3::new(5.0, 0.0, -1.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_capsule_bounds_along_z() {
        let capsule = Primitive::Capsule(Capsule {
            center: Vec3::zeros(),
            axis: Vec3::z(),
            radius: 0.5,
            half_height: 1.0,
        });
        let bounds = capsule.bounds();
        assert_relative_eq!(bounds.half_size.z, 1.5);
        assert_relative_eq!(bounds.half_size.x, 0.5);
    }

    #[test]
    fn test_sphere_volume() {
        let sphere = Primitive::Sphere(Sphere {
            center: Vec3::zeros(),
            radius: 2.0,
        });
        assert_relative_eq!(sphere.volume(), 32.0 / 3.0 * PI, epsilon = 1e-4);
    }
}
