//! Physical geometry
//!
//! Architecture:
//! - primitives: value types for boxes, spheres, rays and the other primitives
//! - geometry: handle-backed shapes built and queried by native physics

pub mod geometry;
pub mod primitives;

pub use geometry::{
    BoxificationParameters, Buoyancy, BvParameters, BvTreeKind, Contact, ForeignData,
    GeometryBackend, GeometryReadGuard, GeometryShape, GeometryWriteGuard, MeshDescription,
    PhysicsMeshFlags, TreeParameters, VoxelGridParameters, MAX_MESH_VERTICES,
};
pub use primitives::{
    BoxPrimitive, Capsule, Cylinder, GeometryType, Plane, Primitive, Ray, Sphere, Triangle,
    REGISTERED_PRIMITIVE_TYPES,
};
