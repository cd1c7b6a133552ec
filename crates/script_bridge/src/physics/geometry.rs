//! Handle-backed wrapper around native physical geometry
//!
//! Key principles:
//! - Every argument is validated before native code is called, so a failed
//!   construction never allocates a native object
//! - Every operation on an invalid (null) shape fails fast with an
//!   invalid-state error and never reaches native code
//! - Locks are RAII guards, acquire and release always come in nested pairs

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::GeometryDefaults;
use crate::error::{BridgeError, BridgeResult};
use crate::foundation::math::Vec3;
use crate::native::NativeHandle;
use crate::physics::primitives::{BoxPrimitive, GeometryType, Plane, Primitive};

/// Largest number of vertices a mesh can index with 16-bit indices
pub const MAX_MESH_VERTICES: usize = u16::MAX as usize;

bitflags! {
    /// Flags that specify how a physical mesh is built
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PhysicsMeshFlags: u32 {
        /// Vertices are shared with the caller
        const SHARED_VERTICES = 0x1;
        /// Indices are shared with the caller
        const SHARED_INDICES = 0x2;
        /// Material ids are shared with the caller
        const SHARED_MATERIALS = 0x4;
        /// Foreign ids are shared with the caller
        const SHARED_FOREIGN_IDS = 0x8;
        /// Normals are shared with the caller
        const SHARED_NORMALS = 0x10;
        /// Build an oriented bounding box tree
        const OBB = 0x20;
        /// Build an axis-aligned bounding box tree
        const AABB = 0x40;
        /// Use a single bounding box
        const SINGLE_BB = 0x80;
        /// Report at most one contact
        const MULTICONTACT0 = 0x100;
        /// Report several contacts when cheap
        const MULTICONTACT1 = 0x200;
        /// Always report several contacts
        const MULTICONTACT2 = 0x400;
        /// Replace with a cylinder when it resembles one
        const APPROX_CYLINDER = 0x800;
        /// Replace with a box when it resembles one
        const APPROX_BOX = 0x1000;
        /// Replace with a sphere when it resembles one
        const APPROX_SPHERE = 0x2000;
        /// Keep the vertex map after merging
        const KEEP_VERTEX_MAP = 0x8000;
        /// Do not merge coincident vertices
        const NO_VERTEX_MERGE = 0x20000;
        /// Build a voxel grid over the mesh
        const VOXEL_GRID = 0x80000;
        /// Mesh never moves
        const ALWAYS_STATIC = 0x100000;
        /// Replace with a capsule when it resembles one
        const APPROX_CAPSULE = 0x200000;
        /// Mesh is transient
        const TRANSIENT = 0x800000;
        /// Mesh cannot take part in boolean operations
        const NO_BOOLEANS = 0x1000000;
    }
}

/// Kind of bounding volume tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BvTreeKind {
    /// Axis-aligned boxes
    Aabb,
    /// Oriented boxes
    Obb,
    /// One box for the whole mesh
    SingleBox,
}

/// Parameters of a bounding volume tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BvParameters {
    /// Tree kind
    pub kind: BvTreeKind,
    /// Nodes with fewer triangles are not split
    pub min_triangles_per_node: i32,
    /// Nodes with more triangles are split
    pub max_triangles_per_node: i32,
    /// Scale applied to AABB volume when several trees compete
    pub favor_aabb: f32,
}

/// Parameters of a voxel grid built over a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelGridParameters {
    /// Nodes with fewer triangles are not split
    pub min_triangles_per_node: i32,
    /// Nodes with more triangles are split
    pub max_triangles_per_node: i32,
    /// Grid origin
    pub origin: Vec3,
    /// Cell size
    pub step: Vec3,
    /// Number of cells along each axis
    pub size: [i32; 3],
}

/// How the mesh's acceleration structure is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TreeParameters {
    /// Native code picks the tree
    Default {
        /// Nodes with fewer triangles are not split
        min_triangles_per_node: i32,
        /// Nodes with more triangles are split
        max_triangles_per_node: i32,
        /// Scale applied to AABB volume when several trees compete
        favor_aabb: f32,
    },
    /// Explicit bounding volume tree
    BoundingVolume(BvParameters),
    /// Voxel grid
    VoxelGrid(VoxelGridParameters),
}

impl TreeParameters {
    /// Default tree with configured node limits
    pub const fn from_defaults(defaults: &GeometryDefaults) -> Self {
        Self::Default {
            min_triangles_per_node: defaults.min_triangles_per_node,
            max_triangles_per_node: defaults.max_triangles_per_node,
            favor_aabb: defaults.favor_aabb,
        }
    }

    const fn triangles_per_node(&self) -> (i32, i32) {
        match self {
            Self::Default {
                min_triangles_per_node,
                max_triangles_per_node,
                ..
            } => (*min_triangles_per_node, *max_triangles_per_node),
            Self::BoundingVolume(bv) => (bv.min_triangles_per_node, bv.max_triangles_per_node),
            Self::VoxelGrid(vg) => (vg.min_triangles_per_node, vg.max_triangles_per_node),
        }
    }
}

/// Everything needed to build a triangle mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    /// Vertex positions
    pub vertices: Vec<Vec3>,
    /// Three indices per triangle
    pub indices: Vec<u16>,
    /// Material id per triangle
    pub material_ids: Option<Vec<u8>>,
    /// Build flags
    pub flags: PhysicsMeshFlags,
    /// Acceleration structure
    pub tree: TreeParameters,
    /// Tolerance used when checking whether the mesh resembles a primitive
    pub approximation_tolerance: f32,
}

impl MeshDescription {
    /// Mesh with the built-in defaults
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u16>) -> Self {
        Self::with_defaults(vertices, indices, &GeometryDefaults::default())
    }

    /// Mesh with configured defaults
    pub fn with_defaults(vertices: Vec<Vec3>, indices: Vec<u16>, defaults: &GeometryDefaults) -> Self {
        Self {
            vertices,
            indices,
            material_ids: None,
            flags: PhysicsMeshFlags::empty(),
            tree: TreeParameters::from_defaults(defaults),
            approximation_tolerance: defaults.approximation_tolerance,
        }
    }

    /// Set per-triangle material ids
    #[must_use]
    pub fn with_material_ids(mut self, material_ids: Vec<u8>) -> Self {
        self.material_ids = Some(material_ids);
        self
    }

    /// Set build flags
    #[must_use]
    pub const fn with_flags(mut self, flags: PhysicsMeshFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the acceleration structure
    #[must_use]
    pub const fn with_tree(mut self, tree: TreeParameters) -> Self {
        self.tree = tree;
        self
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check every argument native code relies on
    pub fn validate(&self) -> BridgeResult<()> {
        if self.vertices.len() < 3 {
            return Err(BridgeError::argument(
                "vertices",
                "An array of vertices needs to have at least 3 vertices.",
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(BridgeError::argument(
                "indices",
                "Length of the array of indexes must be divisible by 3.",
            ));
        }

        let (min_per_node, max_per_node) = self.tree.triangles_per_node();
        if min_per_node <= 0 {
            return Err(BridgeError::out_of_range(
                "min_triangles_per_node",
                "Minimal number of triangles per node must be greater then 0.",
            ));
        }
        if max_per_node <= 0 {
            return Err(BridgeError::out_of_range(
                "max_triangles_per_node",
                "Maximal number of triangles per node must be greater then 0.",
            ));
        }

        if self.vertices.len() > MAX_MESH_VERTICES {
            return Err(BridgeError::out_of_range(
                "vertices",
                "An array of vertices cannot be longer then 65535.",
            ));
        }
        if let Some(material_ids) = &self.material_ids {
            if material_ids.len() != self.triangle_count() {
                return Err(BridgeError::argument(
                    "material_ids",
                    "The number of ids for materials must be equal to number of triangles.",
                ));
            }
        }
        if let TreeParameters::VoxelGrid(grid) = &self.tree {
            if grid.size.iter().any(|&cells| cells <= 0) {
                return Err(BridgeError::argument(
                    "tree",
                    "Dimensions of the voxel grid cannot be less then 0.",
                ));
            }
        }

        if let Some((position, index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| usize::from(index) >= self.vertices.len())
        {
            return Err(BridgeError::out_of_range(
                "indices",
                format!(
                    "Index {index} at position {position} references a vertex outside of an array of {} vertices.",
                    self.vertices.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Arbitrary data attached to a geometry object by its user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForeignData {
    /// Type tag chosen by the user
    pub id: i32,
    /// Opaque payload
    pub data: u64,
}

/// One contact found by an intersection test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact point
    pub point: Vec3,
    /// Contact normal, pointing out of the other geometry
    pub normal: Vec3,
    /// Penetration depth
    pub depth: f32,
}

/// Submerged part of a geometry object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Buoyancy {
    /// Volume below the surface
    pub submerged_volume: f32,
    /// Center of the submerged volume
    pub submerged_center: Vec3,
}

/// How a mesh is covered with boxes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxificationParameters {
    /// Voxel size used to sample the mesh
    pub voxel_size: f32,
    /// Faces smaller than this are ignored
    pub min_face_area: f32,
    /// Islands of voxels smaller than this are dropped
    pub min_island_voxels: i32,
}

impl Default for BoxificationParameters {
    fn default() -> Self {
        Self {
            voxel_size: 0.1,
            min_face_area: 0.0,
            min_island_voxels: 1,
        }
    }
}

/// Native physical geometry
pub trait GeometryBackend: Send + Sync {
    /// Build a triangle mesh; `None` when native code refuses it
    fn create_mesh(&self, description: &MeshDescription) -> Option<NativeHandle>;

    /// Build a primitive geometry object
    fn create_primitive(&self, primitive: &Primitive) -> Option<NativeHandle>;

    /// Type of the geometry object
    fn geometry_type(&self, handle: NativeHandle) -> GeometryType;

    /// Increase the internal reference count; the meaning of the result is engine specific
    fn add_ref(&self, handle: NativeHandle) -> i32;

    /// Decrease the internal reference count
    fn release(&self, handle: NativeHandle);

    /// Acquire a read (`write == false`) or write lock
    fn lock(&self, handle: NativeHandle, write: bool);

    /// Release a lock acquired with the same `write` value
    fn unlock(&self, handle: NativeHandle, write: bool);

    /// Bounding box
    fn bounding_box(&self, handle: NativeHandle) -> BoxPrimitive;

    /// Whether `point` is inside
    fn point_inside(&self, handle: NativeHandle, point: &Vec3) -> bool;

    /// Contacts with another geometry object
    fn intersect(&self, handle: NativeHandle, other: NativeHandle) -> Vec<Contact>;

    /// Closest points on the surface and on the segment `start`..`end`
    fn find_closest_point(
        &self,
        handle: NativeHandle,
        start: &Vec3,
        end: &Vec3,
        max_iterations: u32,
    ) -> (Vec3, Vec3);

    /// Submerged volume and its center below `surface`
    fn buoyancy(&self, handle: NativeHandle, surface: &Plane) -> Buoyancy;

    /// Whether the geometry is convex within `tolerance`
    fn is_convex(&self, handle: NativeHandle, tolerance: f32) -> bool;

    /// Number of primitives (triangles for meshes)
    fn primitive_count(&self, handle: NativeHandle) -> i32;

    /// Volume
    fn volume(&self, handle: NativeHandle) -> f32;

    /// Center
    fn center(&self, handle: NativeHandle) -> Vec3;

    /// Subtract `other`; returns whether anything is left
    fn subtract(&self, handle: NativeHandle, other: NativeHandle) -> bool;

    /// Number of subtractions survived so far
    fn subtraction_count(&self, handle: NativeHandle) -> i32;

    /// User data
    fn foreign_data(&self, handle: NativeHandle) -> ForeignData;

    /// Replace user data
    fn set_foreign_data(&self, handle: NativeHandle, data: ForeignData);

    /// Number of edges that do not belong to exactly two triangles
    fn erroneous_edge_count(&self, handle: NativeHandle) -> i32;

    /// Whether the bounding volume tree has a sane depth
    fn sanity_check(&self, handle: NativeHandle) -> bool;

    /// Cover the mesh with at most `max_boxes` boxes
    fn boxify(
        &self,
        handle: NativeHandle,
        max_boxes: usize,
        parameters: &BoxificationParameters,
    ) -> Vec<BoxPrimitive>;
}

/// Shape of a geometric object used by native physics
///
/// A null shape is representable; every operation on it fails with
/// [`BridgeError::invalid_instance`]. Copies share the native object, whose
/// lifetime is managed with [`GeometryShape::increment_reference_count`] and
/// [`GeometryShape::decrement_reference_count`].
#[derive(Clone)]
pub struct GeometryShape {
    handle: Option<NativeHandle>,
    backend: Arc<dyn GeometryBackend>,
}

impl GeometryShape {
    /// Wrap an existing native object; `None` makes a null shape
    pub fn from_handle(backend: Arc<dyn GeometryBackend>, handle: Option<NativeHandle>) -> Self {
        Self { handle, backend }
    }

    /// Build a triangle mesh
    ///
    /// Nothing is allocated unless every argument is valid. Voxel grid trees
    /// add [`PhysicsMeshFlags::VOXEL_GRID`] to the flags.
    pub fn mesh(backend: Arc<dyn GeometryBackend>, mut description: MeshDescription) -> BridgeResult<Self> {
        description.validate()?;
        if matches!(description.tree, TreeParameters::VoxelGrid(_)) {
            description.flags |= PhysicsMeshFlags::VOXEL_GRID;
        }

        let handle = backend.create_mesh(&description).ok_or_else(|| {
            BridgeError::Native(format!(
                "Native physics refused a mesh with {} vertices and {} triangles",
                description.vertices.len(),
                description.triangle_count()
            ))
        })?;
        log::debug!(
            "Created physical mesh {handle} ({} triangles)",
            description.triangle_count()
        );
        Ok(Self::from_handle(backend, Some(handle)))
    }

    /// Build a primitive geometry object
    pub fn primitive(backend: Arc<dyn GeometryBackend>, primitive: &Primitive) -> BridgeResult<Self> {
        if !primitive.is_registered() {
            return Err(BridgeError::NotSupported(format!(
                "Primitive type with identifier = {} is not supported",
                primitive.geometry_type().id()
            )));
        }

        let handle = backend.create_primitive(primitive).ok_or_else(|| {
            BridgeError::Native(format!(
                "Native physics refused a {:?} primitive",
                primitive.geometry_type()
            ))
        })?;
        Ok(Self::from_handle(backend, Some(handle)))
    }

    /// Whether this shape refers to a native object
    pub const fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Native handle, if any
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Triangle mesh or the kind of primitive
    pub fn geometry_type(&self) -> BridgeResult<GeometryType> {
        let handle = self.assert_instance()?;
        Ok(self.backend.geometry_type(handle))
    }

    /// Bounding box
    pub fn bounding_box(&self) -> BridgeResult<BoxPrimitive> {
        let handle = self.assert_instance()?;
        Ok(self.backend.bounding_box(handle))
    }

    /// Whether the shape is convex within `tolerance`
    pub fn is_convex(&self, tolerance: f32) -> BridgeResult<bool> {
        let handle = self.assert_instance()?;
        Ok(self.backend.is_convex(handle, tolerance))
    }

    /// Number of primitives the shape consists of
    pub fn primitive_count(&self) -> BridgeResult<i32> {
        let handle = self.assert_instance()?;
        Ok(self.backend.primitive_count(handle))
    }

    /// Volume
    pub fn volume(&self) -> BridgeResult<f32> {
        let handle = self.assert_instance()?;
        Ok(self.backend.volume(handle))
    }

    /// Center
    pub fn center(&self) -> BridgeResult<Vec3> {
        let handle = self.assert_instance()?;
        Ok(self.backend.center(handle))
    }

    /// Number of subtractions this shape survived
    pub fn survived_subtractions(&self) -> BridgeResult<i32> {
        let handle = self.assert_instance()?;
        Ok(self.backend.subtraction_count(handle))
    }

    /// User data
    pub fn foreign_data(&self) -> BridgeResult<ForeignData> {
        let handle = self.assert_instance()?;
        Ok(self.backend.foreign_data(handle))
    }

    /// Replace user data
    pub fn set_foreign_data(&self, data: ForeignData) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        self.backend.set_foreign_data(handle, data);
        Ok(())
    }

    /// Number of edges that do not belong to exactly two triangles; only meaningful for meshes
    pub fn erroneous_edge_count(&self) -> BridgeResult<i32> {
        let handle = self.assert_instance()?;
        Ok(self.backend.erroneous_edge_count(handle))
    }

    /// Whether the bounding volume tree is not excessively deep
    pub fn is_sane(&self) -> BridgeResult<bool> {
        let handle = self.assert_instance()?;
        Ok(self.backend.sanity_check(handle))
    }

    /// Increase the native reference count
    ///
    /// The returned value is whatever native code reports and is not
    /// guaranteed to be the number of references.
    pub fn increment_reference_count(&self) -> BridgeResult<i32> {
        let handle = self.assert_instance()?;
        Ok(self.backend.add_ref(handle))
    }

    /// Decrease the native reference count
    pub fn decrement_reference_count(&self) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        self.backend.release(handle);
        Ok(())
    }

    /// Prevent writes to the internal buffers until the guard is dropped
    pub fn lock_read(&self) -> BridgeResult<GeometryReadGuard<'_>> {
        let handle = self.assert_instance()?;
        self.backend.lock(handle, false);
        Ok(GeometryReadGuard {
            shape: self,
            handle,
        })
    }

    /// Take exclusive access to the internal buffers until the guard is dropped
    pub fn lock_write(&self) -> BridgeResult<GeometryWriteGuard<'_>> {
        let handle = self.assert_instance()?;
        self.backend.lock(handle, true);
        Ok(GeometryWriteGuard {
            shape: self,
            handle,
        })
    }

    /// Whether `point` is inside
    pub fn contains_point(&self, point: &Vec3) -> BridgeResult<bool> {
        let handle = self.assert_instance()?;
        Ok(self.backend.point_inside(handle, point))
    }

    /// Contacts with `other`
    pub fn intersection(&self, other: &Self) -> BridgeResult<Vec<Contact>> {
        let handle = self.assert_instance()?;
        let other = other.handle.ok_or_else(|| {
            BridgeError::argument("other", "An object that represents another geometry must be valid.")
        })?;
        Ok(self.backend.intersect(handle, other))
    }

    /// Point on the surface closest to `start`
    pub fn find_closest_point(&self, start: &Vec3, max_iterations: u32) -> BridgeResult<Vec3> {
        let (on_surface, _) = self.find_closest_point_to_segment(start, start, max_iterations)?;
        Ok(on_surface)
    }

    /// Shortest segment between the surface and `start`..`end`, as (surface point, segment point)
    pub fn find_closest_point_to_segment(
        &self,
        start: &Vec3,
        end: &Vec3,
        max_iterations: u32,
    ) -> BridgeResult<(Vec3, Vec3)> {
        let handle = self.assert_instance()?;
        Ok(self
            .backend
            .find_closest_point(handle, start, end, max_iterations))
    }

    /// Volume and center of the part below `surface`
    pub fn calculate_buoyancy(&self, surface: &Plane) -> BridgeResult<Buoyancy> {
        let handle = self.assert_instance()?;
        Ok(self.backend.buoyancy(handle, surface))
    }

    /// Subtract `subtrahend`; returns whether this shape still has volume
    ///
    /// A null subtrahend changes nothing.
    pub fn subtract(&self, subtrahend: &Self) -> BridgeResult<bool> {
        let handle = self.assert_instance()?;
        let Some(other) = subtrahend.handle else {
            return Ok(true);
        };
        Ok(self.backend.subtract(handle, other))
    }

    /// Cover a mesh with at most `max_boxes` boxes
    pub fn boxify(
        &self,
        max_boxes: usize,
        parameters: &BoxificationParameters,
    ) -> BridgeResult<Vec<BoxPrimitive>> {
        let handle = self.assert_instance()?;
        if max_boxes == 0 {
            return Ok(Vec::new());
        }
        Ok(self.backend.boxify(handle, max_boxes, parameters))
    }

    fn assert_instance(&self) -> BridgeResult<NativeHandle> {
        self.handle.ok_or_else(BridgeError::invalid_instance)
    }
}

impl fmt::Debug for GeometryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryShape")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl PartialEq for GeometryShape {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

/// Read lock on a geometry object, released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct GeometryReadGuard<'a> {
    shape: &'a GeometryShape,
    handle: NativeHandle,
}

impl GeometryReadGuard<'_> {
    /// Locked shape
    pub const fn shape(&self) -> &GeometryShape {
        self.shape
    }
}

impl Drop for GeometryReadGuard<'_> {
    fn drop(&mut self) {
        self.shape.backend.unlock(self.handle, false);
    }
}

/// Write lock on a geometry object, released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct GeometryWriteGuard<'a> {
    shape: &'a GeometryShape,
    handle: NativeHandle,
}

impl GeometryWriteGuard<'_> {
    /// Locked shape
    pub const fn shape(&self) -> &GeometryShape {
        self.shape
    }
}

impl Drop for GeometryWriteGuard<'_> {
    fn drop(&mut self) {
        self.shape.backend.unlock(self.handle, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::{HeadlessEngine, LockEvent};
    use crate::physics::primitives::Sphere;
    use approx::assert_relative_eq;

    fn engine() -> Arc<HeadlessEngine> {
        Arc::new(HeadlessEngine::new())
    }

    fn cube(min: f32, max: f32) -> MeshDescription {
        let vertices = vec![
            Vec3::new(min, min, min),
            Vec3::new(max, min, min),
            Vec3::new(max, max, min),
            Vec3::new(min, max, min),
            Vec3::new(min, min, max),
            Vec3::new(max, min, max),
            Vec3::new(max, max, max),
            Vec3::new(min, max, max),
        ];
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            1, 2, 6, 1, 6, 5, // right
            3, 0, 4, 3, 4, 7, // left
        ];
        MeshDescription::new(vertices, indices)
    }

    fn assert_not_allocated(engine: &HeadlessEngine, result: BridgeResult<GeometryShape>) -> BridgeError {
        let err = result.unwrap_err();
        assert_eq!(engine.allocated_geometries(), 0);
        err
    }

    #[test]
    fn test_too_few_vertices() {
        let engine = engine();
        let description = MeshDescription::new(vec![Vec3::zeros(), Vec3::x()], vec![0, 1, 0]);
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::Argument { argument: "vertices", .. }));
    }

    #[test]
    fn test_indices_not_divisible_by_three() {
        let engine = engine();
        let mut description = cube(0.0, 1.0);
        description.indices.pop();
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::Argument { argument: "indices", .. }));
    }

    #[test]
    fn test_too_many_vertices() {
        let engine = engine();
        let description = MeshDescription::new(vec![Vec3::zeros(); MAX_MESH_VERTICES + 1], vec![0, 1, 2]);
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::OutOfRange { argument: "vertices", .. }));
    }

    #[test]
    fn test_validation_order_and_remaining_rules() {
        let engine = engine();

        let description = cube(0.0, 1.0).with_tree(TreeParameters::BoundingVolume(BvParameters {
            kind: BvTreeKind::Aabb,
            min_triangles_per_node: 0,
            max_triangles_per_node: 4,
            favor_aabb: 1.0,
        }));
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::OutOfRange { argument: "min_triangles_per_node", .. }));

        let description = cube(0.0, 1.0).with_material_ids(vec![0; 3]);
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::Argument { argument: "material_ids", .. }));

        let mut description = cube(0.0, 1.0);
        description.indices[4] = 8;
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::OutOfRange { argument: "indices", .. }));

        let description = cube(0.0, 1.0).with_tree(TreeParameters::VoxelGrid(VoxelGridParameters {
            min_triangles_per_node: 2,
            max_triangles_per_node: 4,
            origin: Vec3::zeros(),
            step: Vec3::repeat(0.5),
            size: [2, 0, 2],
        }));
        let err = assert_not_allocated(&engine, GeometryShape::mesh(engine.clone(), description));
        assert!(matches!(err, BridgeError::Argument { argument: "tree", .. }));
    }

    #[test]
    fn test_voxel_grid_adds_flag() {
        let engine = engine();
        let description = cube(0.0, 1.0).with_tree(TreeParameters::VoxelGrid(VoxelGridParameters {
            min_triangles_per_node: 2,
            max_triangles_per_node: 4,
            origin: Vec3::zeros(),
            step: Vec3::repeat(0.5),
            size: [2, 2, 2],
        }));
        let shape = GeometryShape::mesh(engine.clone(), description).unwrap();

        assert_eq!(engine.allocated_geometries(), 1);
        assert_eq!(shape.geometry_type().unwrap(), GeometryType::VoxelGrid);
        assert!(engine
            .mesh_flags(shape.handle().unwrap())
            .unwrap()
            .contains(PhysicsMeshFlags::VOXEL_GRID));
    }

    #[test]
    fn test_null_shape_fails_fast() {
        let engine = engine();
        let shape = GeometryShape::from_handle(engine.clone(), None);

        assert!(!shape.is_valid());
        assert!(shape.volume().unwrap_err().is_invalid_state());
        assert!(shape.lock_read().is_err());
        assert!(shape.increment_reference_count().is_err());
        assert!(shape.subtract(&shape).unwrap_err().is_invalid_state());
        assert!(engine.lock_log().is_empty());
    }

    #[test]
    fn test_mesh_queries() {
        let engine = engine();
        let shape = GeometryShape::mesh(engine.clone(), cube(-1.0, 1.0)).unwrap();

        assert_eq!(shape.geometry_type().unwrap(), GeometryType::TriangleMesh);
        assert_eq!(shape.primitive_count().unwrap(), 12);
        assert_relative_eq!(shape.volume().unwrap(), 8.0, epsilon = 1e-4);
        assert_relative_eq!(shape.center().unwrap(), Vec3::zeros(), epsilon = 1e-6);
        assert!(shape.is_convex(0.01).unwrap());
        assert_eq!(shape.erroneous_edge_count().unwrap(), 0);
        assert!(shape.is_sane().unwrap());
        assert!(shape.contains_point(&Vec3::new(0.5, 0.5, 0.5)).unwrap());
        assert!(!shape.contains_point(&Vec3::new(2.0, 0.0, 0.0)).unwrap());
        assert_relative_eq!(
            shape.find_closest_point(&Vec3::new(3.0, 0.0, 0.0), 10).unwrap(),
            Vec3::new(1.0, 0.0, 0.0)
        );

        let bbox = shape.bounding_box().unwrap();
        assert_relative_eq!(bbox.half_size, Vec3::repeat(1.0));
    }

    #[test]
    fn test_open_mesh_reports_erroneous_edges() {
        let engine = engine();
        let mut description = cube(0.0, 1.0);
        description.indices.truncate(6);
        let shape = GeometryShape::mesh(engine, description).unwrap();
        assert_eq!(shape.erroneous_edge_count().unwrap(), 4);
    }

    #[test]
    fn test_intersection_and_subtraction() {
        let engine = engine();
        let a = GeometryShape::mesh(engine.clone(), cube(0.0, 2.0)).unwrap();
        let b = GeometryShape::mesh(engine.clone(), cube(1.0, 3.0)).unwrap();
        let far = GeometryShape::mesh(engine.clone(), cube(10.0, 11.0)).unwrap();
        let null = GeometryShape::from_handle(engine.clone(), None);

        assert_eq!(a.intersection(&b).unwrap().len(), 1);
        assert!(a.intersection(&far).unwrap().is_empty());
        assert!(matches!(
            a.intersection(&null),
            Err(BridgeError::Argument { argument: "other", .. })
        ));

        assert!(a.subtract(&null).unwrap());
        assert_eq!(a.survived_subtractions().unwrap(), 0);
        assert!(a.subtract(&b).unwrap());
        assert_eq!(a.survived_subtractions().unwrap(), 1);
    }

    #[test]
    fn test_primitive_construction() {
        let engine = engine();
        let sphere = GeometryShape::primitive(
            engine.clone(),
            &Primitive::Sphere(Sphere {
                center: Vec3::zeros(),
                radius: 1.0,
            }),
        )
        .unwrap();
        assert_eq!(sphere.geometry_type().unwrap(), GeometryType::Sphere);
        assert_eq!(sphere.primitive_count().unwrap(), 1);

        let plane = Primitive::Plane(Plane::new(Vec3::z(), Vec3::zeros()));
        assert!(matches!(
            GeometryShape::primitive(engine.clone(), &plane),
            Err(BridgeError::NotSupported(_))
        ));
        assert_eq!(engine.allocated_geometries(), 1);
    }

    #[test]
    fn test_buoyancy_of_half_submerged_cube() {
        let engine = engine();
        let shape = GeometryShape::mesh(engine, cube(-1.0, 1.0)).unwrap();
        let surface = Plane::new(Vec3::z(), Vec3::zeros());

        let buoyancy = shape.calculate_buoyancy(&surface).unwrap();
        assert_relative_eq!(buoyancy.submerged_volume, 4.0, epsilon = 1e-4);
        assert_relative_eq!(buoyancy.submerged_center, Vec3::new(0.0, 0.0, -0.5), epsilon = 1e-5);
    }

    #[test]
    fn test_locks_are_nested_pairs() {
        let engine = engine();
        let shape = GeometryShape::mesh(engine.clone(), cube(0.0, 1.0)).unwrap();
        let handle = shape.handle().unwrap();

        {
            let _read = shape.lock_read().unwrap();
            let _write = shape.lock_write().unwrap();
        }

        assert_eq!(
            engine.lock_log(),
            vec![
                (handle, LockEvent::Lock { write: false }),
                (handle, LockEvent::Lock { write: true }),
                (handle, LockEvent::Unlock { write: true }),
                (handle, LockEvent::Unlock { write: false }),
            ]
        );
    }

    #[test]
    fn test_reference_counting_and_foreign_data() {
        let engine = engine();
        let shape = GeometryShape::mesh(engine.clone(), cube(0.0, 1.0)).unwrap();
        let copy = shape.clone();
        assert_eq!(copy, shape);

        let count = shape.increment_reference_count().unwrap();
        assert_eq!(copy.increment_reference_count().unwrap(), count + 1);
        copy.decrement_reference_count().unwrap();

        let data = ForeignData { id: 3, data: 0xfeed };
        shape.set_foreign_data(data).unwrap();
        assert_eq!(copy.foreign_data().unwrap(), data);
    }

    #[test]
    fn test_boxify() {
        let engine = engine();
        let shape = GeometryShape::mesh(engine, cube(0.0, 2.0)).unwrap();
        let params = BoxificationParameters::default();

        assert!(shape.boxify(0, &params).unwrap().is_empty());
        let boxes = shape.boxify(4, &params).unwrap();
        assert_eq!(boxes.len(), 1);
        assert_relative_eq!(boxes[0].center, Vec3::repeat(1.0));
    }
}
