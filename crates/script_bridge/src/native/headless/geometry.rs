//! Geometry queries of the headless engine
//!
//! Meshes keep their triangles; everything else is answered from bounding
//! boxes. Volume and center of meshes are exact for closed meshes, contacts,
//! closest points and boxification are box approximations.

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::native::NativeHandle;
use crate::physics::{
    BoxPrimitive, BoxificationParameters, Buoyancy, Contact, ForeignData, GeometryBackend,
    GeometryType, MeshDescription, PhysicsMeshFlags, Plane, Primitive,
};

use super::{HeadlessEngine, LockEvent};

/// Cells per axis when sampling a bounding box for buoyancy
const BUOYANCY_SAMPLES: usize = 16;

/// Volumes below this are treated as flat
const FLAT_VOLUME: f32 = 1e-6;

pub(super) enum Shape {
    Mesh {
        vertices: Vec<Vec3>,
        indices: Vec<u16>,
        flags: PhysicsMeshFlags,
    },
    Primitive(Primitive),
}

pub(super) struct GeometryRecord {
    shape: Shape,
    pub(super) ref_count: i32,
    foreign: ForeignData,
    subtractions: i32,
}

impl GeometryRecord {
    fn new(shape: Shape) -> Self {
        Self {
            shape,
            ref_count: 1,
            foreign: ForeignData::default(),
            subtractions: 0,
        }
    }

    pub(super) const fn mesh_flags(&self) -> Option<PhysicsMeshFlags> {
        match &self.shape {
            Shape::Mesh { flags, .. } => Some(*flags),
            Shape::Primitive(_) => None,
        }
    }

    fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        let (vertices, indices): (&[Vec3], &[u16]) = match &self.shape {
            Shape::Mesh {
                vertices, indices, ..
            } => (vertices.as_slice(), indices.as_slice()),
            Shape::Primitive(_) => (&[], &[]),
        };
        indices.chunks_exact(3).map(move |triangle| {
            [
                vertices[usize::from(triangle[0])],
                vertices[usize::from(triangle[1])],
                vertices[usize::from(triangle[2])],
            ]
        })
    }

    fn geometry_type(&self) -> GeometryType {
        match &self.shape {
            Shape::Mesh { flags, .. } if flags.contains(PhysicsMeshFlags::VOXEL_GRID) => {
                GeometryType::VoxelGrid
            }
            Shape::Mesh { .. } => GeometryType::TriangleMesh,
            Shape::Primitive(primitive) => primitive.geometry_type(),
        }
    }

    fn bounds(&self) -> BoxPrimitive {
        match &self.shape {
            Shape::Mesh { vertices, .. } => {
                let first = vertices.first().copied().unwrap_or_else(Vec3::zeros);
                let (min, max) = vertices
                    .iter()
                    .fold((first, first), |(min, max), v| (min.inf(v), max.sup(v)));
                BoxPrimitive::from_bounds(min, max)
            }
            Shape::Primitive(primitive) => primitive.bounds(),
        }
    }

    /// Signed volume and volume-weighted centroid sum of the mesh tetrahedra
    fn mesh_moments(&self) -> (f32, Vec3) {
        self.triangles()
            .fold((0.0, Vec3::zeros()), |(volume, moment), [a, b, c]| {
                let tetra = a.dot(&b.cross(&c)) / 6.0;
                (volume + tetra, moment + (a + b + c) * (tetra / 4.0))
            })
    }

    fn volume(&self) -> f32 {
        match &self.shape {
            Shape::Mesh { .. } => self.mesh_moments().0.abs(),
            Shape::Primitive(primitive) => primitive.volume(),
        }
    }

    fn center(&self) -> Vec3 {
        match &self.shape {
            Shape::Mesh { vertices, .. } => {
                let (volume, moment) = self.mesh_moments();
                if volume.abs() > FLAT_VOLUME {
                    moment / volume
                } else if vertices.is_empty() {
                    Vec3::zeros()
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let count = vertices.len() as f32;
                    vertices.iter().sum::<Vec3>() / count
                }
            }
            Shape::Primitive(primitive) => primitive.center(),
        }
    }

    fn contains(&self, point: &Vec3) -> bool {
        match &self.shape {
            Shape::Primitive(Primitive::Sphere(sphere)) => {
                (point - sphere.center).norm() <= sphere.radius
            }
            _ => self.bounds().contains(point),
        }
    }

    fn is_convex(&self, tolerance: f32) -> bool {
        let Shape::Mesh { vertices, .. } = &self.shape else {
            return true;
        };
        self.triangles().all(|[a, b, c]| {
            let normal = (b - a).cross(&(c - a));
            if normal.norm() <= f32::EPSILON {
                return true;
            }
            let plane = Plane::new(normal, a);
            vertices.iter().all(|v| plane.distance(v) <= tolerance)
        })
    }

    fn primitive_count(&self) -> i32 {
        match &self.shape {
            Shape::Mesh { indices, .. } => i32::try_from(indices.len() / 3).unwrap_or(i32::MAX),
            Shape::Primitive(_) => 1,
        }
    }

    fn erroneous_edge_count(&self) -> i32 {
        let Shape::Mesh { indices, .. } = &self.shape else {
            return 0;
        };
        let mut edges: HashMap<(u16, u16), u32> = HashMap::new();
        for triangle in indices.chunks_exact(3) {
            for (from, to) in [(0, 1), (1, 2), (2, 0)] {
                let (a, b) = (triangle[from], triangle[to]);
                *edges.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        let erroneous = edges.values().filter(|&&count| count != 2).count();
        i32::try_from(erroneous).unwrap_or(i32::MAX)
    }

    #[allow(clippy::cast_precision_loss)]
    fn buoyancy(&self, surface: &Plane) -> Buoyancy {
        let bounds = self.bounds();
        let (min, size) = (bounds.min(), bounds.extent() * 2.0);
        let samples = BUOYANCY_SAMPLES;

        let mut below = 0usize;
        let mut sum = Vec3::zeros();
        for i in 0..samples {
            for j in 0..samples {
                for k in 0..samples {
                    let cell = Vec3::new(i as f32 + 0.5, j as f32 + 0.5, k as f32 + 0.5)
                        / samples as f32;
                    let point = min + size.component_mul(&cell);
                    if surface.distance(&point) < 0.0 {
                        below += 1;
                        sum += point;
                    }
                }
            }
        }

        if below == 0 {
            return Buoyancy {
                submerged_volume: 0.0,
                submerged_center: bounds.center,
            };
        }
        let fraction = below as f32 / samples.pow(3) as f32;
        Buoyancy {
            submerged_volume: self.volume() * fraction,
            submerged_center: sum / below as f32,
        }
    }
}

fn overlap(a: &BoxPrimitive, b: &BoxPrimitive) -> Option<(Vec3, Vec3)> {
    let min = a.min().sup(&b.min());
    let max = a.max().inf(&b.max());
    (0..3).all(|i| min[i] <= max[i]).then_some((min, max))
}

impl HeadlessEngine {
    fn insert_geometry(&self, shape: Shape) -> NativeHandle {
        let handle = self.allocate_handle();
        self.geometry
            .lock()
            .objects
            .insert(handle, GeometryRecord::new(shape));
        handle
    }

    fn with_geometry<T>(
        &self,
        handle: NativeHandle,
        fallback: T,
        query: impl FnOnce(&GeometryRecord) -> T,
    ) -> T {
        self.geometry.lock().objects.get(&handle).map_or_else(
            || {
                log::warn!("Unknown geometry {handle}");
                fallback
            },
            query,
        )
    }

    fn with_geometry_mut<T>(
        &self,
        handle: NativeHandle,
        fallback: T,
        update: impl FnOnce(&mut GeometryRecord) -> T,
    ) -> T {
        self.geometry.lock().objects.get_mut(&handle).map_or_else(
            || {
                log::warn!("Unknown geometry {handle}");
                fallback
            },
            update,
        )
    }
}

impl GeometryBackend for HeadlessEngine {
    fn create_mesh(&self, description: &MeshDescription) -> Option<NativeHandle> {
        Some(self.insert_geometry(Shape::Mesh {
            vertices: description.vertices.clone(),
            indices: description.indices.clone(),
            flags: description.flags,
        }))
    }

    fn create_primitive(&self, primitive: &Primitive) -> Option<NativeHandle> {
        Some(self.insert_geometry(Shape::Primitive(*primitive)))
    }

    fn geometry_type(&self, handle: NativeHandle) -> GeometryType {
        self.with_geometry(handle, GeometryType::TriangleMesh, GeometryRecord::geometry_type)
    }

    fn add_ref(&self, handle: NativeHandle) -> i32 {
        self.with_geometry_mut(handle, 0, |record| {
            record.ref_count += 1;
            record.ref_count
        })
    }

    fn release(&self, handle: NativeHandle) {
        let mut geometry = self.geometry.lock();
        let Some(record) = geometry.objects.get_mut(&handle) else {
            log::warn!("Releasing unknown geometry {handle}");
            return;
        };
        record.ref_count -= 1;
        if record.ref_count <= 0 {
            geometry.objects.remove(&handle);
            log::debug!("Geometry {handle} destroyed");
        }
    }

    fn lock(&self, handle: NativeHandle, write: bool) {
        self.geometry
            .lock()
            .locks
            .push((handle, LockEvent::Lock { write }));
    }

    fn unlock(&self, handle: NativeHandle, write: bool) {
        self.geometry
            .lock()
            .locks
            .push((handle, LockEvent::Unlock { write }));
    }

    fn bounding_box(&self, handle: NativeHandle) -> BoxPrimitive {
        self.with_geometry(
            handle,
            BoxPrimitive::aligned(Vec3::zeros(), Vec3::zeros()),
            GeometryRecord::bounds,
        )
    }

    fn point_inside(&self, handle: NativeHandle, point: &Vec3) -> bool {
        self.with_geometry(handle, false, |record| record.contains(point))
    }

    fn intersect(&self, handle: NativeHandle, other: NativeHandle) -> Vec<Contact> {
        let geometry = self.geometry.lock();
        let (Some(a), Some(b)) = (geometry.objects.get(&handle), geometry.objects.get(&other))
        else {
            return Vec::new();
        };
        let (a, b) = (a.bounds(), b.bounds());
        let Some((min, max)) = overlap(&a, &b) else {
            return Vec::new();
        };

        let depths = max - min;
        let axis = depths.imin();
        let mut normal = Vec3::zeros();
        normal[axis] = if a.center[axis] >= b.center[axis] { 1.0 } else { -1.0 };
        vec![Contact {
            point: (min + max) * 0.5,
            normal,
            depth: depths[axis],
        }]
    }

    #[allow(clippy::cast_precision_loss)]
    fn find_closest_point(
        &self,
        handle: NativeHandle,
        start: &Vec3,
        end: &Vec3,
        max_iterations: u32,
    ) -> (Vec3, Vec3) {
        let bounds = self.bounding_box(handle);
        let steps = max_iterations.max(1);
        (0..=steps)
            .map(|step| {
                let on_segment = start + (end - start) * (step as f32 / steps as f32);
                (bounds.clamp(&on_segment), on_segment)
            })
            .min_by(|(a, p), (b, q)| (a - p).norm().total_cmp(&(b - q).norm()))
            .unwrap_or((bounds.clamp(start), *start))
    }

    fn buoyancy(&self, handle: NativeHandle, surface: &Plane) -> Buoyancy {
        self.with_geometry(
            handle,
            Buoyancy {
                submerged_volume: 0.0,
                submerged_center: Vec3::zeros(),
            },
            |record| record.buoyancy(surface),
        )
    }

    fn is_convex(&self, handle: NativeHandle, tolerance: f32) -> bool {
        self.with_geometry(handle, false, |record| record.is_convex(tolerance))
    }

    fn primitive_count(&self, handle: NativeHandle) -> i32 {
        self.with_geometry(handle, 0, GeometryRecord::primitive_count)
    }

    fn volume(&self, handle: NativeHandle) -> f32 {
        self.with_geometry(handle, 0.0, GeometryRecord::volume)
    }

    fn center(&self, handle: NativeHandle) -> Vec3 {
        self.with_geometry(handle, Vec3::zeros(), GeometryRecord::center)
    }

    fn subtract(&self, handle: NativeHandle, other: NativeHandle) -> bool {
        let subtrahend = self.bounding_box(other);
        self.with_geometry_mut(handle, false, |record| {
            let bounds = record.bounds();
            if subtrahend.contains(&bounds.min()) && subtrahend.contains(&bounds.max()) {
                return false;
            }
            if overlap(&bounds, &subtrahend).is_some() {
                record.subtractions += 1;
            }
            true
        })
    }

    fn subtraction_count(&self, handle: NativeHandle) -> i32 {
        self.with_geometry(handle, 0, |record| record.subtractions)
    }

    fn foreign_data(&self, handle: NativeHandle) -> ForeignData {
        self.with_geometry(handle, ForeignData::default(), |record| record.foreign)
    }

    fn set_foreign_data(&self, handle: NativeHandle, data: ForeignData) {
        self.with_geometry_mut(handle, (), |record| record.foreign = data);
    }

    fn erroneous_edge_count(&self, handle: NativeHandle) -> i32 {
        self.with_geometry(handle, 0, GeometryRecord::erroneous_edge_count)
    }

    fn sanity_check(&self, handle: NativeHandle) -> bool {
        self.with_geometry(handle, false, |record| record.primitive_count() > 0)
    }

    fn boxify(
        &self,
        handle: NativeHandle,
        max_boxes: usize,
        parameters: &BoxificationParameters,
    ) -> Vec<BoxPrimitive> {
        log::trace!(
            "Boxifying geometry {handle} with voxel size {}",
            parameters.voxel_size
        );
        let bounds = self.bounding_box(handle);
        std::iter::once(bounds).take(max_boxes).collect()
    }
}
