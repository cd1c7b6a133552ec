//! Static meshes and their data streams
//!
//! Native meshes keep each vertex attribute in a separate stream. Streams
//! are plain arrays of `#[repr(C)]` elements, exchanged with the engine as
//! bytes and reinterpreted with bytemuck.

pub mod texture_positions;

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::native::NativeHandle;

pub use texture_positions::TexturePositionCollection;

/// Streams of a static mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshStream {
    /// Vertex positions
    Positions,
    /// Vertex normals
    Normals,
    /// Texture coordinates
    TextureCoordinates,
    /// Vertex colors
    Colors,
    /// Triangle indices
    Indices,
}

impl MeshStream {
    /// Size of one element in bytes
    pub const fn element_size(self) -> usize {
        match self {
            Self::Positions | Self::Normals => 12,
            Self::TextureCoordinates => std::mem::size_of::<TexturePosition>(),
            Self::Colors | Self::Indices => 4,
        }
    }
}

/// Texture coordinates of one vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct TexturePosition {
    /// Horizontal coordinate
    pub u: f32,
    /// Vertical coordinate
    pub v: f32,
}

impl TexturePosition {
    /// Create texture coordinates
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Native mesh stream storage
pub trait MeshStreamBackend: Send + Sync {
    /// Number of elements in a stream
    fn stream_len(&self, mesh: NativeHandle, stream: MeshStream) -> usize;

    /// Counter that changes whenever the stream's contents or size change
    fn stream_generation(&self, mesh: NativeHandle, stream: MeshStream) -> u64;

    /// Resize a stream, keeping the leading elements; zero frees it
    fn reallocate_stream(&self, mesh: NativeHandle, stream: MeshStream, len: usize);

    /// Copy of the whole stream as raw bytes
    fn read_stream(&self, mesh: NativeHandle, stream: MeshStream) -> Vec<u8>;

    /// Overwrite elements starting at element `first`
    fn write_stream(&self, mesh: NativeHandle, stream: MeshStream, first: usize, bytes: &[u8]);

    /// Remove `count` elements starting at `first`; the range is already clamped
    fn remove_range(&self, mesh: NativeHandle, stream: MeshStream, first: usize, count: usize);
}

/// Reference to a native static mesh
#[derive(Clone)]
pub struct StaticMesh {
    handle: Option<NativeHandle>,
    backend: Arc<dyn MeshStreamBackend>,
}

impl StaticMesh {
    /// Wrap a native mesh; `None` makes a null mesh
    pub fn new(backend: Arc<dyn MeshStreamBackend>, handle: Option<NativeHandle>) -> Self {
        Self { handle, backend }
    }

    /// Whether this refers to a native mesh
    pub const fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Native handle, if any
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Number of elements in `stream`
    pub fn stream_len(&self, stream: MeshStream) -> BridgeResult<usize> {
        let handle = self.assert_instance()?;
        Ok(self.backend.stream_len(handle, stream))
    }

    /// Texture coordinates of the vertices
    pub fn texture_positions(&self) -> TexturePositionCollection<'_> {
        TexturePositionCollection::new(self)
    }

    pub(crate) fn backend(&self) -> &dyn MeshStreamBackend {
        self.backend.as_ref()
    }

    pub(crate) fn assert_instance(&self) -> BridgeResult<NativeHandle> {
        self.handle.ok_or_else(BridgeError::invalid_instance)
    }
}

impl fmt::Debug for StaticMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMesh")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
