//! Texture coordinate stream of a static mesh

use parking_lot::RwLock;

use crate::error::{BridgeError, BridgeResult};
use crate::mesh::{MeshStream, StaticMesh, TexturePosition};
use crate::native::NativeHandle;

const STREAM: MeshStream = MeshStream::TextureCoordinates;

/// View over the texture coordinates of a mesh
///
/// The stream is copied out of native memory on first access and fetched
/// again whenever the stream's generation moves on, so reads see writes and
/// reallocations made through other views or by the engine itself.
pub struct TexturePositionCollection<'a> {
    mesh: &'a StaticMesh,
    buffer: RwLock<Option<Snapshot>>,
}

struct Snapshot {
    generation: u64,
    positions: Vec<TexturePosition>,
}

impl<'a> TexturePositionCollection<'a> {
    pub(crate) const fn new(mesh: &'a StaticMesh) -> Self {
        Self {
            mesh,
            buffer: RwLock::new(None),
        }
    }

    /// Whether the owning mesh is valid
    pub const fn is_valid(&self) -> bool {
        self.mesh.is_valid()
    }

    /// Number of texture positions
    pub fn len(&self) -> BridgeResult<usize> {
        let handle = self.mesh.assert_instance()?;
        Ok(self.mesh.backend().stream_len(handle, STREAM))
    }

    /// Whether the stream is empty
    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Resize the stream; zero frees it
    pub fn set_len(&self, len: usize) -> BridgeResult<()> {
        let handle = self.mesh.assert_instance()?;
        self.mesh.backend().reallocate_stream(handle, STREAM, len);
        self.refetch(handle);
        Ok(())
    }

    /// Texture position at `index`
    pub fn get(&self, index: usize) -> BridgeResult<TexturePosition> {
        let handle = self.checked_index(index)?;
        self.ensure_fetched(handle);
        self.buffer
            .read()
            .as_ref()
            .and_then(|snapshot| snapshot.positions.get(index).copied())
            .ok_or_else(|| out_of_bounds(index))
    }

    /// Replace the texture position at `index`
    pub fn set(&self, index: usize, position: TexturePosition) -> BridgeResult<()> {
        let handle = self.checked_index(index)?;
        self.mesh
            .backend()
            .write_stream(handle, STREAM, index, bytemuck::bytes_of(&position));
        // the write moved the generation on; the next read fetches again
        Ok(())
    }

    /// Remove up to `count` positions starting at `first`; the range is clamped to the stream
    pub fn remove_range(&self, first: usize, count: usize) -> BridgeResult<()> {
        let handle = self.mesh.assert_instance()?;
        let len = self.mesh.backend().stream_len(handle, STREAM);
        if first >= len || count == 0 {
            return Ok(());
        }

        let count = count.min(len - first);
        self.mesh.backend().remove_range(handle, STREAM, first, count);
        self.refetch(handle);
        Ok(())
    }

    /// Remove the position at `index`
    pub fn remove_at(&self, index: usize) -> BridgeResult<()> {
        self.remove_range(index, 1)
    }

    /// Remove every position
    pub fn clear(&self) -> BridgeResult<()> {
        self.set_len(0)
    }

    /// Every position in order
    pub fn iter(&self) -> BridgeResult<impl Iterator<Item = TexturePosition>> {
        let handle = self.mesh.assert_instance()?;
        self.ensure_fetched(handle);
        let positions = self
            .buffer
            .read()
            .as_ref()
            .map(|snapshot| snapshot.positions.clone())
            .unwrap_or_default();
        Ok(positions.into_iter())
    }

    fn checked_index(&self, index: usize) -> BridgeResult<NativeHandle> {
        let handle = self.mesh.assert_instance()?;
        if index >= self.mesh.backend().stream_len(handle, STREAM) {
            return Err(out_of_bounds(index));
        }
        Ok(handle)
    }

    fn ensure_fetched(&self, handle: NativeHandle) {
        let generation = self.mesh.backend().stream_generation(handle, STREAM);
        let stale = self
            .buffer
            .read()
            .as_ref()
            .map_or(true, |snapshot| snapshot.generation != generation);
        if stale {
            self.refetch(handle);
        }
    }

    fn refetch(&self, handle: NativeHandle) {
        let backend = self.mesh.backend();
        let generation = backend.stream_generation(handle, STREAM);
        let bytes = backend.read_stream(handle, STREAM);
        let positions: Vec<TexturePosition> = bytes
            .chunks_exact(STREAM.element_size())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        log::trace!("Fetched {} texture positions of mesh {handle}", positions.len());
        *self.buffer.write() = Some(Snapshot {
            generation,
            positions,
        });
    }
}

fn out_of_bounds(index: usize) -> BridgeError {
    BridgeError::out_of_range(
        "index",
        format!("Index {index} cannot be greater or equal to the size of this collection."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::HeadlessEngine;
    use std::sync::Arc;

    fn mesh_with(engine: &Arc<HeadlessEngine>, positions: &[TexturePosition]) -> StaticMesh {
        let handle = engine.create_static_mesh();
        let mesh = StaticMesh::new(engine.clone(), Some(handle));
        let view = mesh.texture_positions();
        view.set_len(positions.len()).unwrap();
        for (index, position) in positions.iter().enumerate() {
            view.set(index, *position).unwrap();
        }
        mesh
    }

    fn uv(n: f32) -> TexturePosition {
        TexturePosition::new(n, n * 0.5)
    }

    #[test]
    fn test_get_and_set() {
        let engine = Arc::new(HeadlessEngine::new());
        let mesh = mesh_with(&engine, &[uv(1.0), uv(2.0), uv(3.0)]);
        let view = mesh.texture_positions();

        assert_eq!(view.len().unwrap(), 3);
        assert_eq!(view.get(1).unwrap(), uv(2.0));
        view.set(1, uv(9.0)).unwrap();
        assert_eq!(view.get(1).unwrap(), uv(9.0));
        assert!(matches!(view.get(3), Err(BridgeError::OutOfRange { .. })));
        assert!(view.set(3, uv(0.0)).is_err());
    }

    #[test]
    fn test_view_sees_changes_made_elsewhere() {
        let engine = Arc::new(HeadlessEngine::new());
        let mesh = mesh_with(&engine, &[uv(1.0), uv(2.0)]);
        let first = mesh.texture_positions();
        assert_eq!(first.get(0).unwrap(), uv(1.0));

        let second = mesh.texture_positions();
        second.set_len(3).unwrap();
        second.set(2, uv(7.0)).unwrap();

        assert_eq!(first.get(2).unwrap(), uv(7.0));
    }

    #[test]
    fn test_view_sees_same_length_writes_made_elsewhere() {
        let engine = Arc::new(HeadlessEngine::new());
        let mesh = mesh_with(&engine, &[uv(1.0), uv(2.0)]);
        let first = mesh.texture_positions();
        assert_eq!(first.get(0).unwrap(), uv(1.0));

        let second = mesh.texture_positions();
        second.set(0, uv(9.0)).unwrap();

        assert_eq!(first.get(0).unwrap(), uv(9.0));
        assert_eq!(first.iter().unwrap().collect::<Vec<_>>(), vec![uv(9.0), uv(2.0)]);
    }

    #[test]
    fn test_remove_range_is_clamped() {
        let engine = Arc::new(HeadlessEngine::new());
        let mesh = mesh_with(&engine, &[uv(1.0), uv(2.0), uv(3.0), uv(4.0)]);
        let view = mesh.texture_positions();

        view.remove_range(2, 10).unwrap();
        assert_eq!(view.iter().unwrap().collect::<Vec<_>>(), vec![uv(1.0), uv(2.0)]);

        view.remove_range(5, 1).unwrap();
        view.remove_at(0).unwrap();
        assert_eq!(view.iter().unwrap().collect::<Vec<_>>(), vec![uv(2.0)]);

        view.clear().unwrap();
        assert!(view.is_empty().unwrap());
    }

    #[test]
    fn test_null_mesh() {
        let engine = Arc::new(HeadlessEngine::new());
        let mesh = StaticMesh::new(engine, None);
        let view = mesh.texture_positions();
        assert!(!view.is_valid());
        assert!(view.len().unwrap_err().is_invalid_state());
        assert!(view.iter().is_err());
        assert!(view.remove_at(0).unwrap_err().is_invalid_state());
    }
}
