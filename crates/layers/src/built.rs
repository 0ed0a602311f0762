use scene::backend::SceneBackend;
use scene::object::{ObjectHandle, Subtree};
use tracing::debug;

use crate::instance::{BuiltOverlay, ModelInstance};

/// An overlay build attached to the scene.
///
/// Only the registry creates and disposes these. `dispose` consumes the value,
/// so a handle cannot be released twice or used afterwards.
#[derive(Debug)]
pub struct BuiltObject {
    handle: ObjectHandle,
    checksum: String,
    mesh_count: usize,
    instances: Vec<ModelInstance>,
}

impl BuiltObject {
    pub(crate) fn attach(
        backend: &mut dyn SceneBackend,
        built: BuiltOverlay,
        checksum: String,
    ) -> Self {
        let handle = backend.add(Subtree::Overlays, &built.object);
        Self {
            handle,
            checksum,
            mesh_count: built.object.mesh_count(),
            instances: built.instances,
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn mesh_count(&self) -> usize {
        self.mesh_count
    }

    pub fn instances(&self) -> &[ModelInstance] {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [ModelInstance] {
        &mut self.instances
    }

    /// Releases the backend object. Already-detached handles are logged and
    /// otherwise ignored.
    pub(crate) fn dispose(self, backend: &mut dyn SceneBackend) {
        if let Err(err) = backend.remove(self.handle) {
            debug!(%err, "overlay object was already detached");
        }
    }
}
