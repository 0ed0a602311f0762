use std::collections::BTreeMap;

use tracing::debug;

use crate::camera::Camera;
use crate::object::{ObjectHandle, SceneObject, Subtree};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// Remove/dispose of a handle the backend does not know (already removed or
    /// never attached). Non-fatal.
    #[error("unknown scene handle {0:?}")]
    UnknownHandle(ObjectHandle),
}

/// Opaque rendering backend.
///
/// The core only issues add/remove commands and reads the active camera; it
/// never inspects backend resources.
pub trait SceneBackend {
    /// Creates backend resources for `object` and attaches them under `subtree`.
    fn add(&mut self, subtree: Subtree, object: &SceneObject) -> ObjectHandle;

    /// Detaches the object and releases its geometry and materials.
    fn remove(&mut self, handle: ObjectHandle) -> Result<(), SceneError>;

    fn camera(&self) -> Camera;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveObject {
    pub subtree: Subtree,
    pub name: String,
    pub mesh_count: usize,
}

/// In-memory backend: records what is attached where.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    camera: Camera,
    next_handle: u64,
    live: BTreeMap<ObjectHandle, LiveObject>,
    removed_count: usize,
}

impl MemoryScene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            next_handle: 1,
            live: BTreeMap::new(),
            removed_count: 0,
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&LiveObject> {
        self.live.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Names of live objects under `subtree`, in attach order.
    pub fn live_in(&self, subtree: Subtree) -> Vec<&str> {
        self.live
            .values()
            .filter(|o| o.subtree == subtree)
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn removed_count(&self) -> usize {
        self.removed_count
    }
}

impl SceneBackend for MemoryScene {
    fn add(&mut self, subtree: Subtree, object: &SceneObject) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        debug!(
            subtree = subtree.name(),
            name = %object.name,
            meshes = object.mesh_count(),
            ?handle,
            "scene add"
        );
        self.live.insert(
            handle,
            LiveObject {
                subtree,
                name: object.name.clone(),
                mesh_count: object.mesh_count(),
            },
        );
        handle
    }

    fn remove(&mut self, handle: ObjectHandle) -> Result<(), SceneError> {
        let obj = self
            .live
            .remove(&handle)
            .ok_or(SceneError::UnknownHandle(handle))?;
        debug!(subtree = obj.subtree.name(), name = %obj.name, ?handle, "scene remove");
        self.removed_count += 1;
        Ok(())
    }

    fn camera(&self) -> Camera {
        self.camera
    }
}
