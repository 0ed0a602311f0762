use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use foundation::ids::ObjectId;
use runtime::EventBus;
use scene::backend::SceneBackend;
use scene::camera::{Camera, Viewport};
use scene::object::ObjectHandle;
use scene::picking::{PickGroup, PickTarget};
use streaming::{PollOptions, Poller};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::built::BuiltObject;
use crate::error::{FetchError, RegistryError};
use crate::instance::ModelInstance;
use crate::mode::VisualizationMode;
use crate::payload::OverlayPayload;
use crate::source::OverlaySource;

/// Scope tag carried by every overlay poller task.
pub const OVERLAY_SCOPE: &str = "overlay";
/// Name of the pick group exported for the hit-test pipeline.
pub const OVERLAY_PICK_GROUP: &str = "overlay-models";

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Added(String),
    Removed(String),
    DataLoading(String),
    DataUpdated {
        name: String,
        data: Arc<OverlayPayload>,
        /// The checksum matched the live build; nothing was rebuilt.
        unchanged: bool,
        object: ObjectHandle,
    },
    DataError {
        name: String,
        message: String,
    },
}

/// Overlays touched by one `set_mode` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeChange {
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

#[derive(Debug)]
struct Completion {
    name: String,
    generation: u64,
    seq: u64,
    result: Result<OverlayPayload, FetchError>,
}

#[derive(Debug)]
struct OverlayEntry {
    generation: u64,
    last_seq: u64,
    built: Option<BuiltObject>,
}

fn poll_key(name: &str) -> String {
    format!("overlay:{name}")
}

/// Owns overlay lifecycles: fetch scheduling, raw data cache, checksum-gated
/// rebuilds and disposal of built objects.
///
/// Fetches run on the tokio runtime; their results are queued and only applied
/// to registry and scene state from [`OverlayRegistry::pump`] or
/// [`OverlayRegistry::next_update`], on the caller's task. Raw data survives
/// removal so a re-add attaches from cache without waiting on the network.
///
/// Dropping the registry stops its pollers but cannot release scene objects;
/// call [`OverlayRegistry::clear`] first when the backend outlives it.
pub struct OverlayRegistry {
    sources: BTreeMap<String, Arc<dyn OverlaySource>>,
    entries: BTreeMap<String, OverlayEntry>,
    order: Vec<String>,
    cache: BTreeMap<String, Arc<OverlayPayload>>,
    poller: Poller,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    next_generation: u64,
    mode: Option<VisualizationMode>,
    events: EventBus<OverlayEvent>,
}

impl fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("active", &self.order)
            .field("cached", &self.cache.keys().collect::<Vec<_>>())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRegistry {
    pub fn new() -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            sources: BTreeMap::new(),
            entries: BTreeMap::new(),
            order: Vec::new(),
            cache: BTreeMap::new(),
            poller: Poller::new(),
            completions_tx,
            completions_rx,
            next_generation: 0,
            mode: None,
            events: EventBus::new(),
        }
    }

    /// Registers (or replaces) the source for `name`. Takes effect on the next add.
    pub fn register_source(
        &mut self,
        name: impl Into<String>,
        source: impl OverlaySource + 'static,
    ) {
        let name = name.into();
        debug!(overlay = %name, "overlay source registered");
        self.sources.insert(name, Arc::new(source));
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Activates `name`. No-op if already active.
    ///
    /// Cached data is attached immediately; otherwise a loading event is
    /// emitted and a fetch starts. Periodic sources keep polling until removal.
    pub fn add_overlay(
        &mut self,
        backend: &mut dyn SceneBackend,
        name: &str,
    ) -> Result<(), RegistryError> {
        let source = self
            .sources
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownOverlay(name.to_string()))?;
        if self.entries.contains_key(name) {
            debug!(overlay = name, "overlay already active");
            return Ok(());
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries.insert(
            name.to_string(),
            OverlayEntry {
                generation,
                last_seq: 0,
                built: None,
            },
        );
        self.order.push(name.to_string());
        info!(overlay = name, generation, "overlay added");
        self.events.emit(OverlayEvent::Added(name.to_string()));

        let cached = self.cache.get(name).cloned();
        let has_cache = cached.is_some();
        match cached {
            Some(payload) => self.apply_payload(backend, name, payload),
            None => self.events.emit(OverlayEvent::DataLoading(name.to_string())),
        }

        let options = match source.poll() {
            Some(spec) => Some(spec.options().immediate(!has_cache)),
            None if has_cache => None,
            None => Some(PollOptions::once()),
        };
        if let Some(options) = options {
            self.start_fetching(name, generation, source, options);
        }
        Ok(())
    }

    /// Deactivates `name`: stops its poller and disposes its built object.
    /// Raw data stays cached. Returns `false` if it was not active.
    pub fn remove_overlay(&mut self, backend: &mut dyn SceneBackend, name: &str) -> bool {
        let Some(entry) = self.entries.remove(name) else {
            return false;
        };
        self.poller.stop(&poll_key(name));
        if let Some(built) = entry.built {
            built.dispose(backend);
        }
        self.order.retain(|n| n != name);
        info!(overlay = name, "overlay removed");
        self.events.emit(OverlayEvent::Removed(name.to_string()));
        true
    }

    /// Reconciles the active set with `mode`'s table: removals first, then
    /// additions in table order. Table entries without a source are skipped.
    pub fn set_mode(
        &mut self,
        backend: &mut dyn SceneBackend,
        mode: VisualizationMode,
    ) -> ModeChange {
        let required = mode.overlays();
        let removed: Vec<String> = self
            .order
            .iter()
            .filter(|n| !required.contains(&n.as_str()))
            .cloned()
            .collect();
        for name in &removed {
            self.remove_overlay(backend, name);
        }

        let mut added = Vec::new();
        for name in required {
            if self.entries.contains_key(*name) {
                continue;
            }
            match self.add_overlay(backend, name) {
                Ok(()) => added.push(name.to_string()),
                Err(err) => warn!(%err, mode = mode.as_str(), "mode overlay skipped"),
            }
        }

        self.mode = Some(mode);
        info!(
            mode = mode.as_str(),
            removed = removed.len(),
            added = added.len(),
            "visualization mode set"
        );
        ModeChange { removed, added }
    }

    /// Removes every active overlay. Returns how many were removed.
    pub fn clear(&mut self, backend: &mut dyn SceneBackend) -> usize {
        let stopped = self.poller.stop_all(&[OVERLAY_SCOPE]);
        let names = std::mem::take(&mut self.order);
        for name in &names {
            if let Some(entry) = self.entries.remove(name) {
                if let Some(built) = entry.built {
                    built.dispose(backend);
                }
                self.events.emit(OverlayEvent::Removed(name.clone()));
            }
        }
        self.mode = None;
        debug!(overlays = names.len(), pollers = stopped, "overlay registry cleared");
        names.len()
    }

    /// Applies every completion already queued. Returns how many were current.
    pub fn pump(&mut self, backend: &mut dyn SceneBackend) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply_completion(backend, completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next current completion, applies it and returns its
    /// overlay name. Stale completions are dropped along the way.
    pub async fn next_update(&mut self, backend: &mut dyn SceneBackend) -> Option<String> {
        loop {
            let completion = self.completions_rx.recv().await?;
            let name = completion.name.clone();
            if self.apply_completion(backend, completion) {
                return Some(name);
            }
        }
    }

    pub fn get_overlays(&self) -> &[String] {
        &self.order
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn mode(&self) -> Option<VisualizationMode> {
        self.mode
    }

    /// Last successfully built raw data, kept across removal.
    pub fn get_overlay_data(&self, name: &str) -> Option<&Arc<OverlayPayload>> {
        self.cache.get(name)
    }

    pub fn get_overlay_object(&self, name: &str) -> Option<&BuiltObject> {
        self.entries.get(name).and_then(|e| e.built.as_ref())
    }

    pub fn model_instances(&self, name: &str) -> &[ModelInstance] {
        self.get_overlay_object(name)
            .map(|b| b.instances())
            .unwrap_or_default()
    }

    /// Looks up a hovered/clicked id among the active overlays' instances.
    pub fn find_instance(&self, id: &ObjectId) -> Option<&ModelInstance> {
        let overlay = id.namespace()?;
        self.model_instances(overlay).iter().find(|i| &i.id == id)
    }

    /// True while the overlay has a live fetch task.
    pub fn is_polling(&self, name: &str) -> bool {
        self.poller.is_running(&poll_key(name))
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Pickable instances of all active overlays, in add order.
    pub fn pick_group(&self) -> PickGroup {
        let mut group = PickGroup::new(OVERLAY_PICK_GROUP);
        for name in &self.order {
            group.targets.extend(self.model_instances(name).iter().map(|i| {
                PickTarget::sphere(i.id.clone(), i.base_position, i.pick_radius)
            }));
        }
        group
    }

    pub fn update_screen_positions(&mut self, camera: &Camera, viewport: Viewport) {
        for entry in self.entries.values_mut() {
            let Some(built) = entry.built.as_mut() else {
                continue;
            };
            for instance in built.instances_mut() {
                instance.computed_screen_position =
                    camera.project_to_screen(instance.base_position, viewport);
            }
        }
    }

    pub fn events(&self) -> &[OverlayEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<OverlayEvent> {
        self.events.drain()
    }

    fn start_fetching(
        &mut self,
        name: &str,
        generation: u64,
        source: Arc<dyn OverlaySource>,
        options: PollOptions,
    ) {
        let tx = self.completions_tx.clone();
        let overlay = name.to_string();
        let mut seq = 0u64;
        let task = move |cancel: CancellationToken| {
            seq += 1;
            let completion_seq = seq;
            let fetch = source.fetch(cancel.clone());
            let tx = tx.clone();
            let name = overlay.clone();
            async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    result = fetch => result,
                };
                let completion = Completion {
                    name,
                    generation,
                    seq: completion_seq,
                    result,
                };
                if tx.send(completion).is_err() {
                    debug!("overlay registry gone; fetch result discarded");
                }
            }
        };
        self.poller
            .register(poll_key(name), task, options.scope([OVERLAY_SCOPE, name]));
    }

    /// Returns `false` for completions that no longer belong to a live fetch.
    fn apply_completion(&mut self, backend: &mut dyn SceneBackend, completion: Completion) -> bool {
        let Some(entry) = self.entries.get_mut(&completion.name) else {
            debug!(overlay = %completion.name, "result for inactive overlay dropped");
            return false;
        };
        if completion.generation != entry.generation || completion.seq <= entry.last_seq {
            debug!(
                overlay = %completion.name,
                generation = completion.generation,
                seq = completion.seq,
                "stale result dropped"
            );
            return false;
        }
        entry.last_seq = completion.seq;

        match completion.result {
            Ok(payload) => self.apply_payload(backend, &completion.name, Arc::new(payload)),
            Err(FetchError::Cancelled) => {
                debug!(overlay = %completion.name, "fetch cancelled");
            }
            Err(err) => {
                warn!(overlay = %completion.name, %err, "overlay fetch failed");
                self.events.emit(OverlayEvent::DataError {
                    name: completion.name,
                    message: err.to_string(),
                });
            }
        }
        true
    }

    /// Checksum gate plus rebuild. The old object is disposed before the new
    /// one is attached, so at most one is ever live per overlay.
    fn apply_payload(
        &mut self,
        backend: &mut dyn SceneBackend,
        name: &str,
        payload: Arc<OverlayPayload>,
    ) {
        let Some(source) = self.sources.get(name).cloned() else {
            return;
        };
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };

        let checksum = source.checksum(&payload);
        if let Some(built) = entry.built.as_ref().filter(|b| b.checksum() == checksum) {
            let object = built.handle();
            debug!(overlay = name, %checksum, "checksum unchanged; rebuild skipped");
            self.cache.insert(name.to_string(), Arc::clone(&payload));
            self.events.emit(OverlayEvent::DataUpdated {
                name: name.to_string(),
                data: payload,
                unchanged: true,
                object,
            });
            return;
        }

        let built = match source.build(name, &payload) {
            Ok(built) => built,
            Err(err) => {
                warn!(overlay = name, %err, "overlay build failed; keeping previous object");
                return;
            }
        };
        if let Some(old) = entry.built.take() {
            old.dispose(backend);
        }
        let object = BuiltObject::attach(backend, built, checksum);
        let handle = object.handle();
        info!(
            overlay = name,
            records = payload.len(),
            meshes = object.mesh_count(),
            "overlay rebuilt"
        );
        entry.built = Some(object);
        self.cache.insert(name.to_string(), Arc::clone(&payload));
        self.events.emit(OverlayEvent::DataUpdated {
            name: name.to_string(),
            data: payload,
            unchanged: false,
            object: handle,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use foundation::math::Vec3;
    use pretty_assertions::assert_eq;
    use scene::backend::MemoryScene;
    use scene::camera::Camera;

    use super::{Completion, OverlayEvent, OverlayRegistry};
    use crate::error::FetchError;
    use crate::payload::{GeoMarker, LatLng, OverlayPayload};
    use crate::source::{OverlayDescriptor, PollSpec};

    fn scene() -> MemoryScene {
        MemoryScene::new(Camera::new(Vec3::new(0.0, 0.0, 300.0), Vec3::ZERO, 1.0, 1.0))
    }

    fn markers(lats: &[f64]) -> OverlayPayload {
        OverlayPayload::Markers(
            lats.iter()
                .enumerate()
                .map(|(i, lat)| GeoMarker {
                    id: format!("m{i}"),
                    position: LatLng::new(*lat, 0.0),
                    label: String::new(),
                    category: "alert".to_string(),
                    timestamp_ms: None,
                })
                .collect(),
        )
    }

    fn never() -> OverlayDescriptor {
        OverlayDescriptor::new(|_cancel| {
            std::future::pending::<Result<OverlayPayload, FetchError>>()
        })
    }

    /// Hands out `results` in order, then never resolves.
    fn scripted(results: Vec<Result<OverlayPayload, FetchError>>) -> OverlayDescriptor {
        let queue = Arc::new(Mutex::new(VecDeque::from(results)));
        OverlayDescriptor::new(move |_cancel| {
            let next = queue.lock().unwrap().pop_front();
            async move {
                match next {
                    Some(result) => result,
                    None => std::future::pending().await,
                }
            }
        })
    }

    fn completion(generation: u64, seq: u64, payload: OverlayPayload) -> Completion {
        Completion {
            name: "alerts".to_string(),
            generation,
            seq,
            result: Ok(payload),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_overlay_is_an_error() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        assert!(reg.add_overlay(&mut s, "nope").is_err());
        assert!(reg.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn adding_twice_is_a_no_op() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        reg.register_source("alerts", never());
        reg.add_overlay(&mut s, "alerts").unwrap();
        reg.add_overlay(&mut s, "alerts").unwrap();
        assert_eq!(reg.get_overlays(), ["alerts".to_string()]);
        assert_eq!(
            reg.drain_events(),
            vec![
                OverlayEvent::Added("alerts".to_string()),
                OverlayEvent::DataLoading("alerts".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn results_from_an_earlier_add_are_dropped() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        reg.register_source("alerts", never());
        reg.add_overlay(&mut s, "alerts").unwrap();
        reg.remove_overlay(&mut s, "alerts");
        reg.add_overlay(&mut s, "alerts").unwrap();

        reg.completions_tx.send(completion(1, 1, markers(&[1.0]))).unwrap();
        assert_eq!(reg.pump(&mut s), 0);
        assert!(reg.get_overlay_object("alerts").is_none());

        reg.completions_tx.send(completion(2, 1, markers(&[1.0]))).unwrap();
        assert_eq!(reg.pump(&mut s), 1);
        assert!(reg.get_overlay_object("alerts").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn older_sequence_numbers_are_dropped() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        reg.register_source("alerts", never());
        reg.add_overlay(&mut s, "alerts").unwrap();

        reg.completions_tx.send(completion(1, 3, markers(&[1.0]))).unwrap();
        reg.completions_tx.send(completion(1, 2, markers(&[2.0, 3.0]))).unwrap();
        assert_eq!(reg.pump(&mut s), 1);
        assert_eq!(reg.model_instances("alerts").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn results_for_removed_overlays_are_dropped() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        reg.register_source("alerts", never());
        reg.add_overlay(&mut s, "alerts").unwrap();
        reg.remove_overlay(&mut s, "alerts");

        reg.completions_tx.send(completion(1, 1, markers(&[1.0]))).unwrap();
        assert_eq!(reg.pump(&mut s), 0);
        assert_eq!(s.live_count(), 0);
        assert!(reg.get_overlay_data("alerts").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_keeps_last_good_object_and_polling() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        let source = scripted(vec![
            Ok(markers(&[1.0])),
            Err(FetchError::Failed("503".to_string())),
            Ok(markers(&[1.0])),
        ])
        .polling(PollSpec::every_ms(1_000));
        reg.register_source("alerts", source);
        reg.add_overlay(&mut s, "alerts").unwrap();

        assert_eq!(reg.next_update(&mut s).await.as_deref(), Some("alerts"));
        let handle = reg.get_overlay_object("alerts").unwrap().handle();
        reg.drain_events();

        assert_eq!(reg.next_update(&mut s).await.as_deref(), Some("alerts"));
        assert_eq!(
            reg.drain_events(),
            vec![OverlayEvent::DataError {
                name: "alerts".to_string(),
                message: "fetch failed: 503".to_string(),
            }]
        );
        assert_eq!(reg.get_overlay_object("alerts").unwrap().handle(), handle);
        assert!(s.contains(handle));
        assert!(reg.is_polling("alerts"));

        assert_eq!(reg.next_update(&mut s).await.as_deref(), Some("alerts"));
        let events = reg.drain_events();
        assert!(matches!(
            events.as_slice(),
            [OverlayEvent::DataUpdated { unchanged: true, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn build_failure_keeps_previous_data_and_object() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        let good = markers(&[10.0]);
        let source = scripted(vec![Ok(good.clone()), Ok(markers(&[120.0]))])
            .polling(PollSpec::every_ms(1_000));
        reg.register_source("alerts", source);
        reg.add_overlay(&mut s, "alerts").unwrap();

        reg.next_update(&mut s).await;
        let handle = reg.get_overlay_object("alerts").unwrap().handle();
        reg.drain_events();

        reg.next_update(&mut s).await;
        assert!(reg.events().is_empty());
        assert_eq!(reg.get_overlay_object("alerts").unwrap().handle(), handle);
        assert_eq!(reg.get_overlay_data("alerts").map(|d| &**d), Some(&good));
        assert_eq!(s.removed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rebuild_disposes_previous_object_first() {
        let mut s = scene();
        let mut reg = OverlayRegistry::new();
        let source = scripted(vec![Ok(markers(&[1.0])), Ok(markers(&[1.0, 2.0]))])
            .polling(PollSpec::every_ms(1_000));
        reg.register_source("alerts", source);
        reg.add_overlay(&mut s, "alerts").unwrap();

        reg.next_update(&mut s).await;
        let first = reg.get_overlay_object("alerts").unwrap().handle();
        reg.next_update(&mut s).await;
        let second = reg.get_overlay_object("alerts").unwrap().handle();

        assert_ne!(first, second);
        assert!(!s.contains(first));
        assert_eq!(s.live_count(), 1);
        assert_eq!(reg.model_instances("alerts").len(), 2);
    }
}
