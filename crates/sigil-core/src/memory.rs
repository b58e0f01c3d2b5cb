// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory host and store fakes for testing without an engine or a
//! filesystem.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::entry::ObjectDescriptor;
use crate::host::{ObjectHost, SceneHost};
use crate::ident::{ObjectAddress, ObjectKey, SceneId, Sigil};
use crate::store::{RegistryStore, StoreError};

#[derive(Default)]
struct ObjectState {
    alive: bool,
    address: Option<ObjectAddress>,
    descriptor: Option<ObjectDescriptor>,
    canonical: Option<Sigil>,
}

struct SceneState {
    loaded: bool,
    address: Option<String>,
}

#[derive(Default)]
struct MemoryHostInner {
    next_object: u64,
    next_scene: u64,
    objects: HashMap<ObjectKey, ObjectState>,
    by_address: HashMap<ObjectAddress, ObjectKey>,
    scenes: HashMap<SceneId, SceneState>,
    simulating: bool,
}

/// In-memory implementation of [`ObjectHost`] and [`SceneHost`].
///
/// Models just enough of an authoring process for registry tests: objects
/// spawn with durable addresses and can die, scenes load and unload, and
/// the editorial capabilities (descriptors, canonical sigils, the
/// simulation flag) are plain setters.
///
/// Clones share state, so a handle kept outside a [`Scopes`] hub observes
/// and mutates the same fake world the hub reads.
///
/// [`Scopes`]: crate::scope::Scopes
#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Arc<Mutex<MemoryHostInner>>,
}

impl MemoryHost {
    /// Create an empty host with no objects and no scenes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a live object answering to `address`.
    ///
    /// Spawning a second object at the same address makes the newer object
    /// the one the address resolves to.
    pub fn spawn(&self, address: ObjectAddress) -> ObjectKey {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_object += 1;
        let key = ObjectKey(inner.next_object);
        inner.by_address.insert(address.clone(), key);
        inner.objects.insert(
            key,
            ObjectState { alive: true, address: Some(address), ..ObjectState::default() },
        );
        key
    }

    /// Spawn a live object with no durable address (a never-saved,
    /// transient object).
    pub fn spawn_transient(&self) -> ObjectKey {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_object += 1;
        let key = ObjectKey(inner.next_object);
        inner.objects.insert(key, ObjectState { alive: true, ..ObjectState::default() });
        key
    }

    /// Attach a descriptor so [`ObjectHost::describe`] answers for `object`.
    pub fn set_descriptor(&self, object: ObjectKey, descriptor: ObjectDescriptor) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = inner.objects.get_mut(&object) {
            state.descriptor = Some(descriptor);
        }
    }

    /// Attach a canonical sigil so [`ObjectHost::canonical_sigil`] answers
    /// for `object`.
    pub fn set_canonical_sigil(&self, object: ObjectKey, sigil: Sigil) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = inner.objects.get_mut(&object) {
            state.canonical = Some(sigil);
        }
    }

    /// Kill an object. Its key stops being alive and its address stops
    /// resolving.
    pub fn destroy(&self, object: ObjectKey) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let address = match inner.objects.get_mut(&object) {
            Some(state) => {
                state.alive = false;
                state.address.clone()
            }
            None => None,
        };
        if let Some(address) = address {
            if inner.by_address.get(&address) == Some(&object) {
                inner.by_address.remove(&address);
            }
        }
    }

    /// Add a loaded scene with a durable address.
    pub fn add_scene(&self, address: &str) -> SceneId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_scene += 1;
        let scene = SceneId(inner.next_scene);
        inner
            .scenes
            .insert(scene, SceneState { loaded: true, address: Some(address.to_owned()) });
        scene
    }

    /// Add a loaded scene that has never been saved (no address).
    pub fn add_unsaved_scene(&self) -> SceneId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_scene += 1;
        let scene = SceneId(inner.next_scene);
        inner.scenes.insert(scene, SceneState { loaded: true, address: None });
        scene
    }

    /// Mark a scene unloaded.
    pub fn unload_scene(&self, scene: SceneId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = inner.scenes.get_mut(&scene) {
            state.loaded = false;
        }
    }

    /// Mark a scene loaded again.
    pub fn load_scene(&self, scene: SceneId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = inner.scenes.get_mut(&scene) {
            state.loaded = true;
        }
    }

    /// Give a scene a new durable address, as a save-as would.
    pub fn rename_scene(&self, scene: SceneId, address: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = inner.scenes.get_mut(&scene) {
            state.address = Some(address.to_owned());
        }
    }

    /// Toggle the live-simulation flag.
    pub fn set_simulating(&self, simulating: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.simulating = simulating;
    }
}

impl ObjectHost for MemoryHost {
    fn is_alive(&self, object: ObjectKey) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.objects.get(&object).is_some_and(|state| state.alive)
    }

    fn address_of(&self, object: ObjectKey) -> Option<ObjectAddress> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let state = inner.objects.get(&object)?;
        if state.alive {
            state.address.clone()
        } else {
            None
        }
    }

    fn resolve_address(&self, address: &ObjectAddress) -> Option<ObjectKey> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let key = inner.by_address.get(address).copied()?;
        inner.objects.get(&key).is_some_and(|state| state.alive).then_some(key)
    }

    fn canonical_sigil(&self, object: ObjectKey) -> Option<Sigil> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.objects.get(&object).and_then(|state| state.canonical)
    }

    fn describe(&self, object: ObjectKey) -> Option<ObjectDescriptor> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.objects.get(&object).and_then(|state| state.descriptor.clone())
    }

    fn simulating(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.simulating
    }
}

impl SceneHost for MemoryHost {
    fn scene_loaded(&self, scene: SceneId) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.scenes.get(&scene).is_some_and(|state| state.loaded)
    }

    fn scene_address(&self, scene: SceneId) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.scenes.get(&scene).and_then(|state| state.address.clone())
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    project: Option<Vec<u8>>,
    scenes: HashMap<String, Vec<Vec<u8>>>,
    save_count: usize,
    save_budget: Option<usize>,
}

/// In-memory implementation of [`RegistryStore`] for testing.
///
/// Documents cross a real byte boundary: what comes back from a load is the
/// encoded form of what went in, never a shared in-memory object. Tests can
/// inject duplicate scene blobs, make saves fail after a budget of
/// successes, and inspect stored bytes. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `budget` more successful saves, then fail every save until
    /// [`clear_save_failures`](Self::clear_save_failures) is called.
    pub fn fail_saves_after(&self, budget: usize) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_budget = Some(budget);
    }

    /// Remove any injected save failure.
    pub fn clear_save_failures(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_budget = None;
    }

    /// Number of save attempts so far, successful or not.
    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).save_count
    }

    /// Append a raw blob for a scene address without going through
    /// [`RegistryStore::save_scene`]. This is how tests fabricate the
    /// duplicated-document accident.
    pub fn inject_scene_blob(&self, address: &str, bytes: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.scenes.entry(address.to_owned()).or_default().push(bytes);
    }

    /// Raw bytes of the stored project document, if any.
    pub fn project_bytes(&self) -> Option<Vec<u8>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).project.clone()
    }

    /// Raw blobs stored for a scene address.
    pub fn scene_blobs(&self, address: &str) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .scenes
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    fn charge_save(inner: &mut MemoryStoreInner) -> Result<(), StoreError> {
        inner.save_count += 1;
        match inner.save_budget {
            Some(0) => Err(StoreError::Backend("simulated save failure".into())),
            Some(budget) => {
                inner.save_budget = Some(budget - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RegistryStore for MemoryStore {
    fn load_project(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.project.clone())
    }

    fn save_project(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::charge_save(&mut inner)?;
        inner.project = Some(bytes.to_vec());
        Ok(())
    }

    fn load_scene(&self, address: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.scenes.get(address).cloned().unwrap_or_default())
    }

    fn save_scene(&self, address: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::charge_save(&mut inner)?;
        inner.scenes.insert(address.to_owned(), vec![bytes.to_vec()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn spawn_destroy_lifecycle() {
        let host = MemoryHost::new();
        let address = ObjectAddress::asset("a.mesh", 0);
        let key = host.spawn(address.clone());
        assert!(host.is_alive(key));
        assert_eq!(host.address_of(key), Some(address.clone()));
        assert_eq!(host.resolve_address(&address), Some(key));
        host.destroy(key);
        assert!(!host.is_alive(key));
        assert_eq!(host.address_of(key), None);
        assert_eq!(host.resolve_address(&address), None);
    }

    #[test]
    fn respawn_at_address_takes_over_resolution() {
        let host = MemoryHost::new();
        let address = ObjectAddress::asset("a.mesh", 0);
        let old = host.spawn(address.clone());
        host.destroy(old);
        let new = host.spawn(address.clone());
        assert_eq!(host.resolve_address(&address), Some(new));
    }

    #[test]
    fn transient_objects_have_no_address() {
        let host = MemoryHost::new();
        let key = host.spawn_transient();
        assert!(host.is_alive(key));
        assert_eq!(host.address_of(key), None);
    }

    #[test]
    fn scene_load_state_round_trip() {
        let host = MemoryHost::new();
        let scene = host.add_scene("scenes/main.scene");
        assert!(host.scene_loaded(scene));
        assert_eq!(host.scene_address(scene), Some("scenes/main.scene".to_owned()));
        host.unload_scene(scene);
        assert!(!host.scene_loaded(scene));
        host.load_scene(scene);
        assert!(host.scene_loaded(scene));
    }

    #[test]
    fn unsaved_scene_has_no_address() {
        let host = MemoryHost::new();
        let scene = host.add_unsaved_scene();
        assert!(host.scene_loaded(scene));
        assert_eq!(host.scene_address(scene), None);
    }

    #[test]
    fn store_round_trips_bytes() {
        let store = MemoryStore::new();
        assert!(store.load_project().unwrap().is_none());
        store.save_project(b"project doc").unwrap();
        assert_eq!(store.load_project().unwrap().unwrap(), b"project doc");
        store.save_scene("s", b"scene doc").unwrap();
        assert_eq!(store.load_scene("s").unwrap(), vec![b"scene doc".to_vec()]);
    }

    #[test]
    fn save_scene_replaces_all_blobs() {
        let store = MemoryStore::new();
        store.inject_scene_blob("s", b"one".to_vec());
        store.inject_scene_blob("s", b"two".to_vec());
        assert_eq!(store.load_scene("s").unwrap().len(), 2);
        store.save_scene("s", b"canonical").unwrap();
        assert_eq!(store.load_scene("s").unwrap(), vec![b"canonical".to_vec()]);
    }

    #[test]
    fn save_budget_counts_down_then_fails() {
        let store = MemoryStore::new();
        store.fail_saves_after(1);
        store.save_project(b"ok").unwrap();
        let failed = store.save_project(b"rejected");
        assert!(matches!(failed, Err(StoreError::Backend(_))));
        // Failed saves leave the previous bytes in place.
        assert_eq!(store.project_bytes().unwrap(), b"ok");
        assert_eq!(store.save_count(), 2);
        store.clear_save_failures();
        store.save_project(b"again").unwrap();
        assert_eq!(store.project_bytes().unwrap(), b"again");
    }
}
