// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scope adapters: the project registry and per-scene registries.
use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::doc::{AssetRegistryDoc, SceneRegistryDoc};
use crate::entry::{AssetMeta, SceneMeta, SigilEntry};
use crate::host::{ObjectHost, SceneHost};
use crate::ident::{ObjectKey, SceneId, Sigil};
use crate::reconcile::{self, ReconcileReceipt};
use crate::registry::SigilRegistry;
use crate::store::{RegistryStore, StoreError};

/// Failures surfaced by the scope layer.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The scene is not in a valid, loaded state.
    #[error("scene {0:?} is not loaded")]
    SceneNotLoaded(SceneId),
    /// The scene has never been saved, so no registry document can exist
    /// for it.
    #[error("scene {0:?} has no durable address")]
    SceneUnaddressed(SceneId),
    /// The host is running live simulation; structural rebuilds are
    /// refused until it stops.
    #[error("host is simulating, structural registry rebuild refused")]
    SimulationActive,
    /// The storage backend failed.
    #[error("registry store failure: {0}")]
    Store(#[from] StoreError),
    /// A registry document would not encode or decode.
    #[error("registry document codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

struct SceneScopeState {
    scene_sigil: Sigil,
    registry: SigilRegistry<SceneMeta>,
}

/// Directory of registry scopes for one authoring session.
///
/// Owns the host and store handles plus every open registry: the project
/// scope (at most one) and one scope per scene. Scopes open on first access
/// and stay cached; opening is idempotent. `&mut self` on the accessors is
/// the single-writer boundary — a multi-threaded host wraps the whole hub
/// in one mutex and holds it across each call.
pub struct Scopes<H, S> {
    host: H,
    store: S,
    project: Option<SigilRegistry<AssetMeta>>,
    scenes: FxHashMap<SceneId, SceneScopeState>,
}

impl<H: ObjectHost, S: RegistryStore> Scopes<H, S> {
    /// Creates a hub over a host and a store. Nothing is loaded yet.
    pub fn new(host: H, store: S) -> Self {
        Self { host, store, project: None, scenes: FxHashMap::default() }
    }

    /// The host handle.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens the project scope, loading its document on first access.
    ///
    /// When no document exists yet an empty one is created and persisted
    /// immediately, so the well-known project location exists from the
    /// first session onward.
    pub fn assets(&mut self) -> Result<AssetScope<'_, H, S>, ScopeError> {
        let registry = match self.project.take() {
            Some(registry) => self.project.insert(registry),
            None => {
                let opened = open_project(&self.host, &self.store)?;
                self.project.insert(opened)
            }
        };
        Ok(AssetScope { host: &self.host, store: &self.store, registry })
    }
}

impl<H: SceneHost, S: RegistryStore> Scopes<H, S> {
    /// Opens the scope for `scene`, loading its document on first access.
    ///
    /// Every access re-validates that the scene is loaded; an unloaded
    /// scene fails and its cached scope is discarded so a later reload
    /// starts from the store again. A scene that has never been saved has
    /// no durable address and also fails.
    pub fn scene(&mut self, scene: SceneId) -> Result<SceneScope<'_, H, S>, ScopeError> {
        if !self.host.scene_loaded(scene) {
            self.retire_scene(scene);
            return Err(ScopeError::SceneNotLoaded(scene));
        }
        let state = match self.scenes.entry(scene) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => slot.insert(open_scene(&self.host, &self.store, scene)?),
        };
        Ok(SceneScope { host: &self.host, store: &self.store, scene, state })
    }

    /// Drops the cached scope for `scene` without touching the store.
    ///
    /// Host integrations call this when a scene unloads. Registries reload
    /// from the store on the next access after the scene comes back.
    pub fn retire_scene(&mut self, scene: SceneId) {
        if self.scenes.remove(&scene).is_some() {
            debug!(scene = ?scene, "retired cached scene scope");
        }
    }
}

fn open_project<H: ObjectHost, S: RegistryStore>(
    host: &H,
    store: &S,
) -> Result<SigilRegistry<AssetMeta>, ScopeError> {
    match store.load_project()? {
        Some(bytes) => {
            let doc = AssetRegistryDoc::decode(&bytes)?;
            Ok(SigilRegistry::from_records(host, doc.entries))
        }
        None => {
            debug!("no project registry document, creating one");
            store.save_project(&AssetRegistryDoc::default().encode()?)?;
            Ok(SigilRegistry::new())
        }
    }
}

fn open_scene<H: SceneHost, S: RegistryStore>(
    host: &H,
    store: &S,
    scene: SceneId,
) -> Result<SceneScopeState, ScopeError> {
    let address = host.scene_address(scene).ok_or(ScopeError::SceneUnaddressed(scene))?;
    let blobs = store.load_scene(&address)?;
    let copies = blobs.len();
    let Some(first) = blobs.into_iter().next() else {
        debug!(scene = ?scene, address = %address, "no scene registry document, starting fresh");
        return Ok(SceneScopeState { scene_sigil: Sigil::mint(), registry: SigilRegistry::new() });
    };
    if copies > 1 {
        // The duplicated-component accident: keep the first copy, the
        // rest disappear at the next commit.
        warn!(scene = ?scene, address = %address, copies, "multiple registry documents for scene, keeping the first");
    }
    let doc = SceneRegistryDoc::decode(&first)?;
    Ok(SceneScopeState {
        scene_sigil: doc.scene_sigil,
        registry: SigilRegistry::from_records(host, doc.entries),
    })
}

fn mint_asset_entry<H: ObjectHost>(host: &H, object: ObjectKey) -> SigilEntry<AssetMeta> {
    // Prefer the host's own durable id so the registry agrees with the
    // rest of the toolchain; fall back to fresh entropy.
    let sigil = host.canonical_sigil(object).unwrap_or_else(Sigil::mint);
    let meta = host
        .describe(object)
        .map_or_else(AssetMeta::default, |descriptor| AssetMeta::from_descriptor(&descriptor));
    SigilEntry { object, sigil, meta }
}

fn mint_scene_entry<H: ObjectHost>(_host: &H, object: ObjectKey) -> SigilEntry<SceneMeta> {
    SigilEntry { object, sigil: Sigil::mint(), meta: SceneMeta {} }
}

/// Borrowed view over the project scope.
///
/// Lives as long as the borrow of its [`Scopes`] hub. All mutation happens
/// in memory; nothing is persisted until [`commit`](Self::commit) or a
/// [`reconcile`](Self::reconcile) pass.
pub struct AssetScope<'a, H, S> {
    host: &'a H,
    store: &'a S,
    registry: &'a mut SigilRegistry<AssetMeta>,
}

impl<H: ObjectHost, S: RegistryStore> AssetScope<'_, H, S> {
    /// Returns the entry for `object`, minting one when absent.
    ///
    /// Minting prefers the host's canonical sigil for the object and
    /// records provenance when the host can describe it. A dead object
    /// yields `None`.
    pub fn get_or_create_entry(&mut self, object: ObjectKey) -> Option<SigilEntry<AssetMeta>> {
        let host = self.host;
        self.registry.get_or_create(host, object, |key| mint_asset_entry(host, key))
    }

    /// Inserts a pre-built entry if nothing conflicts. See
    /// [`SigilRegistry::try_add`].
    pub fn try_add_entry(&mut self, entry: SigilEntry<AssetMeta>) -> bool {
        self.registry.try_add(self.host, entry)
    }

    /// Looks up the entry for a live object.
    pub fn entry_for_object(&mut self, object: ObjectKey) -> Option<&SigilEntry<AssetMeta>> {
        self.registry.entry_for_object(self.host, object)
    }

    /// Looks up the entry owning `sigil`.
    pub fn entry_for_sigil(&mut self, sigil: Sigil) -> Option<&SigilEntry<AssetMeta>> {
        self.registry.entry_for_sigil(self.host, sigil)
    }

    /// Removes the entry for `object`. Returns whether one existed.
    pub fn remove(&mut self, object: ObjectKey) -> bool {
        self.registry.remove(object)
    }

    /// Drops every entry in the scope. In-memory only, like all mutation.
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Read-only view of the entries.
    pub fn entries(&mut self) -> &[SigilEntry<AssetMeta>] {
        self.registry.entries(self.host)
    }

    /// Independent copy of the registry for later diffing.
    pub fn snapshot(&self) -> SigilRegistry<AssetMeta> {
        self.registry.clone()
    }

    /// Number of entries as stored, including any awaiting compaction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the scope has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Persists the scope through the store, synchronously.
    ///
    /// On failure the in-memory registry is untouched and remains the
    /// authoritative state; the caller retries by committing again.
    pub fn commit(&mut self) -> Result<(), ScopeError> {
        self.registry.refresh(self.host);
        let doc = AssetRegistryDoc { entries: self.registry.to_records(self.host) };
        self.store.save_project(&doc.encode()?)?;
        Ok(())
    }

    /// Rebuilds the scope against a full enumeration of the objects that
    /// should be tracked, preserving sigils for survivors. Persists the
    /// cleared state first and the rebuilt state last.
    pub fn reconcile(
        &mut self,
        objects: impl IntoIterator<Item = ObjectKey>,
    ) -> Result<ReconcileReceipt, ScopeError> {
        let host = self.host;
        let store = self.store;
        reconcile::run(self.registry, host, objects, mint_asset_entry, |registry| {
            let doc = AssetRegistryDoc { entries: registry.to_records(host) };
            store.save_project(&doc.encode()?)?;
            Ok(())
        })
    }
}

/// Borrowed view over one scene's scope.
///
/// Obtained from [`Scopes::scene`], which has already validated that the
/// scene is loaded. Commit and reconcile re-validate, since the scene can
/// unload while the view is held.
pub struct SceneScope<'a, H, S> {
    host: &'a H,
    store: &'a S,
    scene: SceneId,
    state: &'a mut SceneScopeState,
}

impl<H: SceneHost, S: RegistryStore> SceneScope<'_, H, S> {
    /// The scene this scope belongs to.
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// The scene's own durable sigil, minted when the scope first opened
    /// with no document and preserved thereafter.
    pub fn scene_sigil(&self) -> Sigil {
        self.state.scene_sigil
    }

    /// Returns the entry for `object`, minting a random sigil when absent.
    /// A dead object yields `None`.
    pub fn get_or_create_entry(&mut self, object: ObjectKey) -> Option<SigilEntry<SceneMeta>> {
        let host = self.host;
        self.state.registry.get_or_create(host, object, |key| mint_scene_entry(host, key))
    }

    /// Inserts a pre-built entry if nothing conflicts. See
    /// [`SigilRegistry::try_add`].
    pub fn try_add_entry(&mut self, entry: SigilEntry<SceneMeta>) -> bool {
        self.state.registry.try_add(self.host, entry)
    }

    /// Looks up the entry for a live object.
    pub fn entry_for_object(&mut self, object: ObjectKey) -> Option<&SigilEntry<SceneMeta>> {
        self.state.registry.entry_for_object(self.host, object)
    }

    /// Looks up the entry owning `sigil`.
    pub fn entry_for_sigil(&mut self, sigil: Sigil) -> Option<&SigilEntry<SceneMeta>> {
        self.state.registry.entry_for_sigil(self.host, sigil)
    }

    /// Removes the entry for `object`. Returns whether one existed.
    pub fn remove(&mut self, object: ObjectKey) -> bool {
        self.state.registry.remove(object)
    }

    /// Drops every entry in the scope. In-memory only, like all mutation.
    pub fn clear(&mut self) {
        self.state.registry.clear();
    }

    /// Read-only view of the entries.
    pub fn entries(&mut self) -> &[SigilEntry<SceneMeta>] {
        self.state.registry.entries(self.host)
    }

    /// Independent copy of the registry for later diffing.
    pub fn snapshot(&self) -> SigilRegistry<SceneMeta> {
        self.state.registry.clone()
    }

    /// Number of entries as stored, including any awaiting compaction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.registry.len()
    }

    /// Whether the scope has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.registry.is_empty()
    }

    /// Persists the scope through the store, synchronously.
    ///
    /// The scene's current address is queried at commit time, so a scene
    /// saved under a new path writes to its new location. On failure the
    /// in-memory registry is untouched and remains authoritative.
    pub fn commit(&mut self) -> Result<(), ScopeError> {
        let address = self.validated_address()?;
        self.state.registry.refresh(self.host);
        let doc = SceneRegistryDoc {
            scene_sigil: self.state.scene_sigil,
            entries: self.state.registry.to_records(self.host),
        };
        self.store.save_scene(&address, &doc.encode()?)?;
        Ok(())
    }

    /// Rebuilds the scope against a full enumeration of the objects that
    /// should be tracked, preserving sigils for survivors. Persists the
    /// cleared state first and the rebuilt state last.
    pub fn reconcile(
        &mut self,
        objects: impl IntoIterator<Item = ObjectKey>,
    ) -> Result<ReconcileReceipt, ScopeError> {
        let address = self.validated_address()?;
        let host = self.host;
        let store = self.store;
        let scene_sigil = self.state.scene_sigil;
        reconcile::run(&mut self.state.registry, host, objects, mint_scene_entry, |registry| {
            let doc = SceneRegistryDoc { scene_sigil, entries: registry.to_records(host) };
            store.save_scene(&address, &doc.encode()?)?;
            Ok(())
        })
    }

    fn validated_address(&self) -> Result<String, ScopeError> {
        if !self.host.scene_loaded(self.scene) {
            return Err(ScopeError::SceneNotLoaded(self.scene));
        }
        self.host.scene_address(self.scene).ok_or(ScopeError::SceneUnaddressed(self.scene))
    }
}
