// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host ports: the seam between registries and the authoring process.
use crate::entry::ObjectDescriptor;
use crate::ident::{ObjectAddress, ObjectKey, SceneId, Sigil};

/// Identity provider for the host process that owns the real objects.
///
/// Registries never hold object state themselves; they hold [`ObjectKey`]
/// handles and ask the host three questions: is this handle still alive,
/// what durable address does it map to, and which live handle does a durable
/// address resolve to right now.
///
/// The required methods must satisfy two guarantees for live objects: the
/// same object always reports the same key within a process, and distinct
/// live objects report distinct keys.
///
/// The provided methods are editorial capabilities. Headless hosts (player
/// builds, CI runners) keep the defaults and get random sigils and empty
/// provenance, which matches how tracked content behaves outside the editor.
pub trait ObjectHost {
    /// Whether `object` currently refers to a live object.
    fn is_alive(&self, object: ObjectKey) -> bool;

    /// Durable address for a live object, `None` when the object is dead or
    /// the host cannot address it (transient, never-saved objects).
    fn address_of(&self, object: ObjectKey) -> Option<ObjectAddress>;

    /// Resolves a durable address back to a live handle, `None` when nothing
    /// live answers to it in this session.
    fn resolve_address(&self, address: &ObjectAddress) -> Option<ObjectKey>;

    /// A durable identifier the host itself already assigns to this object,
    /// to be preferred over minting a random one.
    ///
    /// Editor hosts typically derive this from their asset database so the
    /// registry agrees with identifiers visible elsewhere in the toolchain.
    fn canonical_sigil(&self, _object: ObjectKey) -> Option<Sigil> {
        None
    }

    /// Human-oriented description of the object for provenance rendering.
    fn describe(&self, _object: ObjectKey) -> Option<ObjectDescriptor> {
        None
    }

    /// Whether the host is running live simulation, during which structural
    /// registry rebuilds are unsafe and refused.
    fn simulating(&self) -> bool {
        false
    }
}

/// Host capabilities for scene-scoped registries.
pub trait SceneHost: ObjectHost {
    /// Whether `scene` is valid and fully loaded.
    fn scene_loaded(&self, scene: SceneId) -> bool;

    /// Durable address of the scene (typically its file path), `None` for
    /// scenes that have never been saved.
    fn scene_address(&self, scene: SceneId) -> Option<String>;
}
