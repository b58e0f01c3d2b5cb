// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry entries and their per-scope payloads.
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ident::{ObjectKey, Sigil};

/// One tracked object: its live handle, its durable sigil, and a
/// scope-specific payload.
///
/// Entries are immutable once created. Correcting one means removing it and
/// creating a replacement, which by policy mints a fresh sigil.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SigilEntry<P> {
    /// Live handle of the tracked object.
    pub object: ObjectKey,
    /// The durable identifier.
    pub sigil: Sigil,
    /// Scope-specific payload.
    pub meta: P,
}

/// Payload for project-scope (asset) entries.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Advisory provenance string, `origin:type:location:name`.
    ///
    /// Recorded at mint time for humans reading the registry document.
    /// Never consulted for identity or lookup, and allowed to go stale when
    /// the asset moves.
    pub provenance: String,
}

impl AssetMeta {
    /// Builds the payload from a host-supplied descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: &ObjectDescriptor) -> Self {
        Self { provenance: descriptor.to_string() }
    }
}

/// Payload for scene-scope entries.
///
/// Scene entries carry nothing beyond the identity pair today. The struct
/// exists so both scopes share one generic registry and scene documents have
/// a place to grow fields without a format break.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SceneMeta {}

/// Where an asset object comes from, for provenance rendering.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectOrigin {
    /// Shipped with the host itself (default resources, built-in shapes).
    Builtin,
    /// Authored content living in the project.
    Custom,
}

impl Display for ObjectOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("Builtin"),
            Self::Custom => f.write_str("Custom"),
        }
    }
}

/// Human-oriented description of an object, supplied by hosts that can
/// introspect their asset database.
///
/// Renders as `origin:type:location:name`, the provenance format carried by
/// [`AssetMeta`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObjectDescriptor {
    /// Built-in or authored.
    pub origin: ObjectOrigin,
    /// Full type name as the host reports it.
    pub type_name: String,
    /// Source location, typically a project-relative path.
    pub location: String,
    /// Display name of the object itself.
    pub display_name: String,
}

impl Display for ObjectDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.origin, self.type_name, self.location, self.display_name)
    }
}
