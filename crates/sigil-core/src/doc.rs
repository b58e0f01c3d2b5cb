// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted document shapes.
//!
//! Documents are encoded as pretty-printed JSON so registry state diffs
//! cleanly under version control. The byte-level [`RegistryStore`] port
//! stays format-agnostic; everything format-aware lives here.
//!
//! [`RegistryStore`]: crate::store::RegistryStore
use serde::{Deserialize, Serialize};

use crate::entry::{AssetMeta, SceneMeta};
use crate::ident::{ObjectAddress, Sigil};

/// Persisted twin of an entry: the durable address stands in for the
/// process-local object handle, and the payload is flattened into the
/// record.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct EntryRecord<P> {
    /// Durable address of the tracked object.
    pub address: ObjectAddress,
    /// The durable identifier.
    pub sigil: Sigil,
    /// Scope-specific payload.
    #[serde(flatten)]
    pub meta: P,
}

/// The project-scope registry document.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct AssetRegistryDoc {
    /// Ordered entry records; order is cosmetic.
    pub entries: Vec<EntryRecord<AssetMeta>>,
}

impl AssetRegistryDoc {
    /// Encodes the document as pretty JSON bytes.
    ///
    /// # Errors
    /// Returns the underlying serializer error.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Decodes a document from JSON bytes.
    ///
    /// # Errors
    /// Returns the underlying deserializer error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A scene-scope registry document.
///
/// Besides its entries, each scene document carries the scene's own sigil,
/// minted the first time the scene's registry is opened and preserved
/// thereafter.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SceneRegistryDoc {
    /// Durable identifier of the scene itself.
    pub scene_sigil: Sigil,
    /// Ordered entry records; order is cosmetic.
    pub entries: Vec<EntryRecord<SceneMeta>>,
}

impl SceneRegistryDoc {
    /// Encodes the document as pretty JSON bytes.
    ///
    /// # Errors
    /// Returns the underlying serializer error.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Decodes a document from JSON bytes.
    ///
    /// # Errors
    /// Returns the underlying deserializer error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn asset_doc_round_trips_with_flattened_meta() {
        let doc = AssetRegistryDoc {
            entries: vec![EntryRecord {
                address: ObjectAddress::asset("models/hero.mesh", 2),
                sigil: Sigil::mint(),
                meta: AssetMeta { provenance: "Custom:engine.Mesh:models/hero.mesh:hero".to_owned() },
            }],
        };
        let bytes = doc.encode().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"provenance\""));
        assert_eq!(AssetRegistryDoc::decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn scene_doc_round_trips_and_keeps_scene_sigil() {
        let doc = SceneRegistryDoc {
            scene_sigil: Sigil::mint(),
            entries: vec![EntryRecord {
                address: ObjectAddress::scene_local(9),
                sigil: Sigil::mint(),
                meta: SceneMeta {},
            }],
        };
        let bytes = doc.encode().unwrap();
        let back = SceneRegistryDoc::decode(&bytes).unwrap();
        assert_eq!(back.scene_sigil, doc.scene_sigil);
        assert_eq!(back, doc);
    }

    #[test]
    fn empty_asset_doc_decodes_from_minimal_json() {
        let doc = AssetRegistryDoc::decode(br#"{ "entries": [] }"#).unwrap();
        assert!(doc.entries.is_empty());
    }
}
