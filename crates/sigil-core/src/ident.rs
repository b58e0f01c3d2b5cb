// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity primitives: durable sigils and transient host handles.
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use uuid::Uuid;

/// Durable 128-bit identifier attached to a tracked object.
///
/// A `Sigil` is minted once and then follows its object across saves,
/// reloads, renames, and duplication of the surrounding files. It renders as
/// 32 lowercase hex characters, which is also its persisted form in
/// human-readable encodings; binary encodings carry the raw 16 bytes.
///
/// Sigils are opaque. Nothing may be derived from their value, and tooling
/// must not assume any relationship between a sigil and the object's current
/// address or name.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Sigil([u8; 16]);

impl Sigil {
    /// Mints a fresh random sigil (UUID v4 entropy).
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Wraps raw bytes as a sigil.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the canonical byte representation of this sigil.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parses a sigil from a byte slice.
    ///
    /// # Errors
    /// Returns an error when the slice is not exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SigilParseError> {
        if bytes.len() != 16 {
            return Err(SigilParseError::Length(bytes.len() * 2));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl Display for Sigil {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Sigil {
    type Err = SigilParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(SigilParseError::Length(s.len()));
        }
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl serde::Serialize for Sigil {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for Sigil {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SigilVisitor;

        impl serde::de::Visitor<'_> for SigilVisitor {
            type Value = Sigil;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sigil as 32 hex chars or 16 raw bytes")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Sigil::from_slice(value).map_err(serde::de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(SigilVisitor)
        } else {
            deserializer.deserialize_bytes(SigilVisitor)
        }
    }
}

/// Failure to parse a [`Sigil`] from its textual form.
#[derive(Debug, thiserror::Error)]
pub enum SigilParseError {
    /// Input was not exactly 32 hex characters.
    #[error("sigil must be 32 hex characters, got {0}")]
    Length(usize),
    /// Input contained non-hex characters.
    #[error("sigil is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Transient, process-local handle for a live host object.
///
/// The host assigns these; they are unique among live objects within one
/// process and meaningless outside it. `ObjectKey` is never serialized; the
/// durable face of an object is its [`ObjectAddress`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectKey(pub u64);

/// Transient, process-local handle for a loaded scene.
///
/// Like [`ObjectKey`], scene handles are never serialized; a scene's durable
/// face is the address string its host reports.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SceneId(pub u64);

/// Durable address of an object, resolvable across sessions by the host.
///
/// For project assets `path` locates the containing source file and `slot`
/// distinguishes sub-objects within it. For scene objects the owning scene
/// supplies the path context, so `path` is empty and `slot` is the
/// scene-local identifier.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct ObjectAddress {
    /// Source location, empty for scene-local objects.
    pub path: String,
    /// Sub-object or scene-local slot.
    pub slot: u64,
}

impl ObjectAddress {
    /// Address of a sub-object within a source file.
    #[must_use]
    pub fn asset(path: impl Into<String>, slot: u64) -> Self {
        Self { path: path.into(), slot }
    }

    /// Address of a scene-local object.
    #[must_use]
    pub fn scene_local(slot: u64) -> Self {
        Self { path: String::new(), slot }
    }
}

impl Display for ObjectAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.slot)
    }
}
