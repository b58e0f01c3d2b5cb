// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence port for registry documents.
use thiserror::Error;

/// Byte-level storage for registry documents.
///
/// The port traffics in opaque bytes; the scope layer owns the document
/// encoding. One project document exists per store at a well-known location
/// the adapter chooses. Scene documents are keyed by the scene's durable
/// address string.
///
/// `load_scene` returns every document blob found for the address. Backends
/// that embed registry state inside scene files can surface duplicated
/// copies (the classic duplicated-component accident); the scope layer keeps
/// the first and drops the rest. Absence is an empty vec, not an error.
pub trait RegistryStore {
    /// Loads the project document, `None` when none has been saved yet.
    fn load_project(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Saves the project document, replacing any previous one.
    fn save_project(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Loads every document blob stored for a scene address.
    fn load_scene(&self, address: &str) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Saves the single document for a scene address, replacing all blobs
    /// previously stored under it.
    fn save_scene(&self, address: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Failures raised by [`RegistryStore`] backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("registry store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Backend-specific failure that is not plain I/O.
    #[error("registry store backend error: {0}")]
    Backend(String),
}
