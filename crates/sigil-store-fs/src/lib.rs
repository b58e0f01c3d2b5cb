// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `RegistryStore` keeping registry documents with the
//! project.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sigil_core::{RegistryStore, StoreError};

const PROJECT_FILE: &str = "assets.json";
const SCENE_DIR: &str = "scenes";

/// Stores registry documents as JSON files under a caller-supplied root,
/// typically the project's metadata directory.
///
/// The project document lives at `<root>/assets.json`, the well-known
/// location every session agrees on. Scene documents live under
/// `<root>/scenes/`, one file per scene, named by a BLAKE3 digest of the
/// scene's address so arbitrary address strings map to stable,
/// filesystem-safe names.
///
/// One file per scene means a scene can never present more than one
/// document here; the duplicated-document case belongs to backends that
/// embed registry state inside scene files themselves.
pub struct FsRegistryStore {
    root: PathBuf,
}

impl FsRegistryStore {
    /// Creates a store rooted at `root`. Directories are created lazily on
    /// the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory this store writes under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project document.
    pub fn project_path(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    /// Path of the document for a scene address.
    pub fn scene_path(&self, address: &str) -> PathBuf {
        let digest = blake3::hash(address.as_bytes());
        let name = format!("{}.json", hex::encode(&digest.as_bytes()[..8]));
        self.root.join(SCENE_DIR).join(name)
    }
}

impl RegistryStore for FsRegistryStore {
    fn load_project(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.project_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn save_project(&self, bytes: &[u8]) -> Result<(), StoreError> {
        write_file(&self.project_path(), bytes)
    }

    fn load_scene(&self, address: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        match fs::read(self.scene_path(address)) {
            Ok(bytes) => Ok(vec![bytes]),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn save_scene(&self, address: &str, bytes: &[u8]) -> Result<(), StoreError> {
        write_file(&self.scene_path(address), bytes)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}
