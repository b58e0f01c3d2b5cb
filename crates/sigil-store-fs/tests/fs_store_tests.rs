// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use sigil_core::{MemoryHost, ObjectAddress, RegistryStore, Scopes};
use sigil_store_fs::FsRegistryStore;
use tempfile::tempdir;

#[test]
fn missing_files_load_as_absent() {
    let temp_dir = tempdir().unwrap();
    let store = FsRegistryStore::new(temp_dir.path());
    assert!(store.load_project().unwrap().is_none());
    assert!(store.load_scene("scenes/main.scene").unwrap().is_empty());
}

#[test]
fn project_document_lives_at_the_well_known_path() {
    let temp_dir = tempdir().unwrap();
    let store = FsRegistryStore::new(temp_dir.path());
    store.save_project(b"{ \"entries\": [] }").unwrap();
    let path = temp_dir.path().join("assets.json");
    assert!(path.is_file());
    assert_eq!(store.project_path(), path);
}

#[test]
fn project_round_trips_across_store_instances() {
    let temp_dir = tempdir().unwrap();
    FsRegistryStore::new(temp_dir.path()).save_project(b"payload").unwrap();
    let reopened = FsRegistryStore::new(temp_dir.path());
    assert_eq!(reopened.load_project().unwrap().unwrap(), b"payload");
}

#[test]
fn one_file_per_scene_overwritten_in_place() {
    let temp_dir = tempdir().unwrap();
    let store = FsRegistryStore::new(temp_dir.path());
    store.save_scene("scenes/main.scene", b"first").unwrap();
    store.save_scene("scenes/main.scene", b"second").unwrap();
    assert_eq!(store.load_scene("scenes/main.scene").unwrap(), vec![b"second".to_vec()]);
}

#[test]
fn distinct_addresses_map_to_distinct_files() {
    let temp_dir = tempdir().unwrap();
    let store = FsRegistryStore::new(temp_dir.path());
    store.save_scene("scenes/a.scene", b"a").unwrap();
    store.save_scene("scenes/b.scene", b"b").unwrap();

    let a_path = store.scene_path("scenes/a.scene");
    let b_path = store.scene_path("scenes/b.scene");
    assert_ne!(a_path, b_path);
    assert!(a_path.starts_with(temp_dir.path().join("scenes")));
    assert_eq!(store.load_scene("scenes/a.scene").unwrap(), vec![b"a".to_vec()]);
    assert_eq!(store.load_scene("scenes/b.scene").unwrap(), vec![b"b".to_vec()]);
}

#[test]
fn scene_paths_are_stable_across_instances() {
    let temp_dir = tempdir().unwrap();
    let first = FsRegistryStore::new(temp_dir.path()).scene_path("scenes/main.scene");
    let second = FsRegistryStore::new(temp_dir.path()).scene_path("scenes/main.scene");
    assert_eq!(first, second);
}

#[test]
fn hub_round_trips_through_the_filesystem() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path().join("registry");
    let host = MemoryHost::new();
    let hero = host.spawn(ObjectAddress::asset("models/hero.mesh", 0));
    let scene = host.add_scene("scenes/main.scene");
    let prop = host.spawn(ObjectAddress::scene_local(1));

    let (hero_sigil, scene_sigil, prop_sigil) = {
        let mut scopes = Scopes::new(host.clone(), FsRegistryStore::new(&root));
        let mut assets = scopes.assets().unwrap();
        let hero_sigil = assets.get_or_create_entry(hero).unwrap().sigil;
        assets.commit().unwrap();
        let mut view = scopes.scene(scene).unwrap();
        let prop_sigil = view.get_or_create_entry(prop).unwrap().sigil;
        view.commit().unwrap();
        (hero_sigil, view.scene_sigil(), prop_sigil)
    };

    let mut scopes = Scopes::new(host, FsRegistryStore::new(&root));
    let mut assets = scopes.assets().unwrap();
    assert_eq!(assets.entry_for_object(hero).unwrap().sigil, hero_sigil);
    let mut view = scopes.scene(scene).unwrap();
    assert_eq!(view.scene_sigil(), scene_sigil);
    assert_eq!(view.entry_for_object(prop).unwrap().sigil, prop_sigil);
}
