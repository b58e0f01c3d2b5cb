// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use sigil_core::{
    AssetRegistryDoc, MemoryHost, MemoryStore, ObjectAddress, ReconcileReceipt, SceneRegistryDoc,
    ScopeError, Scopes,
};

#[test]
fn asset_reconcile_counts_and_persists_final_state() {
    let host = MemoryHost::new();
    let store = MemoryStore::new();
    let hero = host.spawn(ObjectAddress::asset("models/hero.mesh", 0));
    let sword = host.spawn(ObjectAddress::asset("models/sword.mesh", 0));
    let lamp = host.spawn(ObjectAddress::asset("models/lamp.mesh", 0));

    let mut scopes = Scopes::new(host, store.clone());
    let mut assets = scopes.assets().unwrap();
    let hero_sigil = assets.get_or_create_entry(hero).unwrap().sigil;
    assets.get_or_create_entry(sword).unwrap();

    // The enumeration drops the sword and discovers the lamp.
    let receipt = assets.reconcile([hero, lamp]).unwrap();
    assert_eq!(receipt, ReconcileReceipt { preserved: 1, minted: 1, retired: 1 });

    // One save opened the scope, two more bracketed the rebuild.
    assert_eq!(store.save_count(), 3);
    let doc = AssetRegistryDoc::decode(&store.project_bytes().unwrap()).unwrap();
    assert_eq!(doc.entries.len(), 2);
    assert!(doc.entries.iter().any(|record| record.sigil == hero_sigil));
}

#[test]
fn reconcile_failure_after_clear_leaves_empty_doc_and_memory_rebuilt() {
    let host = MemoryHost::new();
    let store = MemoryStore::new();
    let hero = host.spawn(ObjectAddress::asset("models/hero.mesh", 0));
    let sword = host.spawn(ObjectAddress::asset("models/sword.mesh", 0));
    let lamp = host.spawn(ObjectAddress::asset("models/lamp.mesh", 0));

    let mut scopes = Scopes::new(host, store.clone());
    let mut assets = scopes.assets().unwrap();
    let hero_sigil = assets.get_or_create_entry(hero).unwrap().sigil;
    assets.get_or_create_entry(sword).unwrap();
    assets.commit().unwrap();

    // The cleared state persists, then the final save fails.
    store.fail_saves_after(1);
    let failed = assets.reconcile([hero, lamp]);
    assert!(matches!(failed, Err(ScopeError::Store(_))));

    // On disk: no ids rather than wrong ids.
    let doc = AssetRegistryDoc::decode(&store.project_bytes().unwrap()).unwrap();
    assert!(doc.entries.is_empty());

    // In memory the rebuild finished; committing again heals the store.
    assert_eq!(assets.entry_for_object(hero).unwrap().sigil, hero_sigil);
    assert!(assets.entry_for_object(lamp).is_some());
    assert!(assets.entry_for_object(sword).is_none());
    store.clear_save_failures();
    assets.commit().unwrap();
    let healed = AssetRegistryDoc::decode(&store.project_bytes().unwrap()).unwrap();
    assert_eq!(healed.entries.len(), 2);
}

#[test]
fn reconcile_first_persist_failure_keeps_previous_doc_on_store() {
    let host = MemoryHost::new();
    let store = MemoryStore::new();
    let hero = host.spawn(ObjectAddress::asset("models/hero.mesh", 0));
    let sword = host.spawn(ObjectAddress::asset("models/sword.mesh", 0));
    let lamp = host.spawn(ObjectAddress::asset("models/lamp.mesh", 0));

    let hero_sigil = {
        let mut scopes = Scopes::new(host.clone(), store.clone());
        let mut assets = scopes.assets().unwrap();
        let hero_sigil = assets.get_or_create_entry(hero).unwrap().sigil;
        assets.get_or_create_entry(sword).unwrap();
        assets.commit().unwrap();

        store.fail_saves_after(0);
        assert!(matches!(assets.reconcile([hero, lamp]), Err(ScopeError::Store(_))));

        // The clear never reached the store, so the committed document
        // survives; the in-memory scope is left empty.
        assert!(assets.is_empty());
        hero_sigil
    };
    let committed = AssetRegistryDoc::decode(&store.project_bytes().unwrap()).unwrap();
    assert_eq!(committed.entries.len(), 2);

    // A fresh hub reloads the committed ids.
    store.clear_save_failures();
    let mut scopes = Scopes::new(host, store);
    let mut assets = scopes.assets().unwrap();
    assert_eq!(assets.entry_for_object(hero).unwrap().sigil, hero_sigil);
    assert!(assets.entry_for_object(sword).is_some());
}

#[test]
fn reconcile_refused_while_simulating_touches_nothing() {
    let host = MemoryHost::new();
    let store = MemoryStore::new();
    let hero = host.spawn(ObjectAddress::asset("models/hero.mesh", 0));

    let mut scopes = Scopes::new(host.clone(), store.clone());
    let mut assets = scopes.assets().unwrap();
    let sigil = assets.get_or_create_entry(hero).unwrap().sigil;
    let saves_before = store.save_count();

    host.set_simulating(true);
    assert!(matches!(assets.reconcile([hero]), Err(ScopeError::SimulationActive)));
    assert_eq!(store.save_count(), saves_before);
    assert_eq!(assets.entry_for_object(hero).unwrap().sigil, sigil);
}

#[test]
fn scene_reconcile_preserves_survivors_and_keeps_scene_sigil() {
    let host = MemoryHost::new();
    let store = MemoryStore::new();
    let scene = host.add_scene("scenes/main.scene");
    let chair = host.spawn(ObjectAddress::scene_local(1));
    let table = host.spawn(ObjectAddress::scene_local(2));
    let candle = host.spawn(ObjectAddress::scene_local(3));

    let mut scopes = Scopes::new(host, store.clone());
    let mut view = scopes.scene(scene).unwrap();
    let chair_sigil = view.get_or_create_entry(chair).unwrap().sigil;
    view.get_or_create_entry(table).unwrap();
    view.commit().unwrap();
    let scene_sigil = view.scene_sigil();

    let receipt = view.reconcile([chair, candle]).unwrap();
    assert_eq!(receipt, ReconcileReceipt { preserved: 1, minted: 1, retired: 1 });

    let blobs = store.scene_blobs("scenes/main.scene");
    assert_eq!(blobs.len(), 1);
    let doc = SceneRegistryDoc::decode(&blobs[0]).unwrap();
    assert_eq!(doc.scene_sigil, scene_sigil);
    assert_eq!(doc.entries.len(), 2);
    assert!(doc.entries.iter().any(|record| record.sigil == chair_sigil));
    assert!(view.entry_for_object(table).is_none());
}
