// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The clear-then-rebuild reconciliation pass.
//!
//! Reconciliation realigns a scope's registry with a freshly enumerated set
//! of objects: survivors keep their sigils, newcomers get minted ones, and
//! absentees are retired. The pass persists twice, once right after the
//! clear and once at the end, so a failure mid-pass leaves an empty
//! persisted registry rather than a wrong one. Stale ids heal themselves on
//! the next pass; wrong ids silently corrupt references.
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::entry::SigilEntry;
use crate::host::ObjectHost;
use crate::ident::ObjectKey;
use crate::registry::SigilRegistry;
use crate::scope::ScopeError;

/// Outcome counts of a reconciliation pass.
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReceipt {
    /// Entries carried over with their sigil intact.
    pub preserved: usize,
    /// Entries minted fresh, including survivors whose old sigil was no
    /// longer unique.
    pub minted: usize,
    /// Previous entries whose object was absent from the enumeration.
    pub retired: usize,
}

/// Runs the pass against `registry`, persisting through `persist`.
///
/// `objects` is the full set that should be tracked afterwards, in
/// enumeration order. Dead objects and repeated handles are ignored. The
/// pass refuses to run while the host reports live simulation.
pub(crate) fn run<P, H, F, C>(
    registry: &mut SigilRegistry<P>,
    host: &H,
    objects: impl IntoIterator<Item = ObjectKey>,
    mint: F,
    mut persist: C,
) -> Result<ReconcileReceipt, ScopeError>
where
    P: Clone,
    H: ObjectHost,
    F: Fn(&H, ObjectKey) -> SigilEntry<P>,
    C: FnMut(&SigilRegistry<P>) -> Result<(), ScopeError>,
{
    if host.simulating() {
        return Err(ScopeError::SimulationActive);
    }
    registry.refresh(host);
    let snapshot = registry.clone();
    registry.clear();
    // Empty on disk before anything else: a failure from here on leaves
    // "no ids" rather than "wrong ids".
    persist(registry)?;

    let mut previous: FxHashMap<ObjectKey, SigilEntry<P>> = FxHashMap::default();
    for entry in snapshot.entries {
        previous.insert(entry.object, entry);
    }

    let mut receipt = ReconcileReceipt::default();
    for object in objects {
        if !host.is_alive(object) {
            debug!(object = ?object, "skipping dead object during rebuild");
            continue;
        }
        if registry.contains_object(host, object) {
            continue;
        }
        match previous.remove(&object) {
            Some(entry) => {
                if registry.try_add(host, entry) {
                    receipt.preserved += 1;
                } else {
                    // The old sigil is no longer unique (an earlier mint
                    // claimed it). Track the object under a fresh one.
                    registry.add_minted(mint(host, object));
                    receipt.minted += 1;
                }
            }
            None => {
                registry.add_minted(mint(host, object));
                receipt.minted += 1;
            }
        }
    }
    receipt.retired = previous.len();
    persist(registry)?;
    debug!(
        preserved = receipt.preserved,
        minted = receipt.minted,
        retired = receipt.retired,
        "registry rebuild complete"
    );
    Ok(receipt)
}
