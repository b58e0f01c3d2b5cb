// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The bidirectional registry core.
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::doc::EntryRecord;
use crate::entry::SigilEntry;
use crate::host::ObjectHost;
use crate::ident::{ObjectKey, Sigil};

/// Bidirectional object identity registry, generic over the entry payload.
///
/// The ordered entry list is the authoritative state; the two hash maps are
/// derived position indexes. Incremental mutation keeps the indexes exact.
/// Crossing a reload boundary ([`Self::from_records`]) or calling
/// [`Self::invalidate_index`] marks them stale, and the next access rebuilds
/// them, compacting entries whose object has died in the meantime. That
/// rebuild is the one sanctioned case of a read mutating the registry: a
/// dead entry was never observable as valid, so dropping it is not a
/// semantic change.
///
/// Invariants among live entries: each object appears at most once, each
/// sigil appears at most once, and every indexed position points at the
/// entry it was built from. All mutating and lazily-rebuilding operations
/// take `&mut self`; a shared registry is impossible to corrupt from safe
/// code because the borrow checker serializes access.
///
/// `Clone` is the snapshot operation. A clone shares nothing with its
/// source and is the input to diff-based rebuilds.
#[derive(Debug, Clone)]
pub struct SigilRegistry<P> {
    /// Authoritative ordered entries. Order follows insertion and is
    /// cosmetic.
    pub(crate) entries: Vec<SigilEntry<P>>,
    /// Derived index: object handle to position in `entries`.
    pub(crate) by_object: FxHashMap<ObjectKey, usize>,
    /// Derived index: sigil to position in `entries`.
    pub(crate) by_sigil: FxHashMap<Sigil, usize>,
    /// When set, the indexes may disagree with `entries` and must be
    /// rebuilt before use.
    pub(crate) stale: bool,
}

impl<P> Default for SigilRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SigilRegistry<P> {
    /// Creates an empty registry with fresh indexes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_object: FxHashMap::default(),
            by_sigil: FxHashMap::default(),
            stale: false,
        }
    }

    /// Returns the entry for a live object, minting one via `mint` when the
    /// object has none yet.
    ///
    /// Idempotent: an existing entry is returned as-is and `mint` is never
    /// invoked for it. A dead or unknown object yields `None` and mints
    /// nothing. When `mint` proposes a sigil that is already registered
    /// (hosts can derive canonical sigils from shared provenance, so two
    /// objects may propose the same one), the entry is re-minted with fresh
    /// random entropy instead of breaking sigil uniqueness.
    pub fn get_or_create(
        &mut self,
        host: &impl ObjectHost,
        object: ObjectKey,
        mint: impl FnOnce(ObjectKey) -> SigilEntry<P>,
    ) -> Option<SigilEntry<P>>
    where
        P: Clone,
    {
        self.refresh(host);
        if !host.is_alive(object) {
            return None;
        }
        if let Some(&pos) = self.by_object.get(&object) {
            return self.entries.get(pos).cloned();
        }
        let mut entry = mint(object);
        if entry.object != object {
            debug_assert_eq!(entry.object, object, "mint produced an entry for another object");
            entry.object = object;
        }
        Some(self.add_minted(entry))
    }

    /// Inserts `entry` if its object is alive and neither its object nor
    /// its sigil is already registered. Returns whether the insert happened.
    ///
    /// Never overwrites: a rejected insert leaves the registry untouched.
    pub fn try_add(&mut self, host: &impl ObjectHost, entry: SigilEntry<P>) -> bool {
        self.refresh(host);
        if !host.is_alive(entry.object) {
            return false;
        }
        if self.by_object.contains_key(&entry.object) || self.by_sigil.contains_key(&entry.sigil) {
            return false;
        }
        self.index_insert(entry);
        true
    }

    /// Looks up the entry for a live object. Dead objects always miss, even
    /// while their entry is still awaiting compaction.
    pub fn entry_for_object(
        &mut self,
        host: &impl ObjectHost,
        object: ObjectKey,
    ) -> Option<&SigilEntry<P>> {
        self.refresh(host);
        if !host.is_alive(object) {
            return None;
        }
        let pos = *self.by_object.get(&object)?;
        self.entries.get(pos)
    }

    /// Looks up the entry owning `sigil`, missing when the mapped object is
    /// no longer alive.
    pub fn entry_for_sigil(
        &mut self,
        host: &impl ObjectHost,
        sigil: Sigil,
    ) -> Option<&SigilEntry<P>> {
        self.refresh(host);
        let pos = *self.by_sigil.get(&sigil)?;
        let entry = self.entries.get(pos)?;
        if host.is_alive(entry.object) {
            Some(entry)
        } else {
            None
        }
    }

    /// Whether a live entry exists for `object`.
    pub fn contains_object(&mut self, host: &impl ObjectHost, object: ObjectKey) -> bool {
        self.entry_for_object(host, object).is_some()
    }

    /// Removes the entry for `object`, repairing the indexes in place.
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, object: ObjectKey) -> bool {
        let Some(pos) = self.entries.iter().position(|entry| entry.object == object) else {
            return false;
        };
        let removed = self.entries.remove(pos);
        if self.stale {
            // Indexes are getting rebuilt on next access anyway.
            return true;
        }
        self.by_object.remove(&removed.object);
        self.by_sigil.remove(&removed.sigil);
        for slot in self.by_object.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        for slot in self.by_sigil.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        true
    }

    /// Drops every entry, leaving a fresh empty registry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_object.clear();
        self.by_sigil.clear();
        self.stale = false;
    }

    /// Read-only view of the entry list, rebuilt first when stale.
    ///
    /// Entries whose object died since the last rebuild linger here until
    /// the next rebuild; persistence filters them regardless. Callers that
    /// need a strictly live view call [`Self::invalidate_index`] first.
    pub fn entries(&mut self, host: &impl ObjectHost) -> &[SigilEntry<P>] {
        self.refresh(host);
        &self.entries
    }

    /// Number of entries in the authoritative list, as-is.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the authoritative list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks the derived indexes stale so the next access re-validates
    /// liveness. Cheap; for hosts that just destroyed objects in bulk.
    pub fn invalidate_index(&mut self) {
        self.stale = true;
    }

    /// Rebuilds the derived indexes when stale, compacting dead entries and
    /// dropping duplicates (first occurrence wins).
    ///
    /// No-op on a fresh registry, so calling this on every access is the
    /// intended pattern rather than a cost.
    pub fn refresh(&mut self, host: &impl ObjectHost) {
        if !self.stale {
            return;
        }
        self.by_object.clear();
        self.by_sigil.clear();
        let scanned = std::mem::take(&mut self.entries);
        self.entries = Vec::with_capacity(scanned.len());
        for entry in scanned {
            if !host.is_alive(entry.object) {
                debug!(object = ?entry.object, sigil = %entry.sigil, "compacting entry for dead object");
                continue;
            }
            if self.by_object.contains_key(&entry.object) {
                warn!(object = ?entry.object, sigil = %entry.sigil, "dropping duplicate entry for object");
                continue;
            }
            if self.by_sigil.contains_key(&entry.sigil) {
                warn!(object = ?entry.object, sigil = %entry.sigil, "dropping entry with duplicate sigil");
                continue;
            }
            self.index_insert(entry);
        }
        self.stale = false;
    }

    /// Persistable view: records for live, addressable entries in list
    /// order. Dead or unaddressable entries are skipped.
    pub fn to_records(&self, host: &impl ObjectHost) -> Vec<EntryRecord<P>>
    where
        P: Clone,
    {
        self.entries
            .iter()
            .filter_map(|entry| {
                if !host.is_alive(entry.object) {
                    debug!(object = ?entry.object, sigil = %entry.sigil, "skipping dead entry at serialization");
                    return None;
                }
                let Some(address) = host.address_of(entry.object) else {
                    debug!(object = ?entry.object, sigil = %entry.sigil, "skipping unaddressable entry at serialization");
                    return None;
                };
                Some(EntryRecord { address, sigil: entry.sigil, meta: entry.meta.clone() })
            })
            .collect()
    }

    /// Rebuilds a registry from persisted records, resolving each address to
    /// the object currently answering to it.
    ///
    /// Records whose address no longer resolves are dropped quietly: the
    /// object they named is gone from this session. The returned registry
    /// is born stale, so its first access performs the full rebuild a
    /// reload boundary requires.
    #[must_use]
    pub fn from_records(host: &impl ObjectHost, records: Vec<EntryRecord<P>>) -> Self {
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            match host.resolve_address(&record.address) {
                Some(object) => {
                    entries.push(SigilEntry { object, sigil: record.sigil, meta: record.meta });
                }
                None => {
                    debug!(address = %record.address, sigil = %record.sigil, "dropping record with unresolvable address");
                }
            }
        }
        Self {
            entries,
            by_object: FxHashMap::default(),
            by_sigil: FxHashMap::default(),
            stale: true,
        }
    }

    /// Inserts a freshly minted entry, re-minting its sigil when the
    /// proposed one is already registered.
    ///
    /// Callers guarantee the indexes are fresh and the entry's object is
    /// alive and absent. Returns the entry as stored.
    pub(crate) fn add_minted(&mut self, mut entry: SigilEntry<P>) -> SigilEntry<P>
    where
        P: Clone,
    {
        debug_assert!(!self.stale, "add_minted requires fresh indexes");
        debug_assert!(
            !self.by_object.contains_key(&entry.object),
            "add_minted requires an absent object"
        );
        if self.by_sigil.contains_key(&entry.sigil) {
            debug!(object = ?entry.object, sigil = %entry.sigil, "proposed sigil already registered, re-minting");
            entry.sigil = Sigil::mint();
            debug_assert!(
                !self.by_sigil.contains_key(&entry.sigil),
                "random re-mint collided"
            );
        }
        let stored = entry.clone();
        self.index_insert(entry);
        stored
    }

    fn index_insert(&mut self, entry: SigilEntry<P>) {
        let pos = self.entries.len();
        self.by_object.insert(entry.object, pos);
        self.by_sigil.insert(entry.sigil, pos);
        self.entries.push(entry);
    }
}
