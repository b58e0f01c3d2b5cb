// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Durable object identity for authoring hosts.
//!
//! `sigil-core` layers stable 128-bit identifiers ([`Sigil`]) over the
//! transient handles an authoring host assigns its objects, and keeps the
//! two faces consistent: object to sigil and sigil to object, across saves,
//! reloads, duplication, and full re-scans. The generic
//! [`SigilRegistry`] is the core; [`Scopes`] adapts it to the two scopes a
//! session needs (one project-wide registry for assets, one registry per
//! loaded scene); the reconciliation pass realigns a scope with a fresh
//! enumeration while preserving every surviving id.
//!
//! # Identity Policy
//!
//! Sigils are opaque. A sigil is minted at most once per tracked object and
//! never rewritten while its mapping exists; removal followed by
//! re-creation deliberately yields a fresh one. Asset minting prefers the
//! identifier the host's own asset database assigns (so tooling agrees
//! about identity) and falls back to random entropy; scene minting is
//! always random. Within one registry both directions are injective, and
//! the registry re-mints rather than let two objects share a sigil.
//!
//! # Persistence Boundary
//!
//! The ordered entry list is the authoritative state. The hash indexes are
//! derived caches: never serialized, rebuilt lazily after every reload, and
//! entitled to drop entries whose object died in the meantime. Documents
//! cross the byte-level [`RegistryStore`] port as pretty-printed JSON so
//! registry state diffs cleanly under version control.
//!
//! # Write Discipline
//!
//! One writer at a time, enforced by `&mut` receivers end to end. Mutation
//! is in-memory until an explicit [`commit`](scope::AssetScope::commit);
//! a failed persist leaves memory untouched and authoritative. A
//! multi-threaded host wraps its [`Scopes`] hub in one mutex and holds it
//! across each call.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::significant_drop_tightening,
    clippy::doc_markdown,
    clippy::too_long_first_doc_paragraph,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::trivially_copy_pass_by_ref,
    clippy::manual_let_else,
    clippy::needless_pass_by_value
)]

pub mod doc;
pub mod entry;
pub mod host;
pub mod ident;
pub mod memory;
pub mod reconcile;
pub mod registry;
pub mod scope;
pub mod store;

pub use doc::{AssetRegistryDoc, EntryRecord, SceneRegistryDoc};
pub use entry::{AssetMeta, ObjectDescriptor, ObjectOrigin, SceneMeta, SigilEntry};
pub use host::{ObjectHost, SceneHost};
pub use ident::{ObjectAddress, ObjectKey, SceneId, Sigil, SigilParseError};
pub use memory::{MemoryHost, MemoryStore};
pub use reconcile::ReconcileReceipt;
pub use registry::SigilRegistry;
pub use scope::{AssetScope, SceneScope, ScopeError, Scopes};
pub use store::{RegistryStore, StoreError};
