//! symtable: a string-keyed symbol table with two interchangeable engines.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one small contract (`SymTable<V>`) with a fast engine and a
//!   trivially correct one, so the fast one can be checked against the
//!   simple one.
//! - Layers:
//!   - `chain::Chains<V>`: node storage in a generational slot arena.
//!     A chain is the handle of its first node; nodes link by handle.
//!     Removal patches the predecessor's link; relinking moves no data.
//!   - `HashSymTable<V>`: an array of chain heads indexed by a polynomial
//!     string hash, grown through a fixed size sequence.
//!   - `ListSymTable<V>`: a single chain, linear scans everywhere.
//!
//! Constraints
//! - Single owner: every mutating operation takes `&mut self`; there is no
//!   internal locking.
//! - Keys are `&str` on the way in and are always copied into a `Box<str>`
//!   owned by the table.
//! - Values are a bare `V`: never cloned, compared, hashed or inspected.
//! - Unique keys; duplicate puts fail and leave the table unchanged.
//!
//! Growth
//! - Bucket counts step through `BUCKET_COUNTS` (509 up to 65521).
//! - A put that finds as many bindings as buckets grows the table first
//!   (load factor 1.0). At the last step the table stops growing and chains
//!   get longer.
//! - Growth allocates the new head array fallibly, then walks every old
//!   chain and relinks each node into the bucket its hash selects under the
//!   new count. Hashes are recomputed, never cached. If the allocation
//!   fails the table stays as it was and the put goes ahead anyway.
//!
//! Failure
//! - `PutError::DuplicateKey` for a key already present.
//! - `PutError::OutOfMemory` when the key copy or a head array cannot be
//!   allocated. Node slots come from the arena, which grows like any std
//!   collection and aborts on exhaustion.
//! - Lookup misses are `None`, not errors.
//!
//! Notes and non-goals
//! - Iteration order is unspecified and changes across growth.
//! - Tables never shrink.
//! - Not thread-safe internally; `HashSymTable<V>` is `Send`/`Sync` when
//!   `V` is, so callers can serialize access externally.

mod chain;
mod hash;
pub mod hash_table;
pub mod list_table;
mod sym_table_proptest;
mod table;

// Public surface
pub use hash::BUCKET_COUNTS;
pub use hash_table::HashSymTable;
pub use list_table::ListSymTable;
pub use table::{PutError, SymTable};
