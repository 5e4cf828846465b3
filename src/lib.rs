//! # Multi-Dimensional Data Structures
//!
//! *In-memory containers for spreadsheet and indexing workloads.*
//!
//! ## Intuition First
//!
//! Picture a spreadsheet column a million rows tall.  A handful of rows
//! hold strings, a long run in the middle holds numbers, and almost
//! everything else is blank.  Storing that as a vector of tagged values
//! spends a tag, padding, and often a heap pointer on every single row —
//! including the blank ones.
//!
//! The [`MultiTypeVector`] instead stores the column as a short list of
//! *blocks*: one run of strings, one run of doubles, one run of nothing.
//! Each run is a plain homogeneous vector, blank runs store only a length,
//! and the per-row overhead disappears.  The price is bookkeeping: every
//! write must split, shrink, or fuse blocks so that adjacent runs never
//! share a type.  That bookkeeping is this crate's most intricate piece.
//!
//! ## The Problem
//!
//! Containers face a trade-off between uniformity and density:
//! - **Tagged vectors**: random access in $O(1)$, but $O(n)$ tag and
//!   padding overhead even for sparse or uniform data.
//! - **Maps keyed by row**: dense storage for sparse data, but scattered
//!   allocations and no cheap typed bulk scans.
//!
//! Block-compacted storage keeps positional access linear in the number
//! of *blocks* while bulk reads degrade gracefully into contiguous slice
//! scans per run.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - [`MultiTypeVector`]: the typed block vector described above.
//! - [`Collection`]: row-major side iteration over a group of columns.
//! - [`PackedTrieMap`]: an immutable prefix map compacted into one
//!   contiguous array of machine words.
//! - [`RTree`]: a dynamic R\*-style spatial index over axis-aligned boxes.
//! - [`SegmentTree`]: a batch-built interval map with stabbing queries.
//!
//! All containers are single-owner, in-process structures: no hidden
//! global state, no internal synchronization, no persistence.  Share one
//! across threads read-only, or not at all while mutating.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod element_block;
pub mod error;
pub mod multi_type_vector;
pub mod packed_trie;
pub mod rtree;
pub mod segment_tree;

pub use collection::Collection;
pub use element_block::{CellType, ElementBlock, Value};
pub use error::{Error, Result};
pub use multi_type_vector::MultiTypeVector;
pub use packed_trie::PackedTrieMap;
pub use rtree::{BoundingBox, RTree, RTreeConfig};
pub use segment_tree::SegmentTree;
