#![cfg_attr(docsrs, feature(doc_cfg))]
//! # forest-domains
//!
//! forest-domains turns a block-structured quadtree/octree AMR forest into a
//! multilevel sequence of patch domains for geometric multigrid and domain
//! decomposition solvers. Each [`Domain`](domain::Domain) is a snapshot of
//! the forest at one coarsening level: every patch knows its id, owning rank,
//! physical geometry, parent and children in the adjacent levels, and what
//! lies across each of its sides, corners and (in 3-D) edges.
//!
//! ## Features
//! - Const-generic direction algebra ([`Side`](topology::Side),
//!   [`Corner`](topology::Corner), [`Edge`](topology::Edge),
//!   [`Orthant`](topology::Orthant)) with stable JSON literals
//! - Multi-block connectivity with rotated and periodic block links
//! - Normal / coarse / fine neighbor classification across block and rank
//!   boundaries, relying on 2:1 balance
//! - Deterministic ids: every rank derives the same ids for the patches it
//!   sees without communicating
//! - An in-memory [`Forest`](forest::Forest) that refines, balances and
//!   partitions itself, for tests and small runs
//! - Binary patch records for exchanging patches between ranks
//!
//! ## Determinism
//!
//! Patch ids follow (block, Morton) order of the forest leaves. A coarse
//! patch takes the id of the first leaf it contains, so the same cell has the
//! same id on every rank that can see it. Two generators fed the same view
//! produce identical domain sequences.
//!
//! ## Usage
//!
//! ```
//! use forest_domains::prelude::*;
//!
//! # fn main() -> Result<(), DomainError> {
//! let mut forest = QuadForest::uniform(Connectivity::brick([2, 1], [false; 2])?, 1)?;
//! forest.refine_cells(&[TreeCell { block: 0, level: 1, coords: [1, 1] }])?;
//! forest.balance()?;
//!
//! let config = PatchConfig::new([8, 8], 1)?;
//! let generator = DomainGenerator::new(forest.serial_view(), config, UnitBlockMap)?;
//! let domains = generator.collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(domains.last().map(|d| d.num_global_patches()), Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! Invariant checks on every produced domain run in debug builds, or with
//! the `strict-invariants` / `check-invariants` features.

pub mod algs;
pub mod debug_invariants;
pub mod domain;
pub mod domain_error;
pub mod forest;
pub mod patch;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use domain_error::DomainError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::wire::{decode_patches, encode_patches};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::domain::{
        BlockMap, BrickBlockMap, Domain, DomainGenerator, PatchConfig, UnitBlockMap,
    };
    pub use crate::domain_error::DomainError;
    pub use crate::forest::{Forest, ForestView, GhostLeaf, LocalForest, OctForest, QuadForest};
    pub use crate::patch::{
        CoarseNbrInfo, FineNbrInfo, NbrDirection, NbrInfo, NbrType, NormalNbrInfo, Patch,
    };
    pub use crate::topology::{
        Connectivity, Corner, DirectionTag, Edge, Orthant, OrthantLike, Side, SideOrthant,
        TreeCell,
    };
}
