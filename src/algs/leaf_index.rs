//! Lookup table over the local and ghost leaves of a forest view.
//!
//! The domain at level `l` consists of every leaf coarser than `l` plus the
//! level-`l` ancestors of all deeper leaves. A cell's id in any domain is the
//! id of the first leaf (in Morton order) it contains, so a single sorted map
//! of leaves answers "is this cell a patch at level `l`, and who is it" for
//! every level without building per-level tables.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain_error::DomainError;
use crate::forest::ForestView;
use crate::topology::{MAX_LEVEL, TreeCell};

/// Identity of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafRecord {
    pub id: usize,
    pub rank: usize,
}

#[derive(Debug, Clone)]
pub struct LeafIndex<const D: usize> {
    leaves: BTreeMap<TreeCell<D>, LeafRecord>,
    blocks: BTreeSet<usize>,
}

impl<const D: usize> LeafIndex<D> {
    /// Index the local and ghost leaves of `view`, assigning each leaf the id
    /// `global_first_leaf[owner] + position in owner's sorted leaves`.
    pub fn build<F: ForestView<D> + ?Sized>(view: &F) -> Result<Self, DomainError> {
        let first = view.global_first_leaf();
        let rank = view.rank();
        if first.len() < 2 || first[0] != 0 || first.windows(2).any(|w| w[0] > w[1]) {
            return Err(DomainError::InvalidForest(format!(
                "global leaf offsets {first:?} are not a prefix sum"
            )));
        }
        let num_ranks = first.len() - 1;
        if rank >= num_ranks {
            return Err(DomainError::InvalidForest(format!(
                "rank {rank} out of range for {num_ranks} ranks"
            )));
        }
        let local = view.local_leaves();
        if local.len() != first[rank + 1] - first[rank] {
            return Err(DomainError::InvalidForest(format!(
                "rank {rank} holds {} leaves, offsets expect {}",
                local.len(),
                first[rank + 1] - first[rank]
            )));
        }
        if local.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DomainError::InvalidForest(
                "local leaves are not strictly sorted in (block, Morton) order".into(),
            ));
        }
        let num_blocks = view.connectivity().num_blocks();

        let mut index = Self {
            leaves: BTreeMap::new(),
            blocks: BTreeSet::new(),
        };
        for (i, cell) in local.iter().enumerate() {
            index.insert(*cell, LeafRecord { id: first[rank] + i, rank }, num_blocks)?;
        }
        for ghost in view.ghost_leaves() {
            if ghost.rank >= num_ranks || ghost.rank == rank {
                return Err(DomainError::InvalidForest(format!(
                    "ghost {:?} has invalid owner {}",
                    ghost.cell, ghost.rank
                )));
            }
            if ghost.local_index >= first[ghost.rank + 1] - first[ghost.rank] {
                return Err(DomainError::InvalidForest(format!(
                    "ghost {:?} index {} beyond rank {}'s leaves",
                    ghost.cell, ghost.local_index, ghost.rank
                )));
            }
            let record = LeafRecord {
                id: first[ghost.rank] + ghost.local_index,
                rank: ghost.rank,
            };
            index.insert(ghost.cell, record, num_blocks)?;
        }
        Ok(index)
    }

    fn insert(&mut self, cell: TreeCell<D>, record: LeafRecord, num_blocks: usize) -> Result<(), DomainError> {
        if cell.block >= num_blocks {
            return Err(DomainError::InvalidForest(format!(
                "leaf {cell:?} lies outside the {num_blocks} connected blocks"
            )));
        }
        if cell.level > MAX_LEVEL || cell.coords.iter().any(|&c| u64::from(c) >= 1u64 << cell.level) {
            return Err(DomainError::InvalidForest(format!(
                "leaf {cell:?} lies outside its block at level {}",
                cell.level
            )));
        }
        if self.leaves.insert(cell, record).is_some() {
            return Err(DomainError::InvalidForest(format!("leaf {cell:?} listed twice")));
        }
        self.blocks.insert(cell.block);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Whether any leaf of `block` is known.
    pub fn knows_block(&self, block: usize) -> bool {
        self.blocks.contains(&block)
    }

    /// First leaf in Morton order equal to or inside `cell`.
    pub fn first_leaf(&self, cell: &TreeCell<D>) -> Option<(&TreeCell<D>, &LeafRecord)> {
        self.leaves
            .range(cell..)
            .next()
            .filter(|(leaf, _)| cell.contains(leaf))
    }

    /// Identity of `cell` as a patch of the domain at `level`, or `None` if
    /// the cell is not a patch there.
    pub fn lookup(&self, cell: &TreeCell<D>, level: u8) -> Option<LeafRecord> {
        if cell.level > level {
            return None;
        }
        let (leaf, record) = self.first_leaf(cell)?;
        if cell.level < level && leaf != cell {
            return None;
        }
        Some(*record)
    }
}
