//! Patch assembly shared by the finest builder and the coarsening step.

use crate::algs::classify::Classifier;
use crate::algs::leaf_index::{LeafIndex, LeafRecord};
use crate::domain::{BlockMap, PatchConfig};
use crate::domain_error::DomainError;
use crate::patch::Patch;
use crate::topology::{Connectivity, Dim, Orthant, SupportedDim, TreeCell};

/// Builds the patches of the domain at one level.
pub struct LevelBuilder<'a, const D: usize, M> {
    pub(crate) index: &'a LeafIndex<D>,
    pub(crate) connectivity: &'a Connectivity<D>,
    pub(crate) block_map: &'a M,
    pub(crate) config: PatchConfig<D>,
    /// Level of the domain being built.
    pub(crate) level: u8,
    /// Level of the finest domain of the sequence.
    pub(crate) finest_level: u8,
}

impl<const D: usize, M> LevelBuilder<'_, D, M>
where
    Dim<D>: SupportedDim,
    M: BlockMap<D>,
{
    /// Patches for `cells`, which must be sorted and all be patches of this
    /// level. Local indices follow the order of `cells`.
    pub fn build(&self, cells: &[TreeCell<D>]) -> Result<Vec<Patch<D>>, DomainError> {
        let classifier = Classifier::new(self.index, self.connectivity, self.level);
        cells
            .iter()
            .enumerate()
            .map(|(local_index, cell)| {
                let mut patch = self.patch(*cell, local_index)?;
                classifier.fill(&mut patch)?;
                Ok(patch)
            })
            .collect()
    }

    fn patch(&self, cell: TreeCell<D>, local_index: usize) -> Result<Patch<D>, DomainError> {
        let record = self.require(&cell, self.level)?;
        let mut patch = Patch::new(cell, self.config.ns, self.config.num_ghost_cells);
        patch.id = record.id;
        patch.rank = record.rank;
        patch.local_index = local_index;
        self.place(&mut patch);
        self.link_parent(&mut patch, record)?;
        self.link_children(&mut patch, record)?;
        Ok(patch)
    }

    fn require(&self, cell: &TreeCell<D>, level: u8) -> Result<LeafRecord, DomainError> {
        self.index.lookup(cell, level).ok_or_else(|| {
            DomainError::InvalidForest(format!("{cell:?} is not a patch at level {level}"))
        })
    }

    /// Physical lower corner and spacing from the block map at the cell's
    /// unit-space corners.
    fn place(&self, patch: &mut Patch<D>) {
        let (lower, upper) = patch.cell().unit_bounds();
        let start = self.block_map.map(patch.block(), lower);
        let end = self.block_map.map(patch.block(), upper);
        for axis in 0..D {
            patch.starts[axis] = start[axis];
            patch.spacings[axis] = (end[axis] - start[axis]) / patch.ns[axis] as f64;
        }
    }

    /// A cell coarser than this level has no distinct parent here: it links
    /// to itself with a null orthant.
    fn link_parent(&self, patch: &mut Patch<D>, record: LeafRecord) -> Result<(), DomainError> {
        if self.level == 0 {
            return Ok(());
        }
        let cell = *patch.cell();
        let parent = match cell.parent() {
            Some(parent) if cell.level == self.level => parent,
            _ => {
                patch.parent_id = Some(record.id);
                patch.parent_rank = Some(record.rank);
                return Ok(());
            }
        };
        let found = self.require(&parent, self.level - 1)?;
        patch.parent_id = Some(found.id);
        patch.parent_rank = Some(found.rank);
        patch.orth_on_parent = cell.orthant();
        Ok(())
    }

    /// Leaves reappear unchanged one level finer, in child slot 0.
    fn link_children(&self, patch: &mut Patch<D>, record: LeafRecord) -> Result<(), DomainError> {
        if self.level >= self.finest_level {
            return Ok(());
        }
        let cell = *patch.cell();
        let is_leaf = self
            .index
            .first_leaf(&cell)
            .is_some_and(|(leaf, _)| *leaf == cell);
        if is_leaf {
            patch.child_ids[0] = Some(record.id);
            patch.child_ranks[0] = Some(record.rank);
            return Ok(());
        }
        for orth in Orthant::<D>::values() {
            let found = self.require(&cell.child(orth), self.level + 1)?;
            patch.child_ids[orth.index()] = Some(found.id);
            patch.child_ranks[orth.index()] = Some(found.rank);
        }
        Ok(())
    }
}

/// Global number of patches in the domain at `level`, from the global leaf
/// counts per level.
///
/// Every leaf at or below `level` is its own patch; the `N_k` leaves of each
/// finer level `k` merge `2^D` at a time on the way down, so
/// `M_l = N_l + M_{l+1} / 2^D` and the count is `sum_{k<l} N_k + M_l`.
pub fn global_patch_count<const D: usize>(level_counts: &[usize], level: u8) -> Result<usize, DomainError> {
    let siblings = 1usize << D;
    let count_at = |k: usize| level_counts.get(k).copied().unwrap_or(0);
    let level = level as usize;
    let top = level_counts.len().saturating_sub(1).max(level);
    let mut merged = 0;
    for k in (level..=top).rev() {
        if merged % siblings != 0 {
            return Err(DomainError::InvalidForest(format!(
                "{merged} cells above level {k} do not form complete sibling groups"
            )));
        }
        merged = count_at(k) + merged / siblings;
    }
    Ok((0..level).map(count_at).sum::<usize>() + merged)
}
