//! Quad/oct-tree AMR forests and the read-only view the domain generator
//! consumes.
//!
//! [`ForestView`] is the boundary to whatever adaptive-forest library owns the
//! mesh: it exposes this rank's leaves, the ghost layer and a few global
//! counts, all precomputed so that generation needs no communication.
//! [`Forest`] is an in-memory forest that can refine, balance and partition
//! itself into per-rank [`LocalForest`] views.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain_error::DomainError;
use crate::topology::cell::{MAX_LEVEL, TreeCell};
use crate::topology::connectivity::{Connectivity, neighbor_offsets};

/// A leaf owned by another rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GhostLeaf<const D: usize> {
    pub cell: TreeCell<D>,
    /// Owning rank.
    pub rank: usize,
    /// Position of the leaf in its owner's sorted leaf list.
    pub local_index: usize,
}

/// Read-only view of a partitioned forest as seen from one rank.
///
/// Ghost contract: `ghost_leaves` holds every remote leaf lying in a block
/// that contains a local leaf or shares a face, edge or corner with such a
/// block.
pub trait ForestView<const D: usize> {
    fn rank(&self) -> usize;

    fn num_ranks(&self) -> usize {
        self.global_first_leaf().len().saturating_sub(1)
    }

    fn connectivity(&self) -> &Connectivity<D>;

    /// Leaves owned by this rank, sorted in (block, Morton) order.
    fn local_leaves(&self) -> &[TreeCell<D>];

    fn ghost_leaves(&self) -> &[GhostLeaf<D>];

    /// Prefix offsets of every rank's first leaf; length `num_ranks + 1`.
    fn global_first_leaf(&self) -> &[usize];

    /// Number of leaves per refinement level across all ranks.
    fn global_level_counts(&self) -> &[usize];
}

impl<const D: usize, T: ForestView<D> + ?Sized> ForestView<D> for &T {
    fn rank(&self) -> usize {
        (**self).rank()
    }
    fn num_ranks(&self) -> usize {
        (**self).num_ranks()
    }
    fn connectivity(&self) -> &Connectivity<D> {
        (**self).connectivity()
    }
    fn local_leaves(&self) -> &[TreeCell<D>] {
        (**self).local_leaves()
    }
    fn ghost_leaves(&self) -> &[GhostLeaf<D>] {
        (**self).ghost_leaves()
    }
    fn global_first_leaf(&self) -> &[usize] {
        (**self).global_first_leaf()
    }
    fn global_level_counts(&self) -> &[usize] {
        (**self).global_level_counts()
    }
}

/// One rank's share of a partitioned forest.
#[derive(Debug, Clone)]
pub struct LocalForest<const D: usize> {
    rank: usize,
    connectivity: Arc<Connectivity<D>>,
    local: Vec<TreeCell<D>>,
    ghosts: Vec<GhostLeaf<D>>,
    global_first_leaf: Vec<usize>,
    level_counts: Vec<usize>,
}

impl<const D: usize> LocalForest<D> {
    /// Assemble a view from data exported by an external forest library.
    pub fn new(
        rank: usize,
        connectivity: Arc<Connectivity<D>>,
        local: Vec<TreeCell<D>>,
        ghosts: Vec<GhostLeaf<D>>,
        global_first_leaf: Vec<usize>,
        level_counts: Vec<usize>,
    ) -> Self {
        Self {
            rank,
            connectivity,
            local,
            ghosts,
            global_first_leaf,
            level_counts,
        }
    }
}

impl<const D: usize> ForestView<D> for LocalForest<D> {
    fn rank(&self) -> usize {
        self.rank
    }
    fn connectivity(&self) -> &Connectivity<D> {
        &self.connectivity
    }
    fn local_leaves(&self) -> &[TreeCell<D>] {
        &self.local
    }
    fn ghost_leaves(&self) -> &[GhostLeaf<D>] {
        &self.ghosts
    }
    fn global_first_leaf(&self) -> &[usize] {
        &self.global_first_leaf
    }
    fn global_level_counts(&self) -> &[usize] {
        &self.level_counts
    }
}

/// Forest of quadtrees (`D = 2`) or octrees (`D = 3`) over connected blocks.
#[derive(Debug, Clone)]
pub struct Forest<const D: usize> {
    connectivity: Arc<Connectivity<D>>,
    leaves: BTreeSet<TreeCell<D>>,
}

/// A quadtree forest (`D = 2`).
pub type QuadForest = Forest<2>;
/// An octree forest (`D = 3`).
pub type OctForest = Forest<3>;

impl<const D: usize> Forest<D> {
    /// One unrefined root leaf per block.
    pub fn new(connectivity: Connectivity<D>) -> Self {
        let leaves = (0..connectivity.num_blocks()).map(TreeCell::root).collect();
        Self {
            connectivity: Arc::new(connectivity),
            leaves,
        }
    }

    /// Every block refined uniformly to `level`.
    pub fn uniform(connectivity: Connectivity<D>, level: u8) -> Result<Self, DomainError> {
        let mut forest = Self::new(connectivity);
        for _ in 0..level {
            forest.refine_by_indicator(|_| 1.0, 0.0)?;
        }
        Ok(forest)
    }

    pub fn connectivity(&self) -> &Connectivity<D> {
        &self.connectivity
    }

    /// Return an iterator over leaf cells in (block, Morton) order.
    pub fn leaves(&self) -> impl Iterator<Item = &TreeCell<D>> {
        self.leaves.iter()
    }

    /// Return the number of leaf cells.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn max_level(&self) -> u8 {
        self.leaves.iter().map(|cell| cell.level).max().unwrap_or(0)
    }

    /// Number of leaves on each level, `0..=max_level`.
    pub fn level_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.max_level() as usize + 1];
        for leaf in &self.leaves {
            counts[leaf.level as usize] += 1;
        }
        counts
    }

    /// Refine all leaf cells whose indicator exceeds the threshold.
    pub fn refine_by_indicator<F>(&mut self, indicator: F, threshold: f64) -> Result<usize, DomainError>
    where
        F: Fn(&TreeCell<D>) -> f64,
    {
        let to_refine: Vec<_> = self
            .leaves
            .iter()
            .copied()
            .filter(|cell| indicator(cell) > threshold)
            .collect();
        self.refine_cells(&to_refine)
    }

    /// Coarsen all leaf siblings whose indicators are below the threshold.
    pub fn coarsen_by_indicator<F>(&mut self, indicator: F, threshold: f64) -> usize
    where
        F: Fn(&TreeCell<D>) -> f64,
    {
        let mut parent_to_children: BTreeMap<TreeCell<D>, Vec<TreeCell<D>>> = BTreeMap::new();
        for leaf in &self.leaves {
            if let Some(parent) = leaf.parent() {
                parent_to_children.entry(parent).or_default().push(*leaf);
            }
        }

        let sibling_count = 1 << D;
        let mut coarsened = 0;
        for (parent, children) in parent_to_children {
            if children.len() == sibling_count
                && children.iter().all(|child| indicator(child) < threshold)
            {
                for child in &children {
                    self.leaves.remove(child);
                }
                self.leaves.insert(parent);
                coarsened += 1;
            }
        }
        coarsened
    }

    /// Replace each given leaf by its `2^D` children. Cells that are not
    /// leaves are skipped.
    pub fn refine_cells(&mut self, cells: &[TreeCell<D>]) -> Result<usize, DomainError> {
        let mut refined = 0;
        for cell in cells {
            if cell.level >= MAX_LEVEL {
                return Err(DomainError::InvalidForest(format!(
                    "cannot refine {cell:?} past level {MAX_LEVEL}"
                )));
            }
            if self.leaves.remove(cell) {
                self.leaves.extend(cell.children());
                refined += 1;
            }
        }
        Ok(refined)
    }

    /// Leaf equal to or containing `cell`.
    pub fn covering_leaf(&self, cell: &TreeCell<D>) -> Option<TreeCell<D>> {
        (0..=cell.level)
            .rev()
            .map(|level| cell.ancestor(level))
            .find(|a| self.leaves.contains(a))
    }

    /// Refine until adjoining leaves (across faces, edges, corners and block
    /// boundaries) differ by at most one level. Returns the number of
    /// refinements performed.
    pub fn balance(&mut self) -> Result<usize, DomainError> {
        let mut total = 0;
        loop {
            let to_refine: BTreeSet<_> = self.balance_violations().into_iter().collect();
            if to_refine.is_empty() {
                break;
            }
            let cells: Vec<_> = to_refine.into_iter().collect();
            total += self.refine_cells(&cells)?;
        }
        if total > 0 {
            log::debug!("balance refined {total} leaves, {} leaves now", self.leaf_count());
        }
        Ok(total)
    }

    pub fn is_balanced(&self) -> bool {
        self.balance_violations().is_empty()
    }

    /// Leaves at least two levels coarser than an adjoining leaf.
    fn balance_violations(&self) -> Vec<TreeCell<D>> {
        let offsets = neighbor_offsets::<D>();
        let mut coarse = Vec::new();
        for leaf in self.leaves.iter().filter(|leaf| leaf.level >= 2) {
            for offset in &offsets {
                let Some(nbr) = self.connectivity.neighbor(leaf, *offset) else {
                    continue;
                };
                if let Some(cover) = self.covering_leaf(&nbr) {
                    if cover.level + 1 < leaf.level {
                        coarse.push(cover);
                    }
                }
            }
        }
        coarse
    }

    /// Split the leaves into `num_ranks` contiguous runs in (block, Morton)
    /// order and build each rank's view with its ghost layer.
    pub fn partition(&self, num_ranks: usize) -> Result<Vec<LocalForest<D>>, DomainError> {
        if num_ranks == 0 {
            return Err(DomainError::InvalidForest(
                "cannot partition over zero ranks".into(),
            ));
        }
        let leaves: Vec<_> = self.leaves.iter().copied().collect();
        let n = leaves.len();
        let first: Vec<usize> = (0..=num_ranks).map(|r| r * n / num_ranks).collect();
        let owner = |i: usize| first.partition_point(|&f| f <= i) - 1;
        let level_counts = self.level_counts();

        let views = (0..num_ranks)
            .map(|rank| {
                let local = leaves[first[rank]..first[rank + 1]].to_vec();
                let local_blocks: BTreeSet<usize> = local.iter().map(|c| c.block).collect();
                let mut relevant = local_blocks.clone();
                for &block in &local_blocks {
                    relevant.extend(self.connectivity.block_neighbors(block));
                }
                let ghosts = leaves
                    .iter()
                    .enumerate()
                    .filter(|(i, cell)| {
                        !(first[rank]..first[rank + 1]).contains(i) && relevant.contains(&cell.block)
                    })
                    .map(|(i, cell)| {
                        let owner_rank = owner(i);
                        GhostLeaf {
                            cell: *cell,
                            rank: owner_rank,
                            local_index: i - first[owner_rank],
                        }
                    })
                    .collect();
                LocalForest::new(
                    rank,
                    Arc::clone(&self.connectivity),
                    local,
                    ghosts,
                    first.clone(),
                    level_counts.clone(),
                )
            })
            .collect();
        Ok(views)
    }

    /// The whole forest as a single-rank view.
    pub fn serial_view(&self) -> LocalForest<D> {
        let leaves: Vec<_> = self.leaves.iter().copied().collect();
        let n = leaves.len();
        LocalForest::new(
            0,
            Arc::clone(&self.connectivity),
            leaves,
            Vec::new(),
            vec![0, n],
            self.level_counts(),
        )
    }
}
