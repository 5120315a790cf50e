//! One coarsening step between consecutive domains.

use crate::algs::level::{LevelBuilder, global_patch_count};
use crate::domain::{BlockMap, Domain};
use crate::domain_error::DomainError;
use crate::topology::{Dim, SupportedDim, TreeCell};

/// Cells of the domain one level below `fine` that this rank owns.
///
/// Each complete sibling group of `fine` merges into its parent, owned by
/// the owner of child 0. Patches coarser than `fine`'s level are carried
/// unchanged.
pub fn coarse_cells<const D: usize>(fine: &Domain<D>) -> Vec<TreeCell<D>>
where
    Dim<D>: SupportedDim,
{
    let level = fine.level();
    fine.patches()
        .iter()
        .map(|p| *p.cell())
        .filter_map(|cell| {
            if cell.level < level {
                Some(cell)
            } else if cell.orthant().index() == 0 {
                cell.parent()
            } else {
                None
            }
        })
        .collect()
}

/// The domain one level coarser than `fine`.
pub fn coarsen<const D: usize, M>(
    fine: &Domain<D>,
    builder: &LevelBuilder<'_, D, M>,
    level_counts: &[usize],
) -> Result<Domain<D>, DomainError>
where
    Dim<D>: SupportedDim,
    M: BlockMap<D>,
{
    if fine.level() == 0 || builder.level + 1 != fine.level() {
        return Err(DomainError::InvalidForest(format!(
            "cannot coarsen level {} into level {}",
            fine.level(),
            builder.level
        )));
    }
    let mut cells = coarse_cells(fine);
    cells.sort_unstable();
    let patches = builder.build(&cells)?;
    let carried = fine
        .patches()
        .iter()
        .filter(|p| p.cell().level < fine.level())
        .count();
    log::debug!(
        "level {} -> {}: {} merged, {carried} carried",
        fine.level(),
        builder.level,
        patches.len() - carried
    );
    let num_global = global_patch_count::<D>(level_counts, builder.level)?;
    Domain::new(fine.id() + 1, builder.level, builder.config, patches, num_global)
}
