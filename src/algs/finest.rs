//! Finest domain: one patch per local leaf.

use crate::algs::level::{LevelBuilder, global_patch_count};
use crate::domain::{BlockMap, Domain};
use crate::domain_error::DomainError;
use crate::forest::ForestView;
use crate::topology::{Dim, SupportedDim};

/// Build the finest domain of `view` at `builder.level`, which must be the
/// deepest leaf level of the whole forest.
pub fn build_finest<const D: usize, F, M>(
    view: &F,
    builder: &LevelBuilder<'_, D, M>,
) -> Result<Domain<D>, DomainError>
where
    Dim<D>: SupportedDim,
    F: ForestView<D> + ?Sized,
    M: BlockMap<D>,
{
    let patches = builder.build(view.local_leaves())?;
    let num_global = global_patch_count::<D>(view.global_level_counts(), builder.level)?;
    log::debug!(
        "rank {}: finest level {} built from {} local leaves",
        view.rank(),
        builder.level,
        patches.len()
    );
    Domain::new(0, builder.level, builder.config, patches, num_global)
}
