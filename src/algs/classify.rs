//! Neighbor classification of a patch within one domain level.

use std::fmt::Display;

use crate::algs::leaf_index::LeafIndex;
use crate::domain_error::DomainError;
use crate::patch::{CoarseNbrInfo, FineNbrInfo, NbrInfo, NormalNbrInfo, Patch};
use crate::topology::connectivity::{corner_offset, edge_offset, side_offset};
use crate::topology::{
    Connectivity, Corner, DirectionTag, Dim, Edge, Orthant, OrthantLike, Side, SideOrthant,
    SupportedDim, TreeCell,
};

/// Resolves what lies across each side, corner and edge of a cell in the
/// domain at `level`.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a, const D: usize> {
    index: &'a LeafIndex<D>,
    connectivity: &'a Connectivity<D>,
    level: u8,
}

impl<'a, const D: usize> Classifier<'a, D>
where
    Dim<D>: SupportedDim,
{
    pub fn new(index: &'a LeafIndex<D>, connectivity: &'a Connectivity<D>, level: u8) -> Self {
        Self {
            index,
            connectivity,
            level,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// `orth_on_coarse` is the orthant of the coarse neighbor's face, in the
    /// coarse neighbor's block, so that its fine list holds this cell at
    /// that position.
    pub fn side(&self, cell: &TreeCell<D>, side: Side<D>) -> Result<NbrInfo<SideOrthant<D>>, DomainError> {
        side.checked_index()?;
        self.classify(
            cell,
            side,
            side_offset(side),
            |_, nbr| {
                let axis = self
                    .facing_axis(nbr, cell, Side::<D>::values().map(|s| (s.axis(), side_offset(s))))
                    .unwrap_or(side.axis());
                Some(nbr.orthant().collapse_on_axis(axis))
            },
            &Orthant::values_on_side(side),
        )
    }

    /// A coarse corner neighbor only counts when this cell sits in the
    /// matching corner of its parent; otherwise the corner hangs on the
    /// coarse cell's side and is reported absent.
    pub fn corner(&self, cell: &TreeCell<D>, corner: Corner<D>) -> Result<NbrInfo<Orthant<0>>, DomainError> {
        corner.checked_index()?;
        let touching = Orthant::from_corner(corner);
        self.classify(
            cell,
            corner,
            corner_offset(corner),
            |orth, _| (orth == touching).then(|| Orthant::<0>::from_index(0)),
            &[touching],
        )
    }

    /// A coarse edge neighbor records which half of its edge this cell
    /// touches; cells not lying along the parent's edge see it as absent.
    /// The half is counted along the edge in the coarse cell's block.
    pub fn edge(&self, cell: &TreeCell<D>, edge: Edge<D>) -> Result<NbrInfo<Orthant<1>>, DomainError> {
        edge.checked_index()?;
        let [n0, n1] = edge.normal_axes();
        let [s0, s1] = edge.sides();
        self.classify(
            cell,
            edge,
            edge_offset(edge),
            |orth, nbr| {
                let along = orth.is_higher_on_axis(n0) == s0.is_higher_on_axis()
                    && orth.is_higher_on_axis(n1) == s1.is_higher_on_axis();
                let axis = self
                    .facing_axis(nbr, cell, Edge::<D>::values().map(|e| (e.axis(), edge_offset(e))))
                    .unwrap_or(edge.axis());
                along.then(|| Orthant::<1>::from_index(nbr.orthant().is_higher_on_axis(axis) as usize))
            },
            &Orthant::values_on_edge(edge),
        )
    }

    /// Fill every neighbor slot of `patch`.
    pub fn fill(&self, patch: &mut Patch<D>) -> Result<(), DomainError> {
        let cell = *patch.cell();
        for side in Side::<D>::values() {
            patch.set_nbr_info(side, self.side(&cell, side)?)?;
        }
        for corner in Corner::<D>::values() {
            patch.set_nbr_info(corner, self.corner(&cell, corner)?)?;
        }
        for edge in Edge::<D>::values() {
            patch.set_nbr_info(edge, self.edge(&cell, edge)?)?;
        }
        Ok(())
    }

    fn classify<O: OrthantLike>(
        &self,
        cell: &TreeCell<D>,
        direction: impl Display,
        offset: [i8; D],
        coarse_orth: impl Fn(Orthant<D>, &TreeCell<D>) -> Option<O>,
        fine_children: &[Orthant<D>],
    ) -> Result<NbrInfo<O>, DomainError> {
        let Some(nbr) = self.connectivity.neighbor(cell, offset) else {
            return Ok(NbrInfo::Absent);
        };
        if let Some(found) = self.index.lookup(&nbr, self.level) {
            return Ok(NbrInfo::Normal(NormalNbrInfo {
                id: found.id,
                rank: found.rank,
            }));
        }
        if let Some(parent) = nbr.parent() {
            if let Some(found) = self.index.lookup(&parent, self.level) {
                return Ok(match coarse_orth(cell.orthant(), &nbr) {
                    Some(orth_on_coarse) => NbrInfo::Coarse(CoarseNbrInfo {
                        id: found.id,
                        rank: found.rank,
                        orth_on_coarse,
                    }),
                    None => NbrInfo::Absent,
                });
            }
        }
        if cell.level < self.level {
            let found: Option<Vec<_>> = fine_children
                .iter()
                .map(|&orth| {
                    self.connectivity
                        .neighbor(&cell.child(orth), offset)
                        .and_then(|child_nbr| self.index.lookup(&child_nbr, self.level))
                })
                .collect();
            if let Some(found) = found {
                return Ok(NbrInfo::Fine(FineNbrInfo {
                    ids: found.iter().map(|r| r.id).collect(),
                    ranks: found.iter().map(|r| r.rank).collect(),
                }));
            }
        }
        if !self.index.knows_block(nbr.block) {
            return Err(DomainError::IncompleteGhostLayer {
                block: nbr.block,
                level: cell.level,
            });
        }
        Err(DomainError::UnbalancedForest {
            block: cell.block,
            level: cell.level,
            direction: direction.to_string(),
        })
    }

    /// Axis, in `from`'s block, of the first offset leading from `from` back
    /// to `to`. Differs from the forward axis only across rotated block links.
    fn facing_axis(
        &self,
        from: &TreeCell<D>,
        to: &TreeCell<D>,
        mut offsets: impl Iterator<Item = (usize, [i8; D])>,
    ) -> Option<usize> {
        offsets
            .find(|(_, offset)| self.connectivity.neighbor(from, *offset).as_ref() == Some(to))
            .map(|(axis, _)| axis)
    }
}
