//! Per-cell records handed to the solver.
//!
//! A [`Patch`] is one forest cell at one domain snapshot: identity,
//! ownership, geometry, parent/child links and a [`NbrInfo`] for each side,
//! corner and (in 3-D) edge. Links to other patches are plain ids, so a
//! domain is an arena with no ownership cycles.

pub mod nbr_info;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::debug_invariants::DebugInvariants;
use crate::domain_error::DomainError;
use crate::topology::{
    Corner, DirectionTag, Dim, Edge, Orthant, OrthantLike, Side, SideOrthant, SupportedDim,
    TreeCell,
};

pub use nbr_info::{CoarseNbrInfo, FineNbrInfo, NbrInfo, NbrType, NormalNbrInfo};

/// A direction that indexes one of a patch's neighbor slots.
pub trait NbrDirection<const D: usize>: DirectionTag + Display
where
    Dim<D>: SupportedDim,
{
    /// Orthant type stored for a coarse neighbor in this direction.
    type Orth: OrthantLike;

    /// Number of fine neighbors across this kind of direction.
    const NUM_FINE: usize;

    fn slots(patch: &Patch<D>) -> &[NbrInfo<Self::Orth>];
    fn slots_mut(patch: &mut Patch<D>) -> &mut [NbrInfo<Self::Orth>];
}

impl<const D: usize> NbrDirection<D> for Side<D>
where
    Dim<D>: SupportedDim,
{
    type Orth = SideOrthant<D>;
    const NUM_FINE: usize = 1 << (D - 1);

    fn slots(patch: &Patch<D>) -> &[NbrInfo<Self::Orth>] {
        &patch.side_nbrs
    }
    fn slots_mut(patch: &mut Patch<D>) -> &mut [NbrInfo<Self::Orth>] {
        &mut patch.side_nbrs
    }
}

impl<const D: usize> NbrDirection<D> for Corner<D>
where
    Dim<D>: SupportedDim,
{
    type Orth = Orthant<0>;
    const NUM_FINE: usize = 1;

    fn slots(patch: &Patch<D>) -> &[NbrInfo<Self::Orth>] {
        &patch.corner_nbrs
    }
    fn slots_mut(patch: &mut Patch<D>) -> &mut [NbrInfo<Self::Orth>] {
        &mut patch.corner_nbrs
    }
}

impl<const D: usize> NbrDirection<D> for Edge<D>
where
    Dim<D>: SupportedDim,
{
    type Orth = Orthant<1>;
    const NUM_FINE: usize = 2;

    fn slots(patch: &Patch<D>) -> &[NbrInfo<Self::Orth>] {
        &patch.edge_nbrs
    }
    fn slots_mut(patch: &mut Patch<D>) -> &mut [NbrInfo<Self::Orth>] {
        &mut patch.edge_nbrs
    }
}

/// One forest cell at one domain snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "PatchRepr<D>", try_from = "PatchRepr<D>")]
pub struct Patch<const D: usize>
where
    Dim<D>: SupportedDim,
{
    /// Globally unique id within the domain.
    pub id: usize,
    /// Position within this rank's patches of the domain.
    pub local_index: usize,
    /// Owning rank.
    pub rank: usize,
    pub refine_level: u8,
    pub parent_id: Option<usize>,
    pub parent_rank: Option<usize>,
    /// Indexed by orthant; all `None` for the finest domain.
    pub child_ids: Vec<Option<usize>>,
    pub child_ranks: Vec<Option<usize>>,
    /// Position within the parent, null when the parent is the same cell or absent.
    pub orth_on_parent: Orthant<D>,
    /// Cells per axis.
    pub ns: [usize; D],
    pub num_ghost_cells: usize,
    /// Physical lower corner.
    pub starts: [f64; D],
    /// Physical cell size per axis.
    pub spacings: [f64; D],
    cell: TreeCell<D>,
    side_nbrs: Vec<NbrInfo<SideOrthant<D>>>,
    corner_nbrs: Vec<NbrInfo<Orthant<0>>>,
    edge_nbrs: Vec<NbrInfo<Orthant<1>>>,
}

impl<const D: usize> Patch<D>
where
    Dim<D>: SupportedDim,
{
    /// A patch covering `cell` with unit-block geometry, no links and no
    /// neighbors.
    pub fn new(cell: TreeCell<D>, ns: [usize; D], num_ghost_cells: usize) -> Self {
        let (lower, upper) = cell.unit_bounds();
        let mut spacings = [0.0; D];
        for axis in 0..D {
            spacings[axis] = (upper[axis] - lower[axis]) / ns[axis] as f64;
        }
        Self {
            id: 0,
            local_index: 0,
            rank: 0,
            refine_level: cell.level,
            parent_id: None,
            parent_rank: None,
            child_ids: vec![None; Orthant::<D>::NUM_ORTHANTS],
            child_ranks: vec![None; Orthant::<D>::NUM_ORTHANTS],
            orth_on_parent: Orthant::NULL,
            ns,
            num_ghost_cells,
            starts: lower,
            spacings,
            cell,
            side_nbrs: vec![NbrInfo::Absent; Side::<D>::NUM_SIDES],
            corner_nbrs: vec![NbrInfo::Absent; Corner::<D>::NUM_CORNERS],
            edge_nbrs: vec![NbrInfo::Absent; Edge::<D>::NUM_EDGES],
        }
    }

    /// Forest cell this patch covers.
    pub fn cell(&self) -> &TreeCell<D> {
        &self.cell
    }

    /// Root block of the cell.
    pub fn block(&self) -> usize {
        self.cell.block
    }

    pub fn side_nbrs(&self) -> &[NbrInfo<SideOrthant<D>>] {
        &self.side_nbrs
    }

    pub fn corner_nbrs(&self) -> &[NbrInfo<Orthant<0>>] {
        &self.corner_nbrs
    }

    pub fn edge_nbrs(&self) -> &[NbrInfo<Orthant<1>>] {
        &self.edge_nbrs
    }

    /// Neighbor record in `dir`.
    pub fn nbr_info<Dir: NbrDirection<D>>(&self, dir: Dir) -> Result<&NbrInfo<Dir::Orth>, DomainError> {
        let index = dir.checked_index()?;
        Ok(&Dir::slots(self)[index])
    }

    pub fn set_nbr_info<Dir: NbrDirection<D>>(
        &mut self,
        dir: Dir,
        info: NbrInfo<Dir::Orth>,
    ) -> Result<(), DomainError> {
        let index = dir.checked_index()?;
        Dir::slots_mut(self)[index] = info;
        Ok(())
    }

    /// Whether any neighbor lies in `dir`. The null direction has none.
    pub fn has_nbr<Dir: NbrDirection<D>>(&self, dir: Dir) -> bool {
        self.nbr_info(dir).is_ok_and(|info| !info.is_absent())
    }

    /// Kind of the neighbor in `dir`, `None` when absent.
    pub fn nbr_type<Dir: NbrDirection<D>>(&self, dir: Dir) -> Result<Option<NbrType>, DomainError> {
        Ok(self.nbr_info(dir)?.nbr_type())
    }

    pub fn normal_nbr_info<Dir: NbrDirection<D>>(&self, dir: Dir) -> Result<&NormalNbrInfo, DomainError> {
        self.nbr_info(dir)?.normal()
    }

    pub fn coarse_nbr_info<Dir: NbrDirection<D>>(
        &self,
        dir: Dir,
    ) -> Result<&CoarseNbrInfo<Dir::Orth>, DomainError> {
        self.nbr_info(dir)?.coarse()
    }

    pub fn fine_nbr_info<Dir: NbrDirection<D>>(&self, dir: Dir) -> Result<&FineNbrInfo, DomainError> {
        self.nbr_info(dir)?.fine()
    }

    /// True when this patch was merged into a coarser parent.
    pub fn has_coarse_parent(&self) -> bool {
        !self.orth_on_parent.is_null()
    }

    /// Sorted, de-duplicated ids of all neighbors.
    pub fn nbr_ids(&self) -> Vec<usize> {
        self.all_nbrs(|info| info.0).sorted().dedup().collect()
    }

    /// Sorted, de-duplicated ranks of all neighbors.
    pub fn nbr_ranks(&self) -> Vec<usize> {
        self.all_nbrs(|info| info.1).sorted().dedup().collect()
    }

    fn all_nbrs<'a>(
        &'a self,
        pick: impl Fn((usize, usize)) -> usize + 'a,
    ) -> impl Iterator<Item = usize> + 'a {
        fn pairs<O>(info: &NbrInfo<O>) -> Vec<(usize, usize)> {
            info.ids().into_iter().zip(info.ranks()).collect()
        }
        self.side_nbrs
            .iter()
            .flat_map(pairs)
            .chain(self.corner_nbrs.iter().flat_map(pairs))
            .chain(self.edge_nbrs.iter().flat_map(pairs))
            .map(pick)
    }

    /// Interior cells of the patch.
    pub fn num_cells(&self) -> usize {
        self.ns.iter().product()
    }

    /// Cells including the ghost layer on every side.
    pub fn num_cells_with_ghost(&self) -> usize {
        self.ns.iter().map(|n| n + 2 * self.num_ghost_cells).product()
    }

    /// Physical volume covered by the patch.
    pub fn volume(&self) -> f64 {
        (0..D)
            .map(|axis| (self.spacings[axis] * self.ns[axis] as f64).abs())
            .product()
    }

    fn invalid(&self, reason: impl Into<String>) -> DomainError {
        DomainError::InvalidPatch {
            id: self.id,
            reason: reason.into(),
        }
    }

    fn check_fine_len<O>(&self, infos: &[NbrInfo<O>], expected: usize) -> Result<(), DomainError> {
        for info in infos {
            if let NbrInfo::Fine(fine) = info {
                if fine.ids.len() != expected || fine.ranks.len() != expected {
                    return Err(self.invalid(format!(
                        "fine neighbor lists {} ids and {} ranks, expected {expected}",
                        fine.ids.len(),
                        fine.ranks.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<const D: usize> DebugInvariants for Patch<D>
where
    Dim<D>: SupportedDim,
{
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Patch");
    }

    fn validate_invariants(&self) -> Result<(), DomainError> {
        let num_children = Orthant::<D>::NUM_ORTHANTS;
        if self.child_ids.len() != num_children || self.child_ranks.len() != num_children {
            return Err(self.invalid(format!("expected {num_children} child slots")));
        }
        if self
            .child_ids
            .iter()
            .zip(&self.child_ranks)
            .any(|(id, rank)| id.is_some() != rank.is_some())
        {
            return Err(self.invalid("child id without rank"));
        }
        if self.parent_id.is_some() != self.parent_rank.is_some() {
            return Err(self.invalid("parent id without rank"));
        }
        if self.has_coarse_parent() && self.parent_id.is_none() {
            return Err(self.invalid("orth_on_parent set without a parent"));
        }
        if self.refine_level != self.cell.level {
            return Err(self.invalid(format!(
                "refine level {} disagrees with cell level {}",
                self.refine_level, self.cell.level
            )));
        }
        if self.ns.contains(&0) {
            return Err(self.invalid("ns must be positive"));
        }
        // mirrored block maps give negative spacings
        if self.spacings.iter().any(|h| !h.is_finite() || *h == 0.0) {
            return Err(self.invalid(format!("degenerate spacing {:?}", self.spacings)));
        }
        if self.side_nbrs.len() != Side::<D>::NUM_SIDES
            || self.corner_nbrs.len() != Corner::<D>::NUM_CORNERS
            || self.edge_nbrs.len() != Edge::<D>::NUM_EDGES
        {
            return Err(self.invalid("wrong number of neighbor slots"));
        }
        self.check_fine_len(&self.side_nbrs, <Side<D> as NbrDirection<D>>::NUM_FINE)?;
        self.check_fine_len(&self.corner_nbrs, <Corner<D> as NbrDirection<D>>::NUM_FINE)?;
        self.check_fine_len(&self.edge_nbrs, <Edge<D> as NbrDirection<D>>::NUM_FINE)?;
        Ok(())
    }
}

/// Serialized form of a [`Patch`]; arrays become lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PatchRepr<const D: usize>
where
    Dim<D>: SupportedDim,
{
    id: usize,
    local_index: usize,
    rank: usize,
    block: usize,
    coords: Vec<u32>,
    refine_level: u8,
    parent_id: Option<usize>,
    parent_rank: Option<usize>,
    child_ids: Vec<Option<usize>>,
    child_ranks: Vec<Option<usize>>,
    orth_on_parent: Orthant<D>,
    ns: Vec<usize>,
    num_ghost_cells: usize,
    starts: Vec<f64>,
    spacings: Vec<f64>,
    side_nbrs: Vec<NbrInfo<SideOrthant<D>>>,
    corner_nbrs: Vec<NbrInfo<Orthant<0>>>,
    #[serde(default)]
    edge_nbrs: Vec<NbrInfo<Orthant<1>>>,
}

impl<const D: usize> From<Patch<D>> for PatchRepr<D>
where
    Dim<D>: SupportedDim,
{
    fn from(p: Patch<D>) -> Self {
        Self {
            id: p.id,
            local_index: p.local_index,
            rank: p.rank,
            block: p.cell.block,
            coords: p.cell.coords.to_vec(),
            refine_level: p.refine_level,
            parent_id: p.parent_id,
            parent_rank: p.parent_rank,
            child_ids: p.child_ids,
            child_ranks: p.child_ranks,
            orth_on_parent: p.orth_on_parent,
            ns: p.ns.to_vec(),
            num_ghost_cells: p.num_ghost_cells,
            starts: p.starts.to_vec(),
            spacings: p.spacings.to_vec(),
            side_nbrs: p.side_nbrs,
            corner_nbrs: p.corner_nbrs,
            edge_nbrs: p.edge_nbrs,
        }
    }
}

impl<const D: usize> TryFrom<PatchRepr<D>> for Patch<D>
where
    Dim<D>: SupportedDim,
{
    type Error = DomainError;

    fn try_from(r: PatchRepr<D>) -> Result<Self, Self::Error> {
        fn array<T: Copy, const D: usize>(id: usize, field: &str, v: &[T]) -> Result<[T; D], DomainError> {
            <[T; D]>::try_from(v).map_err(|_| DomainError::InvalidPatch {
                id,
                reason: format!("`{field}` has {} entries, expected {}", v.len(), D),
            })
        }
        let patch = Patch {
            id: r.id,
            local_index: r.local_index,
            rank: r.rank,
            refine_level: r.refine_level,
            parent_id: r.parent_id,
            parent_rank: r.parent_rank,
            child_ids: r.child_ids,
            child_ranks: r.child_ranks,
            orth_on_parent: r.orth_on_parent,
            ns: array(r.id, "ns", &r.ns)?,
            num_ghost_cells: r.num_ghost_cells,
            starts: array(r.id, "starts", &r.starts)?,
            spacings: array(r.id, "spacings", &r.spacings)?,
            cell: TreeCell {
                block: r.block,
                level: r.refine_level,
                coords: array(r.id, "coords", &r.coords)?,
            },
            side_nbrs: r.side_nbrs,
            corner_nbrs: r.corner_nbrs,
            edge_nbrs: r.edge_nbrs,
        };
        patch.validate_invariants()?;
        Ok(patch)
    }
}
