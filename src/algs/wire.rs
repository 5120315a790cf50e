//! Fixed, versioned, little-endian wire records for shipping patches between
//! ranks.
//!
//! A buffer is one [`WireHdr`], one [`WireCount`] and then, per patch, a
//! [`WirePatch`] followed by one [`WireNbr`] for every side, corner and edge
//! slot in index order. Records are sized for three dimensions; unused axes
//! are zero.

use bytemuck::{Pod, Zeroable};
use bytes::{BufMut, Bytes, BytesMut};
use static_assertions::{assert_eq_size, const_assert_eq};
use std::mem::size_of;

use crate::debug_invariants::DebugInvariants;
use crate::domain_error::DomainError;
use crate::patch::{CoarseNbrInfo, FineNbrInfo, NbrInfo, NormalNbrInfo, Patch};
use crate::topology::{
    Corner, DirectionTag, Dim, Edge, Orthant, OrthantLike, Side, SupportedDim, TreeCell,
};

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

/// Header kind of a patch buffer.
pub const KIND_PATCHES: u16 = 1;

/// Stands in for an absent id or rank.
const NONE: u64 = u64::MAX;

const MAX_DIM: usize = 3;
const MAX_CHILDREN: usize = 1 << MAX_DIM;
const MAX_FINE: usize = 1 << (MAX_DIM - 1);

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireHdr {
    pub version_le: u16,
    pub kind_le: u16,
    /// Spatial dimension of the records that follow.
    pub dim_le: u32,
}

impl WireHdr {
    pub fn new(kind: u16, dim: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            kind_le: kind.to_le(),
            dim_le: (dim as u32).to_le(),
        }
    }
    pub fn kind(&self) -> u16 {
        u16::from_le(self.kind_le)
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn dim(&self) -> usize {
        u32::from_le(self.dim_le) as usize
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u32,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u32).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u32::from_le(self.n_le) as usize
    }
}

/// Identity, links and geometry of one patch.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WirePatch {
    pub id_le: u64,
    pub local_index_le: u64,
    pub rank_le: u64,
    pub parent_id_le: u64,
    pub parent_rank_le: u64,
    pub child_ids_le: [u64; MAX_CHILDREN],
    pub child_ranks_le: [u64; MAX_CHILDREN],
    pub ns_le: [u64; MAX_DIM],
    pub num_ghost_cells_le: u64,
    /// `f64::to_bits` of each start.
    pub starts_le: [u64; MAX_DIM],
    pub spacings_le: [u64; MAX_DIM],
    pub block_le: u64,
    pub coords_le: [u32; MAX_DIM],
    pub level: u8,
    pub orth_on_parent: u8,
    pub _pad: [u8; 2],
}

/// One neighbor slot.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireNbr {
    /// 0 absent, 1 normal, 2 coarse, 3 fine.
    pub kind: u8,
    pub count: u8,
    pub orth_on_coarse: u8,
    pub _pad: [u8; 5],
    pub ids_le: [u64; MAX_FINE],
    pub ranks_le: [u64; MAX_FINE],
}

assert_eq_size!(WireHdr, u64);
assert_eq_size!(WireCount, u32);
const_assert_eq!(size_of::<WirePatch>(), 32 * 8 + 16);
const_assert_eq!(size_of::<WireNbr>(), 8 + 2 * MAX_FINE * 8);

fn wire_err(msg: impl Into<String>) -> DomainError {
    DomainError::Wire(msg.into())
}

fn opt_to_wire(v: Option<usize>) -> u64 {
    v.map_or(NONE, |x| x as u64).to_le()
}

fn opt_from_wire(w: u64) -> Option<usize> {
    let v = u64::from_le(w);
    (v != NONE).then_some(v as usize)
}

fn usize_from_wire(w: u64) -> usize {
    u64::from_le(w) as usize
}

fn f64_to_wire(x: f64) -> u64 {
    x.to_bits().to_le()
}

fn f64_from_wire(w: u64) -> f64 {
    f64::from_bits(u64::from_le(w))
}

impl WirePatch {
    pub fn encode<const D: usize>(patch: &Patch<D>) -> Self
    where
        Dim<D>: SupportedDim,
    {
        let mut w = Self::zeroed();
        w.id_le = (patch.id as u64).to_le();
        w.local_index_le = (patch.local_index as u64).to_le();
        w.rank_le = (patch.rank as u64).to_le();
        w.parent_id_le = opt_to_wire(patch.parent_id);
        w.parent_rank_le = opt_to_wire(patch.parent_rank);
        for (i, (id, rank)) in patch.child_ids.iter().zip(&patch.child_ranks).enumerate() {
            w.child_ids_le[i] = opt_to_wire(*id);
            w.child_ranks_le[i] = opt_to_wire(*rank);
        }
        for axis in 0..D {
            w.ns_le[axis] = (patch.ns[axis] as u64).to_le();
            w.starts_le[axis] = f64_to_wire(patch.starts[axis]);
            w.spacings_le[axis] = f64_to_wire(patch.spacings[axis]);
            w.coords_le[axis] = patch.cell().coords[axis].to_le();
        }
        w.num_ghost_cells_le = (patch.num_ghost_cells as u64).to_le();
        w.block_le = (patch.block() as u64).to_le();
        w.level = patch.refine_level;
        w.orth_on_parent = patch.orth_on_parent.raw() as u8;
        w
    }

    /// Patch with identity, links and geometry restored and no neighbors.
    pub fn decode<const D: usize>(&self) -> Result<Patch<D>, DomainError>
    where
        Dim<D>: SupportedDim,
    {
        let mut coords = [0u32; D];
        let mut ns = [0usize; D];
        for axis in 0..D {
            coords[axis] = u32::from_le(self.coords_le[axis]);
            ns[axis] = usize_from_wire(self.ns_le[axis]);
        }
        let cell = TreeCell {
            block: usize_from_wire(self.block_le),
            level: self.level,
            coords,
        };
        let mut patch = Patch::new(cell, ns, usize_from_wire(self.num_ghost_cells_le));
        patch.id = usize_from_wire(self.id_le);
        patch.local_index = usize_from_wire(self.local_index_le);
        patch.rank = usize_from_wire(self.rank_le);
        patch.parent_id = opt_from_wire(self.parent_id_le);
        patch.parent_rank = opt_from_wire(self.parent_rank_le);
        for i in 0..Orthant::<D>::NUM_ORTHANTS {
            patch.child_ids[i] = opt_from_wire(self.child_ids_le[i]);
            patch.child_ranks[i] = opt_from_wire(self.child_ranks_le[i]);
        }
        for axis in 0..D {
            patch.starts[axis] = f64_from_wire(self.starts_le[axis]);
            patch.spacings[axis] = f64_from_wire(self.spacings_le[axis]);
        }
        let orth = self.orth_on_parent as usize;
        if orth > Orthant::<D>::NUM_ORTHANTS {
            return Err(wire_err(format!("orthant index {orth} out of range")));
        }
        patch.orth_on_parent = Orthant::from_raw(orth);
        Ok(patch)
    }
}

impl WireNbr {
    pub fn encode<O: OrthantLike>(info: &NbrInfo<O>) -> Self {
        let mut w = Self::zeroed();
        let (kind, ids, ranks, orth) = match info {
            NbrInfo::Absent => (0, &[][..], &[][..], O::null()),
            NbrInfo::Normal(n) => (1, std::slice::from_ref(&n.id), std::slice::from_ref(&n.rank), O::null()),
            NbrInfo::Coarse(c) => (
                2,
                std::slice::from_ref(&c.id),
                std::slice::from_ref(&c.rank),
                c.orth_on_coarse,
            ),
            NbrInfo::Fine(f) => (3, &f.ids[..], &f.ranks[..], O::null()),
        };
        w.kind = kind;
        w.count = ids.len().min(MAX_FINE) as u8;
        w.orth_on_coarse = orth.to_index() as u8;
        for (i, (id, rank)) in ids.iter().zip(ranks).take(MAX_FINE).enumerate() {
            w.ids_le[i] = (*id as u64).to_le();
            w.ranks_le[i] = (*rank as u64).to_le();
        }
        w
    }

    pub fn decode<O: OrthantLike>(&self) -> Result<NbrInfo<O>, DomainError> {
        let count = self.count as usize;
        let expected = match self.kind {
            0 => 0,
            1 | 2 => 1,
            3 => count,
            kind => return Err(wire_err(format!("unknown neighbor kind {kind}"))),
        };
        if count != expected || count > MAX_FINE {
            return Err(wire_err(format!(
                "neighbor kind {} carries {count} ids",
                self.kind
            )));
        }
        let id = usize_from_wire(self.ids_le[0]);
        let rank = usize_from_wire(self.ranks_le[0]);
        Ok(match self.kind {
            0 => NbrInfo::Absent,
            1 => NbrInfo::Normal(NormalNbrInfo { id, rank }),
            2 => {
                let orth = self.orth_on_coarse as usize;
                if orth >= O::NUM_VALUES {
                    return Err(wire_err(format!("coarse orthant index {orth} out of range")));
                }
                NbrInfo::Coarse(CoarseNbrInfo {
                    id,
                    rank,
                    orth_on_coarse: O::from_index(orth),
                })
            }
            _ => NbrInfo::Fine(FineNbrInfo {
                ids: self.ids_le[..count].iter().map(|w| usize_from_wire(*w)).collect(),
                ranks: self.ranks_le[..count].iter().map(|w| usize_from_wire(*w)).collect(),
            }),
        })
    }
}

fn put<T: Pod>(buf: &mut BytesMut, record: &T) {
    buf.put_slice(bytemuck::bytes_of(record));
}

fn take<T: Pod>(buf: &mut Bytes) -> Result<T, DomainError> {
    let n = size_of::<T>();
    if buf.len() < n {
        return Err(wire_err(format!("expected {n} more bytes, got {}", buf.len())));
    }
    Ok(bytemuck::pod_read_unaligned(&buf.split_to(n)))
}

fn slots_per_patch<const D: usize>() -> usize {
    Side::<D>::NUM_SIDES + Corner::<D>::NUM_CORNERS + Edge::<D>::NUM_EDGES
}

/// Serialize `patches`, neighbors included.
pub fn encode_patches<const D: usize>(patches: &[Patch<D>]) -> Bytes
where
    Dim<D>: SupportedDim,
{
    let per_patch = size_of::<WirePatch>() + slots_per_patch::<D>() * size_of::<WireNbr>();
    let mut buf = BytesMut::with_capacity(
        size_of::<WireHdr>() + size_of::<WireCount>() + patches.len() * per_patch,
    );
    put(&mut buf, &WireHdr::new(KIND_PATCHES, D));
    put(&mut buf, &WireCount::new(patches.len()));
    for patch in patches {
        put(&mut buf, &WirePatch::encode(patch));
        for info in patch.side_nbrs() {
            put(&mut buf, &WireNbr::encode(info));
        }
        for info in patch.corner_nbrs() {
            put(&mut buf, &WireNbr::encode(info));
        }
        for info in patch.edge_nbrs() {
            put(&mut buf, &WireNbr::encode(info));
        }
    }
    buf.freeze()
}

/// Inverse of [`encode_patches`]. Every decoded patch is validated.
pub fn decode_patches<const D: usize>(mut buf: Bytes) -> Result<Vec<Patch<D>>, DomainError>
where
    Dim<D>: SupportedDim,
{
    let hdr: WireHdr = take(&mut buf)?;
    if hdr.version() != WIRE_VERSION {
        return Err(wire_err(format!("unsupported version {}", hdr.version())));
    }
    if hdr.kind() != KIND_PATCHES {
        return Err(wire_err(format!("unexpected record kind {}", hdr.kind())));
    }
    if hdr.dim() != D {
        return Err(wire_err(format!("buffer holds {}-D patches, expected {D}-D", hdr.dim())));
    }
    let n = take::<WireCount>(&mut buf)?.get();
    let mut patches = Vec::with_capacity(n.min(buf.len() / size_of::<WirePatch>()));
    for _ in 0..n {
        let mut patch: Patch<D> = take::<WirePatch>(&mut buf)?.decode()?;
        for side in Side::<D>::values() {
            let info = take::<WireNbr>(&mut buf)?.decode()?;
            patch.set_nbr_info(side, info)?;
        }
        for corner in Corner::<D>::values() {
            let info = take::<WireNbr>(&mut buf)?.decode()?;
            patch.set_nbr_info(corner, info)?;
        }
        for edge in Edge::<D>::values() {
            let info = take::<WireNbr>(&mut buf)?.decode()?;
            patch.set_nbr_info(edge, info)?;
        }
        patch
            .validate_invariants()
            .map_err(|e| wire_err(e.to_string()))?;
        patches.push(patch);
    }
    if !buf.is_empty() {
        return Err(wire_err(format!("{} trailing bytes", buf.len())));
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Patch<2> {
        let cell = TreeCell {
            block: 2,
            level: 1,
            coords: [1, 1],
        };
        let mut p = Patch::new(cell, [8, 4], 2);
        p.id = 9;
        p.rank = 1;
        p.local_index = 3;
        p.parent_id = Some(7);
        p.parent_rank = Some(0);
        p.orth_on_parent = Orthant::<2>::NE;
        p.child_ids[0] = Some(9);
        p.child_ranks[0] = Some(1);
        p.set_nbr_info(
            Side::<2>::WEST,
            NbrInfo::Fine(FineNbrInfo {
                ids: vec![4, 5],
                ranks: vec![0, 1],
            }),
        )
        .unwrap();
        p.set_nbr_info(
            Side::<2>::SOUTH,
            NbrInfo::Coarse(CoarseNbrInfo {
                id: 2,
                rank: 0,
                orth_on_coarse: Orthant::<1>::UPPER,
            }),
        )
        .unwrap();
        p.set_nbr_info(Corner::<2>::SW, NbrInfo::Normal(NormalNbrInfo { id: 6, rank: 1 }))
            .unwrap();
        p
    }

    #[test]
    fn patches_survive_the_wire() {
        let patches = vec![sample(), Patch::new(TreeCell::root(0), [8, 4], 2)];
        let bytes = encode_patches(&patches);
        let back = decode_patches::<2>(bytes).unwrap();
        assert_eq!(back, patches);
    }

    #[test]
    fn header_is_checked() {
        let bytes = encode_patches(&[sample()]);
        let mut raw = bytes.to_vec();
        raw[0] = 9;
        assert!(matches!(
            decode_patches::<2>(Bytes::from(raw)),
            Err(DomainError::Wire(_))
        ));
        assert!(matches!(decode_patches::<3>(bytes), Err(DomainError::Wire(_))));
    }

    #[test]
    fn truncated_buffer_is_rejected() {
        let bytes = encode_patches(&[sample()]);
        let short = bytes.slice(..bytes.len() - 1);
        assert!(matches!(decode_patches::<2>(short), Err(DomainError::Wire(_))));
    }

    #[test]
    fn bad_neighbor_kind_is_rejected() {
        let mut nbr = WireNbr::encode(&NbrInfo::<Orthant<1>>::Absent);
        nbr.kind = 7;
        assert!(matches!(nbr.decode::<Orthant<1>>(), Err(DomainError::Wire(_))));
        let mut coarse = WireNbr::encode(&NbrInfo::Coarse(CoarseNbrInfo {
            id: 1,
            rank: 0,
            orth_on_coarse: Orthant::<1>::LOWER,
        }));
        coarse.orth_on_coarse = 2;
        assert!(coarse.decode::<Orthant<1>>().is_err());
    }

    #[test]
    fn version_guard() {
        assert_eq!(WireHdr::new(KIND_PATCHES, 3).version(), WIRE_VERSION);
        assert_eq!(WireHdr::new(KIND_PATCHES, 3).dim(), 3);
    }
}
