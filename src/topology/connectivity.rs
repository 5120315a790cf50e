//! Block connectivity: how the root blocks of a forest are glued together.
//!
//! Blocks are unit hypercubes. Two blocks sharing a face are joined by a
//! [`FaceLink`] in each direction, carrying the relative orientation of the
//! two block frames. Same-level neighbors across block boundaries are found
//! by hopping through face links; corner and edge neighbors that no face path
//! reaches can be supplied explicitly with [`CornerLink`]s and [`EdgeLink`]s.

use hashbrown::HashMap;
use itertools::Itertools;

use super::cell::TreeCell;
use super::corner::Corner;
use super::edge::Edge;
use super::side::Side;
use crate::domain_error::DomainError;

/// Gluing of one block face onto a face of another block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLink<const D: usize> {
    /// Neighboring block.
    pub block: usize,
    /// Face of the neighboring block that is touched.
    pub side: Side<D>,
    /// `axis_map[a]` is the neighbor axis that this block's axis `a` maps to.
    pub axis_map: [usize; D],
    /// Whether the tangential axis `a` runs backwards in the neighbor frame.
    pub flip: [bool; D],
}

impl<const D: usize> FaceLink<D> {
    fn inverse(&self, block: usize, side: Side<D>) -> Self {
        let mut axis_map = [0; D];
        let mut flip = [false; D];
        for axis in 0..D {
            axis_map[self.axis_map[axis]] = axis;
            flip[self.axis_map[axis]] = self.flip[axis];
        }
        flip[self.side.axis()] = false;
        Self {
            block,
            side,
            axis_map,
            flip,
        }
    }
}

/// A block touching another only at a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerLink<const D: usize> {
    pub block: usize,
    pub corner: Corner<D>,
}

/// A block touching another only along an edge (3-D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeLink<const D: usize> {
    pub block: usize,
    pub edge: Edge<D>,
    /// Whether the edge runs backwards in the neighbor frame.
    pub flip: bool,
}

/// Connectivity table of a forest's root blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity<const D: usize> {
    faces: Vec<Vec<Option<FaceLink<D>>>>,
    corners: HashMap<(usize, Corner<D>), Vec<CornerLink<D>>>,
    edges: HashMap<(usize, Edge<D>), Vec<EdgeLink<D>>>,
}

impl<const D: usize> Connectivity<D> {
    /// `num_blocks` unconnected blocks.
    pub fn new(num_blocks: usize) -> Self {
        Self {
            faces: vec![vec![None; Side::<D>::NUM_SIDES]; num_blocks],
            corners: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// A single block with no neighbors.
    pub fn unit() -> Self {
        Self::new(1)
    }

    /// A `dims[0] x dims[1] x ...` brick of identically oriented blocks,
    /// numbered `x + nx * (y + ny * z)`, optionally periodic per axis.
    pub fn brick(dims: [usize; D], periodic: [bool; D]) -> Result<Self, DomainError> {
        if dims.iter().any(|&n| n == 0) {
            return Err(DomainError::InvalidConnectivity(format!(
                "brick dimensions must be positive, got {dims:?}"
            )));
        }
        let num_blocks = dims.iter().product();
        let mut conn = Self::new(num_blocks);
        let identity: [usize; D] = std::array::from_fn(|a| a);
        for block in 0..num_blocks {
            let pos = brick_position(block, &dims);
            for axis in 0..D {
                let mut nbr_pos = pos;
                if pos[axis] + 1 < dims[axis] {
                    nbr_pos[axis] += 1;
                } else if periodic[axis] {
                    nbr_pos[axis] = 0;
                } else {
                    continue;
                }
                let nbr = brick_block(&nbr_pos, &dims);
                conn.connect_faces(
                    block,
                    Side::from_axis(axis, true),
                    nbr,
                    Side::from_axis(axis, false),
                    identity,
                    [false; D],
                )?;
            }
        }
        Ok(conn)
    }

    pub fn num_blocks(&self) -> usize {
        self.faces.len()
    }

    pub fn face_link(&self, block: usize, side: Side<D>) -> Option<&FaceLink<D>> {
        self.faces.get(block)?.get(side.index())?.as_ref()
    }

    /// Glue `side` of `block` to `nbr_side` of `nbr_block`. The reverse link is
    /// added as well.
    pub fn connect_faces(
        &mut self,
        block: usize,
        side: Side<D>,
        nbr_block: usize,
        nbr_side: Side<D>,
        axis_map: [usize; D],
        flip: [bool; D],
    ) -> Result<(), DomainError> {
        self.check_block(block)?;
        self.check_block(nbr_block)?;
        if side.is_null() || nbr_side.is_null() {
            return Err(DomainError::InvalidConnectivity(
                "face link with a null side".into(),
            ));
        }
        if block == nbr_block && side == nbr_side {
            return Err(DomainError::InvalidConnectivity(format!(
                "block {block} side {side} glued to itself"
            )));
        }
        let mut seen = [false; D];
        for &target in &axis_map {
            if target >= D || std::mem::replace(&mut seen[target], true) {
                return Err(DomainError::InvalidConnectivity(format!(
                    "axis map {axis_map:?} is not a permutation"
                )));
            }
        }
        if axis_map[side.axis()] != nbr_side.axis() {
            return Err(DomainError::InvalidConnectivity(format!(
                "axis map {axis_map:?} does not take {side} onto {nbr_side}"
            )));
        }
        let mut flip = flip;
        flip[side.axis()] = false;
        let link = FaceLink {
            block: nbr_block,
            side: nbr_side,
            axis_map,
            flip,
        };
        let back = link.inverse(block, side);
        self.set_face(block, side, link)?;
        self.set_face(nbr_block, nbr_side, back)
    }

    /// Record that `corner` of `block` touches `nbr_corner` of `nbr_block`.
    pub fn connect_corners(
        &mut self,
        block: usize,
        corner: Corner<D>,
        nbr_block: usize,
        nbr_corner: Corner<D>,
    ) -> Result<(), DomainError> {
        self.check_block(block)?;
        self.check_block(nbr_block)?;
        if corner.is_null() || nbr_corner.is_null() {
            return Err(DomainError::InvalidConnectivity(
                "corner link with a null corner".into(),
            ));
        }
        push_unique(
            self.corners.entry((block, corner)).or_default(),
            CornerLink {
                block: nbr_block,
                corner: nbr_corner,
            },
        );
        push_unique(
            self.corners.entry((nbr_block, nbr_corner)).or_default(),
            CornerLink { block, corner },
        );
        Ok(())
    }

    /// Record that `edge` of `block` touches `nbr_edge` of `nbr_block`.
    pub fn connect_edges(
        &mut self,
        block: usize,
        edge: Edge<D>,
        nbr_block: usize,
        nbr_edge: Edge<D>,
        flip: bool,
    ) -> Result<(), DomainError> {
        self.check_block(block)?;
        self.check_block(nbr_block)?;
        if edge.is_null() || nbr_edge.is_null() {
            return Err(DomainError::InvalidConnectivity(
                "edge link with a null edge".into(),
            ));
        }
        push_unique(
            self.edges.entry((block, edge)).or_default(),
            EdgeLink {
                block: nbr_block,
                edge: nbr_edge,
                flip,
            },
        );
        push_unique(
            self.edges.entry((nbr_block, nbr_edge)).or_default(),
            EdgeLink { block, edge, flip },
        );
        Ok(())
    }

    /// Same-level cell at `offset` (each entry in `-1..=1`) from `cell`,
    /// following block links when the offset leaves the block.
    ///
    /// Returns `None` at a domain boundary, and at block corners/edges where
    /// different hop orders disagree.
    pub fn neighbor(&self, cell: &TreeCell<D>, offset: [i8; D]) -> Option<TreeCell<D>> {
        if cell.block >= self.num_blocks() {
            return None;
        }
        let n = cell.cells_per_axis() as i64;
        let mut coords = [0i64; D];
        let mut out_axes = Vec::with_capacity(D);
        for axis in 0..D {
            coords[axis] = cell.coords[axis] as i64 + offset[axis] as i64;
            if coords[axis] < 0 || coords[axis] >= n {
                out_axes.push(axis);
            }
        }
        if out_axes.is_empty() {
            return to_cell(cell.block, cell.level, coords);
        }

        let mut found = None;
        for order in out_axes.iter().copied().permutations(out_axes.len()) {
            if let Some(candidate) = self.hop(cell.block, cell.level, coords, &order) {
                match found {
                    None => found = Some(candidate),
                    Some(prev) if prev != candidate => return None,
                    Some(_) => {}
                }
            }
        }
        found.or_else(|| self.diagonal_link(cell, &out_axes, coords))
    }

    /// Blocks sharing a face, edge or corner with `block`, ascending.
    pub fn block_neighbors(&self, block: usize) -> Vec<usize> {
        let root = TreeCell::root(block);
        neighbor_offsets::<D>()
            .into_iter()
            .filter_map(|offset| self.neighbor(&root, offset))
            .map(|cell| cell.block)
            .filter(|&b| b != block)
            .sorted()
            .dedup()
            .collect()
    }

    fn hop(
        &self,
        mut block: usize,
        level: u8,
        mut coords: [i64; D],
        order: &[usize],
    ) -> Option<TreeCell<D>> {
        let n = 1i64 << level;
        let mut frame: [usize; D] = std::array::from_fn(|a| a);
        for &original_axis in order {
            let axis = frame[original_axis];
            let upper = coords[axis] >= n;
            if !upper && coords[axis] >= 0 {
                return None;
            }
            let link = self.face_link(block, Side::from_axis(axis, upper))?;
            let depth = if upper {
                coords[axis] - n
            } else {
                -1 - coords[axis]
            };
            let mut next = [0i64; D];
            for a in 0..D {
                next[link.axis_map[a]] = if a == axis {
                    if link.side.is_higher_on_axis() {
                        n - 1 - depth
                    } else {
                        depth
                    }
                } else if link.flip[a] {
                    n - 1 - coords[a]
                } else {
                    coords[a]
                };
            }
            coords = next;
            for f in frame.iter_mut() {
                *f = link.axis_map[*f];
            }
            block = link.block;
        }
        to_cell(block, level, coords)
    }

    fn diagonal_link(
        &self,
        cell: &TreeCell<D>,
        out_axes: &[usize],
        coords: [i64; D],
    ) -> Option<TreeCell<D>> {
        let n = cell.cells_per_axis() as i64;
        let upper = |axis: usize| coords[axis] >= n;
        if D >= 2 && out_axes.len() == D {
            let index = (0..D).fold(0, |acc, a| acc | ((upper(a) as usize) << a));
            let links = self.corners.get(&(cell.block, Corner::new(index)?))?;
            let [link] = links.as_slice() else {
                return None;
            };
            let mut target = [0i64; D];
            for (a, t) in target.iter_mut().enumerate() {
                if (link.corner.index() >> a) & 1 == 1 {
                    *t = n - 1;
                }
            }
            to_cell(link.block, cell.level, target)
        } else if D == 3 && out_axes.len() == 2 {
            let along = (0..D).find(|a| !out_axes.contains(a))?;
            let edge = Edge::from_normal_halves(along, [upper(out_axes[0]), upper(out_axes[1])])?;
            let links = self.edges.get(&(cell.block, edge))?;
            let [link] = links.as_slice() else {
                return None;
            };
            let [t0, t1] = link.edge.normal_axes();
            let [h0, h1] = link.edge.normal_halves();
            let mut target = [0i64; D];
            target[t0] = if h0 { n - 1 } else { 0 };
            target[t1] = if h1 { n - 1 } else { 0 };
            target[link.edge.axis()] = if link.flip {
                n - 1 - coords[along]
            } else {
                coords[along]
            };
            to_cell(link.block, cell.level, target)
        } else {
            None
        }
    }

    fn check_block(&self, block: usize) -> Result<(), DomainError> {
        if block < self.num_blocks() {
            Ok(())
        } else {
            Err(DomainError::InvalidConnectivity(format!(
                "block {block} out of range (have {})",
                self.num_blocks()
            )))
        }
    }

    fn set_face(&mut self, block: usize, side: Side<D>, link: FaceLink<D>) -> Result<(), DomainError> {
        let slot = &mut self.faces[block][side.index()];
        match slot {
            Some(existing) if *existing != link => Err(DomainError::InvalidConnectivity(format!(
                "block {block} side {side} is already linked to block {}",
                existing.block
            ))),
            _ => {
                *slot = Some(link);
                Ok(())
            }
        }
    }
}

/// Offsets to all `3^D - 1` same-level neighbors, zero excluded.
pub fn neighbor_offsets<const D: usize>() -> Vec<[i8; D]> {
    (0..3usize.pow(D as u32))
        .map(|code| {
            let mut offset = [0i8; D];
            let mut rest = code;
            for o in offset.iter_mut() {
                *o = (rest % 3) as i8 - 1;
                rest /= 3;
            }
            offset
        })
        .filter(|offset| offset.iter().any(|&o| o != 0))
        .collect()
}

/// Offset pointing out of `side`.
pub fn side_offset<const D: usize>(side: Side<D>) -> [i8; D] {
    let mut offset = [0i8; D];
    if !side.is_null() {
        offset[side.axis()] = if side.is_higher_on_axis() { 1 } else { -1 };
    }
    offset
}

/// Offset pointing out of `corner`.
pub fn corner_offset<const D: usize>(corner: Corner<D>) -> [i8; D] {
    let mut offset = [0i8; D];
    for side in corner.sides() {
        offset[side.axis()] = if side.is_higher_on_axis() { 1 } else { -1 };
    }
    offset
}

/// Offset pointing out of `edge`.
pub fn edge_offset<const D: usize>(edge: Edge<D>) -> [i8; D] {
    let mut offset = [0i8; D];
    if !edge.is_null() {
        for side in edge.sides() {
            offset[side.axis()] = if side.is_higher_on_axis() { 1 } else { -1 };
        }
    }
    offset
}

fn to_cell<const D: usize>(block: usize, level: u8, coords: [i64; D]) -> Option<TreeCell<D>> {
    let n = 1i64 << level;
    let mut out = [0u32; D];
    for (o, &c) in out.iter_mut().zip(coords.iter()) {
        if c < 0 || c >= n {
            return None;
        }
        *o = c as u32;
    }
    Some(TreeCell {
        block,
        level,
        coords: out,
    })
}

pub(crate) fn brick_position<const D: usize>(mut block: usize, dims: &[usize; D]) -> [usize; D] {
    let mut pos = [0; D];
    for (p, &n) in pos.iter_mut().zip(dims.iter()) {
        *p = block % n;
        block /= n;
    }
    pos
}

fn brick_block<const D: usize>(pos: &[usize; D], dims: &[usize; D]) -> usize {
    pos.iter()
        .zip(dims.iter())
        .rev()
        .fold(0, |acc, (&p, &n)| acc * n + p)
}

fn push_unique<T: PartialEq>(links: &mut Vec<T>, link: T) {
    if !links.contains(&link) {
        links.push(link);
    }
}
