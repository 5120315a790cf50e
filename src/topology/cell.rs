//! Cells of a block-structured quadtree/octree forest.

use std::cmp::Ordering;

use super::orthant::Orthant;

/// Deepest refinement level a cell may reach.
pub const MAX_LEVEL: u8 = 30;

/// A cell in a quadtree/octree forest: a root block plus integer coordinates
/// at the cell's refinement level.
///
/// Cells are ordered by block, then along the Morton (Z-order) curve of the
/// block, with an ancestor sorting before its descendants. Sorting the leaves
/// of a forest with this order yields the canonical patch numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeCell<const D: usize> {
    /// Root block the cell belongs to.
    pub block: usize,
    /// Refinement level (0 is the root block).
    pub level: u8,
    /// Integer coordinates at the given level.
    pub coords: [u32; D],
}

impl<const D: usize> TreeCell<D> {
    /// The unrefined root cell of `block`.
    pub fn root(block: usize) -> Self {
        Self {
            block,
            level: 0,
            coords: [0; D],
        }
    }

    /// Returns the parent cell, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            None
        } else {
            let mut coords = self.coords;
            for coord in &mut coords {
                *coord /= 2;
            }
            Some(Self {
                block: self.block,
                level: self.level - 1,
                coords,
            })
        }
    }

    /// Ancestor at `level`, or the cell itself when `level >= self.level`.
    pub fn ancestor(&self, level: u8) -> Self {
        if level >= self.level {
            return *self;
        }
        let shift = self.level - level;
        let mut coords = self.coords;
        for coord in &mut coords {
            *coord >>= shift;
        }
        Self {
            block: self.block,
            level,
            coords,
        }
    }

    /// The child in position `orthant`.
    pub fn child(&self, orthant: Orthant<D>) -> Self {
        let mut coords = [0u32; D];
        for (axis, coord) in coords.iter_mut().enumerate() {
            let bit = orthant.is_higher_on_axis(axis) as u32;
            *coord = self.coords[axis] * 2 + bit;
        }
        Self {
            block: self.block,
            level: self.level + 1,
            coords,
        }
    }

    /// Returns the `2^D` children of this cell in orthant order.
    pub fn children(&self) -> Vec<Self> {
        Orthant::<D>::values().map(|o| self.child(o)).collect()
    }

    /// Position of this cell within its parent; null for a root.
    pub fn orthant(&self) -> Orthant<D> {
        if self.level == 0 {
            return Orthant::NULL;
        }
        let index = (0..D).fold(0usize, |acc, axis| {
            acc | (((self.coords[axis] & 1) as usize) << axis)
        });
        Orthant::new(index).unwrap_or(Orthant::NULL)
    }

    /// Whether `other` is this cell or one of its descendants.
    pub fn contains(&self, other: &Self) -> bool {
        other.block == self.block && other.level >= self.level && other.ancestor(self.level) == *self
    }

    /// Number of cells per axis at this cell's level.
    pub fn cells_per_axis(&self) -> u64 {
        1u64 << self.level
    }

    /// Lower and upper corner of the cell in the unit coordinates of its block.
    pub fn unit_bounds(&self) -> ([f64; D], [f64; D]) {
        let n = self.cells_per_axis() as f64;
        let mut lower = [0.0; D];
        let mut upper = [0.0; D];
        for axis in 0..D {
            lower[axis] = self.coords[axis] as f64 / n;
            upper[axis] = (self.coords[axis] as f64 + 1.0) / n;
        }
        (lower, upper)
    }

    /// Interleaved coordinate bits at [`MAX_LEVEL`], axis 0 least significant.
    pub fn morton(&self) -> u128 {
        let shift = MAX_LEVEL.saturating_sub(self.level);
        let mut key = 0u128;
        for bit in 0..MAX_LEVEL as usize {
            for axis in 0..D {
                let c = (self.coords[axis] as u128) << shift;
                key |= ((c >> bit) & 1) << (bit * D + axis);
            }
        }
        key
    }
}

impl<const D: usize> Ord for TreeCell<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block
            .cmp(&other.block)
            .then_with(|| self.morton().cmp(&other.morton()))
            .then_with(|| self.level.cmp(&other.level))
    }
}

impl<const D: usize> PartialOrd for TreeCell<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
