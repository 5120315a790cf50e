//! Maps from a block's unit reference coordinates to physical space.

use std::cmp::Ordering;

use crate::domain_error::DomainError;
use crate::topology::connectivity::brick_position;

/// Coordinate map applied to every patch corner.
///
/// Any closure `Fn(block, unit_coords) -> physical_coords` is a block map.
pub trait BlockMap<const D: usize> {
    fn map(&self, block: usize, unit: [f64; D]) -> [f64; D];
}

impl<const D: usize, F> BlockMap<D> for F
where
    F: Fn(usize, [f64; D]) -> [f64; D],
{
    fn map(&self, block: usize, unit: [f64; D]) -> [f64; D] {
        self(block, unit)
    }
}

/// Identity map: every block occupies the unit box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitBlockMap;

impl<const D: usize> BlockMap<D> for UnitBlockMap {
    fn map(&self, _block: usize, unit: [f64; D]) -> [f64; D] {
        unit
    }
}

/// Blocks of a [`Connectivity::brick`](crate::topology::Connectivity::brick)
/// laid out side by side over the box `[lower, upper]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrickBlockMap<const D: usize> {
    dims: [usize; D],
    lower: [f64; D],
    upper: [f64; D],
}

impl<const D: usize> BrickBlockMap<D> {
    pub fn new(dims: [usize; D], lower: [f64; D], upper: [f64; D]) -> Result<Self, DomainError> {
        if dims.contains(&0) {
            return Err(DomainError::InvalidConfig(format!(
                "brick dimensions {dims:?} must be positive"
            )));
        }
        if (0..D).any(|axis| lower[axis].partial_cmp(&upper[axis]) != Some(Ordering::Less)) {
            return Err(DomainError::InvalidConfig(format!(
                "empty box {lower:?}..{upper:?}"
            )));
        }
        Ok(Self { dims, lower, upper })
    }
}

impl<const D: usize> BlockMap<D> for BrickBlockMap<D> {
    fn map(&self, block: usize, unit: [f64; D]) -> [f64; D] {
        let pos = brick_position(block, &self.dims);
        let mut out = [0.0; D];
        for axis in 0..D {
            let width = (self.upper[axis] - self.lower[axis]) / self.dims[axis] as f64;
            out[axis] = self.lower[axis] + (pos[axis] as f64 + unit[axis]) * width;
        }
        out
    }
}
