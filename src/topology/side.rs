//! Faces of a cell.
//!
//! Side indices are laid out as `axis * 2 + (0 lower | 1 upper)`, so in 3-D
//! the values are west, east, south, north, bottom, top. The null side has
//! index `2 * D`.

use super::tag::{DirectionTag, direction_tag_impls};

const SIDE_LITERALS: [&str; 6] = ["WEST", "EAST", "SOUTH", "NORTH", "BOTTOM", "TOP"];

/// One of the `2 * D` faces of a `D`-dimensional cell, or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Side<const D: usize>(u8);

impl<const D: usize> Side<D> {
    /// Number of non-null sides.
    pub const NUM_SIDES: usize = 2 * D;
    /// The null side.
    pub const NULL: Self = Side((2 * D) as u8);

    /// Side with the given index, or `None` if out of range.
    pub fn new(index: usize) -> Option<Self> {
        (index < Self::NUM_SIDES).then_some(Side(index as u8))
    }

    /// Side on `axis`, lower or upper.
    pub fn from_axis(axis: usize, upper: bool) -> Self {
        if axis < D {
            Side((axis * 2 + upper as usize) as u8)
        } else {
            Self::NULL
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.index() >= Self::NUM_SIDES
    }

    /// All non-null sides in index order.
    pub fn values() -> impl Iterator<Item = Self> + Clone {
        (0..Self::NUM_SIDES).map(|i| Side(i as u8))
    }

    /// Axis normal to this side.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_lower_on_axis(self) -> bool {
        !self.is_null() && self.0 % 2 == 0
    }

    pub fn is_higher_on_axis(self) -> bool {
        !self.is_null() && self.0 % 2 == 1
    }

    /// The facing side. Null maps to null.
    pub fn opposite(self) -> Self {
        if self.is_null() {
            self
        } else {
            Side(self.0 ^ 1)
        }
    }
}

impl Side<1> {
    pub const WEST: Self = Side(0);
    pub const EAST: Self = Side(1);
}

impl Side<2> {
    pub const WEST: Self = Side(0);
    pub const EAST: Self = Side(1);
    pub const SOUTH: Self = Side(2);
    pub const NORTH: Self = Side(3);
}

impl Side<3> {
    pub const WEST: Self = Side(0);
    pub const EAST: Self = Side(1);
    pub const SOUTH: Self = Side(2);
    pub const NORTH: Self = Side(3);
    pub const BOTTOM: Self = Side(4);
    pub const TOP: Self = Side(5);
}

impl<const D: usize> DirectionTag for Side<D> {
    const KIND: &'static str = "Side";

    fn literals() -> &'static [&'static str] {
        SIDE_LITERALS.get(..Self::NUM_SIDES).unwrap_or(&[])
    }

    fn raw(self) -> usize {
        self.index()
    }

    fn from_raw(index: usize) -> Self {
        Self::new(index).unwrap_or(Self::NULL)
    }
}

direction_tag_impls!(Side);
