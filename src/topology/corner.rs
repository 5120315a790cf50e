//! Vertices of a cell, indexed like [`Orthant`](super::Orthant). Only 2-D and
//! 3-D cells have corners; `Corner<1>` consists of the null value alone.

use super::side::Side;
use super::tag::{DirectionTag, direction_tag_impls};

const CORNER2_LITERALS: [&str; 4] = ["SW", "SE", "NW", "NE"];
const CORNER3_LITERALS: [&str; 8] = ["BSW", "BSE", "BNW", "BNE", "TSW", "TSE", "TNW", "TNE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Corner<const D: usize>(u8);

impl<const D: usize> Corner<D> {
    pub const NUM_CORNERS: usize = if D >= 2 { 1 << D } else { 0 };
    pub const NULL: Self = Corner(Self::NUM_CORNERS as u8);

    pub fn new(index: usize) -> Option<Self> {
        (index < Self::NUM_CORNERS).then_some(Corner(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.index() >= Self::NUM_CORNERS
    }

    pub fn values() -> impl Iterator<Item = Self> + Clone {
        (0..Self::NUM_CORNERS).map(|i| Corner(i as u8))
    }

    pub fn opposite(self) -> Self {
        if self.is_null() {
            self
        } else {
            Corner(self.0 ^ (Self::NUM_CORNERS as u8 - 1))
        }
    }

    /// The `D` sides meeting at this corner, one per axis.
    pub fn sides(self) -> Vec<Side<D>> {
        if self.is_null() {
            return Vec::new();
        }
        (0..D)
            .map(|axis| Side::from_axis(axis, (self.0 >> axis) & 1 == 1))
            .collect()
    }
}

impl Corner<2> {
    pub const SW: Self = Corner(0);
    pub const SE: Self = Corner(1);
    pub const NW: Self = Corner(2);
    pub const NE: Self = Corner(3);
}

impl Corner<3> {
    pub const BSW: Self = Corner(0);
    pub const BSE: Self = Corner(1);
    pub const BNW: Self = Corner(2);
    pub const BNE: Self = Corner(3);
    pub const TSW: Self = Corner(4);
    pub const TSE: Self = Corner(5);
    pub const TNW: Self = Corner(6);
    pub const TNE: Self = Corner(7);
}

impl<const D: usize> DirectionTag for Corner<D> {
    const KIND: &'static str = "Corner";

    fn literals() -> &'static [&'static str] {
        match D {
            2 => &CORNER2_LITERALS,
            3 => &CORNER3_LITERALS,
            _ => &[],
        }
    }

    fn raw(self) -> usize {
        self.index()
    }

    fn from_raw(index: usize) -> Self {
        Self::new(index).unwrap_or(Self::NULL)
    }
}

direction_tag_impls!(Corner);
