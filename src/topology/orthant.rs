//! Child positions of a cell.
//!
//! Bit `i` of an orthant index is set when the child lies in the upper half
//! along axis `i`. The null orthant has index `2^D`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::hash::Hash;

use super::corner::Corner;
use super::edge::Edge;
use super::side::Side;
use super::tag::{DirectionTag, direction_tag_impls};

const ORTHANT0_LITERALS: [&str; 1] = ["CENTER"];
const ORTHANT1_LITERALS: [&str; 2] = ["LOWER", "UPPER"];
const ORTHANT2_LITERALS: [&str; 4] = ["SW", "SE", "NW", "NE"];
const ORTHANT3_LITERALS: [&str; 8] = ["BSW", "BSE", "BNW", "BNE", "TSW", "TSE", "TNW", "TNE"];

/// One of the `2^D` children of a `D`-dimensional cell, or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Orthant<const D: usize>(u8);

impl<const D: usize> Orthant<D> {
    /// Number of non-null orthants.
    pub const NUM_ORTHANTS: usize = 1 << D;
    /// The null orthant.
    pub const NULL: Self = Orthant((1usize << D) as u8);

    pub fn new(index: usize) -> Option<Self> {
        (index < Self::NUM_ORTHANTS).then_some(Orthant(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.index() >= Self::NUM_ORTHANTS
    }

    pub fn values() -> impl Iterator<Item = Self> + Clone {
        (0..Self::NUM_ORTHANTS).map(|i| Orthant(i as u8))
    }

    pub fn is_lower_on_axis(self, axis: usize) -> bool {
        (self.0 >> axis) & 1 == 0
    }

    pub fn is_higher_on_axis(self, axis: usize) -> bool {
        !self.is_null() && (self.0 >> axis) & 1 == 1
    }

    /// Whether this child touches `side` of its parent.
    pub fn is_on_side(self, side: Side<D>) -> bool {
        !self.is_null() && !side.is_null() && self.is_higher_on_axis(side.axis()) == side.is_higher_on_axis()
    }

    /// Sibling across `side`.
    pub fn nbr_on_side(self, side: Side<D>) -> Self {
        if self.is_null() || side.is_null() {
            return Self::NULL;
        }
        Orthant(self.0 ^ (1 << side.axis()))
    }

    /// Diagonally opposite sibling.
    pub fn opposite(self) -> Self {
        if self.is_null() {
            self
        } else {
            Orthant(self.0 ^ (Self::NUM_ORTHANTS as u8 - 1))
        }
    }

    /// Sides shared with siblings.
    pub fn interior_sides(self) -> Vec<Side<D>> {
        if self.is_null() {
            return Vec::new();
        }
        (0..D)
            .map(|axis| Side::from_axis(axis, self.is_lower_on_axis(axis)))
            .collect()
    }

    /// Sides lying on the parent's boundary.
    pub fn exterior_sides(self) -> Vec<Side<D>> {
        if self.is_null() {
            return Vec::new();
        }
        (0..D)
            .map(|axis| Side::from_axis(axis, self.is_higher_on_axis(axis)))
            .collect()
    }

    /// Drops the bit of `axis`, giving the orthant of the face perpendicular to it.
    pub fn collapse_on_axis<O: OrthantLike>(self, axis: usize) -> O {
        if self.is_null() || axis >= D {
            return O::null();
        }
        let upper_mask = !0u32 << axis;
        let val = self.0 as u32;
        O::from_index((((val >> 1) & upper_mask) | (val & !upper_mask)) as usize)
    }

    /// Children touching `side`, in canonical (increasing index) order.
    pub fn values_on_side(side: Side<D>) -> Vec<Self> {
        if side.is_null() {
            return Vec::new();
        }
        let axis = side.axis();
        let bit = side.is_higher_on_axis() as usize;
        (0..Self::NUM_ORTHANTS / 2)
            .map(|i| {
                let lower = i & ((1 << axis) - 1);
                let upper = (i >> axis) << (axis + 1);
                Orthant((lower | upper | (bit << axis)) as u8)
            })
            .collect()
    }

    /// Children touching `edge`, ordered along the edge axis.
    pub fn values_on_edge(edge: Edge<D>) -> Vec<Self> {
        if edge.checked_index().is_err() {
            return Vec::new();
        }
        let [n0, n1] = edge.normal_axes();
        let [h0, h1] = edge.normal_halves();
        let base = ((h0 as usize) << n0) | ((h1 as usize) << n1);
        vec![Orthant(base as u8), Orthant((base | (1 << edge.axis())) as u8)]
    }

    /// The child touching `corner`.
    pub fn from_corner(corner: Corner<D>) -> Self {
        if corner.is_null() {
            Self::NULL
        } else {
            Orthant(corner.index() as u8)
        }
    }

    /// The parent corner this child touches.
    pub fn to_corner(self) -> Corner<D> {
        Corner::new(self.index()).unwrap_or(Corner::NULL)
    }
}

impl Orthant<1> {
    pub const LOWER: Self = Orthant(0);
    pub const UPPER: Self = Orthant(1);
}

impl Orthant<2> {
    pub const SW: Self = Orthant(0);
    pub const SE: Self = Orthant(1);
    pub const NW: Self = Orthant(2);
    pub const NE: Self = Orthant(3);
}

impl Orthant<3> {
    pub const BSW: Self = Orthant(0);
    pub const BSE: Self = Orthant(1);
    pub const BNW: Self = Orthant(2);
    pub const BNE: Self = Orthant(3);
    pub const TSW: Self = Orthant(4);
    pub const TSE: Self = Orthant(5);
    pub const TNW: Self = Orthant(6);
    pub const TNE: Self = Orthant(7);
}

impl<const D: usize> DirectionTag for Orthant<D> {
    const KIND: &'static str = "Orthant";

    fn literals() -> &'static [&'static str] {
        match D {
            0 => &ORTHANT0_LITERALS,
            1 => &ORTHANT1_LITERALS,
            2 => &ORTHANT2_LITERALS,
            3 => &ORTHANT3_LITERALS,
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

direction_tag_impls!(Orthant);

/// Orthant types usable as the position stored in a coarse neighbor record.
pub trait OrthantLike:
    Copy + Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const NUM_VALUES: usize;

    /// Orthant with the given index; out of range gives null.
    fn from_index(index: usize) -> Self;
    fn to_index(self) -> usize;
    fn null() -> Self;
}

impl<const D: usize> OrthantLike for Orthant<D> {
    const NUM_VALUES: usize = Self::NUM_ORTHANTS;

    fn from_index(index: usize) -> Self {
        Self::new(index).unwrap_or(Self::NULL)
    }

    fn to_index(self) -> usize {
        self.index()
    }

    fn null() -> Self {
        Self::NULL
    }
}
