//! Edges of a 3-D cell.
//!
//! Edges are grouped by the axis they run along (`index / 4`). Within a group
//! the order is low/low, high/high, high/low, low/high on the two normal
//! axes, so opposite edges are adjacent. Cells of other dimensions have no
//! edges, only null.

use super::side::Side;
use super::tag::{DirectionTag, direction_tag_impls};

const EDGE_LITERALS: [&str; 12] = [
    "BS", "TN", "BN", "TS", "BW", "TE", "BE", "TW", "SW", "NE", "SE", "NW",
];

/// Position within an axis group to (lower normal axis, higher normal axis) bits.
const GROUP_BITS: [[bool; 2]; 4] = [[false, false], [true, true], [true, false], [false, true]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge<const D: usize>(u8);

impl<const D: usize> Edge<D> {
    pub const NUM_EDGES: usize = if D == 3 { 12 } else { 0 };
    pub const NULL: Self = Edge(Self::NUM_EDGES as u8);

    pub fn new(index: usize) -> Option<Self> {
        (index < Self::NUM_EDGES).then_some(Edge(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.index() >= Self::NUM_EDGES
    }

    pub fn values() -> impl Iterator<Item = Self> + Clone {
        (0..Self::NUM_EDGES).map(|i| Edge(i as u8))
    }

    /// Axis the edge runs along.
    pub fn axis(self) -> usize {
        self.index() / 4
    }

    /// The two axes normal to the edge, ascending.
    pub fn normal_axes(self) -> [usize; 2] {
        match self.axis() {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        }
    }

    /// Edge running along `axis` on the given halves of its normal axes.
    pub fn from_normal_halves(axis: usize, higher: [bool; 2]) -> Option<Self> {
        if axis >= D {
            return None;
        }
        let pos = GROUP_BITS.iter().position(|bits| *bits == higher)?;
        Self::new(axis * 4 + pos)
    }

    /// Whether the edge lies on the higher half of each normal axis.
    pub fn normal_halves(self) -> [bool; 2] {
        GROUP_BITS[self.index() % 4]
    }

    /// Edge on the far side of the cell, parallel to this one.
    pub fn opposite(self) -> Self {
        if self.is_null() {
            self
        } else {
            Edge(self.0 ^ 1)
        }
    }

    /// The two sides meeting at this edge, ordered by axis.
    pub fn sides(self) -> [Side<D>; 2] {
        if self.is_null() {
            return [Side::NULL, Side::NULL];
        }
        let [n0, n1] = self.normal_axes();
        let [h0, h1] = self.normal_halves();
        [Side::from_axis(n0, h0), Side::from_axis(n1, h1)]
    }
}

impl Edge<3> {
    pub const BS: Self = Edge(0);
    pub const TN: Self = Edge(1);
    pub const BN: Self = Edge(2);
    pub const TS: Self = Edge(3);
    pub const BW: Self = Edge(4);
    pub const TE: Self = Edge(5);
    pub const BE: Self = Edge(6);
    pub const TW: Self = Edge(7);
    pub const SW: Self = Edge(8);
    pub const NE: Self = Edge(9);
    pub const SE: Self = Edge(10);
    pub const NW: Self = Edge(11);
}

impl<const D: usize> DirectionTag for Edge<D> {
    const KIND: &'static str = "Edge";

    fn literals() -> &'static [&'static str] {
        if D == 3 { &EDGE_LITERALS } else { &[] }
    }

    fn raw(self) -> usize {
        self.index()
    }

    fn from_raw(index: usize) -> Self {
        Self::new(index).unwrap_or(Self::NULL)
    }
}

direction_tag_impls!(Edge);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_follow_literal() {
        for edge in Edge::<3>::values() {
            let name = edge.to_string();
            let [a, b] = edge.sides();
            // literals name the higher-axis side first
            assert!(name.starts_with(&b.to_string()[..1]), "{name}");
            assert!(name.ends_with(&a.to_string()[..1]), "{name}");
        }
        assert_eq!(Edge::<3>::BN.sides(), [Side::<3>::NORTH, Side::<3>::BOTTOM]);
        assert_eq!(Edge::<3>::SE.sides(), [Side::<3>::EAST, Side::<3>::SOUTH]);
    }

    #[test]
    fn opposite_and_axis() {
        assert_eq!(Edge::<3>::BS.opposite(), Edge::<3>::TN);
        assert_eq!(Edge::<3>::BE.opposite(), Edge::<3>::TW);
        assert_eq!(Edge::<3>::NW.opposite(), Edge::<3>::SE);
        assert_eq!(Edge::<3>::TW.axis(), 1);
        assert_eq!(Edge::<3>::NE.normal_axes(), [0, 1]);
    }

    #[test]
    fn index_order_pairs_opposite_edges() {
        let names: Vec<_> = Edge::<3>::values().map(|e| e.to_string()).collect();
        assert_eq!(
            names,
            ["BS", "TN", "BN", "TS", "BW", "TE", "BE", "TW", "SW", "NE", "SE", "NW"]
        );
        for edge in Edge::<3>::values() {
            assert_eq!(edge.opposite().index(), edge.index() ^ 1);
            assert_eq!(Edge::from_normal_halves(edge.axis(), edge.normal_halves()), Some(edge));
        }
        assert_eq!(Edge::<3>::from_normal_halves(1, [true, false]), Some(Edge::<3>::BE));
        assert_eq!(Edge::<3>::from_normal_halves(3, [true, false]), None);
    }

    #[test]
    fn two_dimensional_edge_is_only_null() {
        assert_eq!(Edge::<2>::values().count(), 0);
        assert!(Edge::<2>::NULL.is_null());
        assert!("BS".parse::<Edge<2>>().is_err());
    }
}
