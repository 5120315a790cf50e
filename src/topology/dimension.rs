//! Compile-time selection of per-dimension types.
//!
//! A side neighbor's coarse position is an orthant of the shared face, one
//! dimension lower than the cell. Stable const generics cannot spell
//! `Orthant<{ D - 1 }>`, so patch-level types carry a `Dim<D>: SupportedDim`
//! bound and project the face orthant from it.

use super::orthant::{Orthant, OrthantLike};

/// Marker for the spatial dimension `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim<const D: usize>;

/// Dimensions for which patches and domains can be built.
pub trait SupportedDim {
    /// Orthant type of a `D - 1` dimensional face.
    type SideOrthant: OrthantLike;
}

impl SupportedDim for Dim<2> {
    type SideOrthant = Orthant<1>;
}

impl SupportedDim for Dim<3> {
    type SideOrthant = Orthant<2>;
}

/// Face orthant type of a `D`-dimensional cell.
pub type SideOrthant<const D: usize> = <Dim<D> as SupportedDim>::SideOrthant;
