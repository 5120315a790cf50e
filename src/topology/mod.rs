//! Geometric vocabulary of the forest: direction tags, cells and block
//! connectivity.
//!
//! - [`Side`], [`Corner`], [`Edge`] and [`Orthant`] are closed, const-generic
//!   direction types with a distinguished null value.
//! - [`TreeCell`] addresses one cell of a quadtree/octree forest.
//! - [`Connectivity`] glues root blocks together and resolves same-level
//!   neighbors across block boundaries.

pub mod cell;
pub mod connectivity;
pub mod corner;
pub mod dimension;
pub mod edge;
pub mod orthant;
pub mod side;
pub mod tag;

pub use cell::{MAX_LEVEL, TreeCell};
pub use connectivity::{Connectivity, CornerLink, EdgeLink, FaceLink};
pub use corner::Corner;
pub use dimension::{Dim, SideOrthant, SupportedDim};
pub use edge::Edge;
pub use orthant::{Orthant, OrthantLike};
pub use side::Side;
pub use tag::DirectionTag;
