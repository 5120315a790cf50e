//! Domain construction algorithms.

pub mod classify;
pub mod coarsen;
pub mod finest;
pub mod leaf_index;
pub mod level;
pub mod wire;

pub use classify::Classifier;
pub use leaf_index::{LeafIndex, LeafRecord};
pub use level::global_patch_count;
pub use wire::{decode_patches, encode_patches};
