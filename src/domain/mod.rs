//! One snapshot of the forest at a single coarsening level.
//!
//! A [`Domain`] owns this rank's patches of that level. Patches are shared
//! behind an `Arc`, so domains are cheap to clone and hand to several
//! consumers. Patches refer to each other by id; [`Domain::patch`] resolves
//! a local id.

pub mod block_map;
pub mod config;
pub mod generator;

use hashbrown::HashMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;

use crate::debug_invariants::DebugInvariants;
use crate::domain_error::DomainError;
use crate::patch::Patch;
use crate::topology::{Dim, SupportedDim};

pub use block_map::{BlockMap, BrickBlockMap, UnitBlockMap};
pub use config::PatchConfig;
pub use generator::DomainGenerator;

/// This rank's patches of one level, plus global counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain<const D: usize>
where
    Dim<D>: SupportedDim,
{
    id: usize,
    level: u8,
    config: PatchConfig<D>,
    patches: Arc<[Patch<D>]>,
    num_global_patches: usize,
    index_of: Arc<HashMap<usize, usize>>,
}

impl<const D: usize> Domain<D>
where
    Dim<D>: SupportedDim,
{
    /// Assemble a domain from patches already sorted into local order.
    pub fn new(
        id: usize,
        level: u8,
        config: PatchConfig<D>,
        patches: Vec<Patch<D>>,
        num_global_patches: usize,
    ) -> Result<Self, DomainError> {
        let mut index_of = HashMap::with_capacity(patches.len());
        for (i, patch) in patches.iter().enumerate() {
            if index_of.insert(patch.id, i).is_some() {
                return Err(DomainError::InvalidPatch {
                    id: patch.id,
                    reason: format!("id repeated within domain {id}"),
                });
            }
        }
        let domain = Self {
            id,
            level,
            config,
            patches: patches.into(),
            num_global_patches,
            index_of: Arc::new(index_of),
        };
        domain.validate_invariants()?;
        Ok(domain)
    }

    /// 0 for the finest domain, incremented per coarsening.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Refinement level of this domain.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn ns(&self) -> [usize; D] {
        self.config.ns
    }

    pub fn num_ghost_cells(&self) -> usize {
        self.config.num_ghost_cells
    }

    pub fn config(&self) -> &PatchConfig<D> {
        &self.config
    }

    /// Local patches in local index order.
    pub fn patches(&self) -> &[Patch<D>] {
        &self.patches
    }

    /// Local patch with the given global id.
    pub fn patch(&self, id: usize) -> Option<&Patch<D>> {
        self.index_of.get(&id).map(|&i| &self.patches[i])
    }

    pub fn num_local_patches(&self) -> usize {
        self.patches.len()
    }

    pub fn num_global_patches(&self) -> usize {
        self.num_global_patches
    }

    pub fn num_cells_in_patch(&self) -> usize {
        self.config.cells_per_patch()
    }

    pub fn num_local_cells(&self) -> usize {
        self.num_local_patches() * self.num_cells_in_patch()
    }

    pub fn num_global_cells(&self) -> usize {
        self.num_global_patches * self.num_cells_in_patch()
    }

    pub fn num_local_cells_with_ghost(&self) -> usize {
        self.num_local_patches() * self.config.cells_per_patch_with_ghost()
    }

    /// Summed physical volume of the local patches.
    pub fn local_volume(&self) -> f64 {
        self.patches.iter().map(Patch::volume).sum()
    }
}

impl<const D: usize> DebugInvariants for Domain<D>
where
    Dim<D>: SupportedDim,
{
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Domain");
    }

    fn validate_invariants(&self) -> Result<(), DomainError> {
        self.config.validate()?;
        self.patches.validate_invariants()?;
        if self.index_of.len() != self.patches.len() {
            return Err(DomainError::InvalidForest(format!(
                "domain {} has repeated patch ids",
                self.id
            )));
        }
        if self.patches.len() > self.num_global_patches {
            return Err(DomainError::InvalidForest(format!(
                "domain {} holds {} local patches but {} globally",
                self.id,
                self.patches.len(),
                self.num_global_patches
            )));
        }
        for (i, patch) in self.patches.iter().enumerate() {
            let reason = if patch.local_index != i {
                Some(format!("local index {} at position {i}", patch.local_index))
            } else if patch.ns != self.config.ns || patch.num_ghost_cells != self.config.num_ghost_cells {
                Some("resolution differs from the domain's".to_string())
            } else if patch.refine_level > self.level {
                Some(format!(
                    "refine level {} finer than domain level {}",
                    patch.refine_level, self.level
                ))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(DomainError::InvalidPatch { id: patch.id, reason });
            }
        }
        Ok(())
    }
}

impl<const D: usize> Serialize for Domain<D>
where
    Dim<D>: SupportedDim,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Domain", 6)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("level", &self.level)?;
        s.serialize_field("ns", &self.config.ns[..])?;
        s.serialize_field("num_ghost_cells", &self.config.num_ghost_cells)?;
        s.serialize_field("num_global_patches", &self.num_global_patches)?;
        s.serialize_field("patches", &self.patches[..])?;
        s.end()
    }
}
