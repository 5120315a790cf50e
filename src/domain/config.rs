//! Patch resolution shared by every domain of a generator.

use serde::{Deserialize, Serialize};

use crate::domain_error::DomainError;

/// Cells per axis and ghost layer width of every patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PatchConfigRepr", try_from = "PatchConfigRepr")]
pub struct PatchConfig<const D: usize> {
    /// Interior cells along each axis.
    pub ns: [usize; D],
    /// Ghost cells on each side.
    pub num_ghost_cells: usize,
}

impl<const D: usize> PatchConfig<D> {
    pub fn new(ns: [usize; D], num_ghost_cells: usize) -> Result<Self, DomainError> {
        let config = Self { ns, num_ghost_cells };
        config.validate()?;
        Ok(config)
    }

    /// Same resolution on every axis.
    pub fn uniform(n: usize, num_ghost_cells: usize) -> Result<Self, DomainError> {
        Self::new([n; D], num_ghost_cells)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(axis) = self.ns.iter().position(|&n| n == 0) {
            return Err(DomainError::InvalidConfig(format!(
                "ns must be positive, axis {axis} has 0 cells"
            )));
        }
        Ok(())
    }

    /// Interior cells of one patch.
    pub fn cells_per_patch(&self) -> usize {
        self.ns.iter().product()
    }

    pub fn cells_per_patch_with_ghost(&self) -> usize {
        self.ns.iter().map(|n| n + 2 * self.num_ghost_cells).product()
    }
}

impl<const D: usize> Default for PatchConfig<D> {
    fn default() -> Self {
        Self {
            ns: [16; D],
            num_ghost_cells: 1,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PatchConfigRepr {
    ns: Vec<usize>,
    num_ghost_cells: usize,
}

impl<const D: usize> From<PatchConfig<D>> for PatchConfigRepr {
    fn from(c: PatchConfig<D>) -> Self {
        Self {
            ns: c.ns.to_vec(),
            num_ghost_cells: c.num_ghost_cells,
        }
    }
}

impl<const D: usize> TryFrom<PatchConfigRepr> for PatchConfig<D> {
    type Error = DomainError;

    fn try_from(r: PatchConfigRepr) -> Result<Self, Self::Error> {
        let ns = <[usize; D]>::try_from(r.ns.as_slice()).map_err(|_| {
            DomainError::InvalidConfig(format!("ns has {} entries, expected {D}", r.ns.len()))
        })?;
        Self::new(ns, r.num_ghost_cells)
    }
}
