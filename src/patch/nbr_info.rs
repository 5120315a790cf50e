//! Neighbor records stored per side, corner and edge of a patch.

use serde::{Deserialize, Serialize};

use crate::domain_error::DomainError;

/// Refinement relation of a present neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NbrType {
    /// Same refinement level.
    Normal,
    /// One level coarser.
    Coarse,
    /// One level finer.
    Fine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalNbrInfo {
    pub id: usize,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoarseNbrInfo<O> {
    pub id: usize,
    pub rank: usize,
    /// Orthant of the coarse neighbor's shared face (or edge) that touches this patch.
    pub orth_on_coarse: O,
}

/// Finer neighbors in canonical orthant order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FineNbrInfo {
    pub ids: Vec<usize>,
    pub ranks: Vec<usize>,
}

/// What lies across one direction of a patch.
///
/// `O` is the orthant type used for a coarse neighbor's position: a face
/// orthant for sides, `Orthant<1>` for 3-D edges and `Orthant<0>` for corners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NbrInfo<O> {
    Absent,
    Normal(NormalNbrInfo),
    Coarse(CoarseNbrInfo<O>),
    Fine(FineNbrInfo),
}

impl<O> Default for NbrInfo<O> {
    fn default() -> Self {
        NbrInfo::Absent
    }
}

impl<O> NbrInfo<O> {
    pub fn nbr_type(&self) -> Option<NbrType> {
        match self {
            NbrInfo::Absent => None,
            NbrInfo::Normal(_) => Some(NbrType::Normal),
            NbrInfo::Coarse(_) => Some(NbrType::Coarse),
            NbrInfo::Fine(_) => Some(NbrType::Fine),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NbrInfo::Absent)
    }

    /// Literal name of the active variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NbrInfo::Absent => "ABSENT",
            NbrInfo::Normal(_) => "NORMAL",
            NbrInfo::Coarse(_) => "COARSE",
            NbrInfo::Fine(_) => "FINE",
        }
    }

    /// Ids of all neighbors in this record.
    pub fn ids(&self) -> Vec<usize> {
        match self {
            NbrInfo::Absent => Vec::new(),
            NbrInfo::Normal(info) => vec![info.id],
            NbrInfo::Coarse(info) => vec![info.id],
            NbrInfo::Fine(info) => info.ids.clone(),
        }
    }

    /// Ranks of all neighbors in this record.
    pub fn ranks(&self) -> Vec<usize> {
        match self {
            NbrInfo::Absent => Vec::new(),
            NbrInfo::Normal(info) => vec![info.rank],
            NbrInfo::Coarse(info) => vec![info.rank],
            NbrInfo::Fine(info) => info.ranks.clone(),
        }
    }

    pub fn normal(&self) -> Result<&NormalNbrInfo, DomainError> {
        match self {
            NbrInfo::Normal(info) => Ok(info),
            other => Err(other.mismatch("NORMAL")),
        }
    }

    pub fn coarse(&self) -> Result<&CoarseNbrInfo<O>, DomainError> {
        match self {
            NbrInfo::Coarse(info) => Ok(info),
            other => Err(other.mismatch("COARSE")),
        }
    }

    pub fn fine(&self) -> Result<&FineNbrInfo, DomainError> {
        match self {
            NbrInfo::Fine(info) => Ok(info),
            other => Err(other.mismatch("FINE")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> DomainError {
        DomainError::NbrKindMismatch {
            expected,
            found: self.kind_name(),
        }
    }
}
