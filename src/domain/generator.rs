//! Sequencer producing the finest domain and then successively coarser ones.
//!
//! ```no_run
//! use forest_domains::prelude::*;
//!
//! # fn main() -> Result<(), DomainError> {
//! let forest = QuadForest::uniform(Connectivity::unit(), 2)?;
//! let config = PatchConfig::new([16, 16], 1)?;
//! let mut generator = DomainGenerator::new(forest.serial_view(), config, UnitBlockMap)?;
//! let mut domains = vec![generator.finest_domain()?];
//! while generator.has_coarser_domain() {
//!     domains.push(generator.coarser_domain()?);
//! }
//! assert_eq!(domains.len(), 3);
//! # Ok(())
//! # }
//! ```

use once_cell::unsync::OnceCell;

use crate::algs::coarsen::coarsen;
use crate::algs::finest::build_finest;
use crate::algs::leaf_index::LeafIndex;
use crate::algs::level::LevelBuilder;
use crate::debug_invariants::DebugInvariants;
use crate::domain::{BlockMap, Domain, PatchConfig, UnitBlockMap};
use crate::domain_error::DomainError;
use crate::forest::ForestView;
use crate::topology::{Dim, SupportedDim};

/// Generates the domain sequence of one forest view.
///
/// The forest must stay unchanged for the lifetime of the generator.
pub struct DomainGenerator<const D: usize, F, M = UnitBlockMap>
where
    Dim<D>: SupportedDim,
{
    forest: F,
    block_map: M,
    config: PatchConfig<D>,
    index: LeafIndex<D>,
    finest_level: u8,
    finest: OnceCell<Domain<D>>,
    /// Most recently produced coarser domain.
    current: Option<Domain<D>>,
    /// Set once iteration has yielded an error.
    failed: bool,
}

impl<const D: usize, F, M> DomainGenerator<D, F, M>
where
    Dim<D>: SupportedDim,
    F: ForestView<D>,
    M: BlockMap<D>,
{
    pub fn new(forest: F, config: PatchConfig<D>, block_map: M) -> Result<Self, DomainError> {
        config.validate()?;
        let counts = forest.global_level_counts();
        let total: usize = counts.iter().sum();
        let expected = forest.global_first_leaf().last().copied().unwrap_or(0);
        if total == 0 || total != expected {
            return Err(DomainError::InvalidForest(format!(
                "level counts sum to {total}, leaf offsets to {expected}"
            )));
        }
        let finest_level = counts.iter().rposition(|&n| n > 0).unwrap_or(0) as u8;
        let index = LeafIndex::build(&forest)?;
        log::debug!(
            "rank {}: indexed {} local and ghost leaves, finest level {finest_level}",
            forest.rank(),
            index.len()
        );
        Ok(Self {
            forest,
            block_map,
            config,
            index,
            finest_level,
            finest: OnceCell::new(),
            current: None,
            failed: false,
        })
    }

    pub fn forest(&self) -> &F {
        &self.forest
    }

    pub fn config(&self) -> &PatchConfig<D> {
        &self.config
    }

    /// The finest domain, built on first call.
    pub fn finest_domain(&self) -> Result<Domain<D>, DomainError> {
        self.finest
            .get_or_try_init(|| {
                let builder = self.builder(self.finest_level);
                let domain = build_finest(&self.forest, &builder).inspect_err(|e| self.report(e))?;
                self.produced(&domain);
                Ok(domain)
            })
            .cloned()
    }

    /// True until the level-0 domain has been produced.
    pub fn has_coarser_domain(&self) -> bool {
        self.last_level() > 0
    }

    /// Coarsen the most recently produced domain by one level.
    pub fn coarser_domain(&mut self) -> Result<Domain<D>, DomainError> {
        if !self.has_coarser_domain() {
            return Err(DomainError::GeneratorExhausted);
        }
        let fine = match &self.current {
            Some(domain) => domain.clone(),
            None => self.finest_domain()?,
        };
        let builder = self.builder(fine.level() - 1);
        let domain = coarsen(&fine, &builder, self.forest.global_level_counts())
            .inspect_err(|e| self.report(e))?;
        self.produced(&domain);
        self.current = Some(domain.clone());
        Ok(domain)
    }

    fn last_level(&self) -> u8 {
        self.current
            .as_ref()
            .map_or(self.finest_level, |domain| domain.level())
    }

    fn builder(&self, level: u8) -> LevelBuilder<'_, D, M> {
        LevelBuilder {
            index: &self.index,
            connectivity: self.forest.connectivity(),
            block_map: &self.block_map,
            config: self.config,
            level,
            finest_level: self.finest_level,
        }
    }

    fn produced(&self, domain: &Domain<D>) {
        domain.debug_assert_invariants();
        log::info!(
            "rank {}: domain {} at level {} with {} local / {} global patches",
            self.forest.rank(),
            domain.id(),
            domain.level(),
            domain.num_local_patches(),
            domain.num_global_patches()
        );
    }

    fn report(&self, error: &DomainError) {
        if error.is_fatal() {
            log::warn!("rank {}: domain generation failed: {error}", self.forest.rank());
        }
    }
}

impl<const D: usize, F, M> Iterator for DomainGenerator<D, F, M>
where
    Dim<D>: SupportedDim,
    F: ForestView<D>,
    M: BlockMap<D>,
{
    type Item = Result<Domain<D>, DomainError>;

    /// Yields the finest domain first, then each coarser one. Stops after
    /// the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = if self.finest.get().is_none() {
            self.finest_domain()
        } else if self.has_coarser_domain() {
            self.coarser_domain()
        } else {
            return None;
        };
        self.failed = item.is_err();
        Some(item)
    }
}
