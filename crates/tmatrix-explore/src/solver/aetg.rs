//! AETG-style covering-array generation.
//!
//! Each round builds one case greedily and then retires every obligation
//! that case satisfies:
//!
//! ```text
//! while unsatisfied is non-empty:
//!     case = build()
//!     update(case)
//!     yield case
//! ```
//!
//! The seed obligation is copied into the case verbatim, so every round
//! retires at least one obligation. The generator therefore stops after at
//! most `total_obligations()` rounds.

use std::iter::FusedIterator;

use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use tmatrix_ir::{ModelError, ParameterSpace, RequirementIssue, RequirementSet};
use tracing::debug;

use super::builder::CaseBuilder;
use super::coverage::apply_case;
use super::rng::{entropy_rng, seeded_rng};
use super::universe::ObligationUniverse;
use super::TestCase;

/// One generation round.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub case: TestCase,
    /// Obligations this case covered for the first time (always >= 1).
    pub newly_covered: usize,
}

/// Greedy pairwise / t-wise case generator.
///
/// Consumed as an [`Iterator`] of [`TestCase`]s. The sequence is finite and
/// cannot be restarted; stopping early simply leaves obligations uncovered.
#[derive(Debug)]
pub struct AetgGenerator<R = ChaCha8Rng> {
    space: ParameterSpace,
    requirements: RequirementSet,
    universe: ObligationUniverse,
    window: usize,
    rng: R,
    rounds: usize,
}

impl AetgGenerator<ChaCha8Rng> {
    /// Reproducible generator: the same seed always yields the same cases.
    pub fn with_seed(
        space: ParameterSpace,
        requirements: RequirementSet,
        seed: u64,
    ) -> Result<Self, ModelError> {
        Self::new(space, requirements, seeded_rng(seed))
    }

    /// Generator seeded from system entropy; output is not reproducible.
    pub fn from_entropy(
        space: ParameterSpace,
        requirements: RequirementSet,
    ) -> Result<Self, ModelError> {
        Self::new(space, requirements, entropy_rng())
    }
}

impl<R: RngCore> AetgGenerator<R> {
    /// Build a generator over `space` with an injected random source.
    ///
    /// Fails if a requirement refers to a position outside `space`. The
    /// error lists every member; positions with no name render as `#<index>`.
    pub fn new(
        space: ParameterSpace,
        requirements: RequirementSet,
        rng: R,
    ) -> Result<Self, ModelError> {
        for requirement in &requirements {
            if let Some(&bad) = requirement.members().iter().find(|&&m| m >= space.len()) {
                return Err(ModelError::InvalidRequirement {
                    requirement: requirement
                        .members()
                        .iter()
                        .map(|&m| {
                            if m < space.len() {
                                space.name(m).to_string()
                            } else {
                                format!("#{m}")
                            }
                        })
                        .collect(),
                    reason: RequirementIssue::OutOfRange(bad),
                });
            }
        }

        Ok(Self::assemble(space, requirements, rng))
    }

    /// Pairwise generator: every pair of parameters must be covered.
    pub fn pairwise(space: ParameterSpace, rng: R) -> Self {
        let requirements = RequirementSet::pairwise(&space);
        Self::assemble(space, requirements, rng)
    }

    fn assemble(space: ParameterSpace, requirements: RequirementSet, rng: R) -> Self {
        let universe = ObligationUniverse::build(&space, &requirements);
        let window = requirements.max_arity();
        Self {
            space,
            requirements,
            universe,
            window,
            rng,
            rounds: 0,
        }
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn names(&self) -> Vec<&str> {
        self.space.names()
    }

    /// The normalized requirements being covered.
    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    pub fn total_obligations(&self) -> usize {
        self.universe.total()
    }

    /// Obligations not yet covered by a produced case.
    pub fn remaining(&self) -> usize {
        self.universe.remaining()
    }

    /// Number of cases produced so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Build, apply, and return the next case with its coverage gain.
    pub fn next_round(&mut self) -> Option<Round> {
        let positions =
            CaseBuilder::new(&self.space, self.window).build(&mut self.universe, &mut self.rng)?;
        let newly_covered = apply_case(&mut self.universe, &self.requirements, &positions);
        self.rounds += 1;

        debug!(
            round = self.rounds,
            newly_covered,
            remaining = self.universe.remaining(),
            "generated case"
        );

        Some(Round {
            case: TestCase::from_positions(&self.space, &positions),
            newly_covered,
        })
    }
}

impl<R: RngCore> Iterator for AetgGenerator<R> {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        self.next_round().map(|round| round.case)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.universe.remaining();
        (usize::from(remaining > 0), Some(remaining))
    }
}

impl<R: RngCore> FusedIterator for AetgGenerator<R> {}
