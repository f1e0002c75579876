//! Coverage bookkeeping.
//!
//! - [`apply_case`] retires the obligations a finished case satisfies.
//! - [`CoverageReport`] re-derives the universe from scratch and checks a
//!   set of cases against it, independent of any generator state.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tmatrix_ir::{ParameterSpace, RequirementSet, Value};

use super::universe::{Entry, Obligation, ObligationUniverse};
use super::TestCase;

/// Mark every obligation `case` realizes as satisfied.
///
/// Returns the number of obligations that were newly covered.
pub fn apply_case(
    universe: &mut ObligationUniverse,
    requirements: &RequirementSet,
    case: &[usize],
) -> usize {
    requirements
        .iter()
        .filter(|requirement| universe.satisfy(&Obligation::realized_by(requirement, case)))
        .count()
}

/// How well a set of cases covers a requirement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Total obligations demanded by the requirements.
    pub total: usize,
    /// Obligations hit by at least one case.
    pub covered: usize,
    /// Obligations no case hits, in canonical order.
    pub uncovered: Vec<BTreeMap<String, Value>>,
}

impl CoverageReport {
    /// Check `cases` against the full obligation universe.
    ///
    /// Case values outside a parameter's domain never match anything.
    pub fn measure(
        space: &ParameterSpace,
        requirements: &RequirementSet,
        cases: &[TestCase],
    ) -> Self {
        let universe = ObligationUniverse::build(space, requirements);

        let mut hit: HashSet<Obligation> = HashSet::new();
        for case in cases {
            let Some(positions) = positions_of(space, case) else {
                continue;
            };
            for requirement in requirements {
                let entries: Option<Vec<Entry>> = requirement
                    .members()
                    .iter()
                    .map(|&param| positions[param].map(|value| Entry { param, value }))
                    .collect();
                if let Some(entries) = entries {
                    let obligation = Obligation::new(entries);
                    if universe.is_unsatisfied(&obligation) {
                        hit.insert(obligation);
                    }
                }
            }
        }

        let uncovered = universe
            .unsatisfied()
            .into_iter()
            .filter(|ob| !hit.contains(*ob))
            .map(|ob| ob.describe(space))
            .collect();

        Self {
            total: universe.total(),
            covered: hit.len(),
            uncovered,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }

    /// Covered fraction in `[0, 1]`; an empty universe counts as fully covered.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.covered as f64 / self.total as f64
        }
    }
}

/// Value position per parameter, or `None` where the case's value is not in
/// the domain. Returns `None` if the case is missing a parameter.
fn positions_of(space: &ParameterSpace, case: &TestCase) -> Option<Vec<Option<usize>>> {
    space
        .parameters()
        .iter()
        .map(|param| {
            case.get(&param.name)
                .map(|value| param.domain.iter().position(|v| v == value))
        })
        .collect()
}
