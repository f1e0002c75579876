//! Obligation universe: every concrete value combination the requirements
//! demand, plus the per-value frequency table that guides the greedy builder.
//!
//! Obligations are keyed by (parameter position, value position) entries, so
//! equality and hashing never touch the caller's values.

use std::collections::{BTreeMap, HashSet};

use tmatrix_ir::{ParameterSpace, Requirement, RequirementSet, Value};
use tracing::debug;

/// A single (parameter, value) node, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub param: usize,
    pub value: usize,
}

/// One concrete assignment over the members of a requirement.
///
/// Entries are sorted by parameter position, which makes the encoding
/// canonical: the same entry set always compares and hashes equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Obligation {
    entries: Vec<Entry>,
}

impl Obligation {
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_unstable();
        Self { entries }
    }

    /// The obligation a full case realizes for `requirement`.
    ///
    /// `case[p]` is the value position chosen for parameter `p`.
    pub fn realized_by(requirement: &Requirement, case: &[usize]) -> Self {
        Self {
            entries: requirement
                .members()
                .iter()
                .map(|&param| Entry {
                    param,
                    value: case[param],
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn arity(&self) -> usize {
        self.entries.len()
    }

    /// Render with names and values for reports.
    pub fn describe(&self, space: &ParameterSpace) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|e| {
                (
                    space.name(e.param).to_string(),
                    space.domain(e.param)[e.value].clone(),
                )
            })
            .collect()
    }
}

/// Number of unsatisfied obligations that reference each value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCounts {
    counts: Vec<Vec<usize>>,
}

impl NodeCounts {
    fn new(space: &ParameterSpace) -> Self {
        Self {
            counts: space
                .parameters()
                .iter()
                .map(|p| vec![0; p.domain.len()])
                .collect(),
        }
    }

    pub fn get(&self, entry: Entry) -> usize {
        self.counts[entry.param][entry.value]
    }

    fn increment(&mut self, entry: Entry) {
        self.counts[entry.param][entry.value] += 1;
    }

    fn decrement(&mut self, entry: Entry) {
        let count = &mut self.counts[entry.param][entry.value];
        debug_assert!(*count > 0, "node count underflow at {entry:?}");
        *count = count.saturating_sub(1);
    }
}

/// Lazy cross-product over value positions, last position varying fastest.
#[derive(Debug, Clone)]
pub struct Odometer {
    sizes: Vec<usize>,
    current: Option<Vec<usize>>,
}

impl Odometer {
    pub fn new(sizes: Vec<usize>) -> Self {
        let current = if sizes.iter().any(|&s| s == 0) {
            None
        } else {
            Some(vec![0; sizes.len()])
        };
        Self { sizes, current }
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let mut following = current.clone();
        let mut i = following.len();
        while i > 0 {
            i -= 1;
            following[i] += 1;
            if following[i] < self.sizes[i] {
                self.current = Some(following);
                break;
            }
            following[i] = 0;
        }
        Some(current)
    }
}

/// All obligations of a requirement set, and what is still unmet.
#[derive(Debug, Clone)]
pub struct ObligationUniverse {
    unsatisfied: HashSet<Obligation>,
    node_counts: NodeCounts,
    /// Seed candidates in ascending order; consumed from the back.
    worklist: Vec<Obligation>,
    total: usize,
}

impl ObligationUniverse {
    pub fn build(space: &ParameterSpace, requirements: &RequirementSet) -> Self {
        let mut unsatisfied = HashSet::new();
        let mut node_counts = NodeCounts::new(space);

        for requirement in requirements {
            let members = requirement.members();
            let sizes = members.iter().map(|&m| space.domain(m).len()).collect();

            for values in Odometer::new(sizes) {
                let obligation = Obligation::new(
                    members
                        .iter()
                        .zip(values)
                        .map(|(&param, value)| Entry { param, value })
                        .collect(),
                );
                if unsatisfied.contains(&obligation) {
                    continue;
                }
                for &entry in obligation.entries() {
                    node_counts.increment(entry);
                }
                unsatisfied.insert(obligation);
            }
        }

        let mut worklist: Vec<Obligation> = unsatisfied.iter().cloned().collect();
        worklist.sort_unstable();
        let total = unsatisfied.len();

        debug!(
            requirements = requirements.len(),
            obligations = total,
            "built obligation universe"
        );

        Self {
            unsatisfied,
            node_counts,
            worklist,
            total,
        }
    }

    /// Total number of obligations at construction.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of obligations not yet covered by any case.
    pub fn remaining(&self) -> usize {
        self.unsatisfied.len()
    }

    pub fn is_complete(&self) -> bool {
        self.unsatisfied.is_empty()
    }

    pub fn is_unsatisfied(&self, obligation: &Obligation) -> bool {
        self.unsatisfied.contains(obligation)
    }

    pub fn node_count(&self, entry: Entry) -> usize {
        self.node_counts.get(entry)
    }

    /// Next still-unsatisfied obligation to seed a case from.
    ///
    /// Satisfied entries at the back of the work-list are discarded. The
    /// returned seed stays queued until a case actually covers it.
    pub fn next_seed(&mut self) -> Option<Obligation> {
        while let Some(candidate) = self.worklist.last() {
            if self.unsatisfied.contains(candidate) {
                return Some(candidate.clone());
            }
            self.worklist.pop();
        }
        None
    }

    /// Mark `obligation` satisfied. Returns `false` if it already was.
    pub fn satisfy(&mut self, obligation: &Obligation) -> bool {
        if !self.unsatisfied.remove(obligation) {
            return false;
        }
        for &entry in obligation.entries() {
            self.node_counts.decrement(entry);
        }
        true
    }

    /// Unsatisfied obligations in canonical order.
    pub fn unsatisfied(&self) -> Vec<&Obligation> {
        let mut open: Vec<&Obligation> = self.unsatisfied.iter().collect();
        open.sort_unstable();
        open
    }
}

/// Size of the obligation universe without building it, saturating at `usize::MAX`.
pub fn estimated_obligations(space: &ParameterSpace, requirements: &RequirementSet) -> usize {
    requirements
        .iter()
        .map(|r| {
            r.members()
                .iter()
                .fold(1usize, |acc, &m| acc.saturating_mul(space.domain(m).len()))
        })
        .fold(0usize, usize::saturating_add)
}
