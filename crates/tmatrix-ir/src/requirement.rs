//! Coverage requirements and their normalization.
//!
//! A requirement names a group of parameters whose values must appear
//! together in at least one generated case. Normalization:
//! 1. Canonicalize members into space order (duplicates collapse).
//! 2. Sort by `(arity, members)` descending. Members are positions, so ties
//!    break by space order, which follows an explicit `order` rather than
//!    the alphabetical order of names.
//! 3. Keep a requirement only if it is not a subset of one already kept.
//! 4. Reverse into ascending processing order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ModelError, ParameterSpace};

/// Why a requirement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementIssue {
    #[error("requirement names no parameters")]
    Empty,

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("parameter position {0} is outside the space")]
    OutOfRange(usize),
}

/// A group of parameters that must be covered jointly.
///
/// Members are parameter positions in [`ParameterSpace`] order, sorted and
/// distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Requirement {
    members: Vec<usize>,
}

impl Requirement {
    /// Resolve parameter names against `space`.
    pub fn resolve<S: AsRef<str>>(
        space: &ParameterSpace,
        names: &[S],
    ) -> Result<Self, ModelError> {
        let raw = || names.iter().map(|n| n.as_ref().to_string()).collect();

        if names.is_empty() {
            return Err(ModelError::InvalidRequirement {
                requirement: raw(),
                reason: RequirementIssue::Empty,
            });
        }

        let mut members = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let idx = space
                .index_of(name)
                .ok_or_else(|| ModelError::InvalidRequirement {
                    requirement: raw(),
                    reason: RequirementIssue::UnknownParameter(name.to_string()),
                })?;
            members.push(idx);
        }

        Ok(Self::from_members(members))
    }

    /// Build from parameter positions; members are sorted and deduplicated.
    pub fn from_members(mut members: Vec<usize>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn arity(&self) -> usize {
        self.members.len()
    }

    pub fn names<'a>(&self, space: &'a ParameterSpace) -> Vec<&'a str> {
        self.members.iter().map(|&m| space.name(m)).collect()
    }

    /// Non-strict subset test. Both member lists are sorted.
    pub fn is_subset_of(&self, other: &Requirement) -> bool {
        let mut theirs = other.members.iter();
        self.members
            .iter()
            .all(|m| theirs.by_ref().any(|o| o == m))
    }
}

/// All `k`-combinations of `0..n`, in lexicographic order.
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        result.push(current.clone());

        // Find the rightmost slot that can still advance.
        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if current[i] < n - k + i {
                break;
            }
        }
        current[i] += 1;
        for j in (i + 1)..k {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// A normalized requirement list in ascending processing order.
///
/// No member is a subset of another, and the order is fixed:
/// ascending by `(arity, members)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RequirementSet {
    requirements: Vec<Requirement>,
}

impl RequirementSet {
    /// Pairwise coverage: every `min(2, n)`-combination of parameters.
    pub fn pairwise(space: &ParameterSpace) -> Self {
        Self::with_level(space, 2)
    }

    /// Every `min(level, n)`-combination of parameters.
    ///
    /// An empty space, or `level == 0`, yields no requirements.
    pub fn with_level(space: &ParameterSpace, level: usize) -> Self {
        let k = level.min(space.len());
        if k == 0 {
            return Self::default();
        }
        Self::normalize(
            combinations(space.len(), k)
                .into_iter()
                .map(Requirement::from_members)
                .collect(),
        )
    }

    /// Resolve explicit name groups against `space` and normalize them.
    pub fn from_names<I, R, S>(space: &ParameterSpace, groups: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let requirements = groups
            .into_iter()
            .map(|group| Requirement::resolve(space, group.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::normalize(requirements))
    }

    /// Drop duplicates and subsumed requirements, then fix the order.
    ///
    /// Requirements of equal arity are ordered by member positions, not by
    /// member names. With an explicit parameter order the result of
    /// [`RequirementSet::names`] can therefore differ from sorting the name
    /// groups alphabetically.
    pub fn normalize(mut requirements: Vec<Requirement>) -> Self {
        let supplied = requirements.len();
        requirements.sort_by(|a, b| (b.arity(), &b.members).cmp(&(a.arity(), &a.members)));

        let mut kept: Vec<Requirement> = Vec::with_capacity(requirements.len());
        for req in requirements {
            if !kept.iter().any(|k| req.is_subset_of(k)) {
                kept.push(req);
            }
        }
        kept.reverse();

        debug!(supplied, kept = kept.len(), "normalized requirements");
        Self { requirements: kept }
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Requirement> {
        self.requirements.iter()
    }

    pub fn as_slice(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Largest arity in the set (0 when empty).
    pub fn max_arity(&self) -> usize {
        self.requirements.last().map_or(0, Requirement::arity)
    }

    /// Member names of every requirement, for display.
    pub fn names<'a>(&self, space: &'a ParameterSpace) -> Vec<Vec<&'a str>> {
        self.requirements.iter().map(|r| r.names(space)).collect()
    }
}

impl<'a> IntoIterator for &'a RequirementSet {
    type Item = &'a Requirement;
    type IntoIter = std::slice::Iter<'a, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}
