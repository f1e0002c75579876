//! Exhaustive matrix generation with include/exclude lists.
//!
//! The base product runs over every domain in parameter order, depth first.
//! Each include then runs a product of its own, with its listed parameters
//! replaced by the include's values. Combinations already produced by an
//! earlier product are skipped.
//!
//! An exclude matches once each of its listed parameters is assigned one
//! of the listed values. It is tested against partial assignments, so a
//! match prunes the whole subtree.

use std::collections::BTreeMap;

use tmatrix_ir::{DomainSpec, ParameterSpace, Value};

use super::TestCase;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    #[error("unknown parameter '{name}' in matrix {kind}")]
    UnknownParameter { name: String, kind: &'static str },
}

/// Allowed values per parameter position.
#[derive(Debug, Clone, PartialEq)]
struct Pattern {
    slots: Vec<(usize, Vec<Value>)>,
}

impl Pattern {
    fn resolve(
        space: &ParameterSpace,
        raw: BTreeMap<String, DomainSpec>,
        kind: &'static str,
    ) -> Result<Self, MatrixError> {
        let mut slots = Vec::with_capacity(raw.len());
        for (name, domain) in raw {
            let param = space
                .index_of(&name)
                .ok_or(MatrixError::UnknownParameter { name, kind })?;
            slots.push((param, domain.into_values()));
        }
        Ok(Self { slots })
    }

    /// Matches once every slot is assigned one of its values.
    fn matches(&self, partial: &[Value]) -> bool {
        self.slots
            .iter()
            .all(|(param, allowed)| partial.get(*param).is_some_and(|v| allowed.contains(v)))
    }
}

/// Full cartesian product of a parameter space.
#[derive(Debug, Clone)]
pub struct MatrixGenerator {
    space: ParameterSpace,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl MatrixGenerator {
    pub fn new(space: ParameterSpace) -> Self {
        Self {
            space,
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Builder-style: add extra value sets to run after the base product.
    pub fn with_includes(
        mut self,
        includes: Vec<BTreeMap<String, DomainSpec>>,
    ) -> Result<Self, MatrixError> {
        for include in includes {
            self.includes
                .push(Pattern::resolve(&self.space, include, "include")?);
        }
        Ok(self)
    }

    /// Builder-style: add combinations to skip.
    pub fn with_excludes(
        mut self,
        excludes: Vec<BTreeMap<String, DomainSpec>>,
    ) -> Result<Self, MatrixError> {
        for exclude in excludes {
            self.excludes
                .push(Pattern::resolve(&self.space, exclude, "exclude")?);
        }
        Ok(self)
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn names(&self) -> Vec<&str> {
        self.space.names()
    }

    /// Lazily iterate all cases. Each call starts from the beginning.
    pub fn cases(&self) -> MatrixCases<'_> {
        let base: Vec<Vec<Value>> = self
            .space
            .parameters()
            .iter()
            .map(|p| p.domain.clone())
            .collect();

        let mut sets = vec![base.clone()];
        for include in &self.includes {
            let mut set = base.clone();
            for (param, values) in &include.slots {
                set[*param] = values.clone();
            }
            sets.push(set);
        }

        MatrixCases {
            space: &self.space,
            sets,
            excludes: self.excludes.clone(),
            set: 0,
            entered: false,
            cursor: Vec::new(),
            partial: Vec::new(),
        }
    }
}

/// Depth-first walk over each value set in turn.
#[derive(Debug)]
pub struct MatrixCases<'g> {
    space: &'g ParameterSpace,
    sets: Vec<Vec<Vec<Value>>>,
    /// Caller excludes, plus every value set already walked.
    excludes: Vec<Pattern>,
    set: usize,
    entered: bool,
    /// Next value index to try at each depth.
    cursor: Vec<usize>,
    partial: Vec<Value>,
}

impl MatrixCases<'_> {
    fn excluded(&self) -> bool {
        self.excludes.iter().any(|e| e.matches(&self.partial))
    }

    fn emit(&self) -> TestCase {
        TestCase {
            assignments: self
                .space
                .parameters()
                .iter()
                .zip(&self.partial)
                .map(|(p, v)| (p.name.clone(), v.clone()))
                .collect(),
        }
    }

    /// Close the current value set; later sets skip what it produced.
    fn finish_set(&mut self) {
        let slots = self.sets[self.set].iter().cloned().enumerate().collect();
        self.excludes.push(Pattern { slots });
        self.set += 1;
        self.entered = false;
        self.cursor.clear();
        self.partial.clear();
    }
}

impl Iterator for MatrixCases<'_> {
    type Item = TestCase;

    fn next(&mut self) -> Option<TestCase> {
        let n = self.space.len();

        while self.set < self.sets.len() {
            if !self.entered {
                self.entered = true;
                if self.excluded() {
                    self.finish_set();
                    continue;
                }
                if n == 0 {
                    let case = self.emit();
                    self.finish_set();
                    return Some(case);
                }
                self.cursor.push(0);
            }

            let Some(&index) = self.cursor.last() else {
                self.finish_set();
                continue;
            };
            let depth = self.cursor.len() - 1;

            if index >= self.sets[self.set][depth].len() {
                self.cursor.pop();
                self.partial.pop();
                continue;
            }

            self.cursor[depth] += 1;
            self.partial.push(self.sets[self.set][depth][index].clone());

            if self.excluded() {
                self.partial.pop();
                continue;
            }
            if self.partial.len() == n {
                let case = self.emit();
                self.partial.pop();
                return Some(case);
            }
            self.cursor.push(0);
        }

        None
    }
}
