pub mod aetg;
pub mod builder;
pub mod coverage;
pub mod matrix;
pub mod rng;
pub mod universe;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tmatrix_ir::{ParameterSpace, Value};

/// One generated case: a value for every parameter.
/// Assignments are kept in parameter-space order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestCase {
    pub assignments: Vec<(String, Value)>,
}

impl TestCase {
    /// Build from per-parameter value positions.
    pub(crate) fn from_positions(space: &ParameterSpace, positions: &[usize]) -> Self {
        Self {
            assignments: positions
                .iter()
                .enumerate()
                .map(|(param, &value)| {
                    (
                        space.name(param).to_string(),
                        space.domain(param)[value].clone(),
                    )
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Values in parameter order.
    pub fn tuple(&self) -> Vec<Value> {
        self.assignments.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn into_tuple(self) -> Vec<Value> {
        self.assignments.into_iter().map(|(_, v)| v).collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.assignments.iter().cloned().collect()
    }
}
