//! Mode selection and composite keys.
//!
//! A range key is either one parameter name or a group of names whose
//! values always travel together. Each key becomes one internal parameter,
//! so a group's values are never split across cases. Rows are flattened
//! back into one value per name on the way out.
//!
//! Internal parameters are named `key-0`, `key-1`, ... by key position,
//! never by user names.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tmatrix_explore::solver::rng::{entropy_rng, stream_rng};
use tmatrix_explore::solver::universe::estimated_obligations;
use tmatrix_explore::{
    AetgGenerator, CaseGenerator, CoverageReport, MatrixError, MatrixGenerator, TestCase,
};
use tmatrix_ir::parse::MatrixDefinition;
use tmatrix_ir::{ModelError, Parameter, ParameterSpace, RequirementSet, Value};
use tracing::{debug, info};

use crate::config::{ConfigError, MatrixConfig, MatrixMode};

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("composite key {key:?} expects {expected}-tuples, got {value}")]
    CompositeArity {
        key: Vec<String>,
        expected: usize,
        value: Value,
    },

    #[error("{estimated} obligations exceed the limit of {limit}")]
    TooManyObligations { estimated: usize, limit: usize },

    #[error("{size} matrix cases exceed the limit of {limit}")]
    TooManyCases { size: usize, limit: usize },
}

/// One name, or a group of names varied together.
///
/// Deserializes from `"a"` or `["b", "c"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeKey {
    Single(String),
    Group(Vec<String>),
}

impl RangeKey {
    pub fn names(&self) -> &[String] {
        match self {
            RangeKey::Single(name) => std::slice::from_ref(name),
            RangeKey::Group(names) => names,
        }
    }

    fn flatten_into(&self, value: Value, row: &mut Vec<Value>) {
        match (self, value) {
            (RangeKey::Group(_), Value::Tuple(items)) => row.extend(items),
            (_, value) => row.push(value),
        }
    }

    fn regroup(&self, values: &[Value]) -> Value {
        match self {
            RangeKey::Single(_) => values[0].clone(),
            RangeKey::Group(_) => Value::Tuple(values.to_vec()),
        }
    }
}

impl From<&str> for RangeKey {
    fn from(name: &str) -> Self {
        RangeKey::Single(name.to_string())
    }
}

impl From<String> for RangeKey {
    fn from(name: String) -> Self {
        RangeKey::Single(name)
    }
}

impl From<Vec<&str>> for RangeKey {
    fn from(names: Vec<&str>) -> Self {
        RangeKey::Group(names.into_iter().map(String::from).collect())
    }
}

/// A generated matrix: flat names and one row per case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub names: Vec<String>,
    pub cases: Vec<Vec<Value>>,
}

impl Matrix {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Rows keyed by name.
    pub fn rows(&self) -> impl Iterator<Item = BTreeMap<&str, &Value>> + '_ {
        self.cases
            .iter()
            .map(|row| self.names.iter().map(String::as_str).zip(row).collect())
    }
}

/// Validated ranges, ready for either mode.
#[derive(Debug, Clone)]
pub struct Selection {
    keys: Vec<RangeKey>,
    names: Vec<String>,
    space: ParameterSpace,
    requirements: RequirementSet,
}

impl Selection {
    /// Check the ranges and build the internal parameter space.
    ///
    /// Requirements are every `min(level, keys)`-combination of keys.
    pub fn new(ranges: Vec<(RangeKey, Vec<Value>)>, level: usize) -> Result<Self, SelectError> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut keys = Vec::with_capacity(ranges.len());
        let mut parameters = Vec::with_capacity(ranges.len());

        for (i, (key, values)) in ranges.into_iter().enumerate() {
            for name in key.names() {
                if !seen.insert(name.clone()) {
                    return Err(ModelError::DuplicateParameter { name: name.clone() }.into());
                }
                names.push(name.clone());
            }

            if let RangeKey::Group(group) = &key {
                let bad = values
                    .iter()
                    .find(|v| !matches!(v, Value::Tuple(items) if items.len() == group.len()));
                if let Some(value) = bad {
                    return Err(SelectError::CompositeArity {
                        key: group.clone(),
                        expected: group.len(),
                        value: value.clone(),
                    });
                }
            }

            parameters.push(Parameter::new(format!("key-{i}"), values));
            keys.push(key);
        }

        let space = ParameterSpace::new(parameters)?;
        let requirements = RequirementSet::with_level(&space, level);
        Ok(Self {
            keys,
            names,
            space,
            requirements,
        })
    }

    /// Flat names, in row order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Internal space: one parameter per key.
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    /// Flatten an internal case into a row.
    pub fn flatten(&self, case: TestCase) -> Vec<Value> {
        let mut row = Vec::with_capacity(self.names.len());
        for (key, value) in self.keys.iter().zip(case.into_tuple()) {
            key.flatten_into(value, &mut row);
        }
        row
    }

    /// Check a flattened matrix against this selection's requirements.
    ///
    /// Rows of the wrong width are skipped.
    pub fn measure(&self, matrix: &Matrix) -> CoverageReport {
        let cases: Vec<TestCase> = matrix
            .cases
            .iter()
            .filter(|row| row.len() == self.names.len())
            .map(|row| self.regroup(row))
            .collect();
        CoverageReport::measure(&self.space, &self.requirements, &cases)
    }

    fn regroup(&self, row: &[Value]) -> TestCase {
        let mut offset = 0;
        let assignments = self
            .keys
            .iter()
            .zip(self.space.parameters())
            .map(|(key, param)| {
                let width = key.names().len();
                let value = key.regroup(&row[offset..offset + width]);
                offset += width;
                (param.name.clone(), value)
            })
            .collect();
        TestCase { assignments }
    }
}

fn check_obligations(
    space: &ParameterSpace,
    requirements: &RequirementSet,
    config: &MatrixConfig,
) -> Result<(), SelectError> {
    let estimated = estimated_obligations(space, requirements);
    let limit = config.limits.max_obligations;
    if estimated > limit {
        return Err(SelectError::TooManyObligations { estimated, limit });
    }
    Ok(())
}

fn check_cases(space: &ParameterSpace, config: &MatrixConfig) -> Result<(), SelectError> {
    let size = space.cartesian_size();
    let limit = config.limits.max_matrix_cases;
    if size > limit {
        return Err(SelectError::TooManyCases { size, limit });
    }
    Ok(())
}

fn aetg(
    space: ParameterSpace,
    requirements: RequirementSet,
    config: &MatrixConfig,
    stream: u64,
) -> Result<AetgGenerator, SelectError> {
    let rng = match config.seed {
        Some(seed) => stream_rng(seed, stream),
        None => entropy_rng(),
    };
    Ok(AetgGenerator::new(space, requirements, rng)?)
}

/// A lazy generator for `space` in the configured mode.
///
/// `attempts` is ignored here; only [`tmatrix`] compares runs.
pub fn generator_for(
    space: ParameterSpace,
    requirements: RequirementSet,
    config: &MatrixConfig,
) -> Result<Box<dyn CaseGenerator>, SelectError> {
    config.validate()?;
    match config.mode {
        MatrixMode::Aetg => {
            check_obligations(&space, &requirements, config)?;
            Ok(Box::new(aetg(space, requirements, config, 0)?))
        }
        MatrixMode::Matrix => {
            check_cases(&space, config)?;
            Ok(Box::new(MatrixGenerator::new(space)))
        }
    }
}

/// A lazy generator for a JSON matrix definition.
///
/// Without explicit requirements the definition is covered at
/// `config.level`. Include and exclude lists apply to `matrix` mode only.
pub fn from_definition(
    definition: &MatrixDefinition,
    config: &MatrixConfig,
) -> Result<Box<dyn CaseGenerator>, SelectError> {
    config.validate()?;
    let space = definition.space()?;
    let requirements = match definition.requirements {
        Some(_) => definition.requirement_set(&space)?,
        None => RequirementSet::with_level(&space, config.level),
    };

    match config.mode {
        MatrixMode::Aetg => generator_for(space, requirements, config),
        MatrixMode::Matrix => {
            check_cases(&space, config)?;
            let generator = MatrixGenerator::new(space)
                .with_includes(definition.include.clone())?
                .with_excludes(definition.exclude.clone())?;
            Ok(Box::new(generator))
        }
    }
}

/// Generate a full matrix over `ranges`.
///
/// In `aetg` mode with `attempts > 1`, each attempt draws from its own RNG
/// stream and the shortest result wins; ties keep the earliest attempt.
pub fn tmatrix(
    ranges: Vec<(RangeKey, Vec<Value>)>,
    config: &MatrixConfig,
) -> Result<Matrix, SelectError> {
    config.validate()?;
    let selection = Selection::new(ranges, config.level)?;

    let cases: Vec<TestCase> = match config.mode {
        MatrixMode::Matrix => {
            check_cases(selection.space(), config)?;
            MatrixGenerator::new(selection.space().clone())
                .cases()
                .collect()
        }
        MatrixMode::Aetg => {
            check_obligations(selection.space(), selection.requirements(), config)?;
            let mut best: Option<Vec<TestCase>> = None;
            for stream in 0..u64::from(config.attempts) {
                let cases: Vec<TestCase> = aetg(
                    selection.space().clone(),
                    selection.requirements().clone(),
                    config,
                    stream,
                )?
                .collect();
                debug!(attempt = stream, cases = cases.len(), "finished attempt");
                if best.as_ref().map_or(true, |b| cases.len() < b.len()) {
                    best = Some(cases);
                }
            }
            best.unwrap_or_default()
        }
    };

    let matrix = Matrix {
        names: selection.names().to_vec(),
        cases: cases.into_iter().map(|c| selection.flatten(c)).collect(),
    };
    info!(
        mode = %config.mode,
        names = matrix.names.len(),
        cases = matrix.cases.len(),
        "generated test matrix"
    );
    Ok(matrix)
}
