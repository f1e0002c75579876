use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::requirement::RequirementSet;
use crate::types::{DomainSpec, ModelError, ParameterSpace};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

/// A matrix definition as written in JSON.
///
/// ```json
/// {
///   "parameters": { "a": [1, 2, 3], "b": ["x", "y"], "c": true },
///   "order": ["b"],
///   "requirements": [["a", "b"], ["c"]],
///   "exclude": [{ "a": [3], "b": ["y"] }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixDefinition {
    pub parameters: BTreeMap<String, DomainSpec>,
    /// Leading parameter order; unlisted names follow sorted.
    #[serde(default)]
    pub order: Vec<String>,
    /// Explicit requirements; `None` means pairwise.
    #[serde(default)]
    pub requirements: Option<Vec<Vec<String>>>,
    /// Extra value sets for exhaustive mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<BTreeMap<String, DomainSpec>>,
    /// Combinations exhaustive mode skips.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<BTreeMap<String, DomainSpec>>,
}

impl MatrixDefinition {
    pub fn space(&self) -> Result<ParameterSpace, ModelError> {
        ParameterSpace::with_order(self.parameters.clone(), &self.order)
    }

    pub fn requirement_set(&self, space: &ParameterSpace) -> Result<RequirementSet, ModelError> {
        match &self.requirements {
            Some(groups) => RequirementSet::from_names(space, groups),
            None => Ok(RequirementSet::pairwise(space)),
        }
    }

    /// Validate the definition and return its space and normalized requirements.
    pub fn build(&self) -> Result<(ParameterSpace, RequirementSet), ModelError> {
        let space = self.space()?;
        let requirements = self.requirement_set(&space)?;
        Ok((space, requirements))
    }
}

pub fn parse_definition(json: &str) -> Result<MatrixDefinition, ParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse and validate in one step.
pub fn parse_model(json: &str) -> Result<(ParameterSpace, RequirementSet), ParseError> {
    Ok(parse_definition(json)?.build()?)
}
