pub mod parse;
pub mod requirement;
pub mod types;

pub use requirement::{Requirement, RequirementIssue, RequirementSet};
pub use types::{DomainSpec, Float, ModelError, Parameter, ParameterSpace, Value};
