//! Parameter domains and the ordered parameter space.
//!
//! A [`ParameterSpace`] fixes the parameter-name order once. Everything
//! downstream (requirements, obligations, generated cases) refers to
//! parameters by their position in that order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::requirement::RequirementIssue;

/// A concrete value from a parameter domain.
///
/// Values are opaque to the generator: only equality and hashing matter.
/// `Tuple` carries the grouped values of a composite key. JSON numbers with
/// a fractional part or exponent read as [`Float`]; integers stay `Int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(Float),
    Str(String),
    Tuple(Vec<Value>),
}

/// An `f64` domain value with bitwise equality and total ordering.
///
/// `0.0` and `-0.0` are distinct values, and `NaN` equals itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Float(pub f64);

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float {}

impl std::hash::Hash for Float {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{:?}", x.0),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(Float(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}

/// A domain as the caller writes it: a single value or a list of values.
///
/// A single value is a one-element domain. In JSON an array is always read
/// as a list of values, never as one tuple value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainSpec {
    Many(Vec<Value>),
    Single(Value),
}

impl DomainSpec {
    pub fn into_values(self) -> Vec<Value> {
        match self {
            DomainSpec::Many(values) => values,
            DomainSpec::Single(value) => vec![value],
        }
    }
}

impl From<Value> for DomainSpec {
    fn from(value: Value) -> Self {
        DomainSpec::Single(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for DomainSpec {
    fn from(values: Vec<T>) -> Self {
        DomainSpec::Many(values.into_iter().map(Into::into).collect())
    }
}

impl From<RangeInclusive<i64>> for DomainSpec {
    fn from(range: RangeInclusive<i64>) -> Self {
        DomainSpec::Many(range.map(Value::Int).collect())
    }
}

impl From<Range<i64>> for DomainSpec {
    fn from(range: Range<i64>) -> Self {
        DomainSpec::Many(range.map(Value::Int).collect())
    }
}

/// A named parameter with its ordered domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub domain: Vec<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, domain: impl Into<DomainSpec>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into().into_values(),
        }
    }
}

/// Errors raised while building the domain model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("parameter '{name}' has an empty domain")]
    InvalidDomain { name: String },

    #[error("parameter '{name}' lists value {value} more than once")]
    DuplicateValue { name: String, value: Value },

    #[error("parameter '{name}' is defined more than once")]
    DuplicateParameter { name: String },

    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("invalid requirement {requirement:?}: {reason}")]
    InvalidRequirement {
        /// Members as written; a position outside the space shows as `#<index>`.
        requirement: Vec<String>,
        reason: RequirementIssue,
    },
}

/// The validated, ordered set of parameters a generator works over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ParameterSpace {
    /// Build a space that keeps the given parameter order.
    pub fn new(parameters: Vec<Parameter>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(parameters.len());

        for (i, param) in parameters.iter().enumerate() {
            if index.insert(param.name.clone(), i).is_some() {
                return Err(ModelError::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
            if param.domain.is_empty() {
                return Err(ModelError::InvalidDomain {
                    name: param.name.clone(),
                });
            }
            let mut seen = HashSet::with_capacity(param.domain.len());
            for value in &param.domain {
                if !seen.insert(value) {
                    return Err(ModelError::DuplicateValue {
                        name: param.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        Ok(Self { parameters, index })
    }

    /// Build a space from `name -> domain` pairs, ordered by sorted name.
    pub fn from_domains<I, K, D>(domains: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<DomainSpec>,
    {
        let mut sorted: BTreeMap<String, DomainSpec> = BTreeMap::new();
        for (name, domain) in domains {
            let name = name.into();
            if sorted.contains_key(&name) {
                return Err(ModelError::DuplicateParameter { name });
            }
            sorted.insert(name, domain.into());
        }

        Self::new(
            sorted
                .into_iter()
                .map(|(name, domain)| Parameter::new(name, domain))
                .collect(),
        )
    }

    /// Build a space whose leading names follow `order`.
    ///
    /// Parameters missing from `order` follow in sorted name order.
    pub fn with_order<S: AsRef<str>>(
        domains: BTreeMap<String, DomainSpec>,
        order: &[S],
    ) -> Result<Self, ModelError> {
        let mut remaining = domains;
        let mut parameters = Vec::with_capacity(remaining.len());

        for name in order {
            let name = name.as_ref();
            match remaining.remove(name) {
                Some(domain) => parameters.push(Parameter::new(name, domain)),
                None if parameters.iter().any(|p: &Parameter| p.name == name) => {
                    return Err(ModelError::DuplicateParameter {
                        name: name.to_string(),
                    });
                }
                None => {
                    return Err(ModelError::UnknownParameter {
                        name: name.to_string(),
                    });
                }
            }
        }
        parameters.extend(
            remaining
                .into_iter()
                .map(|(name, domain)| Parameter::new(name, domain)),
        );

        Self::new(parameters)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameter names in space order.
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).map(|i| &self.parameters[i])
    }

    /// Domain of the parameter at position `param`.
    ///
    /// Panics if `param` is out of range.
    pub fn domain(&self, param: usize) -> &[Value] {
        &self.parameters[param].domain
    }

    pub fn name(&self, param: usize) -> &str {
        &self.parameters[param].name
    }

    /// Size of the full cartesian product, saturating at `usize::MAX`.
    pub fn cartesian_size(&self) -> usize {
        self.parameters
            .iter()
            .fold(1usize, |acc, p| acc.saturating_mul(p.domain.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_domains_sorts_names() {
        let space = ParameterSpace::from_domains([
            ("r", DomainSpec::from(vec![3, 4, 5])),
            ("a", DomainSpec::from(vec![1, 2, 3])),
            ("b", DomainSpec::from(vec!["a", "b"])),
        ])
        .unwrap();

        assert_eq!(space.names(), vec!["a", "b", "r"]);
        assert_eq!(space.index_of("r"), Some(2));
        assert_eq!(space.domain(1), &[Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_single_value_is_one_element_domain() {
        let space = ParameterSpace::from_domains([("x", Value::from(7))]).unwrap();
        assert_eq!(space.domain(0), &[Value::Int(7)]);
    }

    #[test]
    fn test_empty_domain_rejected() {
        let err = ParameterSpace::new(vec![Parameter::new("x", Vec::<Value>::new())]).unwrap_err();
        assert_eq!(err, ModelError::InvalidDomain { name: "x".into() });
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let err = ParameterSpace::new(vec![Parameter::new("x", vec![1, 2, 1])]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateValue { ref name, .. } if name == "x"));
    }

    #[test]
    fn test_with_order_keeps_explicit_names_first() {
        let mut domains = BTreeMap::new();
        domains.insert("a".to_string(), DomainSpec::from(vec![1, 2]));
        domains.insert("b".to_string(), DomainSpec::from(vec![3, 4]));
        domains.insert("c".to_string(), DomainSpec::from(vec![5, 6]));

        let space = ParameterSpace::with_order(domains.clone(), &["c", "a"]).unwrap();
        assert_eq!(space.names(), vec!["c", "a", "b"]);

        let err = ParameterSpace::with_order(domains.clone(), &["z"]).unwrap_err();
        assert_eq!(err, ModelError::UnknownParameter { name: "z".into() });

        let err = ParameterSpace::with_order(domains, &["a", "a"]).unwrap_err();
        assert_eq!(err, ModelError::DuplicateParameter { name: "a".into() });
    }

    #[test]
    fn test_cartesian_size() {
        let space = ParameterSpace::from_domains([
            ("a", DomainSpec::from(1..=3)),
            ("b", DomainSpec::from(vec!["a", "b"])),
            ("r", DomainSpec::from(3..6)),
        ])
        .unwrap();
        assert_eq!(space.cartesian_size(), 18);
    }

    #[test]
    fn test_value_display() {
        let v = Value::Tuple(vec![Value::Int(1), Value::from("x"), Value::Bool(true)]);
        assert_eq!(v.to_string(), "(1, \"x\", true)");

        let v = Value::Tuple(vec![Value::from(0.5), Value::from(2.0), Value::Null]);
        assert_eq!(v.to_string(), "(0.5, 2.0, null)");
    }

    #[test]
    fn test_float_values_are_totally_ordered() {
        let mut values = vec![
            Value::from(1.5),
            Value::from(-0.0),
            Value::from(0.0),
            Value::from(f64::NAN),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![Value::from(-0.0), Value::from(0.0), Value::from(1.5), Value::from(f64::NAN)]
        );
        assert_ne!(Value::from(0.0), Value::from(-0.0));
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));

        let set: HashSet<Value> = values.into_iter().collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_float_and_null_domains() {
        let space = ParameterSpace::from_domains([
            ("ratio", DomainSpec::from(vec![0.25, 0.5])),
            ("limit", DomainSpec::from(Value::Null)),
        ])
        .unwrap();
        assert_eq!(space.domain(1), &[Value::Null]);
        assert_eq!(space.domain(0)[1], Value::Float(Float(0.5)));

        let err = ParameterSpace::new(vec![Parameter::new("x", vec![0.5, 1.5, 0.5])]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateValue { ref name, .. } if name == "x"));
    }
}
