//! Hyperparameter search spaces and exhaustive grid expansion.

use crate::error::MlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Non-negative integer; floats with no fractional part are accepted.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(v) => usize::try_from(*v).ok(),
            Self::Float(v) if v.fract() == 0.0 && *v >= 0.0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `null`, or the text `none` in any case (TOML has no null).
    pub fn is_none(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.eq_ignore_ascii_case("none"),
            _ => false,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "None"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(s) if s.eq_ignore_ascii_case("none") => write!(f, "None"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One concrete hyperparameter assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(pub BTreeMap<String, ParamValue>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Parameter name to ordered candidate values. Names iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace(BTreeMap<String, Vec<ParamValue>>);

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, values: Vec<ParamValue>) -> Self {
        self.0.insert(name.to_string(), values);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn candidates(&self, name: &str) -> Option<&[ParamValue]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Number of grid points.
    pub fn size(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    /// Reject empty candidate lists and names outside `allowed`.
    pub fn validate(&self, model: &str, allowed: &[&str]) -> Result<(), MlError> {
        for (name, values) in &self.0 {
            let param = format!("models.search_spaces.{model}.{name}");
            if !allowed.contains(&name.as_str()) {
                return Err(MlError::config(
                    param,
                    format!("unknown hyperparameter; expected one of {allowed:?}"),
                ));
            }
            if values.is_empty() {
                return Err(MlError::config(param, "candidate list is empty"));
            }
        }
        Ok(())
    }

    /// Every combination, last name varying fastest.
    pub fn grid(&self) -> Vec<Params> {
        let mut grid = vec![Params::default()];
        for (name, values) in &self.0 {
            let mut expanded = Vec::with_capacity(grid.len() * values.len());
            for partial in &grid {
                for value in values {
                    let mut params = partial.clone();
                    params.0.insert(name.clone(), value.clone());
                    expanded.push(params);
                }
            }
            grid = expanded;
        }
        grid
    }
}

impl fmt::Display for SearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, values)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
            write!(f, "{name}: [{}]", rendered.join(", "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn svm_space() -> SearchSpace {
        SearchSpace::new()
            .with("kernel", vec!["linear".into(), "rbf".into()])
            .with("C", vec![0.1.into(), 1.0.into(), 10.0.into()])
    }

    #[test]
    fn test_grid_is_cartesian_product() {
        let space = svm_space();
        let grid = space.grid();
        assert_eq!(grid.len(), 6);
        assert_eq!(space.size(), 6);
        // Sorted names: "C" before "kernel"; kernel varies fastest.
        assert_eq!(grid[0].to_string(), "{C: 0.1, kernel: linear}");
        assert_eq!(grid[1].to_string(), "{C: 0.1, kernel: rbf}");
        assert_eq!(grid[5].to_string(), "{C: 10.0, kernel: rbf}");
    }

    #[test]
    fn test_empty_space_has_one_point() {
        assert_eq!(SearchSpace::new().grid(), vec![Params::default()]);
    }

    #[test]
    fn test_validate() {
        let space = svm_space();
        assert!(space.validate("svm", &["C", "kernel"]).is_ok());

        let err = space.validate("svm", &["C"]).unwrap_err();
        assert!(err.to_string().contains("models.search_spaces.svm.kernel"));

        let empty = SearchSpace::new().with("C", vec![]);
        assert!(empty.validate("svm", &["C"]).is_err());
    }

    #[test]
    fn test_param_value_accessors() {
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Float(20.0).as_usize(), Some(20));
        assert_eq!(ParamValue::Float(2.5).as_usize(), None);
        assert_eq!(ParamValue::Int(-1).as_usize(), None);
        assert!(ParamValue::Null.is_none());
        assert!(ParamValue::from("None").is_none());
        assert_eq!(ParamValue::Null.to_string(), "None");
    }

    #[test]
    fn test_search_space_from_json() {
        let space: SearchSpace =
            serde_json::from_str(r#"{"max_depth": [null, 10], "n_estimators": [50]}"#).unwrap();
        assert_eq!(space.candidates("max_depth"), Some(&[ParamValue::Null, ParamValue::Int(10)][..]));
        assert_eq!(space.to_string(), "{max_depth: [None, 10], n_estimators: [50]}");
    }
}
