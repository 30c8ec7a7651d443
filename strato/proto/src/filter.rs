//! Filter descriptors for analytics queries.
//!
//! A filter is one predicate `{operator, variable, value}`. The builders here
//! are pure and permissive: they never inspect `value`. Callers that want the
//! shape checked can use [`make_checked_filter`] or [`Filter::validate`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::{ProtoError, Scalar};

/// Comparison operator of a filter, serialized by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
    In,
    Nin,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::In => "in",
            Operator::Nin => "nin",
        }
    }

    /// Set operators take a sequence of values, all others a single scalar.
    pub fn is_set(&self) -> bool {
        matches!(self, Operator::In | Operator::Nin)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            other => Err(ProtoError::UnknownOperator(other.to_string())),
        }
    }
}

/// Operand of a filter: one scalar or an ordered sequence of scalars.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum FilterValue {
    Single(Scalar),
    Many(Vec<Scalar>),
}

impl FilterValue {
    pub fn is_sequence(&self) -> bool {
        matches!(self, FilterValue::Many(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Single(s) => s.to_json(),
            FilterValue::Many(items) => Value::Array(items.iter().map(Scalar::to_json).collect()),
        }
    }
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        FilterValue::Many(values)
    }
}

/// One query predicate.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Filter {
    operator: Operator,
    variable: String,
    value: FilterValue,
}

impl Filter {
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Check that `variable` is non-empty and that the operand shape matches
    /// the operator.
    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.variable.is_empty() {
            return Err(ProtoError::EmptyVariable);
        }
        match (self.operator.is_set(), self.value.is_sequence()) {
            (true, false) => Err(ProtoError::InvalidFilterShape {
                operator: self.operator,
                expected: "a sequence of values",
            }),
            (false, true) => Err(ProtoError::InvalidFilterShape {
                operator: self.operator,
                expected: "a single value",
            }),
            _ => Ok(()),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "operator": self.operator.as_str(),
            "variable": self.variable,
            "value": self.value.to_json(),
        })
    }
}

/// Build a filter without checking the operand shape.
pub fn make_filter(
    operator: Operator,
    variable: impl Into<String>,
    value: impl Into<FilterValue>,
) -> Filter {
    Filter {
        operator,
        variable: variable.into(),
        value: value.into(),
    }
}

/// Build a filter and validate it.
pub fn make_checked_filter(
    operator: Operator,
    variable: impl Into<String>,
    value: impl Into<FilterValue>,
) -> Result<Filter, ProtoError> {
    let filter = make_filter(operator, variable, value);
    filter.validate()?;
    Ok(filter)
}

fn single(operator: Operator, variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    make_filter(operator, variable, FilterValue::Single(value.into()))
}

fn many<I>(operator: Operator, variable: impl Into<String>, values: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Scalar>,
{
    let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
    make_filter(operator, variable, FilterValue::Many(values))
}

/// `variable < value`
pub fn lt_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Lt, variable, value)
}

/// `variable <= value`
pub fn lte_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Lte, variable, value)
}

/// `variable > value`
pub fn gt_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Gt, variable, value)
}

/// `variable >= value`
pub fn gte_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Gte, variable, value)
}

/// `variable == value`
pub fn eq_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Eq, variable, value)
}

/// `variable != value`
pub fn ne_filter(variable: impl Into<String>, value: impl Into<Scalar>) -> Filter {
    single(Operator::Ne, variable, value)
}

/// `variable` is one of `values`
pub fn in_filter<I>(variable: impl Into<String>, values: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Scalar>,
{
    many(Operator::In, variable, values)
}

/// `variable` is none of `values`
pub fn nin_filter<I>(variable: impl Into<String>, values: I) -> Filter
where
    I: IntoIterator,
    I::Item: Into<Scalar>,
{
    many(Operator::Nin, variable, values)
}
