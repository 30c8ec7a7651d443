//! Query objects.
//!
//! The remote service treats a query as an arbitrary JSON object. [`Query`]
//! wraps such an object; [`QueryBuilder`] assembles one from filters,
//! aggregations and free-form fields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::filter::Filter;
use crate::types::error::json_kind;
use crate::types::ProtoError;

pub const FILTERS_KEY: &str = "filters";
pub const AGGREGATIONS_KEY: &str = "aggregations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunc {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
}

impl AggregationFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationFunc::Sum => "sum",
            AggregationFunc::Mean => "mean",
            AggregationFunc::Median => "median",
            AggregationFunc::Min => "min",
            AggregationFunc::Max => "max",
            AggregationFunc::Count => "count",
        }
    }
}

/// Aggregation applied to one variable of the result.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Aggregation {
    pub aggregation_func: AggregationFunc,
    pub variable_name: String,
}

impl Aggregation {
    pub fn new(aggregation_func: AggregationFunc, variable_name: impl Into<String>) -> Self {
        Self {
            aggregation_func,
            variable_name: variable_name.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "aggregation_func": self.aggregation_func.as_str(),
            "variable_name": self.variable_name,
        })
    }
}

/// An opaque JSON query object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Query(Map<String, Value>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Wrap an existing JSON value. Only objects are accepted.
    pub fn from_json(value: Value) -> Result<Self, ProtoError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProtoError::QueryNotObject(json_kind(&other))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Decode the filters embedded in this query, if any.
    pub fn filters(&self) -> Result<Vec<Filter>, ProtoError> {
        match self.0.get(FILTERS_KEY) {
            Some(value) => Ok(Vec::<Filter>::deserialize(value)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Query {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Open builder for [`Query`].
///
/// Filters and aggregations are written under `filters` / `aggregations` and
/// take precedence over free-form fields with the same key.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    filters: Vec<Filter>,
    aggregations: Vec<Aggregation>,
    fields: Map<String, Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    /// Set an arbitrary top-level field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Validate every filter added so far.
    pub fn validate(&self) -> Result<(), ProtoError> {
        self.filters.iter().try_for_each(Filter::validate)
    }

    pub fn build(&self) -> Query {
        let mut map = self.fields.clone();
        map.insert(
            FILTERS_KEY.to_string(),
            Value::Array(self.filters.iter().map(Filter::to_json).collect()),
        );
        if !self.aggregations.is_empty() {
            map.insert(
                AGGREGATIONS_KEY.to_string(),
                Value::Array(self.aggregations.iter().map(Aggregation::to_json).collect()),
            );
        }
        Query(map)
    }

    pub fn to_json(&self) -> Value {
        self.build().to_json()
    }
}
