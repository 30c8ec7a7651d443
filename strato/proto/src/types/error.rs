use thiserror::Error;

use crate::filter::Operator;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("filter variable must not be empty")]
    EmptyVariable,

    #[error("operator `{operator}` expects {expected}")]
    InvalidFilterShape {
        operator: Operator,
        expected: &'static str,
    },

    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),

    #[error("api token must be a single string, got {0} values")]
    TokenShape(usize),

    #[error("query must be a JSON object, got {0}")]
    QueryNotObject(&'static str),

    #[error("response data is not tabular: {0}")]
    NotTabular(String),

    #[error("column `{column}` has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        found: usize,
        expected: usize,
    },

    #[error("cell at row {row} of column `{column}` is not a scalar")]
    NestedCell { column: String, row: usize },

    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),

    #[error("invalid job request: {0}")]
    InvalidJob(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Name of a JSON value's kind, used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
