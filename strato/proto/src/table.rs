use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::error::json_kind;
use crate::types::{FromScalar, ProtoError, Scalar};

/// Column-oriented result table.
///
/// Every column has `len()` cells and column names are unique. Both hold for
/// deserialized tables as well, which are checked on the way in.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
#[serde(try_from = "RawTable")]
pub struct Table {
    names: Vec<String>,
    cols: Vec<Vec<Scalar>>,
    size: usize,
}

#[derive(Deserialize)]
struct RawTable {
    names: Vec<String>,
    cols: Vec<Vec<Scalar>>,
    size: usize,
}

impl TryFrom<RawTable> for Table {
    type Error = ProtoError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let has_cols = !raw.cols.is_empty();
        let mut table = Table::new(raw.names, raw.cols)?;
        if has_cols && table.size != raw.size {
            return Err(ProtoError::NotTabular(format!(
                "size {} does not match {} rows",
                raw.size, table.size
            )));
        }
        // a table without columns can still count rows
        table.size = raw.size;
        Ok(table)
    }
}

/// Shapes the API uses for `data`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableShape {
    Null(()),
    Records(Vec<Map<String, Value>>),
    Columns(Map<String, Value>),
}

fn check_unique(names: &[String]) -> Result<(), ProtoError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ProtoError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

/// Cell type inferred from CSV text: empty is nil, then integer, float,
/// boolean, and text as the fallback.
fn scalar_from_csv(field: &str) -> Scalar {
    if field.is_empty() {
        return Scalar::Nil;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Scalar::Int(i);
    }
    if let Ok(f) = field.parse::<f64>() {
        return Scalar::Float(f);
    }
    match field {
        "true" | "True" | "TRUE" => Scalar::Bool(true),
        "false" | "False" | "FALSE" => Scalar::Bool(false),
        _ => Scalar::Text(field.to_string()),
    }
}

impl Table {
    /// Build a table from uniquely named columns of equal length.
    pub fn new(names: Vec<String>, cols: Vec<Vec<Scalar>>) -> Result<Self, ProtoError> {
        if names.len() != cols.len() {
            return Err(ProtoError::NotTabular(format!(
                "{} names for {} columns",
                names.len(),
                cols.len()
            )));
        }
        check_unique(&names)?;
        let size = cols.first().map(Vec::len).unwrap_or(0);
        for (name, col) in names.iter().zip(cols.iter()) {
            if col.len() != size {
                return Err(ProtoError::RaggedColumn {
                    column: name.clone(),
                    found: col.len(),
                    expected: size,
                });
            }
        }
        Ok(Self { names, cols, size })
    }

    /// Normalize response data into a table.
    ///
    /// The value goes through a JSON text round trip and is then read either
    /// as a list of records (`[{"col": v}, ...]`) or as a mapping of columns
    /// (`{"col": [v, ...]}`). `null` yields an empty table.
    pub fn from_json(data: &Value) -> Result<Self, ProtoError> {
        let text = serde_json::to_string(data)?;
        let shape: TableShape = serde_json::from_str(&text)
            .map_err(|_| ProtoError::NotTabular(format!("unexpected {}", json_kind(data))))?;
        match shape {
            TableShape::Null(()) => Ok(Self::default()),
            TableShape::Records(records) => Self::from_records(&records),
            TableShape::Columns(columns) => Self::from_columns(&columns),
        }
    }

    /// Build a table from records. Columns appear in first-seen key order;
    /// keys missing from a record become `Nil` cells.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, ProtoError> {
        let mut names: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for record in records {
            for key in record.keys() {
                if !index.contains_key(key.as_str()) {
                    index.insert(key.as_str(), names.len());
                    names.push(key.clone());
                }
            }
        }

        let mut cols = vec![Vec::with_capacity(records.len()); names.len()];
        for (row, record) in records.iter().enumerate() {
            for (name, col) in names.iter().zip(cols.iter_mut()) {
                let cell = match record.get(name) {
                    Some(value) => Scalar::from_json(value).ok_or_else(|| ProtoError::NestedCell {
                        column: name.clone(),
                        row,
                    })?,
                    None => Scalar::Nil,
                };
                col.push(cell);
            }
        }

        Ok(Self {
            names,
            cols,
            size: records.len(),
        })
    }

    /// Build a table from a mapping of column name to array of cells.
    pub fn from_columns(columns: &Map<String, Value>) -> Result<Self, ProtoError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        for (name, value) in columns {
            let Value::Array(items) = value else {
                return Err(ProtoError::NotTabular(format!(
                    "column `{name}` is {}, expected array",
                    json_kind(value)
                )));
            };
            let col = items
                .iter()
                .enumerate()
                .map(|(row, item)| {
                    Scalar::from_json(item).ok_or_else(|| ProtoError::NestedCell {
                        column: name.clone(),
                        row,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            names.push(name.clone());
            cols.push(col);
        }
        Self::new(names, cols)
    }

    /// Read CSV with a header row. Cell types are inferred per cell.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, ProtoError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);
        let names = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut cols = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record?;
            for (col, field) in cols.iter_mut().zip(record.iter()) {
                col.push(scalar_from_csv(field));
            }
        }
        Self::new(names, cols)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vec<Scalar>] {
        &self.cols
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Scalar]> {
        self.position(name)
            .and_then(|idx| self.cols.get(idx))
            .map(Vec::as_slice)
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&Scalar> {
        self.column(name).and_then(|col| col.get(row))
    }

    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        if idx >= self.size {
            return None;
        }
        let cells = self
            .cols
            .iter()
            .map(|col| col.get(idx))
            .collect::<Option<Vec<_>>>()?;
        Some(Row {
            names: &self.names,
            cells,
        })
    }

    pub fn iter(&self) -> TableIter<'_> {
        TableIter {
            names: &self.names,
            cols: self.cols.iter().map(|col| col.iter()).collect(),
            remaining: self.size,
        }
    }

    pub fn take(&self, limit: Option<usize>) -> Vec<Row<'_>> {
        let iter = self.iter();
        if let Some(limit) = limit {
            iter.take(limit).collect::<Vec<_>>()
        } else {
            iter.collect::<Vec<_>>()
        }
    }

    /// Upper-case every column name. Fails without changing the table when
    /// two names only differ by case.
    pub fn uppercase_names(&mut self) -> Result<(), ProtoError> {
        let upper = self
            .names
            .iter()
            .map(|name| name.to_uppercase())
            .collect::<Vec<_>>();
        check_unique(&upper)?;
        self.names = upper;
        Ok(())
    }

    pub fn with_uppercase_names(mut self) -> Result<Self, ProtoError> {
        self.uppercase_names()?;
        Ok(self)
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    names: &'a [String],
    cells: Vec<&'a Scalar>,
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Scalar> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.cells.get(idx).copied())
    }

    pub fn get_as<T: FromScalar>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_scalar)
    }

    pub fn cells(&self) -> &[&'a Scalar] {
        &self.cells
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.names
            .iter()
            .cloned()
            .zip(self.cells.iter().map(|cell| cell.to_json()))
            .collect()
    }
}

pub struct TableIter<'a> {
    names: &'a [String],
    cols: Vec<std::slice::Iter<'a, Scalar>>,
    remaining: usize,
}

impl<'a> Iterator for TableIter<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let cells = self
            .cols
            .iter_mut()
            .map(|col| col.next())
            .collect::<Option<Vec<_>>>()?;
        Some(Row {
            names: self.names,
            cells,
        })
    }
}
