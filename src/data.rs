use std::fmt;

use crate::catalog::NumericType;

/// One cell of a resolved table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) | Value::Missing => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Values of one column after coercion. Numeric variants use `None` for
/// empty tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<String>),
}

impl ColumnData {
    /// Coerces a whole column at once. Every non-empty token has to parse for
    /// the column to become numeric; a single failure keeps all the original
    /// tokens as text. Integer parsing is only attempted for columns declared
    /// as [`NumericType::Integer`], and an integer column holding decimals
    /// falls back to float. A column of blank tokens becomes a float column
    /// with every value missing; a column without rows is left as text.
    pub fn coerce(tokens: Vec<String>, declared: NumericType) -> Self {
        if tokens.is_empty() {
            return ColumnData::Text(tokens);
        }
        if tokens.iter().all(|token| token.trim().is_empty()) {
            return ColumnData::Float(vec![None; tokens.len()]);
        }
        if declared == NumericType::Integer
            && let Some(parsed) = parse_all::<i64>(&tokens)
        {
            return ColumnData::Integer(parsed);
        }
        match parse_all::<f64>(&tokens) {
            Some(parsed) => ColumnData::Float(parsed),
            None => ColumnData::Text(tokens),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(values) => values.len(),
            ColumnData::Float(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnData::Text(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ColumnData::Integer(_) => "integer",
            ColumnData::Float(_) => "float",
            ColumnData::Text(_) => "text",
        }
    }

    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Integer(values) => values
                .get(row)
                .map(|v| v.map_or(Value::Missing, Value::Integer)),
            ColumnData::Float(values) => values
                .get(row)
                .map(|v| v.map_or(Value::Missing, Value::Float)),
            ColumnData::Text(values) => values.get(row).map(|v| Value::Text(v.clone())),
        }
    }

    /// Numeric view of the column; `None` for text columns.
    pub fn as_f64s(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Integer(values) => {
                Some(values.iter().map(|v| v.map(|i| i as f64)).collect())
            }
            ColumnData::Float(values) => Some(values.clone()),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            ColumnData::Text(values) => Some(values),
            _ => None,
        }
    }
}

fn parse_all<T: std::str::FromStr>(tokens: &[String]) -> Option<Vec<Option<T>>> {
    tokens
        .iter()
        .map(|token| {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                Some(None)
            } else {
                trimmed.parse::<T>().ok().map(Some)
            }
        })
        .collect()
}
