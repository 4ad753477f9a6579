use std::collections::BTreeMap;

use serde_json::Map;

use crate::error::AlignError;

/// A single typed cell of a source row or prediction request.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl Value {
    /// Type a raw CSV cell: blank is missing, anything parseable as `f64` is a
    /// number, everything else is text.
    #[must_use]
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Coerce to a number for a field declared numeric.
    ///
    /// Missing values and blank strings yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Coercion`] when the value is text that does not
    /// parse as a finite number.
    pub fn coerce_number(&self, field: &str) -> Result<Option<f64>, AlignError> {
        let coercion_error = || AlignError::Coercion {
            field: field.to_string(),
            value: self.to_string(),
        };

        match self {
            Value::Missing => Ok(None),
            Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            Value::Number(n) if n.is_finite() => Ok(Some(*n)),
            Value::Number(_) => Err(coercion_error()),
            Value::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Some(n)),
                    _ => Err(coercion_error()),
                }
            }
        }
    }

    /// The label this value contributes to an indicator column name.
    ///
    /// Text is trimmed the same way CSV cells are, so `"Video "` labels as
    /// `Video`; blank text has no label.
    #[must_use]
    pub fn category_label(&self) -> Option<String> {
        match self {
            Value::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("True".to_string()),
            Value::Bool(false) => Some("False".to_string()),
            Value::Missing => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Missing => write!(f, "null"),
        }
    }
}

/// A flat column-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::NotAnObject`] for non-object bodies and
    /// [`AlignError::UnsupportedValue`] for nested arrays or objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AlignError> {
        match value {
            serde_json::Value::Object(map) => Self::from_json_object(map),
            _ => Err(AlignError::NotAnObject),
        }
    }

    /// Build a record from a JSON object's top-level fields.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::UnsupportedValue`] for nested arrays or objects.
    pub fn from_json_object(map: &Map<String, serde_json::Value>) -> Result<Self, AlignError> {
        let mut record = Self::new();
        for (key, raw) in map {
            let value = match raw {
                serde_json::Value::Null => Value::Missing,
                serde_json::Value::Bool(b) => Value::Bool(*b),
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(f) => Value::Number(f),
                    None => {
                        return Err(AlignError::UnsupportedValue {
                            field: key.clone(),
                            kind: "number out of range",
                        })
                    }
                },
                serde_json::Value::String(s) => Value::Text(s.clone()),
                serde_json::Value::Array(_) => {
                    return Err(AlignError::UnsupportedValue {
                        field: key.clone(),
                        kind: "array",
                    })
                }
                serde_json::Value::Object(_) => {
                    return Err(AlignError::UnsupportedValue {
                        field: key.clone(),
                        kind: "object",
                    })
                }
            };
            record.insert(key.clone(), value);
        }
        Ok(record)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
