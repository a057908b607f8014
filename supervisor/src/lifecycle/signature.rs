//! Column-based model signature inferred from one sample input/output pair.
//!
//! Top-level object keys become named columns; any other top-level value becomes a
//! single unnamed column. Integers are `long`, other numbers `double`. A `null` marks
//! the column or property optional and contributes no type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("cannot infer element type of empty array at {0}")]
    EmptyArray(String),

    #[error("conflicting types at {path}: {left} vs {right}")]
    Conflict {
        path: String,
        left: String,
        right: String,
    },

    #[error("no type can be inferred at {0} (value is null)")]
    Untyped(String),
}

/// Inferred data type of one column or property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataType {
    String,
    Long,
    Double,
    Boolean,
    Array { items: Box<DataType> },
    Object { properties: Vec<ColSpec> },
}

impl DataType {
    fn label(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Long => "long",
            DataType::Double => "double",
            DataType::Boolean => "boolean",
            DataType::Array { .. } => "array",
            DataType::Object { .. } => "object",
        }
    }
}

/// One column (or object property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub data_type: DataType,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColSpec>,
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&ColSpec> {
        self.columns.iter().find(|c| c.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub inputs: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Schema>,
}

/// Infers the signature of a model from one input and (optionally) its output.
pub fn infer_signature(input: &Value, output: Option<&Value>) -> Result<Signature, SignatureError> {
    Ok(Signature {
        inputs: infer_schema(input)?,
        outputs: output.map(infer_schema).transpose()?,
    })
}

/// Schema of one JSON value.
pub fn infer_schema(value: &Value) -> Result<Schema, SignatureError> {
    let columns = match value {
        Value::Object(map) => properties(map, "$")?,
        other => {
            let data_type = infer_type(other, "$")?.ok_or_else(|| SignatureError::Untyped("$".into()))?;
            vec![ColSpec {
                name: None,
                data_type,
                required: true,
            }]
        }
    };
    Ok(Schema { columns })
}

fn properties(map: &serde_json::Map<String, Value>, path: &str) -> Result<Vec<ColSpec>, SignatureError> {
    let mut out = Vec::with_capacity(map.len());
    for (key, value) in map {
        let child = format!("{}.{}", path, key);
        // Columns that are null everywhere carry no type and are left out.
        if let Some(data_type) = infer_type(value, &child)? {
            out.push(ColSpec {
                name: Some(key.clone()),
                data_type,
                required: true,
            });
        }
    }
    Ok(out)
}

fn infer_type(value: &Value, path: &str) -> Result<Option<DataType>, SignatureError> {
    Ok(Some(match value {
        Value::Null => return Ok(None),
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => DataType::Long,
        Value::Number(_) => DataType::Double,
        Value::String(_) => DataType::String,
        Value::Object(map) => DataType::Object {
            properties: properties(map, path)?,
        },
        Value::Array(items) => {
            let item_path = format!("{}[]", path);
            let mut merged: Option<DataType> = None;
            for item in items {
                let Some(ty) = infer_type(item, &item_path)? else {
                    continue;
                };
                merged = Some(match merged {
                    None => ty,
                    Some(prev) => unify(prev, ty, &item_path)?,
                });
            }
            let items = merged.ok_or_else(|| SignatureError::EmptyArray(path.to_string()))?;
            DataType::Array {
                items: Box::new(items),
            }
        }
    }))
}

/// Merges the types of two array elements.
fn unify(left: DataType, right: DataType, path: &str) -> Result<DataType, SignatureError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (DataType::Long, DataType::Double) | (DataType::Double, DataType::Long) => Ok(DataType::Double),
        (DataType::Array { items: l }, DataType::Array { items: r }) => Ok(DataType::Array {
            items: Box::new(unify(*l, *r, &format!("{}[]", path))?),
        }),
        (DataType::Object { properties: l }, DataType::Object { properties: r }) => Ok(DataType::Object {
            properties: unify_properties(l, r, path)?,
        }),
        (l, r) => Err(SignatureError::Conflict {
            path: path.to_string(),
            left: l.label().to_string(),
            right: r.label().to_string(),
        }),
    }
}

/// Union of property sets; a property missing on either side becomes optional.
fn unify_properties(left: Vec<ColSpec>, mut right: Vec<ColSpec>, path: &str) -> Result<Vec<ColSpec>, SignatureError> {
    let mut out = Vec::with_capacity(left.len().max(right.len()));
    for col in left {
        match right.iter().position(|r| r.name == col.name) {
            Some(i) => {
                let other = right.remove(i);
                let child = format!("{}.{}", path, col.name.as_deref().unwrap_or_default());
                out.push(ColSpec {
                    name: col.name,
                    data_type: unify(col.data_type, other.data_type, &child)?,
                    required: col.required && other.required,
                });
            }
            None => out.push(ColSpec {
                required: false,
                ..col
            }),
        }
    }
    out.extend(right.into_iter().map(|col| ColSpec {
        required: false,
        ..col
    }));
    Ok(out)
}
