//! Declared shapes for flow requests and responses.
//!
//! A [`Schema`] is built once when a flow is registered and then reused to
//! check every request and reply. Validation walks the whole value and
//! reports every violation instead of stopping at the first one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{FieldError, FieldProblem, FlowError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FieldKind {
    String,
    Number,
    StringArray,
    Object { schema: Schema },
    ObjectArray { items: Schema },
}

impl FieldKind {
    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Number)
    }

    fn expected(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::StringArray | FieldKind::ObjectArray { .. } => "array",
            FieldKind::Object { .. } => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    /// Prompt/documentation text only; never consulted by validation.
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: &'static str,
    pub version: u32,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(name: &'static str, version: u32) -> Self {
        Self {
            name,
            version,
            fields: Vec::new(),
        }
    }

    pub fn required(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            required: true,
            description,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            required: false,
            description,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `value` against this schema, collecting every violation.
    pub fn validate(&self, value: &Value) -> Result<(), FlowError> {
        let mut errors = Vec::new();
        self.check_object(value, "", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FlowError::validation(self.name, errors))
        }
    }

    /// Validate, then deserialize into the typed record.
    pub fn conform<T: DeserializeOwned>(&self, value: &Value) -> Result<T, FlowError> {
        self.validate(value)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            FlowError::validation(
                self.name,
                vec![FieldError::new(
                    "$",
                    FieldProblem::Invalid {
                        message: e.to_string(),
                    },
                )],
            )
        })
    }

    /// Serialize a typed record and validate the result. Returns the JSON
    /// form, which is what templates render from.
    pub fn check<T: Serialize>(&self, record: &T) -> Result<Value, FlowError> {
        let value = serde_json::to_value(record).map_err(|e| {
            FlowError::validation(
                self.name,
                vec![FieldError::new(
                    "$",
                    FieldProblem::Invalid {
                        message: e.to_string(),
                    },
                )],
            )
        })?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Example-shaped JSON describing the expected output, for the model's
    /// system prompt. Leaves carry `"<type>: <description>"`.
    pub fn shape(&self) -> Value {
        let mut map = Map::new();
        for field in &self.fields {
            map.insert(field.name.to_string(), shape_of(field));
        }
        Value::Object(map)
    }

    fn check_object(&self, value: &Value, prefix: &str, errors: &mut Vec<FieldError>) {
        let Some(obj) = value.as_object() else {
            errors.push(FieldError::new(
                if prefix.is_empty() { "$" } else { prefix },
                FieldProblem::WrongType {
                    expected: "object",
                    found: type_name(value),
                },
            ));
            return;
        };

        for field in &self.fields {
            let path = join_path(prefix, field.name);
            match obj.get(field.name) {
                None => {
                    if field.required {
                        errors.push(FieldError::new(path, FieldProblem::Missing));
                    }
                }
                Some(Value::Null) if !field.required => {}
                Some(v) => check_kind(&field.kind, v, &path, errors),
            }
        }
    }
}

fn check_kind(kind: &FieldKind, value: &Value, path: &str, errors: &mut Vec<FieldError>) {
    match kind {
        FieldKind::String => {
            if !value.is_string() {
                errors.push(wrong_type(kind, value, path));
            }
        }
        // serde_json writes NaN and the infinities as null
        FieldKind::Number => match value {
            Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => {}
            Value::Number(_) | Value::Null => {
                errors.push(FieldError::new(path, FieldProblem::NonFinite))
            }
            _ => errors.push(wrong_type(kind, value, path)),
        },
        FieldKind::StringArray => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_kind(&FieldKind::String, item, &format!("{path}[{i}]"), errors);
                }
            }
            None => errors.push(wrong_type(kind, value, path)),
        },
        FieldKind::Object { schema } => schema.check_object(value, path, errors),
        FieldKind::ObjectArray { items } => match value.as_array() {
            Some(values) => {
                for (i, item) in values.iter().enumerate() {
                    items.check_object(item, &format!("{path}[{i}]"), errors);
                }
            }
            None => errors.push(wrong_type(kind, value, path)),
        },
    }
}

fn wrong_type(kind: &FieldKind, value: &Value, path: &str) -> FieldError {
    FieldError::new(
        path,
        FieldProblem::WrongType {
            expected: kind.expected(),
            found: type_name(value),
        },
    )
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn shape_of(field: &FieldSpec) -> Value {
    match &field.kind {
        FieldKind::String => json!(format!("string: {}", field.description)),
        FieldKind::Number => json!(format!("number: {}", field.description)),
        FieldKind::StringArray => json!([format!("string: {}", field.description)]),
        FieldKind::Object { schema } => schema.shape(),
        FieldKind::ObjectArray { items } => json!([items.shape()]),
    }
}
