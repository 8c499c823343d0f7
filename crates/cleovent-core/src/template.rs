//! Prompt templates.
//!
//! Two constructs only:
//! - `{{field}}` substitutes a scalar (string or number) request field.
//! - `{{#each field}}` expands an array-of-string field to one bulleted line
//!   per element, in order. An empty array expands to nothing.
//!
//! Templates are compiled against the flow's input schema at registration
//! time, so a reference to an unknown field is a configuration error rather
//! than a per-call failure.

use serde_json::Value;

use crate::error::FlowError;
use crate::schema::{FieldKind, Schema};

/// Prefix of every line produced by a repeated section.
pub const BULLET: &str = "- ";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const EACH: &str = "#each ";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Field(String),
    Each(String),
}

/// Output of the scalar pass: text with sections still unexpanded.
enum Pending<'a> {
    Text(String),
    Section(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn compile(text: &str, schema: &Schema) -> Result<Self, FlowError> {
        let segments = parse(text)?;
        for segment in &segments {
            match segment {
                Segment::Text(_) => {}
                Segment::Field(name) => match schema.field(name) {
                    Some(spec) if spec.kind.is_scalar() => {}
                    Some(_) => {
                        return Err(FlowError::configuration(format!(
                            "template for '{}' substitutes non-scalar field '{name}'",
                            schema.name
                        )))
                    }
                    None => {
                        return Err(FlowError::configuration(format!(
                            "template for '{}' references unknown field '{name}'",
                            schema.name
                        )))
                    }
                },
                Segment::Each(name) => match schema.field(name) {
                    Some(spec) if spec.kind == FieldKind::StringArray => {}
                    Some(_) => {
                        return Err(FlowError::configuration(format!(
                            "template for '{}' iterates '{name}', which is not an array of strings",
                            schema.name
                        )))
                    }
                    None => {
                        return Err(FlowError::configuration(format!(
                            "template for '{}' references unknown field '{name}'",
                            schema.name
                        )))
                    }
                },
            }
        }
        Ok(Self { segments })
    }

    /// Render a request that has already passed schema validation.
    pub fn render(&self, request: &Value) -> String {
        let pending = self.substitute_scalars(request);
        expand_sections(pending, request)
    }

    fn substitute_scalars<'a>(&'a self, request: &Value) -> Vec<Pending<'a>> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => Pending::Text(text.clone()),
                Segment::Field(name) => {
                    Pending::Text(request.get(name).map(scalar_text).unwrap_or_default())
                }
                Segment::Each(name) => Pending::Section(name.as_str()),
            })
            .collect()
    }
}

fn expand_sections(pending: Vec<Pending<'_>>, request: &Value) -> String {
    let mut out = String::new();
    for piece in pending {
        match piece {
            Pending::Text(text) => out.push_str(&text),
            Pending::Section(name) => {
                let items = request.get(name).and_then(Value::as_array);
                for item in items.into_iter().flatten() {
                    out.push_str(BULLET);
                    out.push_str(&scalar_text(item));
                    out.push('\n');
                }
            }
        }
    }
    out
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                // f64 Display: no grouping, no trailing ".0"
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse(text: &str) -> Result<Vec<Segment>, FlowError> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or_else(|| {
            FlowError::configuration(format!(
                "unterminated tag near: {}",
                after.chars().take(20).collect::<String>()
            ))
        })?;
        let tag = after[..end].trim();
        if let Some(name) = tag.strip_prefix(EACH) {
            segments.push(Segment::Each(name.trim().to_string()));
        } else if tag.is_empty() || tag.starts_with('#') || tag.starts_with('/') {
            return Err(FlowError::configuration(format!("unsupported tag '{{{{{tag}}}}}'")));
        } else {
            segments.push(Segment::Field(tag.to_string()));
        }
        rest = &after[end + CLOSE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("demo", 1)
            .required("zone", FieldKind::String, "Zone")
            .required("ppm", FieldKind::Number, "Reading")
            .required("types", FieldKind::StringArray, "Types")
    }

    #[test]
    fn substitutes_scalars() {
        let t = PromptTemplate::compile("Zone {{zone}} at {{ ppm }} ppm", &schema()).unwrap();
        assert_eq!(
            t.render(&json!({"zone": "A", "ppm": 512.5, "types": []})),
            "Zone A at 512.5 ppm"
        );
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        let t = PromptTemplate::compile("{{ppm}}", &schema()).unwrap();
        assert_eq!(t.render(&json!({"zone": "A", "ppm": 500.0, "types": []})), "500");
        assert_eq!(t.render(&json!({"zone": "A", "ppm": 1200000, "types": []})), "1200000");
    }

    #[test]
    fn section_emits_one_line_per_element_in_order() {
        let t = PromptTemplate::compile("Types:\n{{#each types}}", &schema()).unwrap();
        let out = t.render(&json!({
            "zone": "A",
            "ppm": 1,
            "types": ["Amine Scrubber", "Vertical Garden"]
        }));
        let lines: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(lines, vec!["- Amine Scrubber", "- Vertical Garden"]);
    }

    #[test]
    fn empty_section_renders_nothing() {
        let t = PromptTemplate::compile("[{{#each types}}]", &schema()).unwrap();
        assert_eq!(t.render(&json!({"zone": "A", "ppm": 1, "types": []})), "[]");
    }

    #[test]
    fn unknown_field_fails_at_compile() {
        let err = PromptTemplate::compile("{{missing}}", &schema()).unwrap_err();
        assert!(matches!(err, FlowError::Configuration(_)));
        let err = PromptTemplate::compile("{{#each nothing}}", &schema()).unwrap_err();
        assert!(matches!(err, FlowError::Configuration(_)));
    }

    #[test]
    fn kind_mismatch_fails_at_compile() {
        assert!(PromptTemplate::compile("{{types}}", &schema()).is_err());
        assert!(PromptTemplate::compile("{{#each zone}}", &schema()).is_err());
    }

    #[test]
    fn unterminated_tag_fails_at_compile() {
        assert!(PromptTemplate::compile("Zone {{zone", &schema()).is_err());
        assert!(PromptTemplate::compile("{{/each}}", &schema()).is_err());
    }
}
