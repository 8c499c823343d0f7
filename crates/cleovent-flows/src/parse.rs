use serde_json::Value;

use cleovent_core::FlowError;

use crate::engine::SERVICE;

/// Parse raw model output into a JSON value. Prose or Markdown fences around
/// the object are tolerated; anything else is an upstream failure. Schema
/// conformance is checked by the caller.
pub fn parse_reply(raw: &str) -> Result<Value, FlowError> {
    let start = raw
        .find('{')
        .ok_or_else(|| FlowError::upstream(SERVICE, "reply contained no JSON object"))?;

    // First complete value from the opening brace; trailing text is ignored.
    match serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(FlowError::upstream(
            SERVICE,
            format!("reply is not valid JSON: {e}"),
        )),
        None => Err(FlowError::upstream(SERVICE, "reply contained no JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_object() {
        assert_eq!(
            parse_reply(r#"{"alertMessage": "hi"}"#).unwrap(),
            json!({"alertMessage": "hi"})
        );
    }

    #[test]
    fn fenced_object_with_prose() {
        let raw = "Sure! Here it is:\n```json\n{\"suggestions\": []}\n```\nHope that helps.";
        assert_eq!(parse_reply(raw).unwrap(), json!({"suggestions": []}));
    }

    #[test]
    fn no_object_is_upstream_error() {
        let err = parse_reply("The air is fine today.").unwrap_err();
        assert!(matches!(err, FlowError::Upstream { .. }));
        assert!(parse_reply("} backwards {").is_err());
    }

    #[test]
    fn trailing_prose_with_braces_is_ignored() {
        let raw = r#"{"alertMessage": "x"} (see {docs})"#;
        assert_eq!(parse_reply(raw).unwrap(), json!({"alertMessage": "x"}));
    }

    #[test]
    fn broken_json_is_upstream_error() {
        let err = parse_reply(r#"{"alertMessage": "unterminated}"#).unwrap_err();
        assert!(matches!(err, FlowError::Upstream { .. }));
    }
}
