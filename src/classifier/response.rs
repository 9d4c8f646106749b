//! Extraction of the structured answer embedded in raw model output.
//!
//! Models wrap JSON in prose or markdown fences more often than not, so the
//! parser looks for the object in several places before giving up.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ResponseError;

/// The only answer shape accepted from the remote classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteClassification {
    /// selector → project field; `null` marks a field the model left unmapped.
    pub field_mappings: BTreeMap<String, Option<String>>,
    pub confidence: f32,
    pub detected_fields: Vec<DetectedField>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedField {
    pub selector: String,
    #[serde(rename = "type", default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub mapped_to: Option<String>,
}

impl RemoteClassification {
    /// selector → field pairs, `fieldMappings` first, then any `detectedFields`
    /// entry naming a selector the map did not cover. Blank targets dropped.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .field_mappings
            .iter()
            .filter_map(|(sel, field)| {
                let field = field.as_deref()?.trim();
                (!field.is_empty()).then(|| (sel.trim().to_string(), field.to_string()))
            })
            .collect();

        for detected in &self.detected_fields {
            let Some(field) = detected.mapped_to.as_deref().map(str::trim) else {
                continue;
            };
            if field.is_empty() || out.iter().any(|(sel, _)| sel == detected.selector.trim()) {
                continue;
            }
            out.push((detected.selector.trim().to_string(), field.to_string()));
        }

        out
    }
}

/// Parse the first candidate in `content` that has the expected shape.
///
/// Candidate order: whole text, ```json fence, any fence, first JSON value.
pub fn parse_remote_classification(content: &str) -> Result<RemoteClassification, ResponseError> {
    let trimmed = content.trim();
    let candidates = [
        Some(trimmed.to_string()),
        extract_fenced_block(trimmed, Some("json")),
        extract_fenced_block(trimmed, None),
        extract_first_json_object(trimmed),
    ];

    let mut saw_json = false;
    let mut last_error = None;

    for candidate in candidates.into_iter().flatten() {
        let value: serde_json::Value = match serde_json::from_str(&candidate) {
            Ok(v) => v,
            Err(_) => continue,
        };
        saw_json = true;
        match serde_json::from_value::<RemoteClassification>(value) {
            Ok(parsed) if parsed.confidence.is_finite() => return Ok(parsed),
            Ok(_) => last_error = Some("confidence is not a finite number".to_string()),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    if saw_json {
        Err(ResponseError::Shape(
            last_error.unwrap_or_else(|| "unrecognised object".to_string()),
        ))
    } else {
        Err(ResponseError::NoJson)
    }
}

/// First JSON object in free text, using the deserializer to find its end.
pub fn extract_first_json_object(content: &str) -> Option<String> {
    for (idx, ch) in content.char_indices() {
        if ch != '{' {
            continue;
        }
        let candidate = &content[idx..];
        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(_)) = stream.next() {
            let end = stream.byte_offset();
            if end > 0 && end <= candidate.len() {
                return Some(candidate[..end].to_string());
            }
        }
    }
    None
}

fn extract_fenced_block(content: &str, language: Option<&str>) -> Option<String> {
    let fence = "```";
    let mut search = content;

    loop {
        let start = search.find(fence)?;
        let after_start = &search[start + fence.len()..];

        let line_end = after_start.find('\n')?;
        let lang_tag = after_start[..line_end].trim();
        let rest = &after_start[line_end + 1..];

        if let Some(expected) = language {
            if !lang_tag.eq_ignore_ascii_case(expected) {
                search = after_start;
                continue;
            }
        }

        let end = rest.find(fence)?;
        return Some(rest[..end].trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r##"{"fieldMappings":{"#email":"email"},"confidence":0.9,"detectedFields":[]}"##;

    #[test]
    fn parses_bare_object() {
        let parsed = parse_remote_classification(VALID).unwrap();
        assert_eq!(parsed.confidence, 0.9);
        assert_eq!(parsed.pairs(), vec![("#email".to_string(), "email".to_string())]);
    }

    #[test]
    fn parses_fenced_and_embedded_objects() {
        let fenced = format!("Sure!\n```json\n{}\n```\nDone.", VALID);
        assert!(parse_remote_classification(&fenced).is_ok());

        let embedded = format!("Here is the mapping: {} hope it helps", VALID);
        assert!(parse_remote_classification(&embedded).is_ok());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let err = parse_remote_classification(r#"{"mapping": {"a": "b"}}"#).unwrap_err();
        assert!(matches!(err, ResponseError::Shape(_)));

        let err = parse_remote_classification("I cannot help with that").unwrap_err();
        assert!(matches!(err, ResponseError::NoJson));
    }

    #[test]
    fn detected_fields_fill_gaps_only() {
        let parsed = parse_remote_classification(
            r##"{"fieldMappings":{"#a":"email","#b":null},
                "confidence":0.8,
                "detectedFields":[
                    {"selector":"#a","type":"text","label":"A","mappedTo":"phone"},
                    {"selector":"#b","type":"text","label":"B","mappedTo":"phone"}
                ]}"##,
        )
        .unwrap();
        assert_eq!(
            parsed.pairs(),
            vec![
                ("#a".to_string(), "email".to_string()),
                ("#b".to_string(), "phone".to_string()),
            ]
        );
    }
}
