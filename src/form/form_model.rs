use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form::patterns;

// ============================================================================
// Extraction output
// ============================================================================

/// Snapshot of one candidate `input` / `textarea` / `select` on a target page.
///
/// Created fresh on every extraction pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldDescriptor {
    pub selector: String,
    pub element_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub associated_label_text: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub current_value: String,
}

impl FormFieldDescriptor {
    /// Normalised name, id, placeholder and label, space separated.
    pub fn signal_text(&self) -> String {
        patterns::signal_text([
            self.name.as_str(),
            self.id.as_str(),
            self.placeholder.as_str(),
            self.associated_label_text.as_str(),
        ])
    }

    pub fn is_editable(&self) -> bool {
        !self.disabled && !self.readonly
    }

    pub fn is_textarea(&self) -> bool {
        self.element_type.eq_ignore_ascii_case("textarea")
    }
}

// ============================================================================
// Project data
// ============================================================================

/// Flat semantic field name → value map taken from a saved project.
///
/// Ordered so prompts and generated payloads are byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectDataBag(BTreeMap<String, String>);

impl ProjectDataBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Non-blank value for `field`, if any.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn has_value(&self, field: &str) -> bool {
        self.value(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy without blank values. This is what leaves the process.
    pub fn without_blanks(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Build a bag from an arbitrary project record.
    ///
    /// Strings are taken as-is, numbers and booleans are stringified, arrays
    /// of scalars are joined with `", "` and nested objects contribute their
    /// own keys unless a top-level key of the same name exists. `null` is
    /// dropped.
    pub fn from_json(record: &Value) -> Self {
        let mut bag = Self::new();
        if let Value::Object(map) = record {
            for (key, value) in map {
                if let Some(s) = scalar_text(value) {
                    bag.insert(key.clone(), s);
                }
            }
            for value in map.values() {
                if let Value::Object(nested) = value {
                    for (key, inner) in nested {
                        if bag.0.contains_key(key) {
                            continue;
                        }
                        if let Some(s) = scalar_text(inner) {
                            bag.insert(key.clone(), s);
                        }
                    }
                }
            }
        }
        bag
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProjectDataBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Classification output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Remote,
    Heuristic,
}

/// One classified form element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub selector: String,
    pub matched_project_field: String,
    pub confidence: f32,
    #[serde(default)]
    pub low_confidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub field_mappings: Vec<FieldMapping>,
    pub overall_confidence: f32,
    pub strategy_used: Strategy,
}

impl ClassificationResult {
    pub fn mapping_for(&self, selector: &str) -> Option<&FieldMapping> {
        self.field_mappings.iter().find(|m| m.selector == selector)
    }

    pub fn is_empty(&self) -> bool {
        self.field_mappings.is_empty()
    }
}
