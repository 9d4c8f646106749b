use crate::form::form_model::{FieldMapping, FormFieldDescriptor};
use crate::form::patterns::match_field;

/// Confidence reported for every heuristic match. Always below what a
/// working remote classifier reports.
pub const HEURISTIC_CONFIDENCE: f32 = 0.3;

/// Fixed pattern-table matcher.
///
/// Pure: same descriptors in, same mappings out. Disabled and readonly
/// elements are never mapped; elements no rule recognises are omitted.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicMatcher {
    pub confidence: f32,
}

impl Default for HeuristicMatcher {
    fn default() -> Self {
        Self {
            confidence: HEURISTIC_CONFIDENCE,
        }
    }
}

impl HeuristicMatcher {
    pub fn new(confidence: f32) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn match_one(&self, descriptor: &FormFieldDescriptor) -> Option<FieldMapping> {
        if !descriptor.is_editable() {
            return None;
        }

        let rule = match_field(&descriptor.element_type, &descriptor.signal_text())?;
        Some(FieldMapping {
            selector: descriptor.selector.clone(),
            matched_project_field: rule.field.to_string(),
            confidence: self.confidence,
            low_confidence: false,
        })
    }

    pub fn match_all(&self, descriptors: &[FormFieldDescriptor]) -> Vec<FieldMapping> {
        descriptors.iter().filter_map(|d| self.match_one(d)).collect()
    }
}
