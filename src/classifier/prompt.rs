use serde::Serialize;

use crate::form::form_model::{FormFieldDescriptor, ProjectDataBag};
use crate::form::patterns::known_fields;

/// Markup beyond this many characters is cut before it reaches the prompt.
pub const MAX_MARKUP_CHARS: usize = 12_000;

/// What the classifier is told about one form.
///
/// `descriptors` are always required (they carry the selectors and feed the
/// heuristic fallback); `markup` is the raw form HTML when available.
#[derive(Debug, Clone, Default)]
pub struct FormDescription {
    pub descriptors: Vec<FormFieldDescriptor>,
    pub markup: Option<String>,
}

impl FormDescription {
    pub fn from_descriptors(descriptors: Vec<FormFieldDescriptor>) -> Self {
        Self {
            descriptors,
            markup: None,
        }
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = Some(markup.into());
        self
    }

    pub fn contains_selector(&self, selector: &str) -> bool {
        self.descriptors.iter().any(|d| d.selector == selector)
    }

    pub fn descriptor(&self, selector: &str) -> Option<&FormFieldDescriptor> {
        self.descriptors.iter().find(|d| d.selector == selector)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptField<'a> {
    selector: &'a str,
    element_type: &'a str,
    name: &'a str,
    id: &'a str,
    placeholder: &'a str,
    label: &'a str,
    required: bool,
}

/// Build the classification prompt for one form.
pub fn build_classification_prompt(form: &FormDescription, data: &ProjectDataBag) -> String {
    let fields: Vec<PromptField> = form
        .descriptors
        .iter()
        .filter(|d| d.is_editable())
        .map(|d| PromptField {
            selector: &d.selector,
            element_type: &d.element_type,
            name: &d.name,
            id: &d.id,
            placeholder: &d.placeholder,
            label: &d.associated_label_text,
            required: d.required,
        })
        .collect();

    let fields_json = serde_json::to_string_pretty(&fields).unwrap_or_else(|_| "[]".to_string());
    let clean = data.without_blanks();
    let data_json = serde_json::to_string_pretty(&clean).unwrap_or_else(|_| "{}".to_string());
    let available: Vec<&str> = clean.fields().collect();
    let suggested = known_fields().join(", ");

    let markup = match &form.markup {
        Some(html) => {
            let cut: String = html.chars().take(MAX_MARKUP_CHARS).collect();
            format!("\nFORM MARKUP:\n```html\n{}\n```\n", cut)
        }
        None => String::new(),
    };

    format!(
        r##"You map the fields of a web form to a business's saved profile data.
{markup}
FORM FIELDS (use these selectors exactly):
{fields}

PROFILE DATA:
{data}

Map each form field to the ONE profile key it should receive. Only use these
keys: {available}. Typical keys are: {suggested}. Leave a field out when no
key fits.

Return ONLY valid JSON matching this exact schema:
{{
  "fieldMappings": {{ "<selector>": "<profile key>" }},
  "confidence": 0.0,
  "detectedFields": [
    {{ "selector": "<selector>", "type": "<element type>", "label": "<visible label>", "mappedTo": "<profile key or empty>" }}
  ]
}}

"confidence" is your overall confidence between 0 and 1.
Respond with ONLY valid JSON, no explanation."##,
        markup = markup,
        fields = fields_json,
        data = data_json,
        available = if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        },
        suggested = suggested,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(selector: &str, name: &str, disabled: bool) -> FormFieldDescriptor {
        FormFieldDescriptor {
            selector: selector.into(),
            element_type: "text".into(),
            name: name.into(),
            id: String::new(),
            placeholder: String::new(),
            associated_label_text: String::new(),
            required: false,
            disabled,
            readonly: false,
            current_value: String::new(),
        }
    }

    #[test]
    fn prompt_lists_editable_selectors_and_keys() {
        let form = FormDescription::from_descriptors(vec![
            descriptor("#email", "email", false),
            descriptor("#locked", "locked", true),
        ]);
        let data: ProjectDataBag = [("email", "a@b.com"), ("phone", "")].into_iter().collect();

        let prompt = build_classification_prompt(&form, &data);
        assert!(prompt.contains("#email"));
        assert!(!prompt.contains("#locked"));
        assert!(prompt.contains("Only use these\nkeys: email."));
        assert!(prompt.contains("\"fieldMappings\""));
    }

    #[test]
    fn markup_is_truncated() {
        let form = FormDescription::default().with_markup("x".repeat(MAX_MARKUP_CHARS + 50));
        let prompt = build_classification_prompt(&form, &ProjectDataBag::new());
        assert!(prompt.contains(&"x".repeat(MAX_MARKUP_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_MARKUP_CHARS + 1)));
    }
}
