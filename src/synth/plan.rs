use serde::{Deserialize, Serialize};

use crate::form::form_model::{ClassificationResult, FormFieldDescriptor, ProjectDataBag};

/// One value bound to one extracted element, plus every attribute the
/// injection program needs to find that element again on a changed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillTarget {
    pub selector: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub element_type: String,
    pub field: String,
    pub value: String,
}

impl FillTarget {
    /// Target addressed only by selector.
    pub fn new(selector: &str, field: &str, value: &str) -> Self {
        Self {
            selector: selector.to_string(),
            id: String::new(),
            name: String::new(),
            placeholder: String::new(),
            element_type: String::new(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn for_descriptor(descriptor: &FormFieldDescriptor, field: &str, value: &str) -> Self {
        Self {
            selector: descriptor.selector.clone(),
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            placeholder: descriptor.placeholder.clone(),
            element_type: descriptor.element_type.clone(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Join a classification with its descriptors and the project data.
///
/// Mappings whose selector is not among `descriptors`, or whose field has no
/// value, produce no target. Order follows `result.field_mappings`.
pub fn build_fill_plan(
    result: &ClassificationResult,
    descriptors: &[FormFieldDescriptor],
    data: &ProjectDataBag,
) -> Vec<FillTarget> {
    result
        .field_mappings
        .iter()
        .filter_map(|mapping| {
            let descriptor = descriptors.iter().find(|d| d.selector == mapping.selector)?;
            let value = data.value(&mapping.matched_project_field)?;
            Some(FillTarget::for_descriptor(
                descriptor,
                &mapping.matched_project_field,
                value,
            ))
        })
        .collect()
}
