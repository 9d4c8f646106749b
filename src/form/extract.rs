use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractError;
use crate::form::form_model::FormFieldDescriptor;

/// In-page script that reports every candidate control as a
/// `RawFieldSnapshot[]` JSON array. Run it in the target page (devtools,
/// headless driver, ...) and feed its output to `describe_snapshot`.
pub const EXTRACTION_SCRIPT: &str = include_str!("extract_fields.js");

/// Input types that never receive project data.
pub const SKIPPED_INPUT_TYPES: &[&str] = &[
    "hidden", "submit", "button", "reset", "image", "file", "password", "checkbox", "radio",
];

/// One control as observed in the page, before selector selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldSnapshot {
    pub tag: String,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Structural `tag:nth-of-type(n) > ...` path from `<html>`.
    pub path: String,
}

fn default_visible() -> bool {
    true
}

impl RawFieldSnapshot {
    pub fn element_type(&self) -> String {
        match self.tag.to_ascii_lowercase().as_str() {
            "textarea" => "textarea".to_string(),
            "select" => "select".to_string(),
            _ => self
                .input_type
                .as_deref()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string()),
        }
    }

    pub fn is_candidate(&self) -> bool {
        let tag = self.tag.to_ascii_lowercase();
        if !matches!(tag.as_str(), "input" | "textarea" | "select") {
            return false;
        }
        if !self.visible {
            return false;
        }
        let element_type = self.element_type();
        !SKIPPED_INPUT_TYPES.contains(&element_type.as_str())
    }
}

// ============================================================================
// Selector construction
// ============================================================================

/// Occurrence counts used to decide which selector is unique.
#[derive(Default)]
struct Uniqueness {
    ids: HashMap<String, usize>,
    names: HashMap<(String, String), usize>,
    classes: HashMap<String, usize>,
}

impl Uniqueness {
    fn from_snapshots(snapshots: &[RawFieldSnapshot]) -> Self {
        let mut u = Uniqueness::default();
        for s in snapshots {
            if let Some(id) = non_blank(s.id.as_deref()) {
                *u.ids.entry(id.to_string()).or_insert(0) += 1;
            }
            if let Some(name) = non_blank(s.name.as_deref()) {
                *u.names
                    .entry((s.tag.to_ascii_lowercase(), name.to_string()))
                    .or_insert(0) += 1;
            }
            if let Some(sel) = class_selector(s) {
                *u.classes.entry(sel).or_insert(0) += 1;
            }
        }
        u
    }
}

/// Pick the most stable selector that is unique within the pass:
/// `#id`, then `tag[name="..."]`, then `tag.class...`, then the structural path.
pub fn build_selector(snapshot: &RawFieldSnapshot, all: &[RawFieldSnapshot]) -> String {
    let uniqueness = Uniqueness::from_snapshots(all);
    select_with(snapshot, &uniqueness)
}

fn select_with(snapshot: &RawFieldSnapshot, u: &Uniqueness) -> String {
    let tag = snapshot.tag.to_ascii_lowercase();

    if let Some(id) = non_blank(snapshot.id.as_deref()) {
        if u.ids.get(id) == Some(&1) {
            return id_selector(id);
        }
    }

    if let Some(name) = non_blank(snapshot.name.as_deref()) {
        if u.names.get(&(tag.clone(), name.to_string())) == Some(&1) {
            return format!("{}[name=\"{}\"]", tag, escape_attr(name));
        }
    }

    if let Some(sel) = class_selector(snapshot) {
        if u.classes.get(&sel) == Some(&1) {
            return sel;
        }
    }

    snapshot.path.clone()
}

fn id_selector(id: &str) -> String {
    let mut chars = id.chars();
    let plain_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '-');
    let plain_rest = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if plain_start && plain_rest {
        format!("#{}", id)
    } else {
        format!("[id=\"{}\"]", escape_attr(id))
    }
}

fn class_selector(snapshot: &RawFieldSnapshot) -> Option<String> {
    let classes: Vec<&str> = snapshot
        .classes
        .iter()
        .map(|c| c.as_str())
        .filter(|c| {
            !c.is_empty()
                && c.chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
                && !c.starts_with(|ch: char| ch.is_ascii_digit())
        })
        .collect();

    if classes.is_empty() {
        return None;
    }

    Some(format!(
        "{}.{}",
        snapshot.tag.to_ascii_lowercase(),
        classes.join(".")
    ))
}

/// Escape a value for use inside a double-quoted CSS attribute selector.
pub fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Snapshot → descriptors
// ============================================================================

/// Turn raw page snapshots into classifier input.
///
/// `snapshots` must cover every control of the page. Non-candidates (hidden,
/// buttons, passwords, ...) are dropped but still count against selector
/// uniqueness, so a hidden twin never shares a selector with a visible field.
pub fn describe_snapshot(snapshots: &[RawFieldSnapshot]) -> Vec<FormFieldDescriptor> {
    describe_within(snapshots, snapshots)
}

/// Describe the candidates of `scope` (e.g. one form) with selectors that are
/// unique across the whole `document`.
pub fn describe_within(
    document: &[RawFieldSnapshot],
    scope: &[RawFieldSnapshot],
) -> Vec<FormFieldDescriptor> {
    let uniqueness = Uniqueness::from_snapshots(document);

    let descriptors: Vec<FormFieldDescriptor> = scope
        .iter()
        .filter(|s| s.is_candidate())
        .map(|s| FormFieldDescriptor {
            selector: select_with(s, &uniqueness),
            element_type: s.element_type(),
            name: s.name.clone().unwrap_or_default(),
            id: s.id.clone().unwrap_or_default(),
            placeholder: s.placeholder.clone().unwrap_or_default(),
            associated_label_text: s.label.clone().unwrap_or_default(),
            required: s.required,
            disabled: s.disabled,
            readonly: s.readonly,
            current_value: s.value.clone().unwrap_or_default(),
        })
        .collect();

    debug!(
        document = document.len(),
        scope = scope.len(),
        candidates = descriptors.len(),
        "described form snapshot"
    );
    descriptors
}

// ============================================================================
// Static HTML
// ============================================================================

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}

/// Snapshot every control in saved HTML markup.
///
/// With `form_index` only the controls inside the n-th `<form>` are reported.
pub fn snapshot_html(
    html: &str,
    form_index: Option<usize>,
) -> Result<Vec<RawFieldSnapshot>, ExtractError> {
    Ok(snapshot_document(html, form_index)?.1)
}

/// `snapshot_html` followed by `describe_within`, with selector uniqueness
/// judged against the whole document even when `form_index` narrows the scope.
pub fn describe_html(
    html: &str,
    form_index: Option<usize>,
) -> Result<Vec<FormFieldDescriptor>, ExtractError> {
    let (document, scope) = snapshot_document(html, form_index)?;
    Ok(describe_within(&document, &scope))
}

/// Every control of the document, and the ones inside the selected form.
fn snapshot_document(
    html: &str,
    form_index: Option<usize>,
) -> Result<(Vec<RawFieldSnapshot>, Vec<RawFieldSnapshot>), ExtractError> {
    let document = Html::parse_document(html);
    let controls = parse_selector("input, textarea, select")?;
    let labels = parse_selector("label[for]")?;

    let mut label_for: HashMap<String, String> = HashMap::new();
    for label in document.select(&labels) {
        if let Some(target) = label.value().attr("for") {
            label_for
                .entry(target.to_string())
                .or_insert_with(|| collapse_text(label));
        }
    }

    let all: Vec<RawFieldSnapshot> = document
        .select(&controls)
        .map(|el| snapshot_element(el, &label_for))
        .collect();

    let Some(index) = form_index else {
        return Ok((all.clone(), all));
    };

    let forms_sel = parse_selector("form")?;
    let forms: Vec<ElementRef> = document.select(&forms_sel).collect();
    let form = forms.get(index).ok_or(ExtractError::NoForm {
        index,
        available: forms.len(),
    })?;
    let scope = form
        .select(&controls)
        .map(|el| snapshot_element(el, &label_for))
        .collect();
    Ok((all, scope))
}

fn snapshot_element(el: ElementRef, label_for: &HashMap<String, String>) -> RawFieldSnapshot {
    let v = el.value();
    let tag = v.name().to_ascii_lowercase();
    let attr = |name: &str| v.attr(name).map(|s| s.to_string());

    let label = attr("id")
        .and_then(|id| label_for.get(&id).cloned())
        .or_else(|| enclosing_label(el))
        .or_else(|| attr("aria-label"))
        .or_else(|| attr("title"))
        .filter(|l| !l.is_empty());

    let value = match tag.as_str() {
        "textarea" => Some(el.text().collect::<String>()),
        "select" => selected_option(el),
        _ => attr("value"),
    };

    let style = attr("style").unwrap_or_default().replace(' ', "").to_lowercase();
    let visible = v.attr("hidden").is_none()
        && !style.contains("display:none")
        && !style.contains("visibility:hidden");

    RawFieldSnapshot {
        input_type: attr("type"),
        id: attr("id"),
        name: attr("name"),
        classes: v.classes().map(|c| c.to_string()).collect(),
        placeholder: attr("placeholder"),
        label,
        required: v.attr("required").is_some() || v.attr("aria-required") == Some("true"),
        disabled: v.attr("disabled").is_some(),
        readonly: v.attr("readonly").is_some(),
        value,
        visible,
        path: structural_path(el),
        tag,
    }
}

fn enclosing_label(el: ElementRef) -> Option<String> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
        .map(collapse_text)
}

fn selected_option(select: ElementRef) -> Option<String> {
    let options = Selector::parse("option[selected]").ok()?;
    select.select(&options).next().map(|opt| {
        opt.value()
            .attr("value")
            .map(|s| s.to_string())
            .unwrap_or_else(|| collapse_text(opt))
    })
}

fn collapse_text(el: ElementRef) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `html:nth-of-type(1) > body:nth-of-type(1) > ...` for the element.
fn structural_path(el: ElementRef) -> String {
    let mut segments = Vec::new();
    let mut current = Some(el);

    while let Some(node) = current {
        let name = node.value().name().to_ascii_lowercase();
        let position = node
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|s| s.value().name().eq_ignore_ascii_case(&name))
            .count()
            + 1;
        segments.push(format!("{}:nth-of-type({})", name, position));
        current = node.parent().and_then(ElementRef::wrap);
    }

    segments.reverse();
    segments.join(" > ")
}
