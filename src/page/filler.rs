use serde::Serialize;
use tracing::debug;

use crate::form::extract::{SKIPPED_INPUT_TYPES, escape_attr};
use crate::form::form_model::ProjectDataBag;
use crate::form::patterns::{match_field, signal_text};
use crate::page::accessor::{ElementHandle, PageAccessor, SyntheticEvent};
use crate::synth::plan::FillTarget;

/// Controls the scan considers; everything else on the page is ignored.
pub const CANDIDATE_SELECTOR: &str = "input, textarea, select";

/// Which step of the cascade found the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    Id,
    Name,
    Placeholder,
    Selector,
    TypeScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    NotFound,
    AlreadyFilled,
    Disabled,
    Readonly,
    NoMatchingOption,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledField {
    pub element: ElementHandle,
    pub field: String,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedField {
    pub field: String,
    pub selector: Option<String>,
    pub reason: SkipReason,
}

/// Outcome of one fill pass. Partial success is a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub filled: Vec<FilledField>,
    pub skipped: Vec<SkippedField>,
}

impl FillReport {
    pub fn filled_count(&self) -> usize {
        self.filled.len()
    }
}

// ============================================================================
// Element resolution
// ============================================================================

fn is_form_control<P: PageAccessor + ?Sized>(page: &P, element: ElementHandle) -> bool {
    matches!(
        page.tag_name(element).to_ascii_lowercase().as_str(),
        "input" | "textarea" | "select"
    )
}

/// A visible control of a type that may receive project data.
fn is_fillable<P: PageAccessor + ?Sized>(page: &P, element: ElementHandle) -> bool {
    is_form_control(page, element)
        && !SKIPPED_INPUT_TYPES.contains(&page.element_type(element).as_str())
        && page.is_visible(element)
}

fn first_fillable<P: PageAccessor + ?Sized>(page: &P, selector: &str) -> Option<ElementHandle> {
    page.query_all(selector)
        .into_iter()
        .find(|el| is_fillable(page, *el))
}

fn is_empty<P: PageAccessor + ?Sized>(page: &P, element: ElementHandle) -> bool {
    page.value(element).trim().is_empty()
}

fn is_open<P: PageAccessor + ?Sized>(page: &P, element: ElementHandle) -> bool {
    !page.is_disabled(element) && !page.is_readonly(element)
}

/// Find the element for `target`, trying id, name, placeholder, the
/// recorded selector, then the first empty editable control of the same type.
///
/// Every step ignores hidden controls and skipped types (hidden, password,
/// ...). Otherwise it stops at the first hit, even a disabled or filled one.
pub fn resolve_target<P: PageAccessor + ?Sized>(
    page: &P,
    target: &FillTarget,
) -> Option<(ElementHandle, Resolution)> {
    let attribute_steps = [
        ("id", target.id.as_str(), Resolution::Id),
        ("name", target.name.as_str(), Resolution::Name),
        ("placeholder", target.placeholder.as_str(), Resolution::Placeholder),
    ];

    for (attr, wanted, resolution) in attribute_steps {
        if wanted.trim().is_empty() {
            continue;
        }
        let selector = format!("[{}=\"{}\"]", attr, escape_attr(wanted));
        if let Some(el) = first_fillable(page, &selector) {
            return Some((el, resolution));
        }
    }

    if !target.selector.trim().is_empty() {
        if let Some(el) = first_fillable(page, &target.selector) {
            return Some((el, Resolution::Selector));
        }
    }

    let wanted_type = if target.element_type.trim().is_empty() {
        "text".to_string()
    } else {
        target.element_type.to_ascii_lowercase()
    };

    page.query_all(CANDIDATE_SELECTOR)
        .into_iter()
        .find(|el| {
            page.element_type(*el) == wanted_type
                && is_fillable(page, *el)
                && is_open(page, *el)
                && is_empty(page, *el)
        })
        .map(|el| (el, Resolution::TypeScan))
}

// ============================================================================
// Writing values
// ============================================================================

/// Apply the safety rules, then set the value and fire input/change/blur.
fn write_value<P: PageAccessor + ?Sized>(
    page: &mut P,
    element: ElementHandle,
    value: &str,
) -> Result<(), SkipReason> {
    if page.is_disabled(element) {
        return Err(SkipReason::Disabled);
    }
    if page.is_readonly(element) {
        return Err(SkipReason::Readonly);
    }
    if !is_empty(&*page, element) {
        return Err(SkipReason::AlreadyFilled);
    }

    let value = if page.tag_name(element).eq_ignore_ascii_case("select") {
        select_option(&*page, element, value).ok_or(SkipReason::NoMatchingOption)?
    } else {
        value.to_string()
    };

    page.set_value(element, &value);
    for event in SyntheticEvent::FILL_SEQUENCE {
        page.dispatch_event(element, event);
    }
    Ok(())
}

/// Option value whose value or text equals `wanted`, ignoring case.
fn select_option<P: PageAccessor + ?Sized>(
    page: &P,
    element: ElementHandle,
    wanted: &str,
) -> Option<String> {
    let wanted = wanted.trim().to_lowercase();
    page.options(element)
        .into_iter()
        .find(|(value, text)| {
            value.trim().to_lowercase() == wanted || text.trim().to_lowercase() == wanted
        })
        .map(|(value, _)| value)
        .filter(|value| !value.is_empty())
}

// ============================================================================
// Fill passes
// ============================================================================

/// Mapped mode: fill each target where it can be found and safely written.
/// A missing element never aborts the pass.
pub fn fill_targets<P: PageAccessor + ?Sized>(page: &mut P, targets: &[FillTarget]) -> FillReport {
    let mut report = FillReport::default();

    for target in targets {
        let skip = |reason| SkippedField {
            field: target.field.clone(),
            selector: Some(target.selector.clone()),
            reason,
        };

        let Some((element, resolution)) = resolve_target(&*page, target) else {
            debug!(selector = %target.selector, "target not found on page");
            report.skipped.push(skip(SkipReason::NotFound));
            continue;
        };

        match write_value(page, element, &target.value) {
            Ok(()) => report.filled.push(FilledField {
                element,
                field: target.field.clone(),
                resolution: Some(resolution),
            }),
            Err(reason) => report.skipped.push(skip(reason)),
        }
    }

    report
}

/// Raw mode: scan the live page and apply the heuristic table to every
/// visible control, taking values straight from `data`.
pub fn fill_from_data<P: PageAccessor + ?Sized>(page: &mut P, data: &ProjectDataBag) -> FillReport {
    let mut report = FillReport::default();

    for element in page.query_all(CANDIDATE_SELECTOR) {
        if !is_fillable(&*page, element) {
            continue;
        }
        let element_type = page.element_type(element);

        let label = page
            .label_text(element)
            .filter(|l| !l.trim().is_empty())
            .or_else(|| page.attribute(element, "aria-label"))
            .or_else(|| page.attribute(element, "title"))
            .unwrap_or_default();
        let name = page.attribute(element, "name").unwrap_or_default();
        let id = page.attribute(element, "id").unwrap_or_default();
        let placeholder = page.attribute(element, "placeholder").unwrap_or_default();
        let signal = signal_text([name.as_str(), id.as_str(), placeholder.as_str(), label.as_str()]);

        let Some(rule) = match_field(&element_type, &signal) else {
            continue;
        };
        let Some(value) = data.value(rule.field) else {
            continue;
        };

        match write_value(page, element, value) {
            Ok(()) => report.filled.push(FilledField {
                element,
                field: rule.field.to_string(),
                resolution: None,
            }),
            Err(reason) => report.skipped.push(SkippedField {
                field: rule.field.to_string(),
                selector: None,
                reason,
            }),
        }
    }

    report
}
