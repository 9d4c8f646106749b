use form_autofill::{
    page::{
        accessor::{PageAccessor, SyntheticEvent},
        filler::{Resolution, SkipReason, fill_from_data, fill_targets, resolve_target},
        memory::{MemoryElement, MemoryPage},
    },
    synth::plan::FillTarget,
};

use crate::common::utils::{project, sample_project};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn target(selector: &str, element_type: &str, field: &str, value: &str) -> FillTarget {
    FillTarget {
        element_type: element_type.into(),
        ..FillTarget::new(selector, field, value)
    }
}

// =========================================================================
// Resolution cascade
// =========================================================================

#[test]
fn id_wins_over_type_scan() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("email"),
        MemoryElement::input("email").attr("id", "work-email"),
    ]);
    let t = FillTarget {
        id: "work-email".into(),
        ..target("#stale-selector", "email", "email", "a@b.com")
    };

    assert_eq!(resolve_target(&page, &t), Some((1, Resolution::Id)));

    let report = fill_targets(&mut page, &[t]);
    assert_eq!(report.filled_count(), 1);
    assert_eq!(page.value_of(1), "a@b.com");
    assert_eq!(page.value_of(0), "");
}

#[test]
fn cascade_falls_through_in_order() {
    let page = MemoryPage::new(vec![
        MemoryElement::new("div").attr("id", "phone"),
        MemoryElement::input("tel").attr("name", "phone_number"),
        MemoryElement::input("text").attr("placeholder", "Your city"),
        MemoryElement::input("url").alias("form > input:nth-of-type(4)"),
        MemoryElement::new("textarea"),
    ]);

    // id names a non-control, so name decides
    let by_name = FillTarget {
        id: "phone".into(),
        name: "phone_number".into(),
        ..target("#phone", "tel", "phone", "1")
    };
    assert_eq!(resolve_target(&page, &by_name), Some((1, Resolution::Name)));

    let by_placeholder = FillTarget {
        placeholder: "Your city".into(),
        ..target("#nope", "text", "city", "x")
    };
    assert_eq!(
        resolve_target(&page, &by_placeholder),
        Some((2, Resolution::Placeholder))
    );

    let by_selector = target("form > input:nth-of-type(4)", "url", "website", "x");
    assert_eq!(resolve_target(&page, &by_selector), Some((3, Resolution::Selector)));

    let by_type = target("#gone", "textarea", "metaDescription", "x");
    assert_eq!(resolve_target(&page, &by_type), Some((4, Resolution::TypeScan)));

    let nothing = target("#gone", "date", "founded", "x");
    assert_eq!(resolve_target(&page, &nothing), None);
}

#[test]
fn type_scan_skips_filled_hidden_and_locked_controls() {
    let page = MemoryPage::new(vec![
        MemoryElement::input("text").value("taken"),
        MemoryElement::input("text").hidden(),
        MemoryElement::input("text").attr("readonly", ""),
        MemoryElement::input("text").attr("disabled", ""),
        MemoryElement::input("text"),
    ]);
    let t = target("#gone", "text", "city", "Springfield");
    assert_eq!(resolve_target(&page, &t), Some((4, Resolution::TypeScan)));
}

#[test]
fn hidden_twin_never_receives_the_value() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("hidden").attr("name", "email"),
        MemoryElement::input("text").attr("name", "email"),
    ]);
    let t = FillTarget {
        name: "email".into(),
        ..target("input[name=\"email\"]", "text", "email", "a@b.com")
    };

    assert_eq!(resolve_target(&page, &t), Some((1, Resolution::Name)));

    let report = fill_targets(&mut page, &[t]);
    assert_eq!(report.filled_count(), 1);
    assert_eq!(page.value_of(0), "");
    assert_eq!(page.value_of(1), "a@b.com");
}

#[test]
fn lookup_steps_pass_over_unfillable_matches() {
    let page = MemoryPage::new(vec![
        MemoryElement::input("password").attr("id", "pin").attr("placeholder", "PIN"),
        MemoryElement::input("text").attr("placeholder", "PIN").hidden(),
        MemoryElement::input("text").attr("class", "pin"),
        MemoryElement::input("text").attr("placeholder", "PIN"),
    ]);

    // id hits a password field, placeholder skips the hidden one
    let by_placeholder = FillTarget {
        id: "pin".into(),
        placeholder: "PIN".into(),
        ..target("input.pin", "text", "pincode", "12345")
    };
    assert_eq!(
        resolve_target(&page, &by_placeholder),
        Some((3, Resolution::Placeholder))
    );

    let hidden_selector = MemoryPage::new(vec![
        MemoryElement::input("text").attr("class", "zip").hidden(),
        MemoryElement::input("tel"),
    ]);
    let t = target("input.zip", "text", "pincode", "12345");
    assert_eq!(resolve_target(&hidden_selector, &t), None);
}

// =========================================================================
// Safety rules
// =========================================================================

#[test]
fn prefilled_field_is_left_untouched() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("email").attr("id", "email").value("x@x.com"),
    ]);
    let t = FillTarget {
        id: "email".into(),
        ..target("#email", "email", "email", "a@b.com")
    };

    let report = fill_targets(&mut page, &[t]);

    assert_eq!(report.filled_count(), 0);
    assert_eq!(report.skipped[0].reason, SkipReason::AlreadyFilled);
    assert_eq!(page.value_of(0), "x@x.com");
    assert!(page.events.is_empty());
}

#[test]
fn disabled_and_readonly_are_skipped() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("text").attr("id", "a").attr("disabled", ""),
        MemoryElement::input("text").attr("id", "b").attr("readonly", "readonly"),
    ]);
    let report = fill_targets(
        &mut page,
        &[
            target("#a", "text", "city", "x"),
            target("#b", "text", "state", "y"),
        ],
    );

    let reasons: Vec<SkipReason> = report.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(reasons, vec![SkipReason::Disabled, SkipReason::Readonly]);
    assert_eq!(page.value_of(0), "");
    assert_eq!(page.value_of(1), "");
}

#[test]
fn missing_element_does_not_abort_the_pass() {
    let mut page = MemoryPage::new(vec![MemoryElement::input("tel").attr("id", "phone")]);
    let report = fill_targets(
        &mut page,
        &[
            target("#gone", "date", "founded", "2020"),
            target("#phone", "tel", "phone", "555"),
        ],
    );

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::NotFound);
    assert_eq!(report.filled_count(), 1);
    assert_eq!(page.value_of(0), "555");
}

#[test]
fn events_fire_input_change_blur() {
    let mut page = MemoryPage::new(vec![MemoryElement::input("text").attr("id", "city")]);
    fill_targets(&mut page, &[target("#city", "text", "city", "Springfield")]);

    assert_eq!(
        page.events_for(0),
        vec![SyntheticEvent::Input, SyntheticEvent::Change, SyntheticEvent::Blur]
    );
    let names: Vec<&str> = SyntheticEvent::FILL_SEQUENCE.iter().map(|e| e.as_str()).collect();
    assert_eq!(names, vec!["input", "change", "blur"]);
}

#[test]
fn select_matches_option_value_or_text() {
    let country = || {
        MemoryElement::new("select")
            .option("", "Choose")
            .option("US", "United States")
            .option("FR", "France")
    };
    let mut page = MemoryPage::new(vec![
        country().attr("id", "c1"),
        country().attr("id", "c2"),
        country().attr("id", "c3"),
    ]);

    let report = fill_targets(
        &mut page,
        &[
            target("#c1", "select", "country", "france"),
            target("#c2", "select", "country", "US"),
            target("#c3", "select", "country", "Atlantis"),
        ],
    );

    assert_eq!(page.value_of(0), "FR");
    assert_eq!(page.value_of(1), "US");
    assert_eq!(page.value_of(2), "");
    assert_eq!(report.skipped[0].reason, SkipReason::NoMatchingOption);
}

// =========================================================================
// Raw mode
// =========================================================================

#[test]
fn raw_fill_uses_pattern_table_on_live_page() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("text").attr("name", "company_name"),
        MemoryElement::input("email"),
        MemoryElement::input("text").label("Mobile number"),
        MemoryElement::input("text").attr("name", "city").value("Paris"),
        MemoryElement::input("password").attr("name", "email_password"),
        MemoryElement::input("text").attr("name", "country").hidden(),
        MemoryElement::new("textarea").attr("name", "details"),
        MemoryElement::input("text").attr("name", "nickname_xyz"),
    ]);

    let report = fill_from_data(&mut page, &sample_project());

    assert_eq!(page.value_of(0), "Acme Widgets");
    assert_eq!(page.value_of(1), "a@b.com");
    assert_eq!(page.value_of(2), "+1 555 0100");
    assert_eq!(page.value_of(3), "Paris");
    assert_eq!(page.value_of(4), "");
    assert_eq!(page.value_of(5), "");
    assert_eq!(page.value_of(6), "Widgets for every occasion");
    assert_eq!(page.value_of(7), "");

    assert_eq!(report.filled_count(), 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::AlreadyFilled);
}

#[test]
fn raw_fill_normalises_labels_and_falls_back_to_title() {
    let mut page = MemoryPage::new(vec![
        MemoryElement::input("text").label("First\n     Name"),
        MemoryElement::input("text").attr("title", "Surname"),
        MemoryElement::input("text").attr("id", "billingState"),
        MemoryElement::input("text").attr("name", "statement_ref"),
    ]);
    let data = project(&[
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("state", "Illinois"),
    ]);

    let report = fill_from_data(&mut page, &data);

    assert_eq!(page.value_of(0), "Ada");
    assert_eq!(page.value_of(1), "Lovelace");
    assert_eq!(page.value_of(2), "Illinois");
    assert_eq!(page.value_of(3), "");
    assert_eq!(report.filled_count(), 3);
}

#[test]
fn raw_fill_ignores_fields_without_data() {
    let mut page = MemoryPage::new(vec![MemoryElement::input("text").attr("name", "zip")]);
    let report = fill_from_data(&mut page, &project(&[("pincode", "  ")]));

    assert_eq!(report.filled_count(), 0);
    assert!(report.skipped.is_empty());
    assert_eq!(page.query_element("[name=\"zip\"]"), Some(0));
}
