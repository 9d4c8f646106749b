use chrono::{DateTime, Duration, TimeZone, Utc};
use percent_encoding::percent_decode_str;

use form_autofill::{
    delivery::{
        bookmarklet::{Bookmarklet, EXPIRED_NOTICE, SCHEME, encode_uri, guarded_script},
        install_page::render_install_page,
        store::BookmarkletStore,
    },
    form::form_model::ProjectDataBag,
    synth::program::{FillInput, InjectionProgram, Synthesizer},
};

use crate::common::utils::{project, sample_project};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
}

fn program_for(data: ProjectDataBag, issued_at: DateTime<Utc>) -> InjectionProgram {
    Synthesizer::default()
        .synthesize(&FillInput::Raw(data), issued_at)
        .unwrap()
}

// =========================================================================
// Bookmarklet encoding
// =========================================================================

#[test]
fn href_is_percent_encoded_javascript_uri() {
    let program = program_for(sample_project(), t0());
    let bookmarklet = Bookmarklet::from_program(&program);

    assert!(bookmarklet.href.starts_with(SCHEME));
    let body = &bookmarklet.href[SCHEME.len()..];
    for forbidden in [' ', '"', '<', '>', '\n', '{', '}', '#'] {
        assert!(!body.contains(forbidden), "raw {:?} in href", forbidden);
    }

    let decoded = percent_decode_str(body).decode_utf8().unwrap();
    assert_eq!(decoded, bookmarklet.script);
    assert!(bookmarklet.script.contains(program.source.trim_end()));
}

#[test]
fn encoding_matches_encode_uri_component() {
    assert_eq!(encode_uri("a b"), "javascript:a%20b");
    assert_eq!(encode_uri("f('x');"), "javascript:f('x')%3B");
    assert_eq!(encode_uri("-_.!~*"), "javascript:-_.!~*");
    assert_eq!(encode_uri("é"), "javascript:%C3%A9");
}

#[test]
fn guard_checks_expiry_before_running_program() {
    let program = program_for(sample_project(), t0());
    let script = guarded_script(&program);

    let expected_guard = format!(
        "(function(){{if(Date.now()>={}){{alert(",
        (t0() + Duration::minutes(30)).timestamp_millis()
    );
    assert!(script.starts_with(&expected_guard));
    assert!(script.contains(EXPIRED_NOTICE));
    assert!(script.ends_with("void 0"));

    let guard_end = script.find("return;}").unwrap();
    let program_start = script.find("var payload").unwrap();
    assert!(guard_end < program_start);
}

// =========================================================================
// Store and expiry
// =========================================================================

#[test]
fn store_hides_and_removes_expired_bookmarklets() {
    let mut store = BookmarkletStore::new();
    let program = program_for(sample_project(), t0());
    let issued = store.issue(&program);

    assert_eq!(store.len(), 1);
    assert!(store.get(&issued.id, t0()).is_some());
    assert!(
        store
            .get(&issued.id, t0() + Duration::minutes(29) + Duration::seconds(59))
            .is_some()
    );

    assert!(store.get(&issued.id, t0() + Duration::minutes(30)).is_none());
    assert!(store.is_empty());
    assert!(store.get(&issued.id, t0()).is_none());
}

#[test]
fn sweep_returns_removed_ids() {
    let mut store = BookmarkletStore::new();
    let early = store.issue(&program_for(project(&[("email", "a@b.com")]), t0()));
    let late = store.issue(&program_for(
        project(&[("email", "c@d.com")]),
        t0() + Duration::minutes(20),
    ));

    assert!(store.sweep(t0() + Duration::minutes(10)).is_empty());

    let removed = store.sweep(t0() + Duration::minutes(30));
    assert_eq!(removed, vec![early.id.clone()]);
    assert_eq!(store.len(), 1);
    assert!(store.get(&late.id, t0() + Duration::minutes(30)).is_some());

    let removed = store.sweep(t0() + Duration::hours(1));
    assert_eq!(removed, vec![late.id]);
    assert!(store.is_empty());
}

#[test]
fn reissuing_the_same_program_renews_it() {
    let mut store = BookmarkletStore::new();
    let first = store.issue(&program_for(sample_project(), t0()));
    let second = store.issue(&program_for(sample_project(), t0() + Duration::minutes(25)));

    assert_eq!(first.id, second.id);
    assert_eq!(store.len(), 1);
    assert!(store.get(&first.id, t0() + Duration::minutes(40)).is_some());
}

// =========================================================================
// Install page
// =========================================================================

#[test]
fn install_page_links_bookmarklet_and_removes_it_on_expiry() {
    let program = program_for(sample_project(), t0());
    let bookmarklet = Bookmarklet::from_program(&program);
    let html = render_install_page(&bookmarklet, "Fill <Acme> & co");

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Fill &lt;Acme&gt; &amp; co"));
    assert!(!html.contains("Fill <Acme>"));
    let escaped_href = bookmarklet.href.replace('\'', "&#39;");
    assert!(html.contains(&format!("href=\"{}\"", escaped_href)));
    assert!(html.contains("id=\"bookmarklet-link\""));
    assert!(html.contains(&bookmarklet.expires_at.timestamp_millis().to_string()));
    assert!(html.contains("removeChild(link)"));
}
