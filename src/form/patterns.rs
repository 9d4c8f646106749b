use serde::Serialize;

/// One row of the heuristic table.
///
/// A rule matches an element when its type is listed in `element_types`, or
/// when a keyword occurs in the element's signal text starting at a word
/// boundary (`cell` hits `cell_no` and `cellphone`, never `excellent`).
/// `whole_words` must also end at a boundary. `textarea_only` rules never
/// match anything but a textarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPattern {
    pub field: &'static str,
    pub keywords: &'static [&'static str],
    pub whole_words: &'static [&'static str],
    pub element_types: &'static [&'static str],
    pub textarea_only: bool,
}

impl FieldPattern {
    pub fn matches(&self, element_type: &str, signal_text: &str) -> bool {
        let element_type = element_type.to_ascii_lowercase();
        if self.textarea_only && element_type != "textarea" {
            return false;
        }
        if self.element_types.iter().any(|t| *t == element_type) {
            return true;
        }
        self.keywords
            .iter()
            .any(|k| contains_word(signal_text, k, false))
            || self
                .whole_words
                .iter()
                .any(|k| contains_word(signal_text, k, true))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// `needle` occurs in `haystack` at a word start (and, with `whole`, ending at a word end).
pub fn contains_word(haystack: &str, needle: &str, whole: bool) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let starts_word = !haystack[..start].chars().next_back().is_some_and(is_word_char);
        let ends_word = !haystack[start + needle.len()..]
            .chars()
            .next()
            .is_some_and(is_word_char);
        starts_word && (!whole || ends_word)
    })
}

/// Matcher input from an element's name, id, placeholder and label.
///
/// camelCase is split (`userEmail` -> `user email`), whitespace collapsed,
/// everything lowercased. The raw-mode program normalises the same way.
pub fn signal_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for part in parts {
        let mut split = String::with_capacity(part.len());
        let mut prev: Option<char> = None;
        for c in part.chars() {
            let after_lower = prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if c.is_ascii_uppercase() && after_lower {
                split.push(' ');
            }
            split.push(c);
            prev = Some(c);
        }
        for word in split.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&word.to_lowercase());
        }
    }
    out
}

/// Ordered; the first matching row wins. Textarea-only rows come first so a
/// `business_description` textarea is not taken by `businessName`.
///
/// The same table is embedded in every raw-mode injection program, so the
/// in-page scan and the Rust matcher always agree.
pub const FIELD_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        field: "metaDescription",
        keywords: &["description", "about", "details", "content", "summary"],
        whole_words: &[],
        element_types: &[],
        textarea_only: true,
    },
    FieldPattern {
        field: "email",
        keywords: &["email", "e-mail"],
        whole_words: &[],
        element_types: &["email"],
        textarea_only: false,
    },
    FieldPattern {
        field: "phone",
        keywords: &["phone", "mobile", "telephone", "cell"],
        whole_words: &[],
        element_types: &["tel"],
        textarea_only: false,
    },
    FieldPattern {
        field: "website",
        keywords: &["website", "homepage", "web site", "url"],
        whole_words: &[],
        element_types: &["url"],
        textarea_only: false,
    },
    FieldPattern {
        field: "businessName",
        keywords: &["business", "company", "organization", "organisation", "firm"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "pincode",
        keywords: &["zip", "postal", "pincode", "postcode", "pin code"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "city",
        keywords: &["city", "town"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "state",
        keywords: &["province", "region"],
        whole_words: &["state"],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "country",
        keywords: &["country"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "address",
        keywords: &["address", "street", "addr"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "firstName",
        keywords: &["first name", "first_name", "firstname", "fname", "given"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "lastName",
        keywords: &["last name", "last_name", "lastname", "lname", "surname", "family"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "name",
        keywords: &["name", "contact person"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "category",
        keywords: &["category", "industry", "niche"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "keywords",
        keywords: &["keyword", "tags"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
    FieldPattern {
        field: "metaTitle",
        keywords: &["title", "headline"],
        whole_words: &[],
        element_types: &[],
        textarea_only: false,
    },
];

/// First rule matching the element, if any.
pub fn match_field(element_type: &str, signal_text: &str) -> Option<&'static FieldPattern> {
    FIELD_PATTERNS
        .iter()
        .find(|p| p.matches(element_type, signal_text))
}

/// Every semantic field name the table can produce, in table order.
pub fn known_fields() -> Vec<&'static str> {
    FIELD_PATTERNS.iter().map(|p| p.field).collect()
}
