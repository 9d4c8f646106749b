use std::collections::BTreeMap;

use crate::page::accessor::{ElementHandle, PageAccessor, SyntheticEvent};

/// One element of a `MemoryPage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub value: String,
    pub label: Option<String>,
    pub options: Vec<(String, String)>,
    pub hidden: bool,
    /// Extra selectors (e.g. structural paths) this element answers to.
    pub aliases: Vec<String>,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn option(mut self, value: &str, text: &str) -> Self {
        self.options.push((value.to_string(), text.to_string()));
        self
    }

    pub fn alias(mut self, selector: &str) -> Self {
        self.aliases.push(selector.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// In-memory page for exercising fill logic without a browser.
///
/// Understands `#id`, `[attr="v"]`, `tag[attr="v"]`, `tag`, `tag.class`,
/// comma-separated lists of those, and exact aliases.
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub elements: Vec<MemoryElement>,
    pub events: Vec<(ElementHandle, SyntheticEvent)>,
}

impl MemoryPage {
    pub fn new(elements: Vec<MemoryElement>) -> Self {
        Self {
            elements,
            events: Vec::new(),
        }
    }

    pub fn value_of(&self, element: ElementHandle) -> &str {
        self.elements
            .get(element)
            .map(|e| e.value.as_str())
            .unwrap_or("")
    }

    pub fn events_for(&self, element: ElementHandle) -> Vec<SyntheticEvent> {
        self.events
            .iter()
            .filter(|(h, _)| *h == element)
            .map(|(_, e)| *e)
            .collect()
    }

    fn matches(&self, element: &MemoryElement, selector: &str) -> bool {
        if element.aliases.iter().any(|a| a == selector) {
            return true;
        }
        match SimpleSelector::parse(selector) {
            Some(simple) => simple.matches(element),
            None => false,
        }
    }
}

impl PageAccessor for MemoryPage {
    fn query_all(&self, selector: &str) -> Vec<ElementHandle> {
        let whole: Vec<ElementHandle> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.aliases.iter().any(|a| a == selector))
            .map(|(i, _)| i)
            .collect();
        if !whole.is_empty() {
            return whole;
        }

        let parts = split_selector_list(selector);
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| parts.iter().any(|p| !p.is_empty() && self.matches(e, p)))
            .map(|(i, _)| i)
            .collect()
    }

    fn tag_name(&self, element: ElementHandle) -> String {
        self.elements
            .get(element)
            .map(|e| e.tag.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, element: ElementHandle, name: &str) -> Option<String> {
        self.elements.get(element)?.attributes.get(name).cloned()
    }

    fn value(&self, element: ElementHandle) -> String {
        self.value_of(element).to_string()
    }

    fn set_value(&mut self, element: ElementHandle, value: &str) {
        if let Some(e) = self.elements.get_mut(element) {
            e.value = value.to_string();
        }
    }

    fn dispatch_event(&mut self, element: ElementHandle, event: SyntheticEvent) {
        self.events.push((element, event));
    }

    fn label_text(&self, element: ElementHandle) -> Option<String> {
        self.elements.get(element)?.label.clone()
    }

    fn options(&self, element: ElementHandle) -> Vec<(String, String)> {
        self.elements
            .get(element)
            .map(|e| e.options.clone())
            .unwrap_or_default()
    }

    fn is_visible(&self, element: ElementHandle) -> bool {
        self.elements.get(element).is_some_and(|e| !e.hidden)
    }
}

// ============================================================================
// Selector subset
// ============================================================================

#[derive(Debug, PartialEq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attribute: Option<(String, String)>,
}

impl SimpleSelector {
    fn parse(selector: &str) -> Option<Self> {
        let s = selector.trim();
        if s.is_empty() || (s.contains(' ') && !s.contains('[')) {
            return None;
        }

        let mut out = SimpleSelector {
            tag: None,
            id: None,
            classes: Vec::new(),
            attribute: None,
        };

        let (head, attr) = match s.find('[') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix(']')?;
                (&s[..open], Some(parse_attribute(inner)?))
            }
            None => (s, None),
        };
        out.attribute = attr;

        if let Some(id) = head.strip_prefix('#') {
            if id.is_empty() || id.contains(['.', '#', ':']) {
                return None;
            }
            out.id = Some(id.to_string());
            return Some(out);
        }

        let mut pieces = head.split('.');
        let tag = pieces.next().unwrap_or("");
        if !tag.is_empty() {
            if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return None;
            }
            out.tag = Some(tag.to_ascii_lowercase());
        }
        for class in pieces {
            if class.is_empty() {
                return None;
            }
            out.classes.push(class.to_string());
        }

        if out.tag.is_none() && out.classes.is_empty() && out.attribute.is_none() {
            return None;
        }
        Some(out)
    }

    fn matches(&self, element: &MemoryElement) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attributes.get("id") != Some(id) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let have = element.attributes.get("class").cloned().unwrap_or_default();
            let have: Vec<&str> = have.split_whitespace().collect();
            if !self.classes.iter().all(|c| have.contains(&c.as_str())) {
                return false;
            }
        }
        if let Some((name, value)) = &self.attribute {
            if element.attributes.get(name) != Some(value) {
                return false;
            }
        }
        true
    }
}

/// Split on commas that are not inside brackets or quotes.
fn split_selector_list(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => depth += 1,
            ']' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                parts.push(selector[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(selector[start..].trim());
    parts
}

/// `name="value"` with `\"` and `\\` escapes.
fn parse_attribute(inner: &str) -> Option<(String, String)> {
    let (name, raw) = inner.split_once('=')?;
    let raw = raw.trim();
    let quoted = raw.strip_prefix('"')?.strip_suffix('"')?;

    let mut value = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            value.push(chars.next()?);
        } else {
            value.push(c);
        }
    }
    Some((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> MemoryPage {
        MemoryPage::new(vec![
            MemoryElement::input("email").attr("id", "email").attr("name", "user_email"),
            MemoryElement::new("textarea").attr("class", "big note"),
            MemoryElement::input("text")
                .attr("placeholder", "Say \"hi\"")
                .alias("form > input:nth-of-type(2)"),
        ])
    }

    #[test]
    fn supported_selectors_resolve() {
        let p = page();
        assert_eq!(p.query_element("#email"), Some(0));
        assert_eq!(p.query_element("[name=\"user_email\"]"), Some(0));
        assert_eq!(p.query_element("input[name=\"user_email\"]"), Some(0));
        assert_eq!(p.query_element("textarea.note"), Some(1));
        assert_eq!(p.query_element("[placeholder=\"Say \\\"hi\\\"\"]"), Some(2));
        assert_eq!(p.query_element("form > input:nth-of-type(2)"), Some(2));
        assert_eq!(p.query_all("input, textarea, select"), vec![0, 1, 2]);
        assert_eq!(split_selector_list("[a=\"x, y\"], b"), vec!["[a=\"x, y\"]", "b"]);
    }

    #[test]
    fn unsupported_selector_matches_nothing() {
        let p = page();
        assert!(p.query_all("div > span").is_empty());
        assert!(p.query_all("#").is_empty());
    }
}
