/// Opaque reference to an element of the page behind a `PageAccessor`.
pub type ElementHandle = usize;

/// Events fired after a value change, in this order, so reactive frameworks
/// on the target page notice the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    Input,
    Change,
    Blur,
}

impl SyntheticEvent {
    pub const FILL_SEQUENCE: [SyntheticEvent; 3] = [
        SyntheticEvent::Input,
        SyntheticEvent::Change,
        SyntheticEvent::Blur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticEvent::Input => "input",
            SyntheticEvent::Change => "change",
            SyntheticEvent::Blur => "blur",
        }
    }
}

/// Minimal view of a live page: the operations the fill algorithm needs.
///
/// Implemented in-memory by `MemoryPage`; a headless-browser driver would
/// implement it over its own element API. Invalid selectors yield no match.
pub trait PageAccessor {
    fn query_element(&self, selector: &str) -> Option<ElementHandle> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementHandle>;

    fn tag_name(&self, element: ElementHandle) -> String;

    fn attribute(&self, element: ElementHandle, name: &str) -> Option<String>;

    fn value(&self, element: ElementHandle) -> String;

    fn set_value(&mut self, element: ElementHandle, value: &str);

    fn dispatch_event(&mut self, element: ElementHandle, event: SyntheticEvent);

    /// Text of the associated `<label>`, if the page has one.
    fn label_text(&self, _element: ElementHandle) -> Option<String> {
        None
    }

    /// `(value, text)` pairs of a `<select>`.
    fn options(&self, _element: ElementHandle) -> Vec<(String, String)> {
        Vec::new()
    }

    fn is_visible(&self, _element: ElementHandle) -> bool {
        true
    }

    fn is_disabled(&self, element: ElementHandle) -> bool {
        self.attribute(element, "disabled").is_some()
    }

    fn is_readonly(&self, element: ElementHandle) -> bool {
        self.attribute(element, "readonly").is_some()
    }

    /// `textarea`, `select`, or the input's lowercased `type` (default `text`).
    fn element_type(&self, element: ElementHandle) -> String {
        match self.tag_name(element).to_ascii_lowercase().as_str() {
            "textarea" => "textarea".to_string(),
            "select" => "select".to_string(),
            _ => self
                .attribute(element, "type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string()),
        }
    }
}
