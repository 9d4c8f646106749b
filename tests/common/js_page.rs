#![allow(dead_code)]

use rquickjs::{Context, Runtime};
use serde::Deserialize;
use serde_json::Value;

const DOM_STUB: &str = include_str!("dom_stub.js");

/// Page state after an injection program ran against the DOM stub.
#[derive(Debug, Deserialize)]
pub struct PageRun {
    pub values: Vec<String>,
    pub events: Vec<(i64, String)>,
    pub notices: Vec<String>,
    pub error: Option<String>,
}

impl PageRun {
    pub fn events_for(&self, element: i64) -> Vec<&str> {
        self.events
            .iter()
            .filter(|(index, _)| *index == element)
            .map(|(_, event)| event.as_str())
            .collect()
    }
}

/// Run `source` in QuickJS against a page built from `elements`.
///
/// Each element spec is `{tag, attrs, value, hidden, label, options, aliases}`;
/// `label` is the text of a wrapping `<label>`.
pub fn run_in_page(source: &str, elements: &Value) -> PageRun {
    let script = format!(
        "{}\n__loadPage({});\nvar __error = null;\ntry {{\n{}\n}} catch (e) {{ __error = String(e); }}\n__report(__error);\n",
        DOM_STUB, elements, source
    );

    let runtime = Runtime::new().unwrap();
    let context = Context::full(&runtime).unwrap();
    let json: String = context
        .with(|ctx| ctx.eval::<String, _>(script))
        .unwrap();

    let run: PageRun = serde_json::from_str(&json).unwrap();
    assert!(run.error.is_none(), "program threw: {:?}", run.error);
    run
}
