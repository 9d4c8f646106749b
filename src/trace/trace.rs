use chrono::Utc;
use serde::Serialize;

use crate::classifier::classifier::ClassifierPhase;
use crate::form::form_model::Strategy;

/// One line of the classification trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: i64,
    pub request: u64,

    pub phase: String,

    pub backend: Option<String>,
    pub strategy: Option<Strategy>,
    pub candidates: Option<usize>,
    pub mappings: Option<usize>,
    pub confidence: Option<f32>,
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(request: u64, phase: ClassifierPhase) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            request,
            phase: format!("{:?}", phase),
            backend: None,
            strategy: None,
            candidates: None,
            mappings: None,
            confidence: None,
            error: None,
        }
    }

    pub fn with_backend(mut self, backend: &str) -> Self {
        self.backend = Some(backend.to_string());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_candidates(mut self, count: usize) -> Self {
        self.candidates = Some(count);
        self
    }

    pub fn with_mappings(mut self, count: usize) -> Self {
        self.mappings = Some(count);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
