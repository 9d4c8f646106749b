use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier::heuristic::{HEURISTIC_CONFIDENCE, HeuristicMatcher};
use crate::classifier::inference::TextInference;
use crate::classifier::prompt::{FormDescription, build_classification_prompt};
use crate::classifier::response::{RemoteClassification, parse_remote_classification};
use crate::error::{InferenceError, ResponseError};
use crate::form::form_model::{ClassificationResult, FieldMapping, ProjectDataBag, Strategy};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Mappings below this confidence are kept but flagged `low_confidence`.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f32 = 0.5;

/// `Idle → AttemptingRemote → {Success | AttemptingHeuristic} → Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierPhase {
    Idle,
    AttemptingRemote,
    Success,
    AttemptingHeuristic,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    pub heuristic_confidence: f32,
    pub acceptance_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heuristic_confidence: HEURISTIC_CONFIDENCE,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Why the remote attempt was abandoned.
#[derive(Debug, Error)]
pub enum RemoteFailure {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Maps form elements to project fields: one remote attempt, then the
/// heuristic table.
///
/// Holds no per-request state, so one instance can serve concurrent calls.
pub struct FieldClassifier {
    remote: Option<Box<dyn TextInference>>,
    heuristic: HeuristicMatcher,
    config: ClassifierConfig,
    tracer: TraceLogger,
    requests: AtomicU64,
}

impl FieldClassifier {
    /// Classifier with no remote capability; always uses the heuristic table.
    pub fn heuristic_only() -> Self {
        Self {
            remote: None,
            heuristic: HeuristicMatcher::default(),
            config: ClassifierConfig::default(),
            tracer: TraceLogger::disabled(),
            requests: AtomicU64::new(0),
        }
    }

    pub fn with_remote(backend: Box<dyn TextInference>) -> Self {
        Self {
            remote: Some(backend),
            ..Self::heuristic_only()
        }
    }

    pub fn with_config(mut self, config: ClassifierConfig) -> Self {
        self.heuristic = HeuristicMatcher::new(config.heuristic_confidence);
        self.config = config;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify every descriptor of `form` against `data`.
    ///
    /// Never fails: any remote problem degrades to the heuristic strategy.
    pub fn classify(&self, form: &FormDescription, data: &ProjectDataBag) -> ClassificationResult {
        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        self.tracer.log(
            &TraceEvent::now(request, ClassifierPhase::Idle)
                .with_candidates(form.descriptors.len()),
        );

        let remote = match &self.remote {
            Some(backend) => {
                self.tracer.log(
                    &TraceEvent::now(request, ClassifierPhase::AttemptingRemote)
                        .with_backend(backend.name()),
                );
                debug!(backend = backend.name(), "attempting remote classification");
                self.try_remote(backend.as_ref(), form, data)
            }
            None => Err(RemoteFailure::Inference(InferenceError::Unavailable)),
        };

        let (strategy, raw, reported) = match remote {
            Ok(parsed) => {
                let confidence = parsed.confidence.clamp(0.0, 1.0);
                let raw = parsed
                    .pairs()
                    .into_iter()
                    .map(|(selector, field)| FieldMapping {
                        selector,
                        matched_project_field: field,
                        confidence,
                        low_confidence: false,
                    })
                    .collect();
                self.tracer.log(
                    &TraceEvent::now(request, ClassifierPhase::Success).with_confidence(confidence),
                );
                (Strategy::Remote, raw, Some(confidence))
            }
            Err(failure) => {
                if self.remote.is_some() {
                    warn!(error = %failure, "remote classification failed, using heuristic table");
                } else {
                    debug!("no remote backend configured, using heuristic table");
                }
                self.tracer.log(
                    &TraceEvent::now(request, ClassifierPhase::AttemptingHeuristic)
                        .with_error(&failure),
                );
                (Strategy::Heuristic, self.heuristic.match_all(&form.descriptors), None)
            }
        };

        let field_mappings = self.finalize(raw, form, data);
        let overall_confidence = match reported {
            Some(confidence) => confidence,
            None if field_mappings.is_empty() => 0.0,
            None => self.heuristic.confidence,
        };

        info!(
            strategy = ?strategy,
            mappings = field_mappings.len(),
            candidates = form.descriptors.len(),
            "classification done"
        );
        self.tracer.log(
            &TraceEvent::now(request, ClassifierPhase::Done)
                .with_strategy(strategy)
                .with_mappings(field_mappings.len())
                .with_confidence(overall_confidence),
        );

        ClassificationResult {
            field_mappings,
            overall_confidence,
            strategy_used: strategy,
        }
    }

    fn try_remote(
        &self,
        backend: &dyn TextInference,
        form: &FormDescription,
        data: &ProjectDataBag,
    ) -> Result<RemoteClassification, RemoteFailure> {
        let prompt = build_classification_prompt(form, data);
        let text = backend.infer_text(&prompt)?;
        Ok(parse_remote_classification(&text)?)
    }

    /// Filters shared by both strategies.
    ///
    /// A mapping survives only if its selector names an editable descriptor
    /// of this pass, its field has a non-blank value, and no earlier mapping
    /// claimed the same selector.
    fn finalize(
        &self,
        raw: Vec<FieldMapping>,
        form: &FormDescription,
        data: &ProjectDataBag,
    ) -> Vec<FieldMapping> {
        let mut seen = HashSet::new();

        raw.into_iter()
            .filter_map(|mut mapping| {
                let Some(descriptor) = form.descriptor(&mapping.selector) else {
                    debug!(selector = %mapping.selector, "dropping mapping for unknown selector");
                    return None;
                };
                if !descriptor.is_editable() {
                    return None;
                }

                let field = resolve_field(data, &mapping.matched_project_field)?;
                if !seen.insert(mapping.selector.clone()) {
                    return None;
                }

                mapping.matched_project_field = field;
                mapping.low_confidence = mapping.confidence < self.config.acceptance_threshold;
                Some(mapping)
            })
            .collect()
    }
}

/// The bag's own spelling of `field`, if it holds a non-blank value.
/// Exact match first, then ASCII case-insensitive.
fn resolve_field(data: &ProjectDataBag, field: &str) -> Option<String> {
    let field = field.trim();
    if data.has_value(field) {
        return Some(field.to_string());
    }
    data.fields()
        .find(|key| key.eq_ignore_ascii_case(field) && data.has_value(key))
        .map(|key| key.to_string())
}
