use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::classifier::classifier::FieldClassifier;
use crate::classifier::inference::{HostedBackend, OllamaBackend};
use crate::classifier::prompt::FormDescription;
use crate::cli::config::{AppConfig, BackendKind, ResolvedInference};
use crate::delivery::bookmarklet::Bookmarklet;
use crate::delivery::install_page::render_install_page;
use crate::error::AutofillError;
use crate::form::extract::{EXTRACTION_SCRIPT, RawFieldSnapshot, describe_html, describe_snapshot};
use crate::form::form_model::{FormFieldDescriptor, ProjectDataBag};
use crate::synth::plan::build_fill_plan;
use crate::synth::program::{FillInput, Synthesizer};
use crate::trace::logger::TraceLogger;

pub const INSTALL_PAGE_TITLE: &str = "Autofill project data";

// ============================================================================
// extract / extract-script subcommands
// ============================================================================

pub fn cmd_extract(html_path: &str, form_index: Option<usize>) -> Result<(), AutofillError> {
    let html = read_file(html_path)?;
    let descriptors = describe_html(&html, form_index)?;
    info!(path = html_path, fields = descriptors.len(), "extracted form fields");
    println!("{}", to_json_pretty(&descriptors, "descriptors")?);
    Ok(())
}

pub fn cmd_extract_script() {
    print!("{}", EXTRACTION_SCRIPT);
}

// ============================================================================
// classify subcommand
// ============================================================================

pub fn cmd_classify(
    html: Option<&str>,
    fields: Option<&str>,
    project: &str,
    trace: Option<&str>,
    inference: &ResolvedInference,
    config: &AppConfig,
) -> Result<(), AutofillError> {
    let form = load_form(html, fields)?
        .ok_or_else(|| AutofillError::InvalidArgument("either --html or --fields is required".into()))?;
    let data = load_project(project)?;

    let mut classifier = build_classifier(inference, config)?;
    if let Some(path) = trace {
        classifier = classifier.with_tracer(TraceLogger::new(path));
    }

    let result = classifier.classify(&form, &data);
    println!("{}", to_json_pretty(&result, "classification")?);
    Ok(())
}

// ============================================================================
// bookmarklet subcommand
// ============================================================================

/// Build the bookmarklet and return the text that was written (install page
/// or bare URI). With `output` the text goes to that file, else stdout.
pub fn cmd_bookmarklet(
    project: &str,
    html: Option<&str>,
    fields: Option<&str>,
    output: Option<&str>,
    uri_only: bool,
    inference: &ResolvedInference,
    config: &AppConfig,
) -> Result<String, AutofillError> {
    let data = load_project(project)?;

    let input = match load_form(html, fields)? {
        Some(form) => {
            let classifier = build_classifier(inference, config)?;
            let result = classifier.classify(&form, &data);
            FillInput::Mapped(build_fill_plan(&result, &form.descriptors, &data))
        }
        None => {
            debug!("no form given, generating raw-mode program");
            FillInput::Raw(data)
        }
    };

    let synthesizer = build_synthesizer(config)?;
    let program = synthesizer.synthesize(&input, Utc::now())?;
    let bookmarklet = Bookmarklet::from_program(&program);

    let content = if uri_only {
        format!("{}\n", bookmarklet.href)
    } else {
        render_install_page(&bookmarklet, INSTALL_PAGE_TITLE)
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content).map_err(|e| AutofillError::io(path, e))?;
            info!(
                path,
                id = %bookmarklet.id,
                targets = program.target_count,
                expires_at = %bookmarklet.expires_at,
                "wrote bookmarklet"
            );
        }
        None => print!("{}", content),
    }

    Ok(content)
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the classifier for the resolved backend.
pub fn build_classifier(
    inference: &ResolvedInference,
    config: &AppConfig,
) -> Result<FieldClassifier, AutofillError> {
    let classifier = match inference.backend {
        BackendKind::Ollama => {
            let backend = OllamaBackend::new(inference.ollama_endpoint(), &inference.model)
                .with_timeout(inference.timeout);
            FieldClassifier::with_remote(Box::new(backend))
        }
        BackendKind::Hosted => {
            let endpoint = inference.endpoint.as_deref().ok_or_else(|| {
                AutofillError::InvalidArgument("the hosted backend needs an endpoint".into())
            })?;
            let backend = HostedBackend::new(endpoint, inference.api_token.as_deref())
                .with_timeout(inference.timeout);
            FieldClassifier::with_remote(Box::new(backend))
        }
        BackendKind::None => FieldClassifier::heuristic_only(),
    };

    Ok(classifier.with_config(config.classifier.to_classifier_config()))
}

pub fn build_synthesizer(config: &AppConfig) -> Result<Synthesizer, AutofillError> {
    if config.delivery.lifetime_minutes <= 0 {
        return Err(AutofillError::InvalidArgument(format!(
            "delivery.lifetime_minutes must be positive, got {}",
            config.delivery.lifetime_minutes
        )));
    }
    Ok(Synthesizer::new(Duration::minutes(config.delivery.lifetime_minutes))
        .with_notice_millis(config.delivery.notice_millis))
}

/// Project data from a JSON object file. Nested objects are flattened.
pub fn load_project(path: &str) -> Result<ProjectDataBag, AutofillError> {
    let value: Value = serde_json::from_str(&read_file(path)?)
        .map_err(|e| AutofillError::json(path, e))?;
    if !value.is_object() {
        return Err(AutofillError::InvalidArgument(format!(
            "{path}: project data must be a JSON object"
        )));
    }
    Ok(ProjectDataBag::from_json(&value))
}

/// Field list from a JSON array of descriptors (`extract` output) or raw
/// snapshots (extraction script output).
pub fn load_fields(path: &str) -> Result<Vec<FormFieldDescriptor>, AutofillError> {
    let value: Value = serde_json::from_str(&read_file(path)?)
        .map_err(|e| AutofillError::json(path, e))?;

    if let Ok(descriptors) = serde_json::from_value::<Vec<FormFieldDescriptor>>(value.clone()) {
        return Ok(descriptors);
    }
    let snapshots: Vec<RawFieldSnapshot> =
        serde_json::from_value(value).map_err(|e| AutofillError::json(path, e))?;
    Ok(describe_snapshot(&snapshots))
}

/// Form from `--html` or `--fields`; `None` when neither was given.
pub fn load_form(
    html: Option<&str>,
    fields: Option<&str>,
) -> Result<Option<FormDescription>, AutofillError> {
    match (html, fields) {
        (Some(path), _) => {
            let markup = read_file(path)?;
            let descriptors = describe_html(&markup, None)?;
            Ok(Some(
                FormDescription::from_descriptors(descriptors).with_markup(markup),
            ))
        }
        (None, Some(path)) => Ok(Some(FormDescription::from_descriptors(load_fields(path)?))),
        (None, None) => Ok(None),
    }
}

fn read_file(path: &str) -> Result<String, AutofillError> {
    std::fs::read_to_string(path).map_err(|e| AutofillError::io(path, e))
}

fn to_json_pretty<T: serde::Serialize>(value: &T, context: &str) -> Result<String, AutofillError> {
    serde_json::to_string_pretty(value).map_err(|e| AutofillError::json(context, e))
}
