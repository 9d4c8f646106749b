use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classifier::classifier::{ClassifierConfig, DEFAULT_ACCEPTANCE_THRESHOLD};
use crate::classifier::heuristic::HEURISTIC_CONFIDENCE;
use crate::classifier::inference::{
    DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, DEFAULT_TIMEOUT_SECS,
};
use crate::synth::program::{DEFAULT_LIFETIME_MINUTES, DEFAULT_NOTICE_MILLIS};

pub const DEFAULT_CONFIG_FILE: &str = "form-autofill.yaml";

pub const ENV_ENDPOINT: &str = "AUTOFILL_ENDPOINT";
pub const ENV_MODEL: &str = "AUTOFILL_MODEL";
pub const ENV_API_TOKEN: &str = "AUTOFILL_API_TOKEN";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Detect web-form fields and generate autofill bookmarklets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Remote classification endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model name (ollama backend)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Remote backend: ollama, hosted or none
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe the form controls of a saved HTML page
    Extract {
        /// HTML file to read
        #[arg(long)]
        html: String,

        /// Only the n-th <form> of the page (0-based)
        #[arg(long)]
        form_index: Option<usize>,
    },

    /// Print the in-page extraction script
    ExtractScript,

    /// Map form controls to project fields
    Classify {
        /// HTML file with the form
        #[arg(long, conflicts_with = "fields", required_unless_present = "fields")]
        html: Option<String>,

        /// JSON file with extracted fields (descriptors or raw snapshots)
        #[arg(long)]
        fields: Option<String>,

        /// JSON file with the project data
        #[arg(long)]
        project: String,

        /// Append a JSONL classification trace to this file
        #[arg(long)]
        trace: Option<String>,
    },

    /// Generate an expiring autofill bookmarklet
    Bookmarklet {
        /// JSON file with the project data
        #[arg(long)]
        project: String,

        /// HTML file with the form (mapped mode)
        #[arg(long, conflicts_with = "fields")]
        html: Option<String>,

        /// JSON file with extracted fields (mapped mode)
        #[arg(long)]
        fields: Option<String>,

        /// Install page path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Print only the javascript: URI
        #[arg(long, default_value_t = false)]
        uri_only: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    Hosted,
    None,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub backend: Option<BackendKind>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: None,
            endpoint: None,
            model: None,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSection {
    #[serde(default = "default_heuristic_confidence")]
    pub heuristic_confidence: f32,

    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            heuristic_confidence: HEURISTIC_CONFIDENCE,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl ClassifierSection {
    pub fn to_classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            heuristic_confidence: self.heuristic_confidence,
            acceptance_threshold: self.acceptance_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_lifetime_minutes")]
    pub lifetime_minutes: i64,

    #[serde(default = "default_notice_millis")]
    pub notice_millis: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            lifetime_minutes: DEFAULT_LIFETIME_MINUTES,
            notice_millis: DEFAULT_NOTICE_MILLIS,
        }
    }
}

// Serde default helpers
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_heuristic_confidence() -> f32 { HEURISTIC_CONFIDENCE }
fn default_acceptance_threshold() -> f32 { DEFAULT_ACCEPTANCE_THRESHOLD }
fn default_lifetime_minutes() -> i64 { DEFAULT_LIFETIME_MINUTES }
fn default_notice_millis() -> u64 { DEFAULT_NOTICE_MILLIS }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config file, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Setting resolution: CLI > config file > environment > defaults
// ============================================================================

/// Inference settings after merging every source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInference {
    pub backend: BackendKind,
    pub endpoint: Option<String>,
    pub model: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

/// Merge inference settings. `env` looks up an environment variable; pass
/// `|k| std::env::var(k).ok()` outside tests.
pub fn resolve_inference(
    cli: &Cli,
    config: &AppConfig,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedInference {
    let section = &config.inference;

    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| section.endpoint.clone())
        .or_else(|| env(ENV_ENDPOINT));
    let model = cli
        .model
        .clone()
        .or_else(|| section.model.clone())
        .or_else(|| env(ENV_MODEL))
        .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
    let api_token = section.api_token.clone().or_else(|| env(ENV_API_TOKEN));

    ResolvedInference {
        backend: cli.backend.or(section.backend).unwrap_or(BackendKind::Ollama),
        endpoint,
        model,
        api_token,
        timeout: Duration::from_secs(section.timeout_secs),
    }
}

impl ResolvedInference {
    /// Endpoint to call, falling back to the local Ollama default.
    pub fn ollama_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT)
    }
}
