use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AutofillError;
use crate::form::extract::SKIPPED_INPUT_TYPES;
use crate::form::form_model::ProjectDataBag;
use crate::form::patterns::{FIELD_PATTERNS, FieldPattern};
use crate::synth::plan::FillTarget;

/// Program skeleton. The only variable part is the payload literal.
pub const PROGRAM_TEMPLATE: &str = include_str!("templates/fill_program.js");
pub const PAYLOAD_MARKER: &str = "__AUTOFILL_PAYLOAD__";

pub const DEFAULT_LIFETIME_MINUTES: i64 = 30;
pub const DEFAULT_NOTICE_MILLIS: u64 = 4000;
pub const DEFAULT_NOTICE: &str = "Autofill: {count} field(s) filled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Mapped,
    Raw,
}

/// What a program is generated from.
#[derive(Debug, Clone, PartialEq)]
pub enum FillInput {
    /// Values already bound to extracted elements.
    Mapped(Vec<FillTarget>),
    /// No classification; the program scans the live page itself.
    Raw(ProjectDataBag),
}

impl FillInput {
    pub fn mode(&self) -> FillMode {
        match self {
            FillInput::Mapped(_) => FillMode::Mapped,
            FillInput::Raw(_) => FillMode::Raw,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    mode: FillMode,
    targets: Vec<&'a FillTarget>,
    data: Option<ProjectDataBag>,
    rules: &'a [FieldPattern],
    skip_types: &'a [&'a str],
    notice: &'a str,
    notice_millis: u64,
}

/// Generated in-page program with its delivery window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionProgram {
    /// SHA-1 of `source`.
    pub fingerprint: String,
    pub mode: FillMode,
    pub source: String,
    pub target_count: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl InjectionProgram {
    pub fn id(&self) -> &str {
        &self.fingerprint[..12.min(self.fingerprint.len())]
    }

    /// Expired at any instant `>= expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Renders programs and stamps their lifetime.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    pub lifetime: Duration,
    pub notice: String,
    pub notice_millis: u64,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self {
            lifetime: Duration::minutes(DEFAULT_LIFETIME_MINUTES),
            notice: DEFAULT_NOTICE.to_string(),
            notice_millis: DEFAULT_NOTICE_MILLIS,
        }
    }
}

impl Synthesizer {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            ..Self::default()
        }
    }

    pub fn with_notice_millis(mut self, millis: u64) -> Self {
        self.notice_millis = millis;
        self
    }

    /// Program text for `input`. Same input, same text.
    pub fn render_source(&self, input: &FillInput) -> Result<String, AutofillError> {
        let payload = match input {
            FillInput::Mapped(targets) => Payload {
                mode: FillMode::Mapped,
                targets: targets.iter().filter(|t| !t.value.trim().is_empty()).collect(),
                data: None,
                rules: &[],
                skip_types: SKIPPED_INPUT_TYPES,
                notice: &self.notice,
                notice_millis: self.notice_millis,
            },
            FillInput::Raw(data) => Payload {
                mode: FillMode::Raw,
                targets: Vec::new(),
                data: Some(data.without_blanks()),
                rules: FIELD_PATTERNS,
                skip_types: SKIPPED_INPUT_TYPES,
                notice: &self.notice,
                notice_millis: self.notice_millis,
            },
        };

        let literal = serde_json::to_string(&payload)
            .map_err(|e| AutofillError::json("injection payload", e))?;
        Ok(render_template(PROGRAM_TEMPLATE, &literal))
    }

    pub fn synthesize(
        &self,
        input: &FillInput,
        issued_at: DateTime<Utc>,
    ) -> Result<InjectionProgram, AutofillError> {
        let source = self.render_source(input)?;
        let target_count = match input {
            FillInput::Mapped(targets) => targets
                .iter()
                .filter(|t| !t.value.trim().is_empty())
                .count(),
            FillInput::Raw(data) => data.without_blanks().len(),
        };

        let program = InjectionProgram {
            fingerprint: fingerprint(&source),
            mode: input.mode(),
            source,
            target_count,
            created_at: issued_at,
            expires_at: issued_at + self.lifetime,
        };

        debug!(
            id = program.id(),
            mode = ?program.mode,
            targets = target_count,
            bytes = program.source.len(),
            "synthesized injection program"
        );
        Ok(program)
    }
}

/// Substitute the payload literal into a skeleton.
///
/// `<`, U+2028 and U+2029 are escaped so the literal is safe inside HTML and
/// in every JS engine's string grammar.
pub fn render_template(template: &str, payload_json: &str) -> String {
    let safe = payload_json
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029");
    template.replacen(PAYLOAD_MARKER, &safe, 1)
}

pub fn fingerprint(text: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
