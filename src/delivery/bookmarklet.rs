use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::synth::program::InjectionProgram;

/// Same set `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SCHEME: &str = "javascript:";
pub const EXPIRED_NOTICE: &str =
    "This autofill bookmarklet has expired. Generate a new one and remove this bookmark.";

// ============================================================================
// Bookmarklet
// ============================================================================

/// An injection program packaged as a `javascript:` URI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmarklet {
    pub id: String,
    /// Unencoded script: expiry guard around the program.
    pub script: String,
    pub href: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Bookmarklet {
    pub fn from_program(program: &InjectionProgram) -> Self {
        let script = guarded_script(program);
        let href = encode_uri(&script);
        Self {
            id: program.id().to_string(),
            script,
            href,
            created_at: program.created_at,
            expires_at: program.expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Wrap `program` so that running it at or after `expires_at` only shows a
/// notice. The check uses the browser clock at click time.
pub fn guarded_script(program: &InjectionProgram) -> String {
    let notice = serde_json::Value::String(EXPIRED_NOTICE.to_string()).to_string();
    format!(
        "(function(){{if(Date.now()>={expires}){{alert({notice});return;}}\n{source}\n}})();void 0",
        expires = program.expires_at.timestamp_millis(),
        notice = notice,
        source = program.source.trim_end(),
    )
}

/// `javascript:` URI for a script, percent-encoded like `encodeURIComponent`.
pub fn encode_uri(script: &str) -> String {
    format!("{}{}", SCHEME, utf8_percent_encode(script, URI_COMPONENT))
}
