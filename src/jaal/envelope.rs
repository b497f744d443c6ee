//! Envelope written by the exercise recorder around a JAAL document.
//!
//! JSON shape:
//! {
//!   "description": "JAAL 2.0 recording",
//!   "generator": "JSAV Exercise Recorder 2.0.1",
//!   "encoding": "JSON string -> HTML escape -> zlib compress -> Base64 encode",
//!   "data": "eJzNWF1v2zYU/S..."
//! }
//!
//! Unwrapping runs the encoding chain backwards:
//! base64 decode -> zlib inflate -> UTF-8 text -> HTML unescape -> JSON parse.

use crate::jaal::unescape::unescape_html;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::read::ZlibDecoder;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

/// Value of `description` that marks a wrapped recording.
pub const WRAPPED_DESCRIPTION: &str = "JAAL 2.0 recording";

/// Number of leading/trailing units shown per stage in a [`DecodeTrace`].
const PEEK: usize = 8;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("envelope is malformed: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("envelope has no 'data' field")]
    MissingData,

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("zlib inflate failed: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("inflated payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("unwrapped payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
}

/// Typed view of the envelope fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub generator: String,

    #[serde(default)]
    pub encoding: String,

    #[serde(default)]
    pub data: Option<String>,
}

impl Envelope {
    pub fn from_value(doc: &Value) -> Result<Self, DecodeError> {
        Envelope::deserialize(doc).map_err(DecodeError::Envelope)
    }

    fn payload(&self) -> Result<&str, DecodeError> {
        self.data.as_deref().ok_or(DecodeError::MissingData)
    }
}

/// True if `doc` is a recorder envelope rather than a bare JAAL document.
pub fn is_wrapped(doc: &Value) -> bool {
    doc.get("description").and_then(Value::as_str) == Some(WRAPPED_DESCRIPTION)
}

/// Recover the inner JAAL document from an envelope.
pub fn unwrap(doc: &Value) -> Result<Value, DecodeError> {
    let envelope = Envelope::from_value(doc)?;
    let text = decode_text(envelope.payload()?)?;
    serde_json::from_str(&text).map_err(DecodeError::Json)
}

/// Run the chain up to (and including) HTML unescaping.
pub fn decode_text(data: &str) -> Result<String, DecodeError> {
    let compressed = decode_base64(data)?;
    let inflated = inflate(&compressed)?;
    let text = String::from_utf8(inflated)?;
    let unescaped = unescape_html(&text);
    debug!(
        base64 = data.len(),
        compressed = compressed.len(),
        unescaped = unescaped.len(),
        "decoded envelope payload"
    );
    Ok(unescaped)
}

fn decode_base64(data: &str) -> Result<Vec<u8>, DecodeError> {
    // Exported payloads may be line-wrapped.
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

fn inflate(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(DecodeError::Inflate)?;
    Ok(out)
}

/// One step of the decode pipeline as seen by the `decode` command.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub kind: &'static str,
    pub len: usize,
    pub head: String,
    pub tail: String,
}

impl Stage {
    fn text(name: &'static str, s: &str) -> Self {
        let chars: Vec<char> = s.chars().collect();
        let n = chars.len();
        Stage {
            name,
            kind: "text",
            len: n,
            head: chars[..n.min(PEEK)].iter().collect(),
            tail: chars[n.saturating_sub(PEEK)..].iter().collect(),
        }
    }

    fn bytes(name: &'static str, b: &[u8]) -> Self {
        let n = b.len();
        Stage {
            name,
            kind: "bytes",
            len: n,
            head: b[..n.min(PEEK)].escape_ascii().to_string(),
            tail: b[n.saturating_sub(PEEK)..].escape_ascii().to_string(),
        }
    }
}

/// The decode chain executed stage by stage, keeping what each stage produced.
#[derive(Debug, Clone)]
pub struct DecodeTrace {
    pub envelope: Envelope,
    pub stages: Vec<Stage>,
    /// Final unescaped text (the JSON document source).
    pub text: String,
}

impl DecodeTrace {
    pub fn run(envelope: Envelope) -> Result<Self, DecodeError> {
        let data = envelope.payload()?;
        let mut stages = vec![Stage::text("base64 payload", data)];

        let compressed = decode_base64(data)?;
        stages.push(Stage::bytes("base64 decoded", &compressed));

        let inflated = inflate(&compressed)?;
        stages.push(Stage::bytes("zlib inflated", &inflated));

        let text = String::from_utf8(inflated)?;
        stages.push(Stage::text("utf-8 text", &text));

        let text = unescape_html(&text);
        stages.push(Stage::text("html unescaped", &text));

        Ok(DecodeTrace {
            envelope,
            stages,
            text,
        })
    }

    /// Characters `range` of the unescaped text, clamped to its length.
    pub fn window(&self, range: Range<usize>) -> String {
        self.text
            .chars()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    pub fn parse(&self) -> Result<Value, DecodeError> {
        serde_json::from_str(&self.text).map_err(DecodeError::Json)
    }
}

impl fmt::Display for DecodeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "description: {}", self.envelope.description)?;
        writeln!(f, "generator:   {}", self.envelope.generator)?;
        writeln!(f, "encoding:    {}", self.envelope.encoding)?;
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "[{}] {} ({}, len {})", i + 1, stage.name, stage.kind, stage.len)?;
            writeln!(f, "    first/last {}: {} ... {}", PEEK, stage.head, stage.tail)?;
        }
        Ok(())
    }
}
