//! Loaded JAAL document with accessors for the sections the report walks.
//!
//! All sections are optional; the schema is informal and only the parts the
//! report needs are looked up.

use crate::Result;
use crate::jaal::envelope;

use anyhow::Context;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Recording {
    root: Value,
}

/// A model answer step flattened out of (possibly nested) step lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswerStep<'a> {
    /// "3" for a top-level step, "3.2" for a substep.
    pub number: String,
    /// JSON path without the leading `$.`.
    pub path: String,
    pub step: &'a Value,
}

/// Read a JSON file and unwrap it if it carries the recorder envelope.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let doc: Value =
        serde_json::from_str(&text).with_context(|| format!("parse JSON in {}", path.display()))?;

    if envelope::is_wrapped(&doc) {
        info!("unwrapping recorder envelope in {}", path.display());
        let inner = envelope::unwrap(&doc)
            .with_context(|| format!("unwrap recording {}", path.display()))?;
        return Ok(Recording::from_value(inner));
    }

    debug!("{} is a bare JAAL document", path.display());
    Ok(Recording::from_value(doc))
}

impl Recording {
    pub fn from_value(root: Value) -> Self {
        Recording { root }
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.root.get("metadata")
    }

    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        self.root.get("definitions").and_then(Value::as_object)
    }

    pub fn initial_data_structures(&self) -> Option<&Vec<Value>> {
        self.root
            .pointer("/initialState/dataStructures")
            .and_then(Value::as_array)
    }

    pub fn initial_svg(&self) -> Option<&str> {
        self.root.pointer("/initialState/svg").and_then(Value::as_str)
    }

    pub fn animation(&self) -> Option<&Vec<Value>> {
        self.root.get("animation").and_then(Value::as_array)
    }

    pub fn model_answer(&self) -> Option<&Vec<Value>> {
        self.definitions()
            .and_then(|d| d.get("modelAnswer"))
            .and_then(Value::as_array)
    }

    /// Flatten the model answer; a list element contributes its substeps.
    pub fn model_answer_steps(&self) -> Vec<ModelAnswerStep<'_>> {
        let mut out = Vec::new();
        for (i, step) in self.model_answer().into_iter().flatten().enumerate() {
            match step {
                Value::Array(substeps) => {
                    for (j, sub) in substeps.iter().enumerate() {
                        out.push(ModelAnswerStep {
                            number: format!("{}.{}", i + 1, j + 1),
                            path: format!("definitions.modelAnswer[{}][{}]", i, j),
                            step: sub,
                        });
                    }
                }
                _ => out.push(ModelAnswerStep {
                    number: (i + 1).to_string(),
                    path: format!("definitions.modelAnswer[{}]", i),
                    step,
                }),
            }
        }
        out
    }
}
