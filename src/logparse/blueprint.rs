//! Blueprint compile-log parsing.
//!
//! The compile commandlet prints one section per blueprint, opened by a
//! `Loading and Compiling:` line and closed by a long `=` rule. Everything
//! between is collected as that blueprint's messages and classified by
//! severity.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

const SECTION_MARKER: &str = "Loading and Compiling: ";
const SECTION_TERMINATOR: &str =
    "===================================================================================";

/// How bad a blueprint's compile messages are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// Messages and classification for one blueprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    pub message: Vec<String>,
    pub severity: Severity,
}

/// Per-blueprint compile results, keyed by blueprint name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct BlueprintCompileReport {
    pub blueprints: BTreeMap<String, CompileResult>,
}

impl BlueprintCompileReport {
    /// Parses a compile commandlet log from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::missing(path));
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        Ok(Self::from_lines(&lines))
    }

    pub fn from_lines(lines: &[String]) -> Self {
        let mut blueprints: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for line in lines {
            if line.contains(SECTION_TERMINATOR) {
                current = None;
            }

            if let Some(idx) = line.find(SECTION_MARKER) {
                let name = line[idx + SECTION_MARKER.len()..]
                    .replace("...", "")
                    .trim_end()
                    .to_string();
                blueprints.entry(name.clone()).or_default();
                current = Some(name);
            } else if let Some(name) = &current {
                // TODO: also require "compile" on the line before skipping;
                // the inherited filter drops every line mentioning
                // "successful", whatever it is about.
                if !line.to_lowercase().contains("successful") {
                    if let Some(messages) = blueprints.get_mut(name) {
                        messages.push(line.trim_end().to_string());
                    }
                }
            }
        }

        let blueprints = blueprints
            .into_iter()
            .map(|(name, message)| {
                let severity = classify(&message);
                debug!(blueprint = %name, %severity, lines = message.len(), "classified");
                (name, CompileResult { message, severity })
            })
            .collect();

        Self { blueprints }
    }

    /// Blueprints whose messages classified at `severity` or worse.
    pub fn at_least(&self, severity: Severity) -> Vec<&str> {
        self.blueprints
            .iter()
            .filter(|(_, result)| result.severity >= severity)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Strongest classification across all message lines wins.
fn classify(messages: &[String]) -> Severity {
    let mut severity = Severity::Notice;

    for line in messages {
        let lower = line.to_lowercase();

        let line_severity = if lower.contains("error: [callstack]") {
            Severity::Critical
        } else if lower.contains("logblueprint: error") {
            Severity::Error
        } else if lower.contains("logblueprint: warning") {
            Severity::Warning
        } else {
            Severity::Notice
        };

        severity = severity.max(line_severity);
    }

    severity
}
