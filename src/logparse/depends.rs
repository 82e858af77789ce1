//! Structured-list parsers for dependency and registry dumps.
//!
//! These operate on raw line ranges rather than chapters: the engine prints
//! import/export maps and asset-registry blocks as prefixed log lines, with
//! runs of parenthesized index entries under header lines.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::coerce;

const DISPLAY_PREFIX: &str = "LogPackageUtilities: Display:";
const WARNING_PREFIX: &str = "LogPackageUtilities: Warning:";
const REJECT_MARKER: &str = "LogInit: Display:";

const ALL_DEPENDS_HEADER: &str = "All Depends";
const DEPENDS_MAP_HEADER: &str = "DependsMap";

/// Parser for one import/export dependency dump.
///
/// `kind` is the index-marker word the engine uses for this dump
/// (`"Import"` or `"Export"`).
#[derive(Debug)]
pub struct DependencyList<'a> {
    lines: &'a [String],
    kind: &'a str,
}

impl<'a> DependencyList<'a> {
    pub fn new(lines: &'a [String], kind: &'a str) -> Self {
        Self { lines, kind }
    }

    /// Full dictionary form: marker name/index, named depends runs, and the
    /// generic `key value` fallback for everything else.
    pub fn parse(&self) -> Map<String, Value> {
        let mut out = Map::new();
        let mut processed: HashSet<usize> = HashSet::new();
        let index_flag = format!("{} ", self.kind);

        for (line_no, raw) in self.lines.iter().enumerate() {
            if processed.contains(&line_no) {
                continue;
            }

            let clean = strip_prefixes(raw);

            if clean.contains(&index_flag) && clean.contains(':') {
                if clean.contains(REJECT_MARKER) {
                    continue;
                }

                out.insert("Name".to_string(), coerce(&marker_name(&clean)));
                out.insert("Index".to_string(), coerce(&marker_index(&clean)));
                processed.insert(line_no);
            } else if clean.contains(ALL_DEPENDS_HEADER) {
                let (run, used) = collect_depends_run(self.lines, line_no + 1);
                processed.extend(used);
                out.insert("AllDepends".to_string(), Value::Array(run));
            } else if clean.contains(DEPENDS_MAP_HEADER) {
                let (run, used) = collect_depends_run(self.lines, line_no + 1);
                processed.extend(used);
                out.insert("DependsMap".to_string(), Value::Array(run));
            } else {
                let mut tokens = clean.split_whitespace();
                if let (Some(key), Some(value)) = (tokens.next(), tokens.next()) {
                    out.insert(key.replace('\'', ""), coerce(&value.replace('\'', "")));
                }
            }
        }

        out
    }

    /// The first run of consecutive index entries in the dump, in order.
    ///
    /// This is the list form used for the record's Imports/Exports.
    pub fn entries(&self) -> Vec<Value> {
        for (line_no, raw) in self.lines.iter().enumerate() {
            if depends_entry(&strip_prefixes(raw)).is_some() {
                let (run, _) = collect_depends_run(self.lines, line_no);
                return run;
            }
        }

        Vec::new()
    }
}

/// Collects consecutive valid index lines starting at `start`.
///
/// Stops at the first invalid line; a run that reaches the end of input is
/// returned as-is. Second element is the set of consumed line numbers.
fn collect_depends_run(lines: &[String], start: usize) -> (Vec<Value>, Vec<usize>) {
    let mut run = Vec::new();
    let mut used = Vec::new();

    for (offset, raw) in lines[start.min(lines.len())..].iter().enumerate() {
        match depends_entry(&strip_prefixes(raw)) {
            Some(entry) => {
                run.push(entry);
                used.push(start + offset);
            }
            None => break,
        }
    }

    (run, used)
}

/// One `(N) Type FullName` line as an object, or None when the line is not
/// a valid index entry (fewer than three tokens, or a non-numeric index).
fn depends_entry(line: &str) -> Option<Value> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let index = tokens[0].trim_matches(|c| c == '(' || c == ')');
    index.parse::<f64>().ok()?;

    let mut entry = Map::new();
    entry.insert("Index".to_string(), coerce(index));
    entry.insert("AssetType".to_string(), coerce(tokens[1]));
    entry.insert("AssetFullName".to_string(), coerce(tokens[2]));
    Some(Value::Object(entry))
}

fn strip_prefixes(line: &str) -> String {
    let mut out = line.to_string();
    for prefix in [DISPLAY_PREFIX, WARNING_PREFIX] {
        if out.contains(prefix) {
            out = out.replace(prefix, "");
        }
    }
    out.trim().to_string()
}

/// Name declared on a marker line: the text after the first colon, with
/// quotes removed.
fn marker_name(line: &str) -> String {
    line.split(':')
        .nth(1)
        .unwrap_or("")
        .replace('\'', "")
        .trim()
        .to_string()
}

/// Index declared on a marker line: the second token of the part before
/// the first `": "`.
fn marker_index(line: &str) -> String {
    let head = line.split(": ").next().unwrap_or("");
    head.split_whitespace().nth(1).unwrap_or("").to_string()
}

/// Parses a registry declaration remainder (`'Type'Name'` or
/// `Type'Name'`) into `(type, name)`.
pub(crate) fn parse_asset_declaration(rest: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = rest.split('\'').collect();

    let (asset_type, asset_name) = if rest.starts_with('\'') {
        (segments.get(1)?, segments.get(2)?)
    } else {
        (segments.first()?, segments.get(1)?)
    };

    if asset_type.is_empty() {
        return None;
    }

    Some((asset_type.to_string(), asset_name.to_string()))
}

/// Parser for a raw asset-registry dump (prefixed log lines, not chapters).
#[derive(Debug)]
pub struct AssetRegistryBlock<'a> {
    lines: &'a [String],
}

impl<'a> AssetRegistryBlock<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self { lines }
    }

    pub fn parse(&self) -> Map<String, Value> {
        let mut out = Map::new();

        for raw in self.lines {
            // Only engine registry lines carry data here.
            if !raw.contains(DISPLAY_PREFIX) {
                continue;
            }

            let line = raw.replace(DISPLAY_PREFIX, "").replace('"', "");
            let line = line.trim();

            // Truncated continuation lines start with a bracket.
            if line.is_empty() || line.starts_with('[') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let first = tokens.next().unwrap_or("");

            if first.contains(')') {
                let rest = line[first.len()..].trim_start();
                if let Some((asset_type, asset_name)) = parse_asset_declaration(rest) {
                    out.insert("AssetName".to_string(), Value::String(asset_name));
                    out.insert("AssetType".to_string(), Value::String(asset_type));
                } else {
                    debug!(line = %line, "unparseable registry declaration");
                }
            } else if line.starts_with("FiBData") {
                continue;
            } else if line.starts_with("AssetImportData") {
                let key = clean_key(first);
                let rest = line[first.len()..].trim_start();
                out.insert(key, Value::Object(inline_record(rest)));
            } else {
                let second = tokens.next().unwrap_or("");
                out.insert(clean_key(first), Value::String(clean_key(second)));
            }
        }

        out
    }
}

/// Parses an inline bracketed sub-record: strip three characters on each
/// side, split on commas, each pair on its first colon.
fn inline_record(data: &str) -> Map<String, Value> {
    let mut out = Map::new();

    let inner = if data.len() > 6 {
        data.get(3..data.len() - 3).unwrap_or("")
    } else {
        ""
    };

    for pair in inner.split(',') {
        match pair.split_once(':') {
            Some((key, value)) => {
                out.insert(
                    key.replace(' ', "").replace(':', ""),
                    Value::String(value.trim_start().to_string()),
                );
            }
            None => debug!(pair = %pair, "unparseable import data pair"),
        }
    }

    out
}

fn clean_key(token: &str) -> String {
    token.replace(':', "").trim_start().to_string()
}
