//! Structured view over one asset's PkgInfo log fragment.
//!
//! [`PackageLog`] reads the fragment once, splits it into chapters, and
//! exposes one getter per chapter. [`PackageLog::record`] assembles the
//! final [`PackageRecord`] from the individual getter results, so a skipped
//! or reordered parse step can never leave the record half-mutated.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::chapters::{split_chapters, Chapter, ChapterKind};
use super::depends::{parse_asset_declaration, DependencyList};
use super::coerce;
use crate::error::Result;

/// Project-relative content marker. Everything after it is the asset path
/// as the engine displays it.
const CONTENT_ROOT_MARKER: &str = "/Content/";

/// Registry keys whose values are known-unparseable and intentionally
/// excluded from the record.
const REGISTRY_SKIP_KEYS: &[&str] = &["FiBData"];

/// The structured output for one asset.
///
/// Field order is the on-disk JSON key order.
#[derive(Debug, Clone, Serialize)]
pub struct PackageRecord {
    #[serde(rename = "UnrealFileName")]
    pub unreal_file_name: String,
    #[serde(rename = "AssetPath")]
    pub asset_path: String,
    #[serde(rename = "AssetType")]
    pub asset_type: String,
    #[serde(rename = "PackageInfo")]
    pub package_info: Map<String, Value>,
    #[serde(rename = "PackageReferences")]
    pub package_references: Map<String, Value>,
    #[serde(rename = "AssetRegistry")]
    pub asset_registry: Map<String, Value>,
    #[serde(rename = "Imports")]
    pub imports: Vec<Value>,
    #[serde(rename = "Exports")]
    pub exports: Vec<Value>,
}

/// One PkgInfo log fragment, read once and cached for the object's lifetime.
#[derive(Debug)]
pub struct PackageLog {
    path: PathBuf,
    lines: OnceCell<Vec<String>>,
    chapters: OnceCell<Vec<Chapter>>,
}

impl PackageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: OnceCell::new(),
            chapters: OnceCell::new(),
        }
    }

    /// Builds a log view from lines already in memory (tests, split output).
    pub fn from_lines(lines: Vec<String>) -> Self {
        let log = Self::new(PathBuf::new());
        let _ = log.lines.set(lines);
        log
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lines(&self) -> Result<&[String]> {
        let lines = self.lines.get_or_try_init(|| -> Result<Vec<String>> {
            // Engine logs are nominally UTF-8 but stray bytes happen;
            // decode lossily rather than fail the whole fragment.
            let bytes = std::fs::read(&self.path)?;
            let text = String::from_utf8_lossy(&bytes);
            Ok(text.lines().map(str::to_string).collect())
        })?;
        Ok(lines)
    }

    fn chapters(&self) -> Result<&[Chapter]> {
        let chapters = self
            .chapters
            .get_or_try_init(|| -> Result<Vec<Chapter>> { Ok(split_chapters(self.lines()?)) })?;
        Ok(chapters)
    }

    fn chapter_of(&self, kind: ChapterKind) -> Result<Option<&Chapter>> {
        Ok(self.chapters()?.iter().find(|c| c.kind() == kind))
    }

    /// The absolute package path as declared by the `Filename:` line.
    pub fn absolute_package_path(&self) -> Result<Option<String>> {
        for line in self.lines()? {
            if let Some(idx) = line.find("Filename: ") {
                let path = line[idx + "Filename: ".len()..].trim();
                return Ok(Some(path.to_string()));
            }
        }

        warn!(path = %self.path.display(), "no Filename line in fragment");
        Ok(None)
    }

    /// Display path of the asset: `/Content/` plus everything after the
    /// content root in the absolute filename.
    pub fn relative_package_path(&self) -> Result<String> {
        let Some(absolute) = self.absolute_package_path()? else {
            return Ok(String::new());
        };

        let normalized = absolute.replace('\\', "/");
        match normalized.split_once(CONTENT_ROOT_MARKER) {
            Some((_, rel)) => Ok(format!("{}{}", CONTENT_ROOT_MARKER, rel)),
            None => {
                warn!(filename = %normalized, "no content root in package path");
                Ok(normalized)
            }
        }
    }

    /// The asset name as it appears in the engine: the filename stem.
    pub fn asset_name(&self) -> Result<String> {
        let Some(absolute) = self.absolute_package_path()? else {
            return Ok(String::new());
        };

        let normalized = absolute.replace('\\', "/");
        let stem = Path::new(&normalized)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(stem)
    }

    /// Key/value pairs from the package-info chapter.
    pub fn package_info(&self) -> Result<Map<String, Value>> {
        let mut info = Map::new();
        let Some(chapter) = self.chapter_of(ChapterKind::PackageInfo)? else {
            return Ok(info);
        };

        for raw in chapter.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match line.split_once(": ") {
                Some((key, value)) => {
                    info.insert(key.to_string(), coerce(value));
                }
                None => debug!(line, "package info line has no key/value split"),
            }
        }

        Ok(info)
    }

    /// Index → package name from the references chapter.
    pub fn package_references(&self) -> Result<Map<String, Value>> {
        let mut refs = Map::new();
        let Some(chapter) = self.chapter_of(ChapterKind::PackageReferences)? else {
            return Ok(refs);
        };

        for raw in chapter.lines() {
            let line = raw.trim();
            if let Some((index, name)) = line.split_once(") ") {
                if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                    refs.insert(index.to_string(), Value::String(name.to_string()));
                }
            }
        }

        Ok(refs)
    }

    /// The asset type from the first registry declaration line.
    ///
    /// Empty (with a warning) when the registry chapter has no declaration;
    /// a missing type is diagnostic, not fatal.
    pub fn asset_type(&self) -> Result<String> {
        let Some(chapter) = self.chapter_of(ChapterKind::AssetRegistry)? else {
            warn!(path = %self.path.display(), "no asset registry chapter");
            return Ok(String::new());
        };

        for raw in chapter.lines() {
            let line = raw.trim();
            if let Some(rest) = declaration_rest(line) {
                if let Some((asset_type, _)) = parse_asset_declaration(rest) {
                    return Ok(asset_type);
                }
            }
        }

        warn!(path = %self.path.display(), "unable to determine asset type");
        Ok(String::new())
    }

    /// Asset-registry key/value pairs (the quoted lines of the registry
    /// chapter). Values with nested structure become sub-objects.
    pub fn asset_registry(&self) -> Result<Map<String, Value>> {
        let mut registry = Map::new();
        let Some(chapter) = self.chapter_of(ChapterKind::AssetRegistry)? else {
            return Ok(registry);
        };

        for raw in chapter.lines() {
            let line = raw.trim();
            if line.is_empty() || !line.starts_with('"') {
                continue;
            }

            let line = line.replace('"', "");
            let segments: Vec<&str> = line.split(": ").collect();
            let key = segments[0];

            if REGISTRY_SKIP_KEYS.contains(&key) {
                continue;
            }

            if segments.len() > 2 {
                registry.insert(key.to_string(), complex_registry_value(&line));
            } else if segments.len() == 2 {
                registry.insert(key.to_string(), coerce(segments[1]));
            } else {
                debug!(line = %line, "unparseable asset registry line");
            }
        }

        Ok(registry)
    }

    /// Import-map entries, empty when the fragment has no import chapter.
    pub fn imports(&self) -> Result<Vec<Value>> {
        match self.chapter_of(ChapterKind::ImportMap)? {
            Some(chapter) => Ok(DependencyList::new(chapter.lines(), "Import").entries()),
            None => Ok(Vec::new()),
        }
    }

    /// Export-map entries, empty when the fragment has no export chapter.
    pub fn exports(&self) -> Result<Vec<Value>> {
        match self.chapter_of(ChapterKind::ExportMap)? {
            Some(chapter) => Ok(DependencyList::new(chapter.lines(), "Export").entries()),
            None => Ok(Vec::new()),
        }
    }

    /// Assembles the full record from the per-chapter getters.
    pub fn record(&self) -> Result<PackageRecord> {
        Ok(PackageRecord {
            unreal_file_name: self.asset_name()?,
            asset_path: self.relative_package_path()?,
            asset_type: self.asset_type()?,
            package_info: self.package_info()?,
            package_references: self.package_references()?,
            asset_registry: self.asset_registry()?,
            imports: self.imports()?,
            exports: self.exports()?,
        })
    }
}

/// If `line` opens with an `N)` index token, returns the remainder.
fn declaration_rest(line: &str) -> Option<&str> {
    let (token, rest) = line.split_once(' ')?;
    let index = token.strip_suffix(')')?;
    if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Parses a registry value with multiple colon-separated segments into a
/// nested object: strip the outer wrapper, split on commas, then each pair
/// on its first colon.
fn complex_registry_value(line: &str) -> Value {
    let mut nested = Map::new();

    let value = match line.split_once(": ") {
        Some((_, rest)) => rest,
        None => line,
    };

    // The engine wraps these values in two leading and three trailing
    // bracket/quote characters.
    let inner = strip_wrapper(value, 2, 3);

    for pair in inner.split(',') {
        let pair = pair.trim_start();
        match pair.split_once(':') {
            Some((key, val)) => {
                nested.insert(key.to_string(), coerce(val.trim_start()));
            }
            None => debug!(pair, "unparseable complex registry pair"),
        }
    }

    Value::Object(nested)
}

fn strip_wrapper(s: &str, front: usize, back: usize) -> &str {
    if s.len() > front + back {
        s.get(front..s.len() - back).unwrap_or("")
    } else {
        ""
    }
}
