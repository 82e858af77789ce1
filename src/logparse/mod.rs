//! Parsers for engine-emitted log text.
//!
//! Everything in here is line-oriented and deliberately forgiving: the
//! engine's output is semi-structured at best, so a line that does not
//! match its chapter's shape is skipped with a diagnostic instead of
//! failing the whole extraction.

pub mod blueprint;
pub mod chapters;
pub mod depends;
pub mod package;

pub use blueprint::{BlueprintCompileReport, Severity};
pub use chapters::{split_chapters, Chapter, ChapterKind, CHAPTER_DIVIDER};
pub use depends::{AssetRegistryBlock, DependencyList};
pub use package::{PackageLog, PackageRecord};

use serde_json::Value;

/// Numeric-looking values become JSON numbers, everything else stays text.
///
/// Mirrors how the engine prints sizes and counts: plain decimal, no units.
pub(crate) fn coerce(value: &str) -> Value {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Value::from(number),
        _ => Value::String(value.to_string()),
    }
}
