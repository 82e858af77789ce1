//! Chapter splitting for commandlet log fragments.
//!
//! PkgInfo output is chapter-structured: runs of lines separated by a long
//! dash divider. Every parser in this crate works on chapters, never on the
//! raw file, so the split lives here as the base primitive.

/// The divider the engine prints between chapters. Matched by containment:
/// engine log lines carry category prefixes in front of the dashes.
pub const CHAPTER_DIVIDER: &str = "--------------------------------------------";

/// What a chapter is about, decided once from its first non-blank line.
///
/// Dispatching on this enum replaces repeated prefix scans over the same
/// text and makes unrecognized chapters an explicit case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterKind {
    /// `Filename: ...` header block with package-level key/value pairs.
    PackageInfo,
    /// `Packages referenced by ...` listing.
    PackageReferences,
    /// `Asset Registry Size: ...` block.
    AssetRegistry,
    /// `Import Map` dependency listing.
    ImportMap,
    /// `Export Map` dependency listing.
    ExportMap,
    Unknown,
}

/// One divider-delimited run of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    lines: Vec<String>,
}

impl Chapter {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line with any non-whitespace content, trimmed at the start.
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .iter()
            .map(|line| line.trim_start())
            .find(|line| !line.is_empty())
    }

    pub fn kind(&self) -> ChapterKind {
        match self.first_line() {
            Some(first) => classify(first),
            None => ChapterKind::Unknown,
        }
    }
}

fn classify(first_line: &str) -> ChapterKind {
    if first_line.starts_with("Filename: ") {
        ChapterKind::PackageInfo
    } else if first_line.starts_with("Packages referenced by ") {
        ChapterKind::PackageReferences
    } else if first_line.starts_with("Asset Registry Size: ") {
        ChapterKind::AssetRegistry
    } else if first_line.starts_with("Import Map") {
        ChapterKind::ImportMap
    } else if first_line.starts_with("Export Map") {
        ChapterKind::ExportMap
    } else {
        ChapterKind::Unknown
    }
}

/// Splits log lines into chapters wherever a divider line occurs.
///
/// The divider line itself is consumed. The chapter after the last divider
/// is always included, even when empty, so a file with N dividers yields
/// N + 1 chapters and a file with none yields exactly one.
pub fn split_chapters(lines: &[String]) -> Vec<Chapter> {
    let mut chapters = Vec::new();
    let mut current = Vec::new();

    for line in lines {
        if line.contains(CHAPTER_DIVIDER) {
            chapters.push(Chapter::new(std::mem::take(&mut current)));
        } else {
            current.push(line.clone());
        }
    }

    chapters.push(Chapter::new(current));
    chapters
}
