//! Parser behavior over on-disk fragments.

use std::fs;

use serde_json::Value;
use upi::logparse::{split_chapters, ChapterKind, CHAPTER_DIVIDER};
use upi::PackageLog;

fn fragment_text(chapters: &[&[&str]]) -> String {
    let mut out = String::new();
    for (i, chapter) in chapters.iter().enumerate() {
        if i > 0 {
            out.push_str(CHAPTER_DIVIDER);
            out.push('\n');
        }
        for line in *chapter {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn info_chapter() -> Vec<&'static str> {
    vec![
        "Filename: /work/game/Content/Props/Barrel.uasset",
        "FileSize: 2048",
        "Custom Version Count: 3",
    ]
}

fn registry_chapter() -> Vec<&'static str> {
    vec![
        "Asset Registry Size: 99",
        "0) 'StaticMesh'Barrel'",
        "\"TriCount: 64\"",
    ]
}

#[test]
fn record_from_disk_fragment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fragment.log");
    fs::write(
        &path,
        fragment_text(&[&info_chapter(), &registry_chapter()]),
    )
    .unwrap();

    let record = PackageLog::new(&path).record().unwrap();

    assert_eq!(record.unreal_file_name, "Barrel");
    assert_eq!(record.asset_path, "/Content/Props/Barrel.uasset");
    assert_eq!(record.asset_type, "StaticMesh");
    assert_eq!(record.package_info["FileSize"], Value::from(2048.0));
}

#[test]
fn chapter_order_does_not_matter() {
    let dir = tempfile::tempdir().unwrap();

    let forward = dir.path().join("forward.log");
    fs::write(
        &forward,
        fragment_text(&[&info_chapter(), &registry_chapter()]),
    )
    .unwrap();

    let reversed = dir.path().join("reversed.log");
    fs::write(
        &reversed,
        fragment_text(&[&registry_chapter(), &info_chapter()]),
    )
    .unwrap();

    let a = PackageLog::new(&forward).record().unwrap();
    let b = PackageLog::new(&reversed).record().unwrap();

    assert_eq!(a.package_info, b.package_info);
    assert_eq!(a.asset_type, b.asset_type);
    assert_eq!(a.unreal_file_name, b.unreal_file_name);
}

#[test]
fn invalid_utf8_in_fragment_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fragment.log");

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"Filename: /work/game/Content/A.uasset\n");
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(b"FileSize: 1\n");
    fs::write(&path, bytes).unwrap();

    let record = PackageLog::new(&path).record().unwrap();
    assert_eq!(record.unreal_file_name, "A");
}

#[test]
fn chapters_from_text_classify() {
    let text = fragment_text(&[&info_chapter(), &registry_chapter()]);
    let lines: Vec<String> = text.lines().map(str::to_string).collect();

    let chapters = split_chapters(&lines);

    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].kind(), ChapterKind::PackageInfo);
    assert_eq!(chapters[1].kind(), ChapterKind::AssetRegistry);
}
