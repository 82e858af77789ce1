//! End-to-end extraction pipeline scenarios with scripted process runners.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use upi::{CommandSpec, Error, PackageInspection, ProcessRunner, RunConfig};

/// Fakes the PkgInfo commandlet: emits one package summary section per
/// `.uasset` named on the command line, plus preamble noise.
struct ScriptedRunner {
    invocations: AtomicUsize,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
        }
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

fn summary_section(asset: &Path) -> String {
    let stem = asset.file_stem().unwrap().to_string_lossy();
    let mut out = String::new();
    out.push_str(&format!("Package '/Game/{}' Summary\n", stem));
    out.push_str("--------------------------------------------\n");
    out.push_str(&format!("Filename: {}\n", asset.display()));
    out.push_str("FileSize: 123\n");
    out.push_str("--------------------------------------------\n");
    out.push_str(&format!("Packages referenced by {}\n", stem));
    out.push_str("0) /Game/Base\n");
    out.push_str("--------------------------------------------\n");
    out.push_str("Asset Registry Size: 10\n");
    out.push_str(&format!("0) 'StaticMesh'{}'\n", stem));
    out.push_str("\"TriCount: 7\"\n");
    out
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec, log_path: &Path) -> upi::Result<i32> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut log = String::from("LogInit: Display: engine preamble\n");
        for arg in &spec.args {
            if arg.ends_with(".uasset") {
                log.push_str(&summary_section(Path::new(arg)));
            }
        }

        fs::write(log_path, log)?;
        Ok(0)
    }
}

/// Always exits non-zero without writing anything useful.
struct FailingRunner;

impl ProcessRunner for FailingRunner {
    fn run(&self, _spec: &CommandSpec, log_path: &Path) -> upi::Result<i32> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(log_path, "LogInit: Display: crash\n")?;
        Ok(1)
    }
}

/// Emits a section whose filename the hash index does not know.
struct StrayRunner {
    stray: PathBuf,
}

impl ProcessRunner for StrayRunner {
    fn run(&self, spec: &CommandSpec, log_path: &Path) -> upi::Result<i32> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut log = String::new();
        for arg in &spec.args {
            if arg.ends_with(".uasset") {
                log.push_str(&summary_section(Path::new(arg)));
            }
        }
        log.push_str(&summary_section(&self.stray));

        fs::write(log_path, log)?;
        Ok(0)
    }
}

fn setup(assets: &[(&str, &[u8])]) -> (tempfile::TempDir, RunConfig) {
    let dir = tempfile::tempdir().unwrap();

    let project = dir.path().join("game");
    fs::create_dir_all(project.join("Content")).unwrap();
    fs::write(project.join("Game.uproject"), "{}").unwrap();
    for (name, content) in assets {
        fs::write(project.join("Content").join(name), content).unwrap();
    }

    let config = RunConfig::from_value(json!({
        "environment": {
            "project_root_path": project,
            "engine_root_path": dir.path(),
            "artifacts_root_path": dir.path().join("artifacts"),
            "cache_root_path": dir.path().join("cache")
        },
        "commandlets": {
            "package-info": {
                "command": "PkgInfoCommandlet",
                "flags": ["AssetRegistryDump"]
            }
        }
    }))
    .unwrap();

    (dir, config)
}

fn archive_entries(config: &RunConfig) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(config.archive_dir())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn data_files(config: &RunConfig) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = fs::read_dir(config.packages_data_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read_to_string(e.path()).unwrap(),
            )
        })
        .collect();
    out.sort();
    out
}

#[test]
fn full_pipeline_extracts_all_assets() {
    let (_dir, config) = setup(&[("rock.uasset", b"rock bytes"), ("tree.uasset", b"tree bytes")]);
    let runner = ScriptedRunner::new();

    let summary = PackageInspection::new(&config, &runner).run().unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.cached, 0);
    assert_eq!(summary.missing, 2);
    assert_eq!(summary.invocations, 1);
    assert_eq!(summary.archived_fragments, 2);
    assert_eq!(summary.orphaned_fragments, 0);
    assert_eq!(archive_entries(&config).len(), 2);
}

#[test]
fn records_round_trip_package_info() {
    let (_dir, config) = setup(&[("rock.uasset", b"rock bytes")]);
    let runner = ScriptedRunner::new();
    let inspection = PackageInspection::new(&config, &runner);

    inspection.run().unwrap();
    let written = inspection.process_archive().unwrap();
    assert_eq!(written, 1);

    let (_, record_text) = data_files(&config).remove(0);
    let record: serde_json::Value = serde_json::from_str(&record_text).unwrap();

    assert_eq!(record["UnrealFileName"], json!("rock"));
    assert_eq!(record["AssetPath"], json!("/Content/rock.uasset"));
    assert_eq!(record["AssetType"], json!("StaticMesh"));
    assert_eq!(record["PackageInfo"]["FileSize"], json!(123.0));
    assert_eq!(record["PackageReferences"]["0"], json!("/Game/Base"));
    assert_eq!(record["AssetRegistry"]["TriCount"], json!(7.0));
}

#[test]
fn unchanged_project_is_served_from_cache() {
    let (_dir, config) = setup(&[("rock.uasset", b"rock bytes"), ("tree.uasset", b"tree bytes")]);

    let first = ScriptedRunner::new();
    let inspection = PackageInspection::new(&config, &first);
    inspection.run().unwrap();
    inspection.process_archive().unwrap();
    let baseline = data_files(&config);

    // Second run with a fresh runner: everything is cached, the engine is
    // never invoked, and the processed output is unchanged.
    let second = ScriptedRunner::new();
    let inspection = PackageInspection::new(&config, &second);
    let summary = inspection.run().unwrap();

    assert_eq!(second.invocations(), 0);
    assert_eq!(summary.cached, 2);
    assert_eq!(summary.missing, 0);

    inspection.process_archive().unwrap();
    assert_eq!(data_files(&config), baseline);
}

#[test]
fn changed_file_is_reextracted() {
    let (dir, config) = setup(&[("rock.uasset", b"rock bytes"), ("tree.uasset", b"tree bytes")]);

    let first = ScriptedRunner::new();
    PackageInspection::new(&config, &first).run().unwrap();

    fs::write(
        dir.path().join("game").join("Content").join("rock.uasset"),
        b"new rock bytes",
    )
    .unwrap();

    let second = ScriptedRunner::new();
    let summary = PackageInspection::new(&config, &second).run().unwrap();

    assert_eq!(second.invocations(), 1);
    assert_eq!(summary.cached, 1);
    assert_eq!(summary.missing, 1);
}

#[test]
fn identical_assets_share_one_archive_entry() {
    let (_dir, config) = setup(&[("a.uasset", b"same bytes"), ("b.uasset", b"same bytes")]);
    let runner = ScriptedRunner::new();

    let summary = PackageInspection::new(&config, &runner).run().unwrap();

    // Content-addressing collapses identical files to one digest.
    assert_eq!(summary.total_files, 2);
    assert_eq!(archive_entries(&config).len(), 1);
}

#[test]
fn batch_size_bounds_invocations() {
    let assets: Vec<(String, Vec<u8>)> = (0..5)
        .map(|i| (format!("asset{}.uasset", i), format!("bytes {}", i).into_bytes()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = assets
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_slice()))
        .collect();

    let (_dir, mut config) = setup(&borrowed);
    config.inspection.batch_size = 2;

    let runner = ScriptedRunner::new();
    let summary = PackageInspection::new(&config, &runner).run().unwrap();

    assert_eq!(runner.invocations(), 3);
    assert_eq!(summary.archived_fragments, 5);
}

#[test]
fn unmapped_fragment_is_orphaned_not_archived() {
    let (dir, config) = setup(&[("rock.uasset", b"rock bytes")]);

    // A file the hash index never saw.
    let stray = dir.path().join("stray.uasset");
    fs::write(&stray, b"stray bytes").unwrap();

    let runner = StrayRunner { stray };
    let summary = PackageInspection::new(&config, &runner).run().unwrap();

    assert_eq!(summary.archived_fragments, 1);
    assert_eq!(summary.orphaned_fragments, 1);
    assert_eq!(archive_entries(&config).len(), 1);
}

#[test]
fn commandlet_failure_aborts_the_pipeline() {
    let (_dir, config) = setup(&[("rock.uasset", b"rock bytes")]);

    let result = PackageInspection::new(&config, &FailingRunner).run();

    assert!(matches!(result, Err(Error::ProcessFailure { code: 1, .. })));
}
