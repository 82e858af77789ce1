//! Config assembly: fragments + environment discovery → one generated file.
//!
//! Configuration is layered: a directory of default fragments, a directory
//! of project overrides, and an environment file naming the machine-local
//! paths. Assembly merges the layers, resolves relative paths, discovers
//! the engine install when it is not pinned, and writes the result to one
//! generated JSON file that every later command loads.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Name of the generated config file, written next to the environment file
/// and looked up under `--project-root`.
pub const GENERATED_CONFIG_FILE_NAME: &str = "_generated_config.json";

/// Assembles the config and writes it next to the environment file.
/// Returns the generated file's path.
pub fn generate(environment_file: &Path, defaults_dir: Option<&Path>) -> Result<PathBuf> {
    let assembled = assemble(environment_file, defaults_dir)?;

    let root = environment_file.parent().unwrap_or(Path::new("."));
    let out_path = root.join(GENERATED_CONFIG_FILE_NAME);

    let mut text = serde_json::to_string_pretty(&assembled).map_err(|source| Error::Json {
        path: out_path.clone(),
        source,
    })?;
    text.push('\n');
    std::fs::write(&out_path, text)?;

    info!(path = %out_path.display(), "generated config written");
    Ok(out_path)
}

/// Assembles the layered config into a single JSON value.
pub fn assemble(environment_file: &Path, defaults_dir: Option<&Path>) -> Result<Value> {
    if !environment_file.exists() {
        return Err(Error::missing(environment_file));
    }

    let root = environment_file
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let text = std::fs::read_to_string(environment_file)?;
    let mut environment: Map<String, Value> =
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: environment_file.to_path_buf(),
            source,
        })?;

    let defaults = match defaults_dir {
        Some(dir) => read_config_dir(dir)?,
        None => Value::Object(Map::new()),
    };

    // Project overrides live where the environment file points.
    let overrides = match environment.get("config_root_path").and_then(Value::as_str) {
        Some(rel) => {
            let dir = root.join(rel);
            if dir.is_dir() {
                read_config_dir(&dir)?
            } else {
                debug!(dir = %dir.display(), "no override config directory");
                Value::Object(Map::new())
            }
        }
        None => Value::Object(Map::new()),
    };

    let mut run_config = merge_values(defaults, overrides);

    resolve_environment_paths(&mut environment, &root);

    if !environment.contains_key("engine_root_path") {
        info!("no engine path in environment, discovering from project file");
        let engine_root = discover_engine_root(&environment)?;
        environment.insert(
            "engine_root_path".to_string(),
            Value::String(engine_root.to_string_lossy().into_owned()),
        );
    }

    apply_artifact_name(&mut environment);

    let engine_root = PathBuf::from(
        environment
            .get("engine_root_path")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    );

    if let Some(object) = run_config.as_object_mut() {
        object.insert("environment".to_string(), Value::Object(environment));
        object.insert(
            "generated_at".to_string(),
            Value::String(chrono::Local::now().to_rfc3339()),
        );

        let engine_structure = object
            .entry("unreal_engine_structure")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(engine_object) = engine_structure.as_object_mut() {
            engine_object.insert(
                "is_installed".to_string(),
                Value::Bool(engine_is_installed(&engine_root)),
            );
        }
    }

    Ok(run_config)
}

/// Recursively merges two JSON values; `overlay` wins on conflicts, object
/// sub-trees are merged key by key.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(mut overlay_map)) => {
            let mut merged = Map::new();
            for (key, base_value) in base_map {
                match overlay_map.remove(&key) {
                    Some(overlay_value) => {
                        merged.insert(key, merge_values(base_value, overlay_value));
                    }
                    None => {
                        merged.insert(key, base_value);
                    }
                }
            }
            merged.extend(overlay_map);
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Reads a config directory into categories.
///
/// Each sub-directory is a category; each JSON file under it is one entry
/// keyed by file stem. A category holding a single file collapses to that
/// file's object directly.
fn read_config_dir(dir: &Path) -> Result<Value> {
    let mut config = Map::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }

        let category = entry.file_name().to_string_lossy().into_owned();
        let mut category_map = Map::new();
        let mut last_value = Value::Object(Map::new());
        let mut file_count = 0usize;

        let mut json_files: Vec<PathBuf> = walkdir::WalkDir::new(entry.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .map(|e| e.into_path())
            .collect();
        json_files.sort();

        for file in json_files {
            let text = std::fs::read_to_string(&file)?;
            let value: Value = serde_json::from_str(&text).map_err(|source| Error::Json {
                path: file.clone(),
                source,
            })?;

            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            category_map.insert(stem, value.clone());
            last_value = value;
            file_count += 1;
        }

        if file_count == 1 {
            config.insert(category, last_value);
        } else {
            config.insert(category, Value::Object(category_map));
        }
    }

    Ok(Value::Object(config))
}

/// Environment values ending in `/` (or empty) are directory references
/// relative to the environment file; everything else is taken verbatim.
fn resolve_environment_paths(environment: &mut Map<String, Value>, root: &Path) {
    for (key, value) in environment.iter_mut() {
        let Some(text) = value.as_str() else { continue };

        if text.is_empty() || text.ends_with('/') {
            let resolved = normalize(&root.join(text));
            debug!(key = %key, path = %resolved.display(), "resolved environment path");
            *value = Value::String(resolved.to_string_lossy().into_owned());
        }
    }
}

/// Appends the artifact name (explicit, or the machine name) to the
/// artifact root so runs from different machines do not collide.
fn apply_artifact_name(environment: &mut Map<String, Value>) {
    let name = match environment.get("artifact_name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => machine_name(),
    };

    let suffixed = environment
        .get("artifacts_root_path")
        .and_then(Value::as_str)
        .map(|root| Path::new(root).join(&name));
    if let Some(suffixed) = suffixed {
        environment.insert(
            "artifacts_root_path".to_string(),
            Value::String(suffixed.to_string_lossy().into_owned()),
        );
    }

    environment.insert("artifact_name".to_string(), Value::String(name));
}

/// Engine root from the project's `.uproject` file.
///
/// The `EngineAssociation` field is taken as a path relative to the
/// project root. Launcher-registered GUIDs cannot be resolved here; pin
/// `engine_root_path` in the environment file for those installs.
fn discover_engine_root(environment: &Map<String, Value>) -> Result<PathBuf> {
    let project_root = PathBuf::from(
        environment
            .get("project_root_path")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::config("environment has no project_root_path"))?,
    );

    let project_file = find_project_file(&project_root)?;

    let text = std::fs::read_to_string(&project_file)?;
    let project: Value = serde_json::from_str(&text).map_err(|source| Error::Json {
        path: project_file.clone(),
        source,
    })?;

    let association = project
        .get("EngineAssociation")
        .and_then(Value::as_str)
        .unwrap_or_default();
    debug!(association, "engine association from project file");

    let candidate = normalize(&project_root.join(association));
    if candidate.is_dir() {
        info!(path = %candidate.display(), "engine found from project file");
        Ok(candidate)
    } else {
        Err(Error::config(format!(
            "engine association '{}' does not resolve to a directory; \
             set environment engine_root_path explicitly",
            association
        )))
    }
}

/// The first `.uproject` directly under the project root.
fn find_project_file(project_root: &Path) -> Result<PathBuf> {
    if project_root.is_dir() {
        for entry in std::fs::read_dir(project_root)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "uproject") {
                return Ok(path);
            }
        }
    }

    warn!(root = %project_root.display(), "no project file found");
    Err(Error::missing(project_root.join("*.uproject")))
}

/// Source checkouts carry project-file generation scripts; launcher
/// installs do not.
fn engine_is_installed(engine_root: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(engine_root) else {
        return false;
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains("generateprojectfiles") {
            return false;
        }
    }

    true
}

fn machine_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string())
}

/// Lexical cleanup of `.` and `..` components; no filesystem access, the
/// path may not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
