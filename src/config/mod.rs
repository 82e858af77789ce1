//! Run configuration: typed views over the assembled config JSON.
//!
//! Commands never read config fragments directly; they load the single
//! generated file that [`assemble`] wrote and work with the typed sections
//! here. The raw JSON stays available for display.

mod assemble;

pub use assemble::{assemble, generate, merge_values, GENERATED_CONFIG_FILE_NAME};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Resolved environment paths. All paths are absolute once assembly ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Root of the Unreal project (holds the `.uproject`).
    pub project_root_path: PathBuf,
    /// Root of the engine installation.
    pub engine_root_path: PathBuf,
    /// Root for everything this tool writes.
    pub artifacts_root_path: PathBuf,
    /// The extraction archive directory.
    pub cache_root_path: PathBuf,
    /// Directory of project config overrides, relative to the environment
    /// file.
    #[serde(default)]
    pub config_root_path: Option<PathBuf>,
    /// Subdirectory name under the artifact root for this run's outputs.
    #[serde(default)]
    pub artifact_name: Option<String>,
}

/// Layout of the artifact tree, relative to the artifact root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    pub raw_logs_path: PathBuf,
    pub processed_path: PathBuf,
    pub temp_path: PathBuf,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            raw_logs_path: PathBuf::from("Raw"),
            processed_path: PathBuf::from("Data"),
            temp_path: PathBuf::from("temp"),
        }
    }
}

/// Where things live inside an engine installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineStructure {
    pub binaries_root_folder: PathBuf,
    pub editor_binary_cmd_name: String,
    pub unreal_build_tool_path: PathBuf,
    /// Pre-built launcher install (true) vs. source checkout (false).
    /// Filled in during assembly.
    pub is_installed: bool,
}

impl Default for EngineStructure {
    fn default() -> Self {
        Self {
            binaries_root_folder: PathBuf::from("Engine/Binaries"),
            editor_binary_cmd_name: "UE4Editor-Cmd".to_string(),
            unreal_build_tool_path: PathBuf::from("Engine/Binaries/DotNET/UnrealBuildTool"),
            is_installed: false,
        }
    }
}

/// Where things live inside the Unreal project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectStructure {
    pub content_root_path: PathBuf,
}

impl Default for ProjectStructure {
    fn default() -> Self {
        Self {
            content_root_path: PathBuf::from("Content"),
        }
    }
}

/// Settings for one engine commandlet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandletSettings {
    /// The `-run=` target.
    pub command: String,
    /// Extra flags, passed with a leading dash.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Some commandlets legitimately exit non-zero on "found issues";
    /// setting this treats any exit code as success.
    #[serde(default)]
    pub ignore_exit_code: bool,
    #[serde(default)]
    pub log_file_name: Option<String>,
}

/// Extraction pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionSettings {
    /// Assets per commandlet invocation. Bounds command-line length and
    /// the size of each combined log.
    pub batch_size: usize,
}

impl Default for InspectionSettings {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// The assembled run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub environment: EnvironmentConfig,
    pub structure: StructureConfig,
    pub engine: EngineStructure,
    pub project: ProjectStructure,
    pub commandlets: BTreeMap<String, CommandletSettings>,
    pub inspection: InspectionSettings,
    raw: Value,
}

impl RunConfig {
    /// Loads a generated config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::missing(path));
        }

        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_value(value)
    }

    /// Loads the generated config from its conventional place under
    /// `project_root`.
    pub fn load_from_project_root(project_root: &Path) -> Result<Self> {
        Self::load(&project_root.join(GENERATED_CONFIG_FILE_NAME))
    }

    /// Builds typed sections from an assembled config value.
    pub fn from_value(value: Value) -> Result<Self> {
        let environment = required_section(&value, "environment")?;
        let structure = optional_section(&value, "structure")?;
        let engine = optional_section(&value, "unreal_engine_structure")?;
        let project = optional_section(&value, "unreal_project_structure")?;
        let commandlets = optional_section(&value, "commandlets")?;
        let inspection = optional_section(&value, "inspection")?;

        Ok(Self {
            environment,
            structure,
            engine,
            project,
            commandlets,
            inspection,
            raw: value,
        })
    }

    /// The full assembled JSON, for display.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn commandlet(&self, name: &str) -> Result<&CommandletSettings> {
        self.commandlets
            .get(name)
            .ok_or_else(|| Error::UnknownCommandlet {
                name: name.to_string(),
            })
    }

    pub fn artifacts_root(&self) -> &Path {
        &self.environment.artifacts_root_path
    }

    /// The extraction archive directory.
    pub fn archive_dir(&self) -> &Path {
        &self.environment.cache_root_path
    }

    pub fn raw_logs_dir(&self) -> PathBuf {
        self.artifacts_root().join(&self.structure.raw_logs_path)
    }

    /// Work folder the pipeline fills with per-asset fragments.
    pub fn packages_work_dir(&self) -> PathBuf {
        self.raw_logs_dir().join("Packages")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.artifacts_root().join(&self.structure.processed_path)
    }

    /// Output folder for per-asset JSON records.
    pub fn packages_data_dir(&self) -> PathBuf {
        self.processed_dir().join("Packages")
    }

    /// Scratch space for combined commandlet logs before splitting.
    pub fn temp_dir(&self) -> PathBuf {
        self.artifacts_root().join(&self.structure.temp_path)
    }
}

fn required_section<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Result<T> {
    let section = value
        .get(key)
        .ok_or_else(|| Error::config(format!("missing '{}' section", key)))?;

    serde_json::from_value(section.clone())
        .map_err(|err| Error::config(format!("bad '{}' section: {}", key, err)))
}

fn optional_section<T: serde::de::DeserializeOwned + Default>(value: &Value, key: &str) -> Result<T> {
    match value.get(key) {
        Some(section) => serde_json::from_value(section.clone())
            .map_err(|err| Error::config(format!("bad '{}' section: {}", key, err))),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_value() -> Value {
        json!({
            "environment": {
                "project_root_path": "/proj",
                "engine_root_path": "/engine",
                "artifacts_root_path": "/artifacts/host",
                "cache_root_path": "/cache"
            },
            "commandlets": {
                "package-info": {
                    "command": "PkgInfoCommandlet",
                    "flags": ["AssetRegistryDump"]
                }
            }
        })
    }

    #[test]
    fn typed_sections_from_value() {
        let config = RunConfig::from_value(minimal_value()).unwrap();

        assert_eq!(config.environment.engine_root_path, Path::new("/engine"));
        assert_eq!(config.inspection.batch_size, 100);
        assert_eq!(
            config.commandlet("package-info").unwrap().command,
            "PkgInfoCommandlet"
        );
    }

    #[test]
    fn derived_paths_nest_under_artifact_root() {
        let config = RunConfig::from_value(minimal_value()).unwrap();

        assert_eq!(config.raw_logs_dir(), Path::new("/artifacts/host/Raw"));
        assert_eq!(
            config.packages_work_dir(),
            Path::new("/artifacts/host/Raw/Packages")
        );
        assert_eq!(
            config.packages_data_dir(),
            Path::new("/artifacts/host/Data/Packages")
        );
        assert_eq!(config.archive_dir(), Path::new("/cache"));
    }

    #[test]
    fn missing_environment_is_invalid() {
        let result = RunConfig::from_value(json!({}));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn unknown_commandlet_is_an_error() {
        let config = RunConfig::from_value(minimal_value()).unwrap();
        assert!(matches!(
            config.commandlet("does-not-exist"),
            Err(Error::UnknownCommandlet { .. })
        ));
    }

    #[test]
    fn batch_size_override() {
        let mut value = minimal_value();
        value["inspection"] = json!({ "batch_size": 7 });

        let config = RunConfig::from_value(value).unwrap();
        assert_eq!(config.inspection.batch_size, 7);
    }

    #[test]
    fn load_missing_file_is_missing_input() {
        let result = RunConfig::load(Path::new("/nonexistent/_generated_config.json"));
        assert!(matches!(result, Err(Error::MissingInput { .. })));
    }
}
