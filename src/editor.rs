//! Paths into the engine installation and the Unreal project.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::error::{Error, Result};

/// Target platform for engine binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Win64,
    Linux,
    Mac,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Win64 => "Win64",
            Platform::Linux => "Linux",
            Platform::Mac => "Mac",
        }
    }

    fn executable_extension(&self) -> &'static str {
        match self {
            Platform::Win64 => ".exe",
            Platform::Linux | Platform::Mac => "",
        }
    }

    fn script_extension(&self) -> &'static str {
        match self {
            Platform::Win64 => ".bat",
            Platform::Linux | Platform::Mac => ".sh",
        }
    }
}

/// Resolves engine executables and project content from the run config.
#[derive(Debug)]
pub struct EditorContext<'c> {
    config: &'c RunConfig,
    platform: Platform,
}

impl<'c> EditorContext<'c> {
    pub fn new(config: &'c RunConfig) -> Self {
        Self::with_platform(config, Platform::default())
    }

    pub fn with_platform(config: &'c RunConfig, platform: Platform) -> Self {
        Self { config, platform }
    }

    /// The command-line editor binary used for commandlets.
    pub fn editor_cmd_path(&self) -> PathBuf {
        let file_name = format!(
            "{}{}",
            self.config.engine.editor_binary_cmd_name,
            self.platform.executable_extension()
        );

        self.config
            .environment
            .engine_root_path
            .join(&self.config.engine.binaries_root_folder)
            .join(self.platform.name())
            .join(file_name)
    }

    /// The `.uproject` file, searched for under the project root.
    pub fn project_file(&self) -> Result<PathBuf> {
        let root = &self.config.environment.project_root_path;

        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "uproject") {
                debug!(path = %path.display(), "project file");
                return Ok(path.to_path_buf());
            }
        }

        warn!(root = %root.display(), "unable to find project file");
        Err(Error::missing(root.join("*.uproject")))
    }

    /// The project's content directory.
    pub fn content_dir(&self) -> Result<PathBuf> {
        let project_file = self.project_file()?;
        let project_dir = project_file.parent().unwrap_or(Path::new("."));
        Ok(project_dir.join(&self.config.project.content_root_path))
    }

    /// Every `.uasset` under the content directory, in path order.
    pub fn content_files(&self) -> Result<Vec<PathBuf>> {
        let content_dir = self.content_dir()?;

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&content_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "uasset"))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        debug!(count = files.len(), dir = %content_dir.display(), "content files");
        Ok(files)
    }

    /// RunUAT entry point for this platform.
    pub fn automation_tool_path(&self) -> PathBuf {
        self.config
            .environment
            .engine_root_path
            .join("Engine")
            .join("Build")
            .join("BatchFiles")
            .join(format!("RunUAT{}", self.platform.script_extension()))
    }

    /// UnrealBuildTool, verified to exist.
    pub fn build_tool_path(&self) -> Result<PathBuf> {
        let path = self
            .config
            .environment
            .engine_root_path
            .join(&self.config.engine.unreal_build_tool_path);

        if path.exists() {
            Ok(path)
        } else {
            Err(Error::missing(path))
        }
    }
}
