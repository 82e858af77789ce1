//! Engine commandlet invocation.
//!
//! A commandlet run is: build the editor command line from the settings in
//! the run config, hand it to the process runner (which captures the log),
//! apply the exit-code policy, and dispatch a log parser when one is
//! registered for the commandlet.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{CommandletSettings, RunConfig};
use crate::editor::EditorContext;
use crate::error::{Error, Result};
use crate::logparse::BlueprintCompileReport;
use crate::runner::{CommandSpec, ProcessRunner};

/// One configured commandlet invocation.
#[derive(Debug)]
pub struct Commandlet<'c> {
    config: &'c RunConfig,
    name: String,
    settings: CommandletSettings,
    files: Vec<PathBuf>,
    log_path: Option<PathBuf>,
}

impl<'c> Commandlet<'c> {
    /// Looks `name` up in the commandlet settings. Unknown names fail here,
    /// before anything touches the engine.
    pub fn new(config: &'c RunConfig, name: &str, files: Vec<PathBuf>) -> Result<Self> {
        let settings = config.commandlet(name)?.clone();

        Ok(Self {
            config,
            name: name.to_string(),
            settings,
            files,
            log_path: None,
        })
    }

    /// Overrides where the captured log is written.
    pub fn with_log_path(mut self, path: PathBuf) -> Self {
        self.log_path = Some(path);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where this run's log goes.
    pub fn log_path(&self) -> PathBuf {
        match &self.log_path {
            Some(path) => path.clone(),
            None => {
                let file_name = self
                    .settings
                    .log_file_name
                    .clone()
                    .unwrap_or_else(|| format!("{}.log", self.name));
                self.config.raw_logs_dir().join(file_name)
            }
        }
    }

    /// The full editor command line for this commandlet.
    pub fn command(&self) -> Result<CommandSpec> {
        let editor = EditorContext::new(self.config);
        let editor_cmd = editor.editor_cmd_path();
        let project_file = editor.project_file()?;

        let mut spec = CommandSpec::new(editor_cmd)
            .arg(project_file.to_string_lossy().into_owned())
            .arg(format!("-run={}", self.settings.command));

        for file in &self.files {
            spec = spec.arg(file.to_string_lossy().into_owned());
        }

        for flag in &self.settings.flags {
            spec = spec.arg(format!("-{}", flag));
        }

        let log_name = self
            .log_path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.log", self.name));

        spec = spec.arg(format!("-LOG={}", log_name)).arg("-UNATTENDED");
        Ok(spec)
    }

    /// Runs the commandlet and returns the captured log's path.
    pub fn run(&self, runner: &dyn ProcessRunner) -> Result<PathBuf> {
        let spec = self.command()?;
        let log_path = self.log_path();

        let code = runner.run(&spec, &log_path)?;

        if code != 0 {
            if self.settings.ignore_exit_code {
                info!(code, commandlet = %self.name, "ignoring non-zero exit code");
            } else {
                return Err(Error::ProcessFailure {
                    command: spec.to_string(),
                    code,
                });
            }
        }

        if let Some(report_path) = self.parse_log(&log_path)? {
            info!(report = %report_path.display(), "commandlet report written");
        }

        Ok(log_path)
    }

    /// Runs the parser registered for this commandlet, if any, writing its
    /// report as JSON next to the processed output.
    fn parse_log(&self, log_path: &Path) -> Result<Option<PathBuf>> {
        if self.name != "compile-blueprints" {
            return Ok(None);
        }

        let report = BlueprintCompileReport::from_file(log_path)?;
        if report.blueprints.is_empty() {
            warn!(log = %log_path.display(), "compile log held no blueprint sections");
        }

        let out_dir = self.config.processed_dir();
        std::fs::create_dir_all(&out_dir)?;
        let out_path = out_dir.join(format!("{}.json", self.name));

        let mut text = serde_json::to_string_pretty(&report).map_err(|source| Error::Json {
            path: out_path.clone(),
            source,
        })?;
        text.push('\n');
        std::fs::write(&out_path, text)?;

        Ok(Some(out_path))
    }
}
