//! Unreal Package Inspector.
//!
//! A build-automation and asset-inspection toolkit layered over Unreal
//! Engine's command-line tools: it assembles a layered configuration,
//! shells out to engine commandlets while capturing their logs, and parses
//! the captured text into structured per-asset records.
//!
//! The interesting part is the extraction pipeline: project files are
//! content-hashed, the digests are diffed against a flat archive of
//! previously extracted log fragments, only the missing files are pushed
//! through the engine, and the resulting combined logs are split back into
//! digest-named fragments and parsed into JSON records.
//!
//! # Modules
//!
//! - [`config`] - layered JSON-fragment configuration
//! - [`editor`] - engine/project path resolution and content enumeration
//! - [`commandlet`] - commandlet command construction and execution
//! - [`inspect`] - hashing, archive diffing, log splitting, orchestration
//! - [`logparse`] - chapter splitting and log-to-record parsers
//! - [`runner`] - external process execution

pub mod commandlet;
pub mod config;
pub mod editor;
pub mod error;
pub mod inspect;
pub mod logparse;
pub mod runner;

pub use commandlet::Commandlet;
pub use config::RunConfig;
pub use error::{Error, Result};
pub use inspect::{ExtractionArchive, HashIndex, InspectionSummary, LogSplitter, PackageInspection};
pub use logparse::{BlueprintCompileReport, PackageLog, PackageRecord};
pub use runner::{CommandSpec, ProcessRunner, SystemRunner};
