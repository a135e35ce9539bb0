//! Pipeline orchestration engine for GARNET.
//!
//! This crate sequences the five external analysis stages, decides whether
//! each must run or can reuse a cached artifact, derives every output name
//! from its inputs, and enforces dependency gating and the abort policy.
//! The analysis tools themselves are opaque collaborators behind
//! [`CommandExecutor`].

pub mod engine;
pub mod events;
pub mod executor;
pub mod manifest;
pub mod naming;
pub mod runner;
pub mod stages;

pub use engine::{PipelineOrchestrator, RunOptions};
pub use events::{EventEmitter, PipelineEvent};
pub use executor::{CommandExecutor, ProcessExecutor, RecordingExecutor};
pub use manifest::{load_run_manifest, save_run_manifest, MANIFEST_FILE};
pub use runner::StageRunner;
pub use stages::{CommandSpec, RequiredInput, StagePlan, StageSpec, ToolPaths};
