//! Shared types, errors, stage results and run records for the GARNET pipeline.
//!
//! This crate provides the foundational types used across all other GARNET crates:
//! - `GarnetError` — unified error taxonomy
//! - `StageName` — the five analysis stages, in pipeline order
//! - `StageResult` — immutable record of what happened to one stage
//! - `PipelineRun` — ordered stage results plus the run's terminal state

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Unified error type for all GARNET subsystems.
#[derive(Debug, thiserror::Error)]
pub enum GarnetError {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Config parse error at line {line}, col {col}: {message}")]
    ParseError {
        line: usize,
        col: usize,
        message: String,
        source_snippet: Option<String>,
    },

    // === Stage Errors ===
    #[error("Stage {stage} is missing required input '{input}'")]
    MissingInput { stage: StageName, input: String },

    #[error("Could not start '{program}': {message}")]
    ToolSpawn { program: String, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GarnetError {
    /// Returns `true` for errors that must stop the program before any stage runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GarnetError::Configuration(_) | GarnetError::ParseError { .. }
        )
    }
}

/// A convenience alias for `Result<T, GarnetError>`.
pub type Result<T> = std::result::Result<T, GarnetError>;

// ---------------------------------------------------------------------------
// StageName — the analysis stages in pipeline order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    GeneRegionMapping,
    MotifScanning,
    BindingMatrixConstruction,
    NetworkExport,
    Regression,
}

impl StageName {
    /// Every stage, in execution order.
    pub const ALL: [StageName; 5] = [
        StageName::GeneRegionMapping,
        StageName::MotifScanning,
        StageName::BindingMatrixConstruction,
        StageName::NetworkExport,
        StageName::Regression,
    ];

    /// Human readable label used in stage banners.
    pub fn label(&self) -> &'static str {
        match self {
            StageName::GeneRegionMapping => "Gene-region mapping",
            StageName::MotifScanning => "Motif scanning",
            StageName::BindingMatrixConstruction => "Binding matrix",
            StageName::NetworkExport => "Network export",
            StageName::Regression => "Regression",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::GeneRegionMapping => "GeneRegionMapping",
            StageName::MotifScanning => "MotifScanning",
            StageName::BindingMatrixConstruction => "BindingMatrixConstruction",
            StageName::NetworkExport => "NetworkExport",
            StageName::Regression => "Regression",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// StageStatus — outcome status of a stage
// ---------------------------------------------------------------------------

/// Why a stage did not invoke its tool without that being a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The stage's output artifact already exists on disk.
    Cached,
    /// The configuration switched the stage off.
    Disabled,
    /// The configuration does not name the stage's inputs at all.
    NotConfigured,
    /// The configuration names input files that do not exist.
    MissingFiles,
    /// An upstream stage produced no artifact.
    MissingUpstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped(SkipReason),
}

// ---------------------------------------------------------------------------
// StageResult — what happened to one stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageName,
    pub status: StageStatus,
    pub output_path: Option<PathBuf>,
    pub exit_code: Option<i32>,
    pub message: Option<String>,
}

impl StageResult {
    /// The tool exited with status zero.
    pub fn succeeded(stage: StageName, output_path: Option<PathBuf>) -> Self {
        Self {
            stage,
            status: StageStatus::Succeeded,
            output_path,
            exit_code: Some(0),
            message: None,
        }
    }

    /// The tool ran and exited non-zero, or could not be run at all.
    pub fn failed(stage: StageName, exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            output_path: None,
            exit_code,
            message: Some(message.into()),
        }
    }

    /// A required input was empty, so the tool was never invoked.
    pub fn missing_input(stage: StageName, input: &str) -> Self {
        let err = GarnetError::MissingInput {
            stage,
            input: input.to_string(),
        };
        Self::failed(stage, None, err.to_string())
    }

    /// The output artifact already exists from an earlier run.
    pub fn cached(stage: StageName, output_path: PathBuf) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped(SkipReason::Cached),
            output_path: Some(output_path),
            exit_code: None,
            message: None,
        }
    }

    /// The stage was not run for an architectural reason.
    pub fn skipped(stage: StageName, reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped(reason),
            output_path: None,
            exit_code: None,
            message: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }

    pub fn is_cached(&self) -> bool {
        self.status == StageStatus::Skipped(SkipReason::Cached)
    }

    /// The artifact a downstream stage may consume: present only when the
    /// stage succeeded or was satisfied from cache.
    pub fn artifact(&self) -> Option<&Path> {
        match self.status {
            StageStatus::Succeeded | StageStatus::Skipped(SkipReason::Cached) => {
                self.output_path.as_deref()
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineRun — ordered stage results plus terminal state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum RunTerminal {
    Completed,
    AbortedAt(StageName),
}

impl fmt::Display for RunTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTerminal::Completed => f.write_str("Completed"),
            RunTerminal::AbortedAt(stage) => write!(f, "AbortedAt({stage})"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: uuid::Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub output_dir: PathBuf,
    results: Vec<StageResult>,
    terminal: Option<RunTerminal>,
}

impl PipelineRun {
    /// Start a new, empty run writing into `output_dir`.
    pub fn start(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            finished_at: None,
            output_dir: output_dir.into(),
            results: Vec::new(),
            terminal: None,
        }
    }

    /// Append a stage result and return a reference to it.
    pub fn record(&mut self, result: StageResult) -> &StageResult {
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    /// Seal the run. Later calls keep the first terminal state.
    pub fn finish(&mut self, terminal: RunTerminal) {
        if self.terminal.is_none() {
            self.terminal = Some(terminal);
            self.finished_at = Some(chrono::Utc::now());
        }
    }

    /// `None` while the run is still in progress.
    pub fn terminal(&self) -> Option<RunTerminal> {
        self.terminal
    }

    pub fn is_completed(&self) -> bool {
        self.terminal == Some(RunTerminal::Completed)
    }

    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn result(&self, stage: StageName) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    /// Every artifact produced or reused by the run, in stage order.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter_map(|r| r.artifact().map(Path::to_path_buf))
            .collect()
    }
}
