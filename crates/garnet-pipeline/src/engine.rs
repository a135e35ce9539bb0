//! Pipeline orchestration: the fixed stage sequence, gating and abort policy.
//!
//! Stages run strictly one after another. Each required stage either yields
//! an artifact for the next one or stops the run with `AbortedAt(stage)`.
//! Architectural skips (not configured, files missing, disabled) are recorded
//! and never abort.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use garnet_config::PipelineConfig;
use garnet_types::{PipelineRun, Result, RunTerminal, SkipReason, StageName, StageResult};

use crate::events::{EventEmitter, PipelineEvent};
use crate::executor::{CommandExecutor, ProcessExecutor};
use crate::naming;
use crate::runner::StageRunner;
use crate::stages::{
    BindingMatrixConstruction, GeneRegionMapping, MotifScanning, NetworkExport, Regression,
    StagePlan, StageSpec, ToolPaths,
};

/// Options that come from the command line rather than the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Where artifacts go. Derived from the region file when absent.
    pub output_dir: Option<PathBuf>,
    /// Forwarded to network export.
    pub all_genes: bool,
}

pub struct PipelineOrchestrator {
    runner: StageRunner,
    options: RunOptions,
}

impl PipelineOrchestrator {
    pub fn new(executor: Arc<dyn CommandExecutor>, tools: ToolPaths, options: RunOptions) -> Self {
        Self {
            runner: StageRunner::new(executor, tools),
            options,
        }
    }

    /// Orchestrator that spawns the real collaborator tools.
    pub fn with_process_executor(tools: ToolPaths, options: RunOptions) -> Self {
        Self::new(Arc::new(ProcessExecutor), tools, options)
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.runner = self.runner.with_events(events);
        self
    }

    pub fn events(&self) -> &EventEmitter {
        self.runner.events()
    }

    /// Run every stage in order and return the finished run.
    ///
    /// Returns `Err` only when the gene-mapping inputs are not configured; in
    /// that case no stage has been started. Stage failures are reported in
    /// the returned run's terminal state.
    pub async fn execute(&self, config: &PipelineConfig) -> Result<PipelineRun> {
        let mapping_inputs = config.chromatin.mapping_inputs()?;
        let output_dir = self
            .options
            .output_dir
            .clone()
            .unwrap_or_else(|| {
                naming::default_output_dir(mapping_inputs.regions, mapping_inputs.window_size)
            });

        let started = Instant::now();
        let mut run = PipelineRun::start(&output_dir);
        tracing::info!(run_id = %run.run_id, output_dir = %output_dir.display(), "Starting GARNET run");
        self.events().emit(PipelineEvent::PipelineStarted {
            run_id: run.run_id,
            output_dir: output_dir.clone(),
        });

        let flow = self
            .run_stages(config, &mapping_inputs, &output_dir, &mut run)
            .await;
        if flow.is_continue() {
            run.finish(RunTerminal::Completed);
        }

        match run.terminal() {
            Some(RunTerminal::Completed) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::info!(run_id = %run.run_id, duration_ms, "GARNET run completed");
                self.events().emit(PipelineEvent::PipelineCompleted {
                    run_id: run.run_id,
                    artifacts: run.artifacts(),
                    duration_ms,
                });
            }
            Some(terminal) => {
                self.events().emit(PipelineEvent::PipelineAborted {
                    run_id: run.run_id,
                    terminal,
                });
            }
            None => {}
        }

        Ok(run)
    }

    async fn run_stages(
        &self,
        config: &PipelineConfig,
        mapping_inputs: &garnet_config::MappingInputs<'_>,
        output_dir: &Path,
        run: &mut PipelineRun,
    ) -> ControlFlow<()> {
        // 1. Gene-region mapping
        let mapping = GeneRegionMapping::new(mapping_inputs, output_dir);
        let gene_mapping = self.run_required(&mapping, run).await?;

        // 2. Motif scanning
        let motif_scores = match MotifScanning::plan(
            &config.motif,
            config.chromatin.fasta_path.as_deref(),
            gene_mapping.as_deref(),
        ) {
            StagePlan::Run(stage) => self.run_required(&stage, run).await?,
            StagePlan::Skip { reason, message } => {
                self.skip(run, StageName::MotifScanning, reason, message);
                None
            }
        };

        // 3. Binding matrix
        let binding_matrix = match BindingMatrixConstruction::plan(
            config.motif.motif_library_path.as_deref(),
            gene_mapping.as_deref(),
            motif_scores.as_deref(),
        ) {
            StagePlan::Run(stage) => self.run_required(&stage, run).await?,
            StagePlan::Skip { reason, message } => {
                self.skip(run, StageName::BindingMatrixConstruction, reason, message);
                None
            }
        };

        // 4. Network export, never fatal
        match NetworkExport::plan(&config.motif, binding_matrix.as_deref(), self.options.all_genes) {
            StagePlan::Run(stage) => {
                let result = run.record(self.runner.run(&stage).await);
                if result.is_failed() {
                    tracing::warn!(
                        stage = %StageName::NetworkExport,
                        error = result.message.as_deref().unwrap_or_default(),
                        "Network export failed, continuing"
                    );
                }
            }
            StagePlan::Skip { reason, message } => {
                self.skip(run, StageName::NetworkExport, reason, message);
            }
        }

        // 5. Regression
        match Regression::plan(&config.expression, binding_matrix.as_deref()) {
            StagePlan::Run(stage) => {
                self.run_required(&stage, run).await?;
            }
            StagePlan::Skip { reason, message } => {
                self.skip(run, StageName::Regression, reason, message);
            }
        }

        ControlFlow::Continue(())
    }

    /// Run a stage whose failure ends the run. Continues with the stage's
    /// artifact, if any.
    async fn run_required(
        &self,
        stage: &dyn StageSpec,
        run: &mut PipelineRun,
    ) -> ControlFlow<(), Option<PathBuf>> {
        let result = run.record(self.runner.run(stage).await);
        if result.is_failed() {
            let stage = result.stage;
            self.abort(run, stage);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(result.artifact().map(Path::to_path_buf))
    }

    fn abort(&self, run: &mut PipelineRun, stage: StageName) {
        let cause = run
            .result(stage)
            .and_then(|r| r.message.clone())
            .unwrap_or_default();
        tracing::error!(
            stage = %stage,
            cause = %cause,
            "Error running {} step, check your files and try again",
            stage.label()
        );
        run.finish(RunTerminal::AbortedAt(stage));
    }

    fn skip(&self, run: &mut PipelineRun, stage: StageName, reason: SkipReason, message: String) {
        match reason {
            SkipReason::MissingFiles => tracing::warn!(stage = %stage, "{message}"),
            _ => tracing::info!(stage = %stage, reason = ?reason, "{message}"),
        }
        self.events().emit(PipelineEvent::StageSkipped { stage, reason });
        run.record(StageResult::skipped(stage, reason, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use garnet_types::StageStatus;

    fn orchestrator(exec: Arc<RecordingExecutor>, out: &Path) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            exec,
            ToolPaths::new("/s", "/u"),
            RunOptions {
                output_dir: Some(out.to_path_buf()),
                all_genes: false,
            },
        )
    }

    #[tokio::test]
    async fn missing_gene_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::parse("[chromatinData]\nbedfile=a.bed\nxreffile=x.txt\n").unwrap();
        let exec = Arc::new(RecordingExecutor::new());
        let err = orchestrator(exec.clone(), dir.path())
            .execute(&cfg)
            .await
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(exec.call_count(), 0);
    }

    #[tokio::test]
    async fn mapping_only_run_completes() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::parse(
            "[chromatinData]\nbedfile=a.bed\ngenefile=g.txt\nxreffile=x.txt\n",
        )
        .unwrap();
        let exec = Arc::new(RecordingExecutor::new());
        let run = orchestrator(exec.clone(), dir.path()).execute(&cfg).await.unwrap();

        assert!(run.is_completed());
        assert_eq!(exec.call_count(), 1);
        let statuses: Vec<StageStatus> = run.results().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                StageStatus::Succeeded,
                StageStatus::Skipped(SkipReason::NotConfigured),
                StageStatus::Skipped(SkipReason::MissingUpstream),
                StageStatus::Skipped(SkipReason::Disabled),
                StageStatus::Skipped(SkipReason::NotConfigured),
            ]
        );
    }
}
