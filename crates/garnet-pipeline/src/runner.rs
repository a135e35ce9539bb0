//! Executes one stage: input check, cache check, invocation, result.

use std::sync::Arc;
use std::time::Instant;

use garnet_types::StageResult;

use crate::events::{EventEmitter, PipelineEvent};
use crate::executor::CommandExecutor;
use crate::stages::{StageSpec, ToolPaths};

pub struct StageRunner {
    executor: Arc<dyn CommandExecutor>,
    tools: ToolPaths,
    events: EventEmitter,
}

impl StageRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>, tools: ToolPaths) -> Self {
        Self {
            executor,
            tools,
            events: EventEmitter::default(),
        }
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Run `stage` unless its inputs are missing or its output already exists.
    ///
    /// Never returns an error: a missing input, a failure to start the tool
    /// and a non-zero exit all become a `Failed` result.
    pub async fn run(&self, stage: &dyn StageSpec) -> StageResult {
        let name = stage.name();

        if let Some(missing) = stage.required_inputs().into_iter().find(|i| i.is_missing()) {
            let result = StageResult::missing_input(name, missing.name);
            tracing::error!(stage = %name, input = missing.name, "Required input is empty");
            self.emit_failed(&result);
            return result;
        }

        let output = stage.output_path();

        if let Some(path) = output.as_deref().filter(|p| p.exists()) {
            tracing::info!(
                stage = %name,
                output = %path.display(),
                "Intermediate file already exists. If you would like to replace it, delete and re-run"
            );
            self.events.emit(PipelineEvent::StageCached {
                stage: name,
                output: path.to_path_buf(),
            });
            return StageResult::cached(name, path.to_path_buf());
        }

        if let Some(parent) = output
            .as_deref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
        {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                let result = StageResult::failed(
                    name,
                    None,
                    format!("cannot create {}: {}", parent.display(), e),
                );
                tracing::error!(stage = %name, error = %e, "Could not create output directory");
                self.emit_failed(&result);
                return result;
            }
        }

        let command = stage.invocation(&self.tools, output.as_deref());
        tracing::info!("----------------------------- {} -----------------------------", name.label());
        tracing::info!(stage = %name, command = %command, "Running command");
        self.events.emit(PipelineEvent::StageStarted {
            stage: name,
            command: command.to_string(),
        });

        let started = Instant::now();
        let result = match self.executor.execute(&command).await {
            Ok(0) => {
                for expected in command.outputs.iter().filter(|p| !p.exists()) {
                    tracing::warn!(
                        stage = %name,
                        output = %expected.display(),
                        "Tool exited cleanly but did not create its output"
                    );
                }
                let duration_ms = started.elapsed().as_millis() as u64;
                tracing::info!(stage = %name, duration_ms, "Stage completed");
                self.events.emit(PipelineEvent::StageCompleted {
                    stage: name,
                    duration_ms,
                });
                StageResult::succeeded(name, output)
            }
            Ok(code) => {
                tracing::error!(stage = %name, exit_code = code, "Tool exited with non-zero status");
                StageResult::failed(name, Some(code), format!("exited with status {code}"))
            }
            Err(e) => {
                tracing::error!(stage = %name, error = %e, "Tool could not be run");
                StageResult::failed(name, None, e.to_string())
            }
        };

        if result.is_failed() {
            self.emit_failed(&result);
        }
        result
    }

    fn emit_failed(&self, result: &StageResult) {
        self.events.emit(PipelineEvent::StageFailed {
            stage: result.stage,
            exit_code: result.exit_code,
            error: result.message.clone().unwrap_or_default(),
        });
    }
}
