//! Pipeline event system for observability.
//!
//! Emits [`PipelineEvent`]s via a [`tokio::sync::broadcast`] channel so that
//! tests and embedding tools can follow stage transitions without parsing the
//! log stream.

use std::path::PathBuf;

use garnet_types::{RunTerminal, SkipReason, StageName};
use serde::{Deserialize, Serialize};

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineEvent {
    PipelineStarted {
        run_id: uuid::Uuid,
        output_dir: PathBuf,
    },
    StageStarted {
        stage: StageName,
        command: String,
    },
    StageCached {
        stage: StageName,
        output: PathBuf,
    },
    StageSkipped {
        stage: StageName,
        reason: SkipReason,
    },
    StageCompleted {
        stage: StageName,
        duration_ms: u64,
    },
    StageFailed {
        stage: StageName,
        exit_code: Option<i32>,
        error: String,
    },
    PipelineCompleted {
        run_id: uuid::Uuid,
        artifacts: Vec<PathBuf>,
        duration_ms: u64,
    },
    PipelineAborted {
        run_id: uuid::Uuid,
        terminal: RunTerminal,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<PipelineEvent>,
}

impl EventEmitter {
    /// Create a new emitter with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
