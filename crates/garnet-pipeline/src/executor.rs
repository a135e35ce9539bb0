//! Running external commands.
//!
//! [`CommandExecutor`] is the seam between orchestration and the operating
//! system. [`ProcessExecutor`] spawns real processes; [`RecordingExecutor`]
//! records invocations and answers with scripted exit codes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use garnet_types::{GarnetError, Result};

use crate::stages::CommandSpec;

/// Exit status reported when a process was terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion and return its exit status. A non-zero
    /// status is data; only a failure to start the process is an `Err`.
    async fn execute(&self, command: &CommandSpec) -> Result<i32>;
}

// ---------------------------------------------------------------------------
// ProcessExecutor
// ---------------------------------------------------------------------------

/// Spawns the command as a child process with inherited stdio, so the
/// collaborator's own output lands in the same stream as ours.
#[derive(Debug, Default, Clone)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<i32> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        cmd.stdin(std::process::Stdio::null());

        let status = cmd.status().await.map_err(|e| GarnetError::ToolSpawn {
            program: command.program.clone(),
            message: e.to_string(),
        })?;

        let code = status.code().unwrap_or(SIGNAL_EXIT_CODE);
        tracing::debug!(program = %command.program, exit_code = code, "Process exited");
        Ok(code)
    }
}

// ---------------------------------------------------------------------------
// RecordingExecutor
// ---------------------------------------------------------------------------

/// Test double: records every command, returns exit codes keyed by script
/// name (default 0) and creates the declared outputs of successful commands.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    exit_codes: HashMap<String, i32>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `script` exit with `code`.
    pub fn fail_script(mut self, script: &str, code: i32) -> Self {
        self.exit_codes.insert(script.to_string(), code);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    pub fn calls_for(&self, script: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.script_name() == Some(script))
            .collect()
    }
}

fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(())
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<i32> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }
        let code = command
            .script_name()
            .and_then(|s| self.exit_codes.get(s).copied())
            .unwrap_or(0);
        if code == 0 {
            for output in &command.outputs {
                touch(output)?;
            }
        }
        Ok(code)
    }
}
