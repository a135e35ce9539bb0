//! Stage specifications: one typed parameter set per external analysis tool.
//!
//! A [`StageSpec`] knows its required inputs, the artifact that marks it as
//! done, and how to turn itself into a [`CommandSpec`]. It never runs anything;
//! that is the [`StageRunner`](crate::runner::StageRunner)'s job.

pub mod binding_matrix;
pub mod gene_mapping;
pub mod motif_scan;
pub mod network_export;
pub mod regression;

use std::fmt;
use std::path::{Path, PathBuf};

use garnet_types::{SkipReason, StageName};

pub use binding_matrix::BindingMatrixConstruction;
pub use gene_mapping::GeneRegionMapping;
pub use motif_scan::MotifScanning;
pub use network_export::NetworkExport;
pub use regression::Regression;

// ---------------------------------------------------------------------------
// StageSpec trait
// ---------------------------------------------------------------------------

/// A named input a stage cannot run without. An empty value means missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredInput {
    pub name: &'static str,
    pub value: String,
}

impl RequiredInput {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn path(name: &'static str, path: Option<&Path>) -> Self {
        Self::new(
            name,
            path.map(|p| p.display().to_string()).unwrap_or_default(),
        )
    }

    pub fn is_missing(&self) -> bool {
        self.value.trim().is_empty()
    }
}

pub trait StageSpec: Send + Sync {
    fn name(&self) -> StageName;

    /// Inputs checked before anything else; any empty one fails the stage.
    fn required_inputs(&self) -> Vec<RequiredInput>;

    /// The artifact whose existence marks the stage as already done.
    /// `None` for stages that only have side effects; those are never cached.
    fn output_path(&self) -> Option<PathBuf>;

    /// Build the external invocation.
    fn invocation(&self, tools: &ToolPaths, output: Option<&Path>) -> CommandSpec;
}

/// Whether the orchestrator should run a stage or record it as skipped.
#[derive(Debug)]
pub enum StagePlan<S> {
    Run(S),
    Skip { reason: SkipReason, message: String },
}

impl<S> StagePlan<S> {
    pub(crate) fn skip(reason: SkipReason, message: impl Into<String>) -> Self {
        StagePlan::Skip {
            reason,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ToolPaths — where the collaborator scripts live
// ---------------------------------------------------------------------------

pub const DEFAULT_INTERPRETER: &str = "python";

/// Locations of the collaborator scripts and their support library. Passed
/// explicitly into every invocation; nothing is looked up globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub interpreter: String,
    pub script_dir: PathBuf,
    pub util_path: PathBuf,
}

impl ToolPaths {
    pub fn new(script_dir: impl Into<PathBuf>, util_path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            script_dir: script_dir.into(),
            util_path: util_path.into(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn script(&self, name: &str) -> PathBuf {
        self.script_dir.join(name)
    }

    /// Search path handed to every collaborator: the library and its
    /// `chipsequtil` package directory.
    pub fn python_path(&self) -> String {
        format!(
            "{}:{}",
            self.util_path.display(),
            self.util_path.join("chipsequtil").display()
        )
    }

    /// Start a command that runs `script` under the interpreter.
    pub fn command(&self, script: &str) -> CommandSpec {
        CommandSpec::new(&self.interpreter)
            .arg(self.script(script).display().to_string())
            .env("PYTHONPATH", self.python_path())
    }
}

// ---------------------------------------------------------------------------
// CommandSpec — an external invocation, as data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Files the invocation is expected to create.
    pub outputs: Vec<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `--name=value`.
    pub fn flag(self, name: &str, value: impl fmt::Display) -> Self {
        self.arg(format!("{name}={value}"))
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn produces(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value of a `--name=value` argument.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find_map(|a| a.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
    }

    /// File name of the script being run, if the first argument is one.
    pub fn script_name(&self) -> Option<&str> {
        self.args
            .first()
            .and_then(|a| Path::new(a).file_name())
            .and_then(|n| n.to_str())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Render a path for use inside a command argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}
