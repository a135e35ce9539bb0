//! Stage 4 (optional): export the binding matrix as a network. Side effect only.

use std::path::{Path, PathBuf};

use garnet_config::MotifConfig;
use garnet_types::{SkipReason, StageName};

use super::{CommandSpec, RequiredInput, StagePlan, StageSpec, ToolPaths};

pub const SCRIPT: &str = "zipTgms.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkExport {
    pub binding_matrix: Option<PathBuf>,
    pub genome: String,
    pub tf_delimiter: String,
    pub all_genes: bool,
}

impl NetworkExport {
    pub fn plan(motif: &MotifConfig, binding_matrix: Option<&Path>, all_genes: bool) -> StagePlan<Self> {
        if !motif.build_network {
            return StagePlan::skip(SkipReason::Disabled, "network export not requested");
        }
        StagePlan::Run(Self {
            binding_matrix: binding_matrix.map(Path::to_path_buf),
            genome: motif.genome_id.clone().unwrap_or_default(),
            tf_delimiter: motif.tf_delimiter.clone(),
            all_genes,
        })
    }
}

impl StageSpec for NetworkExport {
    fn name(&self) -> StageName {
        StageName::NetworkExport
    }

    fn required_inputs(&self) -> Vec<RequiredInput> {
        vec![
            RequiredInput::path("binding matrix", self.binding_matrix.as_deref()),
            RequiredInput::new("genome", self.genome.as_str()),
        ]
    }

    fn output_path(&self) -> Option<PathBuf> {
        None
    }

    fn invocation(&self, tools: &ToolPaths, _output: Option<&Path>) -> CommandSpec {
        let matrix = self
            .binding_matrix
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let cmd = tools
            .command(SCRIPT)
            .flag("--pkl", matrix)
            .arg("--genome")
            .arg(self.genome.as_str())
            .arg("--as-network")
            .flag("--tf-delimiter", &self.tf_delimiter);
        if self.all_genes {
            cmd.arg("--allGenes")
        } else {
            cmd
        }
    }
}
