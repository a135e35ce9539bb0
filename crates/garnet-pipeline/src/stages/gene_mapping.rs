//! Stage 1: map accessible regions to their nearest known genes.

use std::path::{Path, PathBuf};

use garnet_config::MappingInputs;
use garnet_types::StageName;

use super::{path_arg, CommandSpec, RequiredInput, StageSpec, ToolPaths};
use crate::naming;

pub const SCRIPT: &str = "map_peaks_to_known_genes.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRegionMapping {
    pub gene_annotation: PathBuf,
    pub xref: PathBuf,
    pub regions: PathBuf,
    pub window_size: u32,
    pub output_dir: PathBuf,
}

impl GeneRegionMapping {
    pub fn new(inputs: &MappingInputs<'_>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            gene_annotation: inputs.gene_annotation.to_path_buf(),
            xref: inputs.xref.to_path_buf(),
            regions: inputs.regions.to_path_buf(),
            window_size: inputs.window_size,
            output_dir: output_dir.into(),
        }
    }
}

impl StageSpec for GeneRegionMapping {
    fn name(&self) -> StageName {
        StageName::GeneRegionMapping
    }

    fn required_inputs(&self) -> Vec<RequiredInput> {
        vec![
            RequiredInput::path("gene annotation", Some(self.gene_annotation.as_path())),
            RequiredInput::path("gene cross-reference", Some(self.xref.as_path())),
            RequiredInput::path("region file", Some(self.regions.as_path())),
            RequiredInput::new("window size", self.window_size.to_string()),
        ]
    }

    fn output_path(&self) -> Option<PathBuf> {
        Some(naming::gene_mapping_output(&self.output_dir))
    }

    fn invocation(&self, tools: &ToolPaths, output: Option<&Path>) -> CommandSpec {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| naming::gene_mapping_output(&self.output_dir));
        tools
            .command(SCRIPT)
            .flag("--peaks-format", "BED")
            .flag("--utilpath", tools.util_path.display())
            .flag("--upstream-window", self.window_size)
            .flag("--downstream-window", self.window_size)
            .arg("--tss")
            .flag("--map-output", output.display())
            .flag("--symbol-xref", self.xref.display())
            .arg(path_arg(&self.gene_annotation))
            .arg(path_arg(&self.regions))
            .produces(naming::region_sequences(&output))
            .produces(output)
    }
}
