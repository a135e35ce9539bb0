//! Stage 2: score every mapped region against the motif library.

use std::path::{Path, PathBuf};

use garnet_config::MotifConfig;
use garnet_types::{SkipReason, StageName};

use super::{path_arg, CommandSpec, RequiredInput, StagePlan, StageSpec, ToolPaths};
use crate::naming;

pub const SCRIPT: &str = "motif_fsa_scores.py";
/// Fixed score scale the scanner is always run with.
pub const SCORE_SCALE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifScanning {
    pub motif_library: PathBuf,
    pub genome: String,
    pub sequences: PathBuf,
    pub thread_count: u32,
    pub gene_mapping: Option<PathBuf>,
}

impl MotifScanning {
    /// Decide whether motif scanning can run. It needs a library, a genome and
    /// a FASTA file in the configuration, and both files on disk.
    pub fn plan(
        motif: &MotifConfig,
        fasta: Option<&Path>,
        gene_mapping: Option<&Path>,
    ) -> StagePlan<Self> {
        let (Some(library), Some(genome), Some(fasta)) =
            (motif.motif_library_path.as_deref(), motif.genome_id.as_deref(), fasta)
        else {
            return StagePlan::skip(
                SkipReason::NotConfigured,
                "motif library, genome or FASTA file not configured",
            );
        };

        if !library.exists() || !fasta.exists() {
            return StagePlan::skip(
                SkipReason::MissingFiles,
                "Missing FASTA file or TAMO file - check your config file and try again.",
            );
        }

        StagePlan::Run(Self {
            motif_library: library.to_path_buf(),
            genome: genome.to_string(),
            sequences: fasta.to_path_buf(),
            thread_count: motif.thread_count,
            gene_mapping: gene_mapping.map(Path::to_path_buf),
        })
    }
}

impl StageSpec for MotifScanning {
    fn name(&self) -> StageName {
        StageName::MotifScanning
    }

    fn required_inputs(&self) -> Vec<RequiredInput> {
        vec![
            RequiredInput::path("motif library", Some(self.motif_library.as_path())),
            RequiredInput::new("genome", self.genome.as_str()),
            RequiredInput::path("FASTA file", Some(self.sequences.as_path())),
            RequiredInput::path("gene mapping", self.gene_mapping.as_deref()),
        ]
    }

    fn output_path(&self) -> Option<PathBuf> {
        Some(naming::motif_scan_output(
            self.gene_mapping.as_deref(),
            &self.sequences,
        ))
    }

    fn invocation(&self, tools: &ToolPaths, output: Option<&Path>) -> CommandSpec {
        let output = output
            .map(Path::to_path_buf)
            .or_else(|| self.output_path())
            .unwrap_or_default();
        let gene_mapping = self
            .gene_mapping
            .as_deref()
            .map(path_arg)
            .unwrap_or_default();
        tools
            .command(SCRIPT)
            .flag("--motif", self.motif_library.display())
            .flag("--genome", &self.genome)
            .flag("--outfile", output.display())
            .flag("--genefile", gene_mapping)
            .flag("--scale", SCORE_SCALE)
            .flag("--threads", self.thread_count)
            .arg(path_arg(&self.sequences))
            .produces(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::tests::tools;

    fn motif_config(library: Option<PathBuf>, genome: Option<&str>) -> MotifConfig {
        MotifConfig {
            motif_library_path: library,
            genome_id: genome.map(String::from),
            thread_count: 4,
            build_network: false,
            tf_delimiter: String::new(),
        }
    }

    #[test]
    fn not_configured_without_genome() {
        let cfg = motif_config(Some("m.tamo".into()), None);
        let plan = MotifScanning::plan(&cfg, Some(Path::new("a.fasta")), None);
        assert!(matches!(
            plan,
            StagePlan::Skip {
                reason: SkipReason::NotConfigured,
                ..
            }
        ));
    }

    #[test]
    fn missing_files_when_library_absent() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("peaks.fasta");
        std::fs::write(&fasta, ">r1\nACGT\n").unwrap();
        let cfg = motif_config(Some(dir.path().join("absent.tamo")), Some("hg19"));

        let plan = MotifScanning::plan(&cfg, Some(&fasta), None);
        assert!(matches!(
            plan,
            StagePlan::Skip {
                reason: SkipReason::MissingFiles,
                ..
            }
        ));
    }

    #[test]
    fn runs_when_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("peaks.fasta");
        let library = dir.path().join("motifs.tamo");
        std::fs::write(&fasta, "").unwrap();
        std::fs::write(&library, "").unwrap();
        let mapping = dir.path().join("out/events_to_genes.xls");
        let cfg = motif_config(Some(library.clone()), Some("hg19"));

        let StagePlan::Run(stage) = MotifScanning::plan(&cfg, Some(&fasta), Some(&mapping)) else {
            panic!("expected motif scanning to run");
        };
        let output = stage.output_path().unwrap();
        assert_eq!(output, dir.path().join("out/events_to_genes_with_motifs.txt"));

        let cmd = stage.invocation(&tools(), Some(&output));
        assert_eq!(cmd.script_name(), Some(SCRIPT));
        assert_eq!(cmd.flag_value("--genome"), Some("hg19"));
        assert_eq!(cmd.flag_value("--scale"), Some("10"));
        assert_eq!(cmd.flag_value("--threads"), Some("4"));
        assert_eq!(
            cmd.flag_value("--genefile"),
            Some(mapping.display().to_string().as_str())
        );
        assert_eq!(cmd.args.last(), Some(&fasta.display().to_string()));
        assert_eq!(cmd.outputs, vec![output]);
    }
}
