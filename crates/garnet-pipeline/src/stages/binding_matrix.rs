//! Stage 3: merge motif scores with the gene mapping into a TF × gene matrix.

use std::path::{Path, PathBuf};

use garnet_types::{SkipReason, StageName};

use super::{path_arg, CommandSpec, RequiredInput, StagePlan, StageSpec, ToolPaths};
use crate::naming;

pub const SCRIPT: &str = "get_window_binding_matrix.py";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMatrixConstruction {
    pub motif_scores: PathBuf,
    pub gene_mapping: PathBuf,
    /// Comma separated TF identifier list file(s).
    pub tf_ids: String,
}

impl BindingMatrixConstruction {
    /// Both upstream artifacts must be present; the TF list is derived from
    /// the motif library, plus its source-names file when one sits beside it.
    pub fn plan(
        motif_library: Option<&Path>,
        gene_mapping: Option<&Path>,
        motif_scores: Option<&Path>,
    ) -> StagePlan<Self> {
        let (Some(gene_mapping), Some(motif_scores)) = (gene_mapping, motif_scores) else {
            return StagePlan::skip(
                SkipReason::MissingUpstream,
                "gene mapping or motif scores were not produced",
            );
        };

        let tf_ids = motif_library.map(tf_id_lists).unwrap_or_default();

        StagePlan::Run(Self {
            motif_scores: motif_scores.to_path_buf(),
            gene_mapping: gene_mapping.to_path_buf(),
            tf_ids,
        })
    }
}

fn tf_id_lists(library: &Path) -> String {
    let mut lists = path_arg(&naming::tf_id_list(library));
    let source_names = naming::source_names_list(library);
    if source_names.exists() {
        tracing::debug!(file = %source_names.display(), "Adding source motif names");
        lists.push(',');
        lists.push_str(&path_arg(&source_names));
    }
    lists
}

impl StageSpec for BindingMatrixConstruction {
    fn name(&self) -> StageName {
        StageName::BindingMatrixConstruction
    }

    fn required_inputs(&self) -> Vec<RequiredInput> {
        vec![
            RequiredInput::path("motif scores", Some(self.motif_scores.as_path())),
            RequiredInput::path("gene mapping", Some(self.gene_mapping.as_path())),
            RequiredInput::new("TF id list", self.tf_ids.as_str()),
        ]
    }

    fn output_path(&self) -> Option<PathBuf> {
        Some(naming::binding_matrix(&self.motif_scores))
    }

    fn invocation(&self, tools: &ToolPaths, output: Option<&Path>) -> CommandSpec {
        let table = naming::binding_table(&self.motif_scores);
        let matrix = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| naming::binding_matrix(&self.motif_scores));
        tools
            .command(SCRIPT)
            .arg(path_arg(&self.motif_scores))
            .arg(path_arg(&self.gene_mapping))
            .arg(path_arg(&naming::region_sequences(&self.gene_mapping)))
            .flag("--distance-to-gene", "")
            .flag("--motif-id-list", &self.tf_ids)
            .flag("--outfile", table.display())
            .produces(table)
            .produces(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::tests::tools;

    #[test]
    fn missing_upstream_when_motif_scores_absent() {
        let plan = BindingMatrixConstruction::plan(
            Some(Path::new("m.tamo")),
            Some(Path::new("out/events_to_genes.xls")),
            None,
        );
        assert!(matches!(
            plan,
            StagePlan::Skip {
                reason: SkipReason::MissingUpstream,
                ..
            }
        ));
    }

    #[test]
    fn tf_list_without_source_names() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("motifs.tamo");
        assert_eq!(
            tf_id_lists(&library),
            dir.path().join("motifs_tfids.txt").display().to_string()
        );
    }

    #[test]
    fn tf_list_appends_source_names_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("motifs.tamo");
        let names = dir.path().join("motifs_source_names.txt");
        std::fs::write(&names, "").unwrap();
        let lists = tf_id_lists(&library);
        assert!(lists.ends_with(&format!(",{}", names.display())), "got: {lists}");
    }

    #[test]
    fn invocation_and_artifacts() {
        let plan = BindingMatrixConstruction::plan(
            Some(Path::new("lib/m.tamo")),
            Some(Path::new("out/events_to_genes.xls")),
            Some(Path::new("out/events_to_genes_with_motifs.txt")),
        );
        let StagePlan::Run(stage) = plan else {
            panic!("expected binding matrix to run");
        };
        let output = stage.output_path().unwrap();
        assert_eq!(output, PathBuf::from("out/events_to_genes_with_motifs.pkl"));

        let cmd = stage.invocation(&tools(), Some(&output));
        assert_eq!(
            &cmd.args[1..4],
            &[
                "out/events_to_genes_with_motifs.txt".to_string(),
                "out/events_to_genes.xls".to_string(),
                "out/events_to_genes.fsa".to_string(),
            ]
        );
        assert_eq!(cmd.flag_value("--distance-to-gene"), Some(""));
        assert_eq!(cmd.flag_value("--motif-id-list"), Some("lib/m_tfids.txt"));
        assert_eq!(
            cmd.flag_value("--outfile"),
            Some("out/events_to_genes_with_motifs.tgm")
        );
        assert!(cmd.outputs.contains(&output));
    }
}
