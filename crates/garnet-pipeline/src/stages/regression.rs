//! Stage 5 (optional): regress expression changes on the binding matrix.

use std::path::{Path, PathBuf};

use garnet_config::{ExpressionConfig, Threshold, ThresholdKind};
use garnet_types::{SkipReason, StageName};

use super::{path_arg, CommandSpec, RequiredInput, StagePlan, StageSpec, ToolPaths};
use crate::naming;

pub const SCRIPT: &str = "motif_regression.py";
pub const Q_VALUE_FLAG: &str = "--use-qval";

#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub binding_matrix: PathBuf,
    pub expression: PathBuf,
    pub threshold: Threshold,
}

impl Regression {
    pub fn plan(expression: &ExpressionConfig, binding_matrix: Option<&Path>) -> StagePlan<Self> {
        let Some(expression_path) = expression.expression_path.as_deref() else {
            return StagePlan::skip(SkipReason::NotConfigured, "no expression data configured");
        };

        match binding_matrix {
            Some(matrix) if matrix.exists() && expression_path.exists() => StagePlan::Run(Self {
                binding_matrix: matrix.to_path_buf(),
                expression: expression_path.to_path_buf(),
                threshold: expression.threshold(),
            }),
            _ => StagePlan::skip(
                SkipReason::MissingFiles,
                "Cannot perform regression because binding matrix or expression datasets are missing",
            ),
        }
    }
}

impl StageSpec for Regression {
    fn name(&self) -> StageName {
        StageName::Regression
    }

    fn required_inputs(&self) -> Vec<RequiredInput> {
        vec![
            RequiredInput::path("binding matrix", Some(self.binding_matrix.as_path())),
            RequiredInput::path("expression data", Some(self.expression.as_path())),
        ]
    }

    fn output_path(&self) -> Option<PathBuf> {
        Some(naming::regression_output(&self.binding_matrix))
    }

    fn invocation(&self, tools: &ToolPaths, output: Option<&Path>) -> CommandSpec {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| naming::regression_output(&self.binding_matrix));
        let mut cmd = tools
            .command(SCRIPT)
            .flag("--outdir", output.display())
            .arg(path_arg(&self.binding_matrix))
            .arg(path_arg(&self.expression));
        if self.threshold.kind == ThresholdKind::QValue {
            cmd = cmd.arg(Q_VALUE_FLAG);
        }
        cmd.flag("--thresh", self.threshold).produces(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::tests::tools;

    fn expression(path: Option<PathBuf>, p: Option<f64>, q: Option<f64>) -> ExpressionConfig {
        ExpressionConfig {
            expression_path: path,
            p_value_threshold: p,
            q_value_threshold: q,
        }
    }

    fn existing_files() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let matrix = dir.path().join("events_to_genes_with_motifs.pkl");
        let expr = dir.path().join("expr.txt");
        std::fs::write(&matrix, "").unwrap();
        std::fs::write(&expr, "").unwrap();
        (dir, matrix, expr)
    }

    #[test]
    fn not_configured_without_expression_path() {
        let plan = Regression::plan(&expression(None, None, None), Some(Path::new("m.pkl")));
        assert!(matches!(
            plan,
            StagePlan::Skip {
                reason: SkipReason::NotConfigured,
                ..
            }
        ));
    }

    #[test]
    fn missing_files_when_expression_absent() {
        let (dir, matrix, _) = existing_files();
        let cfg = expression(Some(dir.path().join("nope.txt")), None, None);
        match Regression::plan(&cfg, Some(&matrix)) {
            StagePlan::Skip { reason, message } => {
                assert_eq!(reason, SkipReason::MissingFiles);
                assert!(message.starts_with("Cannot perform regression"));
            }
            StagePlan::Run(_) => panic!("expected regression to be skipped"),
        }
    }

    #[test]
    fn missing_files_without_matrix() {
        let (_dir, _, expr) = existing_files();
        let plan = Regression::plan(&expression(Some(expr), None, None), None);
        assert!(matches!(
            plan,
            StagePlan::Skip {
                reason: SkipReason::MissingFiles,
                ..
            }
        ));
    }

    #[test]
    fn q_value_only_adds_flag() {
        let (_dir, matrix, expr) = existing_files();
        let StagePlan::Run(stage) = Regression::plan(&expression(Some(expr), None, Some(0.1)), Some(&matrix))
        else {
            panic!("expected regression to run");
        };
        let cmd = stage.invocation(&tools(), stage.output_path().as_deref());
        assert!(cmd.has_arg(Q_VALUE_FLAG));
        assert_eq!(cmd.flag_value("--thresh"), Some("0.1"));
    }

    #[test]
    fn default_threshold_is_p_value() {
        let (_dir, matrix, expr) = existing_files();
        let StagePlan::Run(stage) = Regression::plan(&expression(Some(expr), None, None), Some(&matrix))
        else {
            panic!("expected regression to run");
        };
        let output = stage.output_path().unwrap();
        assert!(output
            .to_string_lossy()
            .ends_with("events_to_genes_with_motifsregression_results.xls"));
        let cmd = stage.invocation(&tools(), Some(&output));
        assert!(!cmd.has_arg(Q_VALUE_FLAG));
        assert_eq!(cmd.flag_value("--thresh"), Some("0.05"));
        assert_eq!(cmd.args.last().map(String::as_str), Some("--thresh=0.05"));
    }
}
