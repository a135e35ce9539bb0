//! Run manifest persistence.
//!
//! After each run the CLI writes the [`PipelineRun`] to
//! `<output_dir>/garnet_run.json`. The manifest is a record for people and
//! tooling only; caching decisions look at the artifacts themselves.

use std::path::{Path, PathBuf};

use garnet_types::{PipelineRun, Result};

pub const MANIFEST_FILE: &str = "garnet_run.json";

/// Write the manifest into the run's output directory, creating it if needed.
pub async fn save_run_manifest(run: &PipelineRun) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&run.output_dir).await?;
    let path = run.output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(run)?;
    tokio::fs::write(&path, json).await?;
    tracing::debug!(path = %path.display(), "Run manifest saved");
    Ok(path)
}

/// Returns `Ok(None)` when the directory holds no manifest.
pub async fn load_run_manifest(output_dir: &Path) -> Result<Option<PipelineRun>> {
    let path = output_dir.join(MANIFEST_FILE);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(&path).await?;
    let run: PipelineRun = serde_json::from_str(&json)?;
    Ok(Some(run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use garnet_types::{RunTerminal, SkipReason, StageName, StageResult};

    fn sample_run(dir: &Path) -> PipelineRun {
        let mut run = PipelineRun::start(dir.join("peakseventsWithin2000"));
        run.record(StageResult::succeeded(
            StageName::GeneRegionMapping,
            Some(dir.join("peakseventsWithin2000/events_to_genes.xls")),
        ));
        run.record(StageResult::skipped(
            StageName::MotifScanning,
            SkipReason::NotConfigured,
            "no motif library",
        ));
        run.finish(RunTerminal::Completed);
        run
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let run = sample_run(dir.path());

        let path = save_run_manifest(&run).await.unwrap();
        assert_eq!(path, run.output_dir.join(MANIFEST_FILE));

        let loaded = load_run_manifest(&run.output_dir).await.unwrap().unwrap();
        assert_eq!(loaded.run_id, run.run_id);
        assert_eq!(loaded.results(), run.results());
        assert_eq!(loaded.terminal(), Some(RunTerminal::Completed));
        assert_eq!(loaded.finished_at, run.finished_at);
    }

    #[tokio::test]
    async fn load_from_nonexistent_directory_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_run_manifest(&dir.path().join("absent")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn corrupt_manifest_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{not json").unwrap();
        let err = load_run_manifest(dir.path()).await.unwrap_err();
        assert!(matches!(err, garnet_types::GarnetError::Json(_)));
    }
}
