//! CLI binary for running the GARNET pipeline from a configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;

use garnet_config::PipelineConfig;
use garnet_pipeline::{save_run_manifest, PipelineOrchestrator, RunOptions, ToolPaths};
use garnet_types::{PipelineRun, StageStatus};

#[derive(Parser)]
#[command(
    name = "garnet",
    version,
    about = "Infer transcription factor activity from chromatin regions, motifs and expression data"
)]
struct Cli {
    /// Path to the experiment configuration file
    config: PathBuf,

    /// Directory for garnet output (default: <bedfile stem>eventsWithin<windowsize>)
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Location of the chipsequtil support library (default: <scriptdir>/../src)
    #[arg(long)]
    utilpath: Option<PathBuf>,

    /// Use all annotated genes, even those without evidence of encoding proteins
    #[arg(long = "allGenes")]
    all_genes: bool,

    /// Directory containing the analysis scripts (default: directory of this binary)
    #[arg(long)]
    scriptdir: Option<PathBuf>,

    /// Interpreter used to run the analysis scripts
    #[arg(long, default_value = garnet_pipeline::stages::DEFAULT_INTERPRETER)]
    interpreter: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let run = cmd_run(&cli).await?;
    if !run.is_completed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Directory of the running binary, where the analysis scripts are installed.
fn default_script_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the garnet binary")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn tool_paths(cli: &Cli) -> anyhow::Result<ToolPaths> {
    let script_dir = match &cli.scriptdir {
        Some(dir) => dir.clone(),
        None => default_script_dir()?,
    };
    let util_path = cli
        .utilpath
        .clone()
        .unwrap_or_else(|| script_dir.join("..").join("src"));
    Ok(ToolPaths::new(script_dir, util_path).with_interpreter(&cli.interpreter))
}

async fn cmd_run(cli: &Cli) -> anyhow::Result<PipelineRun> {
    let config = PipelineConfig::from_path(&cli.config)
        .with_context(|| format!("Need a valid configuration file, got {}", cli.config.display()))?;
    let tools = tool_paths(cli)?;
    tracing::debug!(
        scripts = %tools.script_dir.display(),
        utilpath = %tools.util_path.display(),
        "Resolved tool locations"
    );

    let options = RunOptions {
        output_dir: cli.outdir.clone(),
        all_genes: cli.all_genes,
    };
    let orchestrator = PipelineOrchestrator::with_process_executor(tools, options);
    let run = orchestrator.execute(&config).await?;

    match save_run_manifest(&run).await {
        Ok(path) => tracing::info!(manifest = %path.display(), "Run manifest written"),
        Err(e) => tracing::warn!(error = %e, "Could not write run manifest"),
    }

    print_summary(&run);
    Ok(run)
}

fn print_summary(run: &PipelineRun) {
    println!("\nGARNET run {}", run.run_id);
    println!("Output: {}", run.output_dir.display());
    for result in run.results() {
        let status = match result.status {
            StageStatus::Succeeded => "done".to_string(),
            StageStatus::Failed => match result.exit_code {
                Some(code) => format!("FAILED (exit {code})"),
                None => "FAILED".to_string(),
            },
            StageStatus::Skipped(reason) => format!("skipped ({reason:?})"),
        };
        println!("  {:<28} {}", result.stage.label(), status);
        if let (StageStatus::Failed, Some(message)) = (result.status, &result.message) {
            println!("  {:<28} {}", "", message);
        }
    }
    if let Some(terminal) = run.terminal() {
        println!("Result: {terminal}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn config_argument_is_required() {
        assert!(Cli::try_parse_from(["garnet"]).is_err());
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "garnet",
            "run.cfg",
            "--outdir",
            "results",
            "--utilpath",
            "/opt/lib",
            "--allGenes",
            "--scriptdir",
            "/opt/scripts",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("run.cfg"));
        assert_eq!(cli.outdir, Some(PathBuf::from("results")));
        assert!(cli.all_genes);
        assert_eq!(cli.interpreter, "python");

        let tools = tool_paths(&cli).unwrap();
        assert_eq!(tools.script_dir, PathBuf::from("/opt/scripts"));
        assert_eq!(tools.util_path, PathBuf::from("/opt/lib"));
    }

    #[test]
    fn util_path_defaults_next_to_scripts() {
        let cli = Cli::try_parse_from(["garnet", "run.cfg", "--scriptdir", "/opt/garnet/scripts"])
            .unwrap();
        let tools = tool_paths(&cli).unwrap();
        assert_eq!(tools.util_path, PathBuf::from("/opt/garnet/scripts/../src"));
    }
}
