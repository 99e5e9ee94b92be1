use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use workshop_analyses::config::{
    self, AttendanceBasis, FailurePolicy, PipelineConfig, ESTIMATED_ATTENDEES_PER_WORKSHOP,
};
use workshop_analyses::logging::{self, LogFormat};
use workshop_analyses::{pipeline, ReportError, RunSummary};

#[derive(Parser)]
#[command(name = "workshop-analyses")]
#[command(about = "Spreadsheet reports of Carpentry workshop and instructor data", long_about = None)]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a workshops CSV export
    Workshops {
        #[command(flatten)]
        run: RunArgs,
        #[arg(
            long,
            env = "WORKSHOP_ATTENDEES_ESTIMATE",
            default_value_t = ESTIMATED_ATTENDEES_PER_WORKSHOP
        )]
        attendees_per_workshop: u32,
        #[arg(long, value_enum, default_value_t = AttendanceBasis::Rows)]
        attendance_basis: AttendanceBasis,
    },
    /// Analyse an instructors CSV export
    Instructors {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// CSV file to analyse
    #[arg(short, long)]
    input: PathBuf,
    /// Defaults to `<output-dir>/analysed_<input stem>.xlsx`
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, env = "ANALYSES_DIR", default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Also write every analysis result as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Record failing analyses and keep writing the remaining sheets
    #[arg(long)]
    keep_going: bool,
}

impl RunArgs {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            failure_policy: if self.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
            output_dir: self.output_dir.clone(),
            ..PipelineConfig::default()
        }
    }

    fn output_path(&self, config: &PipelineConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| config.default_output_path(&self.input))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = logging::init_logging(cli.log_format) {
        eprintln!("failed to initialise logging: {error:#}");
    }

    match execute(cli.command) {
        Ok(summary) => match summary.first_failure() {
            Some(kind) => ExitCode::from(kind.exit_code()),
            None => ExitCode::SUCCESS,
        },
        Err(error) => {
            tracing::error!("{error:?}");
            println!("An error occurred while creating the analyses spreadsheet: {error:#}");
            match error.downcast_ref::<ReportError>() {
                Some(report_error) => ExitCode::from(report_error.kind().exit_code()),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn execute(command: Commands) -> anyhow::Result<RunSummary> {
    let (run, summary) = match command {
        Commands::Workshops {
            run,
            attendees_per_workshop,
            attendance_basis,
        } => {
            let config = PipelineConfig {
                attendees_per_workshop,
                attendance_basis,
                ..run.config()
            };
            let output = run.output_path(&config);
            let summary = pipeline::run_workshops(&config, &run.input, &output)
                .with_context(|| format!("workshop analyses of {} failed", run.input.display()))?;
            (run, summary)
        }
        Commands::Instructors { run } => {
            let config = run.config();
            let output = run.output_path(&config);
            let summary = pipeline::run_instructors(&config, &run.input, &output)
                .with_context(|| format!("instructor analyses of {} failed", run.input.display()))?;
            (run, summary)
        }
    };

    if let Some(path) = &run.summary {
        write_summary(path, &summary)?;
    }

    let failed = summary.outcomes.iter().filter(|o| o.is_failure()).count();
    println!(
        "Analyses complete ({} sheets, {failed} failed) - results saved to {}.",
        summary.outcomes.len(),
        summary.output.display()
    );
    Ok(summary)
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary).context("failed to serialise summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write summary to {}", path.display()))?;
    tracing::info!(summary = %path.display(), "summary written");
    Ok(())
}
