use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::analysis::{Analysis, WORKSHOP_ANALYSES};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::error::{FailureKind, ReportError};
use crate::instructors::INSTRUCTOR_ANALYSES;
use crate::loader::{self, INSTRUCTOR_COLUMNS, WORKSHOP_COLUMNS};
use crate::models::{AnalysisOutput, InstructorRecord, WorkshopRecord};
use crate::report::Report;

pub const WORKSHOPS_RAW_SHEET: &str = "carpentry_workshops";
pub const INSTRUCTORS_RAW_SHEET: &str = "carpentry_instructors";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        sheet: String,
        output: AnalysisOutput,
    },
    Failure {
        sheet: String,
        kind: FailureKind,
        detail: String,
    },
}

impl AnalysisOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisOutcome::Failure { .. })
    }
}

/// What one pipeline run produced.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub outcomes: Vec<AnalysisOutcome>,
}

impl RunSummary {
    pub fn first_failure(&self) -> Option<FailureKind> {
        self.outcomes.iter().find_map(|outcome| match outcome {
            AnalysisOutcome::Failure { kind, .. } => Some(*kind),
            AnalysisOutcome::Success { .. } => None,
        })
    }
}

/// Input-specific pieces of a run.
struct Subject<T: 'static> {
    label: &'static str,
    raw_sheet: &'static str,
    columns: &'static [&'static str],
    analyses: &'static [Analysis<T>],
}

const WORKSHOPS: Subject<WorkshopRecord> = Subject {
    label: "Carpentry workshop",
    raw_sheet: WORKSHOPS_RAW_SHEET,
    columns: WORKSHOP_COLUMNS,
    analyses: WORKSHOP_ANALYSES,
};

const INSTRUCTORS: Subject<InstructorRecord> = Subject {
    label: "Carpentry instructor",
    raw_sheet: INSTRUCTORS_RAW_SHEET,
    columns: INSTRUCTOR_COLUMNS,
    analyses: INSTRUCTOR_ANALYSES,
};

pub fn run_workshops(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
) -> Result<RunSummary, ReportError> {
    run(&WORKSHOPS, config, input, output)
}

pub fn run_instructors(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
) -> Result<RunSummary, ReportError> {
    run(&INSTRUCTORS, config, input, output)
}

/// Loads `input`, writes the README and raw sheets, runs every analysis and
/// saves the workbook once.
///
/// Under [`FailurePolicy::Abort`] the first failing analysis stops the run
/// and nothing is saved. Under [`FailurePolicy::Continue`] the failure is
/// recorded and the remaining sheets are still written.
fn run<T: DeserializeOwned + 'static>(
    subject: &Subject<T>,
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
) -> Result<RunSummary, ReportError> {
    tracing::info!(input = %input.display(), "{} data to be analysed", subject.label);
    let table = loader::load_table::<T>(input, subject.columns)?;
    tracing::info!(rows = table.len(), "input loaded");
    if table.is_empty() {
        tracing::warn!("input has no data rows; sheets will be empty");
    }

    let mut report = Report::new();
    report.add_readme(&readme_text(subject, input))?;
    report.add_raw_sheet(subject.raw_sheet, &table.headers, &table.rows)?;

    let mut outcomes = Vec::with_capacity(subject.analyses.len());
    for analysis in subject.analyses {
        let _span = tracing::debug_span!("analysis", sheet = analysis.sheet).entered();
        match (analysis.run)(&table.records, config, &mut report) {
            Ok(result) => {
                tracing::debug!("sheet written");
                outcomes.push(AnalysisOutcome::Success {
                    sheet: analysis.sheet.to_string(),
                    output: result,
                });
            }
            Err(error) => {
                tracing::error!(error = %error.detail(), "analysis failed");
                if config.failure_policy == FailurePolicy::Abort {
                    return Err(error);
                }
                outcomes.push(AnalysisOutcome::Failure {
                    sheet: analysis.sheet.to_string(),
                    kind: error.kind(),
                    detail: error.detail(),
                });
            }
        }
    }

    report.save(output)?;
    tracing::info!(output = %output.display(), "analyses complete");

    Ok(RunSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows: table.len(),
        outcomes,
    })
}

fn readme_text<T: 'static>(subject: &Subject<T>, input: &Path) -> String {
    format!(
        "Data in sheet '{}' contains {} data from {}. Analyses performed on {}.",
        subject.raw_sheet,
        subject.label,
        input.display(),
        Local::now().format("%Y-%m-%d %H:%M")
    )
}
