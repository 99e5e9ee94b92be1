//! Descriptive analyses of Carpentry workshop and instructor exports,
//! written out as a multi-sheet Excel report with one chart per sheet.

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod instructors;
pub mod loader;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::PipelineConfig;
pub use error::{FailureKind, ReportError};
pub use pipeline::{run_instructors, run_workshops, AnalysisOutcome, RunSummary};
