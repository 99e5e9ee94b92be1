use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Attendees assumed per workshop wherever real attendance is not used.
pub const ESTIMATED_ATTENDEES_PER_WORKSHOP: u32 = 20;

pub const DEFAULT_OUTPUT_DIR: &str = "data/analyses";

/// Which workshops contribute to the attendance-per-type-per-year estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AttendanceBasis {
    /// Every workshop row.
    #[default]
    Rows,
    /// Only workshops with a recorded attendance figure.
    Recorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub attendees_per_workshop: u32,
    pub attendance_basis: AttendanceBasis,
    pub failure_policy: FailurePolicy,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            attendees_per_workshop: ESTIMATED_ATTENDEES_PER_WORKSHOP,
            attendance_basis: AttendanceBasis::default(),
            failure_policy: FailurePolicy::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl PipelineConfig {
    pub fn estimate_factor(&self) -> u64 {
        u64::from(self.attendees_per_workshop)
    }

    /// `<output_dir>/analysed_<input stem>.xlsx`
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::trim)
            .unwrap_or("input");
        self.output_dir.join(format!("analysed_{stem}.xlsx"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_twenty_attendees() {
        let config = PipelineConfig::default();
        assert_eq!(config.estimate_factor(), 20);
        assert_eq!(config.attendance_basis, AttendanceBasis::Rows);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn output_path_derives_from_input_stem() {
        let config = PipelineConfig::default();
        let path = config.default_output_path(Path::new("/tmp/raw/carpentry-workshops_UK.csv"));
        assert_eq!(
            path,
            Path::new("data/analyses/analysed_carpentry-workshops_UK.xlsx")
        );
    }
}
