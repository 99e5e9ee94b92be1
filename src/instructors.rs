//! Companion analyses over the instructors table.

use crate::aggregate::{count_by, count_table, ranked_count_table};
use crate::analysis::Analysis;
use crate::config::PipelineConfig;
use crate::error::ReportError;
use crate::models::{AnalysisOutput, InstructorRecord};
use crate::report::{ChartSpec, Report, TOTAL_CELL};

pub const PER_YEAR_SHEET: &str = "instructors_per_year";
pub const NEAREST_AIRPORT_SHEET: &str = "instructors_nearest_airport";
pub const PER_UK_REGION_SHEET: &str = "instructors_per_UK_region";

pub const INSTRUCTOR_ANALYSES: &[Analysis<InstructorRecord>] = &[
    Analysis {
        sheet: PER_YEAR_SHEET,
        run: instructors_per_year,
    },
    Analysis {
        sheet: NEAREST_AIRPORT_SHEET,
        run: instructors_nearest_airport,
    },
    Analysis {
        sheet: PER_UK_REGION_SHEET,
        run: instructors_per_uk_region,
    },
];

const COUNT: &str = "count";
const INSTRUCTORS_AXIS: &str = "Number of instructors";

pub fn instructors_per_year(
    records: &[InstructorRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = count_table(
        count_by(records, InstructorRecord::earliest_badge_awarded_year),
        "earliest-badge-awarded-year",
        COUNT,
    );
    report.write_counts(
        PER_YEAR_SHEET,
        &table,
        &ChartSpec::column(
            "Number of instructors by year of first badge",
            "Year",
            INSTRUCTORS_AXIS,
        ),
    )?;
    report.annotate(
        PER_YEAR_SHEET,
        TOTAL_CELL,
        &format!("Total instructors: {}", table.total()),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn instructors_nearest_airport(
    records: &[InstructorRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = ranked_count_table(
        count_by(records, |r| r.nearest_airport_name.clone()),
        "nearest_airport_name",
        COUNT,
    );
    report.write_counts(
        NEAREST_AIRPORT_SHEET,
        &table,
        &ChartSpec::column(
            "Number of instructors per nearest airport",
            "Airport",
            INSTRUCTORS_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn instructors_per_uk_region(
    records: &[InstructorRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = ranked_count_table(
        count_by(records, |r| r.nearest_airport_uk_region.clone()),
        "nearest_airport_UK_region",
        COUNT,
    );
    report.write_counts(
        PER_UK_REGION_SHEET,
        &table,
        &ChartSpec::column("Number of instructors per UK region", "Region", INSTRUCTORS_AXIS)
            .at(1, 3),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryKey, CountTable};
    use crate::report::CellValue;
    use chrono::NaiveDate;

    fn instructor(
        airport: &str,
        region: Option<&str>,
        badged: Option<(i32, u32)>,
    ) -> InstructorRecord {
        InstructorRecord {
            affiliation: Some("University".to_string()),
            nearest_airport_code: Some(airport[..3].to_uppercase()),
            nearest_airport_name: Some(airport.to_string()),
            nearest_airport_uk_region: region.map(str::to_string),
            earliest_badge_awarded: badged
                .and_then(|(year, month)| NaiveDate::from_ymd_opt(year, month, 1)),
        }
    }

    fn sample() -> Vec<InstructorRecord> {
        let mut records = Vec::new();
        for month in 1..=5 {
            let region = Some("Yorkshire and The Humber");
            records.push(instructor("Leeds", region, Some((2014, month))));
        }
        for month in 1..=5 {
            records.push(instructor("Edinburgh", Some("Scotland"), Some((2015, month))));
        }
        for month in 6..=9 {
            records.push(instructor("Manchester", Some("North West"), Some((2014, month))));
        }
        records.push(instructor("Amsterdam", None, None));
        records
    }

    fn counts(output: AnalysisOutput) -> CountTable {
        match output {
            AnalysisOutput::Counts(table) => table,
            other => panic!("expected counts, got {other:?}"),
        }
    }

    #[test]
    fn nearest_airport_counts() {
        let mut report = Report::new();
        let config = PipelineConfig::default();
        let output = instructors_nearest_airport(&sample(), &config, &mut report);
        let table = counts(output.unwrap());
        assert_eq!(table.get(&"Leeds".into()), Some(5));
        assert_eq!(table.rows.first(), Some(&(CategoryKey::from("Amsterdam"), 1)));
        assert_eq!(table.total(), 15);
    }

    #[test]
    fn uk_region_counts_skip_overseas() {
        let mut report = Report::new();
        let output = instructors_per_uk_region(&sample(), &PipelineConfig::default(), &mut report);
        let table = counts(output.unwrap());
        assert_eq!(table.get(&"Scotland".into()), Some(5));
        assert_eq!(table.total(), 14);
        assert!(table.rows.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    }

    #[test]
    fn badge_year_counts() {
        let mut report = Report::new();
        let output = instructors_per_year(&sample(), &PipelineConfig::default(), &mut report);
        let table = counts(output.unwrap());
        assert_eq!(table.get(&2014.into()), Some(9));
        assert_eq!(table.get(&2015.into()), Some(5));
        assert_eq!(table.rows.len(), 2);

        let layout = report.layout(PER_YEAR_SHEET).unwrap();
        assert_eq!(
            layout.cell(0, 3),
            Some(&CellValue::Text("Total instructors: 14".to_string()))
        );
        assert_eq!(layout.cell(2, 1), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn all_analyses_render() {
        let config = PipelineConfig::default();
        let mut report = Report::new();
        for analysis in INSTRUCTOR_ANALYSES {
            (analysis.run)(&sample(), &config, &mut report).unwrap();
        }
        let expected: Vec<&str> = INSTRUCTOR_ANALYSES.iter().map(|a| a.sheet).collect();
        assert_eq!(report.sheet_names(), expected);
        assert!(report.to_buffer().is_ok());
    }
}
