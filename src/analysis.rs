//! Workshop analyses. Each one aggregates the full table, writes one sheet
//! with its chart, and hands the aggregation back to the caller.

use crate::aggregate::{count_by, count_table, pivot, ranked_count_table, PivotLabels};
use crate::config::{AttendanceBasis, PipelineConfig};
use crate::error::ReportError;
use crate::models::{AnalysisOutput, CategoryKey, CountTable, WorkshopRecord};
use crate::report::{ChartSpec, Report, TOTAL_CELL};

pub type AnalysisFn<T> =
    fn(&[T], &PipelineConfig, &mut Report) -> Result<AnalysisOutput, ReportError>;

pub struct Analysis<T: 'static> {
    pub sheet: &'static str,
    pub run: AnalysisFn<T>,
}

pub const PER_YEAR_SHEET: &str = "workshops_per_year";
pub const PER_TYPE_SHEET: &str = "workshops_per_type";
pub const TYPE_PER_YEAR_SHEET: &str = "workshops_per_type_per_year";
pub const ONLINE_SHEET: &str = "online_vs_inperson";
pub const PER_HOST_SHEET: &str = "workshops_per_host";
pub const HOST_PER_YEAR_SHEET: &str = "workshops_per_host_per_year";
pub const ATTENDANCE_PER_YEAR_SHEET: &str = "attendance_per_year";
pub const ATTENDANCE_PER_TYPE_SHEET: &str = "attendance_per_type";
pub const ATTENDANCE_TYPE_YEAR_SHEET: &str = "attendance_type_year";
pub const PER_REGION_SHEET: &str = "workshops_per_region";
pub const REGION_PER_YEAR_SHEET: &str = "workshops_per_region_per_year";

/// Invocation order, which is also the sheet order in the report.
pub const WORKSHOP_ANALYSES: &[Analysis<WorkshopRecord>] = &[
    Analysis {
        sheet: PER_YEAR_SHEET,
        run: workshops_per_year,
    },
    Analysis {
        sheet: PER_TYPE_SHEET,
        run: workshops_per_type,
    },
    Analysis {
        sheet: TYPE_PER_YEAR_SHEET,
        run: workshops_per_type_per_year,
    },
    Analysis {
        sheet: ONLINE_SHEET,
        run: online_vs_inperson,
    },
    Analysis {
        sheet: PER_HOST_SHEET,
        run: workshops_per_host,
    },
    Analysis {
        sheet: HOST_PER_YEAR_SHEET,
        run: workshops_per_host_per_year,
    },
    Analysis {
        sheet: ATTENDANCE_PER_YEAR_SHEET,
        run: attendance_per_year,
    },
    Analysis {
        sheet: ATTENDANCE_PER_TYPE_SHEET,
        run: attendance_per_type,
    },
    Analysis {
        sheet: ATTENDANCE_TYPE_YEAR_SHEET,
        run: attendance_per_type_per_year,
    },
    Analysis {
        sheet: PER_REGION_SHEET,
        run: workshops_per_region,
    },
    Analysis {
        sheet: REGION_PER_YEAR_SHEET,
        run: workshops_per_region_per_year,
    },
];

const WORKSHOPS: &str = "number_of_workshops";
const ATTENDEES: &str = "number_of_attendees";
const WORKSHOPS_AXIS: &str = "Number of workshops";
const ATTENDEES_AXIS: &str = "Number of attendees";

fn type_per_year_labels(value: &str) -> PivotLabels<'_> {
    PivotLabels {
        row: "year",
        column: "workshop_type",
        value,
    }
}

fn host(record: &WorkshopRecord) -> Option<String> {
    record.organiser_top_level_web_domain.clone()
}

fn region(record: &WorkshopRecord) -> Option<String> {
    record.region.clone()
}

pub fn workshops_per_year(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = count_table(count_by(records, |r| Some(r.year)), "year", WORKSHOPS);
    report.write_counts(
        PER_YEAR_SHEET,
        &table,
        &ChartSpec::column("Number of workshops per year", "Year", WORKSHOPS_AXIS),
    )?;
    report.annotate(
        PER_YEAR_SHEET,
        TOTAL_CELL,
        &format!("Total workshops: {}", table.total()),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn workshops_per_type(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = count_table(
        count_by(records, |r| Some(r.workshop_type.clone())),
        "workshop_type",
        WORKSHOPS,
    );
    report.write_counts(
        PER_TYPE_SHEET,
        &table,
        &ChartSpec::column(
            "Number of workshops of different types",
            "Workshop type",
            WORKSHOPS_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn workshops_per_type_per_year(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = pivot(
        records,
        |r| Some(r.year),
        |r| Some(r.workshop_type.clone()),
        |_| 1,
        type_per_year_labels(WORKSHOPS),
    );
    report.write_pivot(
        TYPE_PER_YEAR_SHEET,
        &table,
        &ChartSpec::stacked(
            "Number of workshops of different types over years",
            "Year",
            WORKSHOPS_AXIS,
        )
        .at(19, 1),
    )?;
    Ok(AnalysisOutput::Pivot(table))
}

pub fn online_vs_inperson(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let online = records.iter().filter(|r| r.is_online()).count() as u64;
    let total = records.len() as u64;
    let table = CountTable::new(
        "delivery_mode",
        WORKSHOPS,
        vec![
            (CategoryKey::from("Online"), online),
            (CategoryKey::from("In-person"), total.saturating_sub(online)),
        ],
    );
    report.write_counts(
        ONLINE_SHEET,
        &table,
        &ChartSpec::column(
            "Number of online vs in-person workshops",
            "Workshop delivery mode",
            WORKSHOPS_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn workshops_per_host(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = ranked_count_table(
        count_by(records, host),
        "organiser_top_level_web_domain",
        "workshops_per_host",
    );
    report.write_counts(
        PER_HOST_SHEET,
        &table,
        &ChartSpec::column(
            "Number of workshops per host institution",
            "Host institution",
            WORKSHOPS_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn workshops_per_host_per_year(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = pivot(
        records,
        |r| Some(r.year),
        host,
        |_| 1,
        PivotLabels {
            row: "year",
            column: "organiser_top_level_web_domain",
            value: WORKSHOPS,
        },
    )
    .fill_missing(0);
    report.write_pivot(
        HOST_PER_YEAR_SHEET,
        &table,
        &ChartSpec::stacked(
            "Number of workshops at different hosts over years",
            "Year",
            WORKSHOPS_AXIS,
        )
        .at(19, 13),
    )?;
    Ok(AnalysisOutput::Pivot(table))
}

pub fn attendance_per_year(
    records: &[WorkshopRecord],
    config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = count_table(count_by(records, |r| Some(r.year)), "year", WORKSHOPS)
        .scaled(config.estimate_factor(), ATTENDEES);
    report.write_counts(
        ATTENDANCE_PER_YEAR_SHEET,
        &table,
        &ChartSpec::column(
            format!(
                "Number of attendees per year (with estimated {} attendees per workshop)",
                config.attendees_per_workshop
            ),
            "Year",
            ATTENDEES_AXIS,
        ),
    )?;
    report.annotate(
        ATTENDANCE_PER_YEAR_SHEET,
        TOTAL_CELL,
        &format!("Total attendees: {}", table.total()),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn attendance_per_type(
    records: &[WorkshopRecord],
    config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = count_table(
        count_by(records, |r| Some(r.workshop_type.clone())),
        "workshop_type",
        WORKSHOPS,
    )
    .scaled(config.estimate_factor(), ATTENDEES);
    report.write_counts(
        ATTENDANCE_PER_TYPE_SHEET,
        &table,
        &ChartSpec::column(
            format!(
                "Number of attendees per workshop type (with estimated {} attendees per workshop)",
                config.attendees_per_workshop
            ),
            "Workshop type",
            ATTENDEES_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn attendance_per_type_per_year(
    records: &[WorkshopRecord],
    config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let basis = config.attendance_basis;
    let table = pivot(
        records,
        |r| Some(r.year),
        |r| Some(r.workshop_type.clone()),
        |r| match basis {
            AttendanceBasis::Rows => 1,
            AttendanceBasis::Recorded => u64::from(r.attendance.is_some()),
        },
        type_per_year_labels(WORKSHOPS),
    )
    .scaled(config.estimate_factor(), ATTENDEES);
    report.write_pivot(
        ATTENDANCE_TYPE_YEAR_SHEET,
        &table,
        &ChartSpec::stacked(
            "Number of attendees for different workshop types over years (with estimates for missing data)",
            "Year",
            ATTENDEES_AXIS,
        ),
    )?;
    Ok(AnalysisOutput::Pivot(table))
}

pub fn workshops_per_region(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = ranked_count_table(count_by(records, region), "region", WORKSHOPS);
    report.write_counts(
        PER_REGION_SHEET,
        &table,
        &ChartSpec::column("Number of workshops per region", "Region", WORKSHOPS_AXIS).at(1, 3),
    )?;
    Ok(AnalysisOutput::Counts(table))
}

pub fn workshops_per_region_per_year(
    records: &[WorkshopRecord],
    _config: &PipelineConfig,
    report: &mut Report,
) -> Result<AnalysisOutput, ReportError> {
    let table = pivot(
        records,
        |r| Some(r.year),
        region,
        |_| 1,
        PivotLabels {
            row: "year",
            column: "region",
            value: WORKSHOPS,
        },
    )
    .fill_missing(0);
    report.write_pivot(
        REGION_PER_YEAR_SHEET,
        &table,
        &ChartSpec::stacked(
            "Number of workshops per region over years",
            "Year",
            WORKSHOPS_AXIS,
        )
        .at(19, 1),
    )?;
    Ok(AnalysisOutput::Pivot(table))
}
