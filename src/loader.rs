use std::io;
use std::path::Path;

use csv::StringRecord;
use serde::de::DeserializeOwned;

use crate::error::ReportError;

pub const WORKSHOP_COLUMNS: &[&str] = &[
    "year",
    "workshop_type",
    "organiser_top_level_web_domain",
    "tags",
    "slug",
    "region",
    "attendance",
];

pub const INSTRUCTOR_COLUMNS: &[&str] = &[
    "affiliation",
    "nearest_airport_code",
    "nearest_airport_name",
    "nearest_airport_UK_region",
    "earliest-badge-awarded",
];

/// An input file held both as raw text (echoed into the report verbatim)
/// and as typed records (fed to the analyses).
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
    pub records: Vec<T>,
}

impl<T> Table<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_table<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<Table<T>, ReportError> {
    let reader = csv::Reader::from_path(path).map_err(|source| ReportError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(reader, path, required)
}

pub fn read_table<R: io::Read, T: DeserializeOwned>(
    mut reader: csv::Reader<R>,
    source_path: &Path,
    required: &[&str],
) -> Result<Table<T>, ReportError> {
    // Columns are matched on trimmed names, so deserialization has to see
    // the same names.
    let headers: StringRecord = reader
        .headers()
        .map_err(|source| ReportError::Input {
            path: source_path.to_path_buf(),
            source,
        })?
        .iter()
        .map(str::trim)
        .collect();

    if let Some(column) = required
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(ReportError::MissingColumn {
            column: column.to_string(),
        });
    }

    let mut rows = Vec::new();
    let mut records = Vec::new();

    for (index, result) in reader.records().enumerate() {
        // Quoted fields may span lines, so the record index is only a
        // fallback for the starting line.
        let fallback = index as u64 + 2;
        let row = result.map_err(|source| ReportError::MalformedRow {
            row: source.position().map_or(fallback, |pos| pos.line()),
            source,
        })?;
        let line = row.position().map_or(fallback, |pos| pos.line());
        let record: T = row
            .deserialize(Some(&headers))
            .map_err(|source| ReportError::MalformedRow { row: line, source })?;
        rows.push(row);
        records.push(record);
    }

    tracing::debug!(
        source = %source_path.display(),
        rows = records.len(),
        "loaded input table"
    );

    Ok(Table {
        headers,
        rows,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstructorRecord, WorkshopRecord};

    fn parse<T: DeserializeOwned>(
        data: &str,
        required: &[&str],
    ) -> Result<Table<T>, ReportError> {
        read_table(
            csv::Reader::from_reader(data.as_bytes()),
            Path::new("inline.csv"),
            required,
        )
    }

    #[test]
    fn empty_cells_become_null() {
        let data = "\
slug,year,workshop_type,organiser_top_level_web_domain,tags,region,attendance,venue
2019-03-04-leeds,2019,SWC,leeds.ac.uk,\"SWC, online\",,18,Leeds
2019-05-01-ttt,2019,TTT,,TTT,Scotland,,
";
        let table: Table<WorkshopRecord> = parse(data, WORKSHOP_COLUMNS).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.headers.len(), 8);

        let first = &table.records[0];
        assert_eq!(first.year, 2019);
        assert!(first.is_online());
        assert!(first.region.is_none());
        assert_eq!(first.attendance, Some(18.0));

        let second = &table.records[1];
        assert!(second.organiser_top_level_web_domain.is_none());
        assert!(second.attendance.is_none());
        assert!(!second.is_online());
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let data = "year,workshop_type,slug\n2020,DC,2020-01-01-dc\n";
        let error = parse::<WorkshopRecord>(data, WORKSHOP_COLUMNS).unwrap_err();
        match error {
            ReportError::MissingColumn { column } => {
                assert_eq!(column, "organiser_top_level_web_domain")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_year_reports_line() {
        let data = "\
year,workshop_type,organiser_top_level_web_domain,tags,slug,region,attendance
2018,SWC,ed.ac.uk,SWC,a,Scotland,
twenty,SWC,ed.ac.uk,SWC,b,Scotland,
";
        let error = parse::<WorkshopRecord>(data, WORKSHOP_COLUMNS).unwrap_err();
        assert!(matches!(error, ReportError::MalformedRow { row: 3, .. }));
    }

    #[test]
    fn multiline_field_does_not_shift_reported_line() {
        let data = "\
year,workshop_type,organiser_top_level_web_domain,tags,slug,region,attendance
2018,SWC,ed.ac.uk,\"SWC,
online\",a,Scotland,
twenty,SWC,ed.ac.uk,SWC,b,Scotland,
";
        let error = parse::<WorkshopRecord>(data, WORKSHOP_COLUMNS).unwrap_err();
        assert!(
            matches!(error, ReportError::MalformedRow { row: 4, .. }),
            "{error:?}"
        );
    }

    #[test]
    fn padded_headers_still_deserialize() {
        let data = "\
 year , workshop_type,organiser_top_level_web_domain,tags,slug,region, attendance
2017,DC,manchester.ac.uk,DC,2017-04-01-dc,North West,21
";
        let table: Table<WorkshopRecord> = parse(data, WORKSHOP_COLUMNS).unwrap();
        assert_eq!(table.records[0].year, 2017);
        assert_eq!(table.records[0].attendance, Some(21.0));
        assert_eq!(table.headers.get(0), Some("year"));
    }

    #[test]
    fn instructor_badge_year_is_derived() {
        let data = "\
affiliation,nearest_airport_code,nearest_airport_name,nearest_airport_UK_region,earliest-badge-awarded
University of Leeds,LBA,Leeds,Yorkshire and The Humber,2014-06-02
,EDI,Edinburgh,Scotland,
";
        let table: Table<InstructorRecord> = parse(data, INSTRUCTOR_COLUMNS).unwrap();
        assert_eq!(table.records[0].earliest_badge_awarded_year(), Some(2014));
        assert_eq!(table.records[1].earliest_badge_awarded_year(), None);
        assert!(table.records[1].affiliation.is_none());
    }

    #[test]
    fn unreadable_file_is_input_failure() {
        let error = load_table::<WorkshopRecord>(
            Path::new("/nonexistent/workshops.csv"),
            WORKSHOP_COLUMNS,
        )
        .unwrap_err();
        assert_eq!(error.kind(), crate::error::FailureKind::Input);
    }
}
