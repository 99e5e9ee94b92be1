use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One workshop occurrence as read from the input CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkshopRecord {
    pub year: i32,
    pub workshop_type: String,
    pub organiser_top_level_web_domain: Option<String>,
    pub tags: Option<String>,
    pub slug: String,
    pub region: Option<String>,
    pub attendance: Option<f64>,
}

impl WorkshopRecord {
    pub fn is_online(&self) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.contains("online"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstructorRecord {
    pub affiliation: Option<String>,
    pub nearest_airport_code: Option<String>,
    pub nearest_airport_name: Option<String>,
    #[serde(rename = "nearest_airport_UK_region")]
    pub nearest_airport_uk_region: Option<String>,
    #[serde(rename = "earliest-badge-awarded")]
    pub earliest_badge_awarded: Option<NaiveDate>,
}

impl InstructorRecord {
    pub fn earliest_badge_awarded_year(&self) -> Option<i32> {
        self.earliest_badge_awarded.map(|date| date.year())
    }
}

/// Grouping key of an aggregation; years sort numerically, labels lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum CategoryKey {
    Year(i32),
    Label(String),
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Year(year) => write!(f, "{year}"),
            CategoryKey::Label(label) => f.write_str(label),
        }
    }
}

impl From<i32> for CategoryKey {
    fn from(year: i32) -> Self {
        CategoryKey::Year(year)
    }
}

impl From<String> for CategoryKey {
    fn from(label: String) -> Self {
        CategoryKey::Label(label)
    }
}

impl From<&str> for CategoryKey {
    fn from(label: &str) -> Self {
        CategoryKey::Label(label.to_string())
    }
}

/// Two-column aggregation: one row per group.
#[derive(Debug, Clone, Serialize)]
pub struct CountTable {
    pub key_label: String,
    pub value_label: String,
    pub rows: Vec<(CategoryKey, u64)>,
}

impl CountTable {
    pub fn new(
        key_label: impl Into<String>,
        value_label: impl Into<String>,
        rows: Vec<(CategoryKey, u64)>,
    ) -> Self {
        Self {
            key_label: key_label.into(),
            value_label: value_label.into(),
            rows,
        }
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|(_, value)| value).sum()
    }

    pub fn get(&self, key: &CategoryKey) -> Option<u64> {
        self.rows
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| *value)
    }

    pub fn scaled(mut self, factor: u64, value_label: impl Into<String>) -> Self {
        for (_, value) in self.rows.iter_mut() {
            *value *= factor;
        }
        self.value_label = value_label.into();
        self
    }
}

/// Wide table indexed by one key with a column per distinct value of another.
/// `None` cells are combinations that never occurred.
#[derive(Debug, Clone, Serialize)]
pub struct PivotTable {
    pub row_label: String,
    pub column_label: String,
    pub value_label: String,
    pub columns: Vec<CategoryKey>,
    pub rows: Vec<(CategoryKey, Vec<Option<u64>>)>,
}

impl PivotTable {
    pub fn cell(&self, row: &CategoryKey, column: &CategoryKey) -> Option<u64> {
        let column_index = self.columns.iter().position(|candidate| candidate == column)?;
        self.rows
            .iter()
            .find(|(candidate, _)| candidate == row)
            .and_then(|(_, cells)| cells[column_index])
    }

    pub fn total(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|(_, cells)| cells.iter().flatten())
            .sum()
    }

    pub fn fill_missing(mut self, value: u64) -> Self {
        for (_, cells) in self.rows.iter_mut() {
            for cell in cells.iter_mut() {
                cell.get_or_insert(value);
            }
        }
        self
    }

    pub fn has_missing(&self) -> bool {
        self.rows
            .iter()
            .any(|(_, cells)| cells.iter().any(Option::is_none))
    }

    pub fn scaled(mut self, factor: u64, value_label: impl Into<String>) -> Self {
        for (_, cells) in self.rows.iter_mut() {
            for value in cells.iter_mut().flatten() {
                *value *= factor;
            }
        }
        self.value_label = value_label.into();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum AnalysisOutput {
    Counts(CountTable),
    Pivot(PivotTable),
}
