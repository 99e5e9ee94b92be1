use std::collections::BTreeMap;
use std::path::Path;

use csv::StringRecord;
use rust_xlsxwriter::{Chart, ChartType, ColNum, Format, RowNum, Workbook, Worksheet};

use crate::error::ReportError;
use crate::models::{CategoryKey, CountTable, PivotTable};

pub const README_SHEET: &str = "README";

/// Cell holding a sheet's grand total note (D1).
pub const TOTAL_CELL: (RowNum, ColNum) = (0, 3);

/// First data row of a pivot sheet; rows 0-2 hold the value, column-key
/// and row-key headers.
const PIVOT_DATA_ROW: RowNum = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Column,
    StackedColumn,
}

impl ChartKind {
    fn chart_type(self) -> ChartType {
        match self {
            ChartKind::Column => ChartType::Column,
            ChartKind::StackedColumn => ChartType::ColumnStacked,
        }
    }
}

/// Declarative description of the chart placed next to a sheet's table.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub anchor: (RowNum, ColNum),
}

impl ChartSpec {
    pub fn column(title: impl Into<String>, x_axis: &str, y_axis: &str) -> Self {
        Self {
            kind: ChartKind::Column,
            title: title.into(),
            x_axis: x_axis.to_string(),
            y_axis: y_axis.to_string(),
            anchor: (1, 8),
        }
    }

    pub fn stacked(title: impl Into<String>, x_axis: &str, y_axis: &str) -> Self {
        Self {
            kind: ChartKind::StackedColumn,
            ..Self::column(title, x_axis, y_axis)
        }
    }

    pub fn at(mut self, row: RowNum, col: ColNum) -> Self {
        self.anchor = (row, col);
        self
    }

    fn render(&self, sheet: &str, series: &[SeriesLayout]) -> Chart {
        let mut chart = Chart::new(self.kind.chart_type());
        chart.title().set_name(self.title.as_str());
        chart.x_axis().set_name(self.x_axis.as_str());
        chart
            .y_axis()
            .set_name(self.y_axis.as_str())
            .set_major_gridlines(false);
        if self.kind == ChartKind::Column {
            chart.legend().set_hidden();
        }

        for layout in series {
            let added = chart.add_series();
            if let Some((row, col)) = layout.name {
                added.set_name((sheet, row, col));
            }
            added
                .set_categories(layout.categories.on(sheet))
                .set_values(layout.values.on(sheet))
                .set_gap(2);
        }
        chart
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Header(String),
    Text(String),
    Number(f64),
}

/// Inclusive, zero-based cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: RowNum,
    pub first_col: ColNum,
    pub last_row: RowNum,
    pub last_col: ColNum,
}

impl CellRange {
    pub fn column(col: ColNum, first_row: RowNum, last_row: RowNum) -> Self {
        Self {
            first_row,
            first_col: col,
            last_row,
            last_col: col,
        }
    }

    fn on(self, sheet: &str) -> (&str, RowNum, ColNum, RowNum, ColNum) {
        (sheet, self.first_row, self.first_col, self.last_row, self.last_col)
    }
}

/// Where one chart series reads its name, categories and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesLayout {
    pub name: Option<(RowNum, ColNum)>,
    pub categories: CellRange,
    pub values: CellRange,
}

/// Cell contents and chart series of one sheet, decided before anything is
/// written to the workbook.
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    name: String,
    cells: BTreeMap<(RowNum, ColNum), CellValue>,
    series: Vec<SeriesLayout>,
}

impl SheetLayout {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, row: RowNum, col: ColNum) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    pub fn series(&self) -> &[SeriesLayout] {
        &self.series
    }

    fn put(&mut self, row: RowNum, col: ColNum, value: CellValue) {
        self.cells.insert((row, col), value);
    }

    fn put_key(&mut self, row: RowNum, col: ColNum, key: &CategoryKey) {
        let value = match key {
            CategoryKey::Year(year) => CellValue::Number(f64::from(*year)),
            CategoryKey::Label(label) => CellValue::Text(label.clone()),
        };
        self.put(row, col, value);
    }

    pub fn readme(text: &str) -> Self {
        let mut layout = Self::new(README_SHEET);
        layout.put(0, 0, CellValue::Text(text.to_string()));
        layout
    }

    /// Echo of an input table; cells that parse as numbers become numbers.
    pub fn raw(name: &str, headers: &StringRecord, rows: &[StringRecord]) -> Self {
        let mut layout = Self::new(name);
        for (col, header) in headers.iter().enumerate() {
            layout.put(0, col as ColNum, CellValue::Header(header.to_string()));
        }
        for (index, row) in rows.iter().enumerate() {
            let row_num = index as RowNum + 1;
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let cell = match value.trim().parse::<f64>() {
                    Ok(number) if number.is_finite() => CellValue::Number(number),
                    _ => CellValue::Text(value.to_string()),
                };
                layout.put(row_num, col as ColNum, cell);
            }
        }
        layout
    }

    /// Header row, one row per group, and a single series over them.
    pub fn counts(name: &str, table: &CountTable) -> Self {
        let mut layout = Self::new(name);
        layout.put(0, 0, CellValue::Header(table.key_label.clone()));
        layout.put(0, 1, CellValue::Header(table.value_label.clone()));
        for (index, (key, value)) in table.rows.iter().enumerate() {
            let row = index as RowNum + 1;
            layout.put_key(row, 0, key);
            layout.put(row, 1, CellValue::Number(*value as f64));
        }

        if !table.rows.is_empty() {
            let last_row = table.rows.len() as RowNum;
            layout.series.push(SeriesLayout {
                name: None,
                categories: CellRange::column(0, 1, last_row),
                values: CellRange::column(1, 1, last_row),
            });
        }
        layout
    }

    /// Three header rows, data from [`PIVOT_DATA_ROW`], and one series per
    /// column named by its row-1 header. Absent cells stay blank.
    pub fn pivot(name: &str, table: &PivotTable) -> Self {
        let mut layout = Self::new(name);
        layout.put(0, 1, CellValue::Header(table.value_label.clone()));
        layout.put(1, 0, CellValue::Header(table.column_label.clone()));
        for (index, column) in table.columns.iter().enumerate() {
            layout.put_key(1, index as ColNum + 1, column);
        }
        layout.put(2, 0, CellValue::Header(table.row_label.clone()));

        for (index, (key, cells)) in table.rows.iter().enumerate() {
            let row = PIVOT_DATA_ROW + index as RowNum;
            layout.put_key(row, 0, key);
            for (offset, cell) in cells.iter().enumerate() {
                if let Some(value) = cell {
                    layout.put(row, offset as ColNum + 1, CellValue::Number(*value as f64));
                }
            }
        }

        if !table.rows.is_empty() {
            let last_row = PIVOT_DATA_ROW + table.rows.len() as RowNum - 1;
            for index in 0..table.columns.len() {
                let col = index as ColNum + 1;
                layout.series.push(SeriesLayout {
                    name: Some((1, col)),
                    categories: CellRange::column(0, PIVOT_DATA_ROW, last_row),
                    values: CellRange::column(col, PIVOT_DATA_ROW, last_row),
                });
            }
        }
        layout
    }
}

/// Multi-sheet workbook under construction. Nothing touches the disk until
/// [`Report::save`].
pub struct Report {
    workbook: Workbook,
    sheets: Vec<SheetLayout>,
    bold: Format,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheets: Vec::new(),
            bold: Format::new().set_bold(),
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(SheetLayout::name).collect()
    }

    pub fn layout(&self, name: &str) -> Option<&SheetLayout> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Builds the worksheet off to the side and only adds it to the workbook
    /// once every cell and the chart are in place.
    fn commit(
        &mut self,
        layout: SheetLayout,
        chart: Option<&ChartSpec>,
    ) -> Result<(), ReportError> {
        if self.layout(&layout.name).is_some() {
            return Err(ReportError::DuplicateSheet(layout.name));
        }

        let mut sheet = Worksheet::new();
        sheet.set_name(layout.name.as_str())?;
        for (&(row, col), value) in &layout.cells {
            match value {
                CellValue::Header(text) => {
                    sheet.write_string_with_format(row, col, text, &self.bold)?
                }
                CellValue::Text(text) => sheet.write_string(row, col, text)?,
                CellValue::Number(number) => sheet.write_number(row, col, *number)?,
            };
        }
        if let Some(spec) = chart.filter(|_| !layout.series.is_empty()) {
            let rendered = spec.render(&layout.name, &layout.series);
            sheet.insert_chart(spec.anchor.0, spec.anchor.1, &rendered)?;
        }

        self.workbook.push_worksheet(sheet);
        self.sheets.push(layout);
        Ok(())
    }

    pub fn add_readme(&mut self, text: &str) -> Result<(), ReportError> {
        self.commit(SheetLayout::readme(text), None)
    }

    pub fn add_raw_sheet(
        &mut self,
        name: &str,
        headers: &StringRecord,
        rows: &[StringRecord],
    ) -> Result<(), ReportError> {
        self.commit(SheetLayout::raw(name, headers, rows), None)
    }

    /// Writes a two-column table and, when it has rows, a single-series chart.
    pub fn write_counts(
        &mut self,
        name: &str,
        table: &CountTable,
        chart: &ChartSpec,
    ) -> Result<(), ReportError> {
        self.commit(SheetLayout::counts(name, table), Some(chart))
    }

    /// Writes a pivot with one stacked series per column.
    pub fn write_pivot(
        &mut self,
        name: &str,
        table: &PivotTable,
        chart: &ChartSpec,
    ) -> Result<(), ReportError> {
        self.commit(SheetLayout::pivot(name, table), Some(chart))
    }

    /// Free-text note on an existing sheet, e.g. a grand total.
    pub fn annotate(
        &mut self,
        name: &str,
        (row, col): (RowNum, ColNum),
        text: &str,
    ) -> Result<(), ReportError> {
        self.workbook
            .worksheet_from_name(name)?
            .write_string(row, col, text)?;
        if let Some(layout) = self.sheets.iter_mut().find(|sheet| sheet.name == name) {
            layout.put(row, col, CellValue::Text(text.to_string()));
        }
        Ok(())
    }

    pub fn save(mut self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.workbook.save(path)?;
        Ok(())
    }

    pub fn to_buffer(mut self) -> Result<Vec<u8>, ReportError> {
        Ok(self.workbook.save_to_buffer()?)
    }
}
