use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, info, warn};

use crate::models::{
    DEFAULT_TARGET, HOURS_PER_RECORD, Record, coerce_number, coerce_value, next_record_id,
};
use crate::services::config_loader::ImportConfig;
use crate::services::import_error::ImportError;

const HEADER_KEYWORDS: [&str; 3] = ["contestant", "name", "hour 1"];
const NAME_LABELS: [&str; 3] = ["contestant", "name", "operator"];
const TARGET_KEYWORDS: [&str; 2] = ["target", "kpi"];

/// One raw spreadsheet cell, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// CSV fields carry no type, so numeric-looking text becomes a number.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(value) => crate::models::format_number(*value),
            Cell::Text(text) => text.clone(),
            Cell::Bool(flag) => flag.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    fn number_or(&self, default: f64) -> f64 {
        match self {
            Cell::Empty => default,
            Cell::Number(value) => coerce_value(*value, default),
            Cell::Text(text) => coerce_number(text, default),
            Cell::Bool(true) => 1.0,
            Cell::Bool(false) => default,
        }
    }
}

#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    target: Option<usize>,
    hours: [Option<usize>; HOURS_PER_RECORD],
}

impl ColumnMap {
    fn from_header(header: &[Cell]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, cell) in header.iter().enumerate() {
            let label = cell.text().trim().to_lowercase();
            if NAME_LABELS.contains(&label.as_str()) {
                claim(&mut map.name, idx);
            } else if TARGET_KEYWORDS.iter().any(|kw| label.contains(kw)) {
                claim(&mut map.target, idx);
            } else if let Some(hour) = parse_hour_label(&label) {
                claim(&mut map.hours[hour - 1], idx);
            }
        }

        if map.hours.iter().all(Option::is_none)
            && let Some(name_col) = map.name
        {
            debug!("No hour headers found, assuming hours follow column {name_col}");
            for (slot, column) in map.hours.iter_mut().zip(name_col + 1..) {
                *slot = Some(column);
            }
        }

        map
    }
}

fn claim(slot: &mut Option<usize>, column: usize) {
    if slot.is_none() {
        *slot = Some(column);
    }
}

/// Matches `hour` followed by optional whitespace and a number in 1..=10.
fn parse_hour_label(label: &str) -> Option<usize> {
    label.match_indices("hour").find_map(|(pos, keyword)| {
        let rest = label[pos + keyword.len()..].trim_start();
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        let hour: usize = digits.parse().ok()?;
        (1..=HOURS_PER_RECORD).contains(&hour).then_some(hour)
    })
}

fn find_header_row(grid: &[Vec<Cell>], scan_rows: usize) -> Option<usize> {
    grid.iter().take(scan_rows).position(|row| {
        let joined = row
            .iter()
            .map(Cell::text)
            .collect::<Vec<_>>()
            .join("|")
            .to_lowercase();
        HEADER_KEYWORDS.iter().any(|kw| joined.contains(kw))
    })
}

fn parse_row(
    index: usize,
    row: &[Cell],
    columns: &ColumnMap,
    config: &ImportConfig,
) -> Option<Record> {
    if row.iter().all(Cell::is_blank) {
        return None;
    }

    let name_cell = row.get(columns.name.unwrap_or(0))?;
    if name_cell.is_blank() {
        return None;
    }
    let name = name_cell.text();
    if name.trim().eq_ignore_ascii_case("total") {
        return None;
    }

    let target = match columns.target {
        Some(col) => row
            .get(col)
            .map_or(DEFAULT_TARGET, |cell| cell.number_or(DEFAULT_TARGET)),
        // Unlabelled column: only a typed number counts, taken as-is.
        None => match config.target_fallback_column.and_then(|col| row.get(col)) {
            Some(Cell::Number(value)) => *value,
            _ => DEFAULT_TARGET,
        },
    };

    let hours = columns.hours.iter().map(|column| {
        column
            .and_then(|col| row.get(col))
            .map_or(0.0, |cell| cell.number_or(0.0))
    });

    Some(Record::new(
        next_record_id("imported", index),
        name,
        hours,
        target,
    ))
}

/// Turns a row-major grid into records. Fails without producing anything when
/// no header is found or no data row survives filtering.
pub fn normalize_grid(grid: &[Vec<Cell>], config: &ImportConfig) -> Result<Vec<Record>, ImportError> {
    let header_index =
        find_header_row(grid, config.header_scan_rows).ok_or(ImportError::HeaderNotFound)?;
    let columns = ColumnMap::from_header(&grid[header_index]);
    debug!("Header row {header_index}, column map {columns:?}");

    let records: Vec<Record> = grid[header_index + 1..]
        .iter()
        .enumerate()
        .filter_map(|(index, row)| parse_row(index, row, &columns, config))
        .collect();

    if records.is_empty() {
        warn!("Header found at row {header_index} but no data rows survived");
        return Err(ImportError::NoValidRows);
    }

    info!("Parsed {} records from tabular source", records.len());
    Ok(records)
}

pub const TABULAR_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "xlsm", "ods", "csv"];

pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

pub fn read_grid(path: &Path) -> Result<Vec<Vec<Cell>>, ImportError> {
    if is_csv_path(path) {
        read_csv_grid(path)
    } else {
        read_workbook_grid(path)
    }
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<Cell>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| ImportError::SourceUnreadable(format!("{}: {err}", path.display())))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|fields| fields.iter().map(Cell::from_text).collect())
                .map_err(|err| ImportError::SourceUnreadable(err.to_string()))
        })
        .collect()
}

/// Reads the first worksheet. Calamine trims leading empty rows and columns
/// from the range, so they are padded back to keep absolute coordinates.
fn read_workbook_grid(path: &Path) -> Result<Vec<Vec<Cell>>, ImportError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| ImportError::SourceUnreadable(format!("{}: {err}", path.display())))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::SourceUnreadable("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| ImportError::SourceUnreadable(format!("sheet '{sheet_name}': {err}")))?;

    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));

    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(cell_from_data));
        grid.push(cells);
    }

    info!(
        "Read {} rows from sheet '{}' of {}",
        grid.len(),
        sheet_name,
        path.display()
    );
    Ok(grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) => Cell::Text(text.clone()),
        Data::Bool(flag) => Cell::Bool(*flag),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn num(value: f64) -> Cell {
        Cell::Number(value)
    }

    fn standard_header() -> Vec<Cell> {
        let mut header = vec![text("Name")];
        header.extend((1..=10).map(|h| text(&format!("Hour {h}"))));
        header
    }

    fn data_row(name: &str, hours: &[f64]) -> Vec<Cell> {
        let mut row = vec![text(name)];
        row.extend(hours.iter().copied().map(num));
        row
    }

    const ALICE_HOURS: [f64; 10] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

    #[test]
    fn imports_labelled_hours() {
        let grid = vec![standard_header(), data_row("Alice", &ALICE_HOURS)];
        let records = normalize_grid(&grid, &ImportConfig::default()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
        assert_eq!(records[0].total(), 550.0);
        assert_eq!(records[0].target, DEFAULT_TARGET);
        assert!(records[0].id().starts_with("imported-0-"));
    }

    #[test]
    fn missing_header_is_reported() {
        let mut grid: Vec<Vec<Cell>> = (0..20).map(|i| vec![text("Site"), num(i as f64)]).collect();
        grid.push(standard_header());
        grid.push(data_row("Alice", &ALICE_HOURS));

        assert_eq!(
            normalize_grid(&grid, &ImportConfig::default()),
            Err(ImportError::HeaderNotFound)
        );
    }

    #[test]
    fn header_can_sit_below_a_title_block() {
        let grid = vec![
            vec![text("Weekly Picking Report")],
            vec![],
            standard_header(),
            data_row("Alice", &ALICE_HOURS),
        ];
        let records = normalize_grid(&grid, &ImportConfig::default()).unwrap();
        assert_eq!(records[0].total(), 550.0);
    }

    #[test]
    fn summary_and_blank_rows_are_skipped() {
        let grid = vec![
            standard_header(),
            data_row("Alice", &ALICE_HOURS),
            vec![],
            data_row("   ", &[5.0; 10]),
            data_row("TOTAL", &[1.0; 10]),
            data_row(" total ", &[1.0; 10]),
            data_row("Bob", &[1.0; 10]),
        ];
        let records = normalize_grid(&grid, &ImportConfig::default()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn no_surviving_rows_is_an_error() {
        let grid = vec![standard_header(), data_row("Total", &[1.0; 10])];
        assert_eq!(
            normalize_grid(&grid, &ImportConfig::default()),
            Err(ImportError::NoValidRows)
        );
    }

    #[test]
    fn hours_fall_back_to_columns_after_name() {
        let mut header = vec![text("Employee Name"), text("Operator")];
        header.extend((1..=10).map(|h| text(&format!("H{h}"))));
        header.push(text("KPI Target"));

        let mut row = vec![text("E-7"), text("Carol")];
        row.extend([5.0; 10].map(num));
        row.push(num(80.0));

        let records = normalize_grid(&[header, row], &ImportConfig::default()).unwrap();
        assert_eq!(records[0].name, "Carol");
        assert_eq!(records[0].total(), 50.0);
        assert_eq!(records[0].target, 80.0);
    }

    #[test]
    fn hour_columns_map_out_of_order_and_first_wins() {
        let header = vec![
            text("Contestant"),
            text("hour 2"),
            text("Hour1"),
            text("Hour 2"),
            text("Hour 11"),
        ];
        let row = vec![text("Dana"), num(2.0), num(1.0), num(99.0), num(500.0)];
        let records = normalize_grid(&[header, row], &ImportConfig::default()).unwrap();

        assert_eq!(records[0].hours()[0], 1.0);
        assert_eq!(records[0].hours()[1], 2.0);
        assert_eq!(records[0].total(), 3.0);
    }

    #[test]
    fn target_uses_fixed_column_when_unlabelled() {
        let mut header = standard_header();
        header.extend([text("Blank"), text("Blank"), text("Blended")]);
        let mut row = data_row("Eve", &[1.0; 10]);
        row.extend([Cell::Empty, Cell::Empty, num(640.0)]);
        assert_eq!(row.len(), 14);
        row.push(num(720.0));

        let config = ImportConfig::default();
        let records = normalize_grid(&[header.clone(), row.clone()], &config).unwrap();
        assert_eq!(records[0].target, 720.0);

        let disabled = ImportConfig {
            target_fallback_column: None,
            ..ImportConfig::default()
        };
        let records = normalize_grid(&[header.clone(), row.clone()], &disabled).unwrap();
        assert_eq!(records[0].target, DEFAULT_TARGET);

        row[14] = num(0.0);
        let records = normalize_grid(&[header.clone(), row.clone()], &config).unwrap();
        assert_eq!(records[0].target, 0.0);

        row[14] = text("650");
        let records = normalize_grid(&[header, row], &config).unwrap();
        assert_eq!(records[0].target, DEFAULT_TARGET);
    }

    #[test]
    fn messy_values_coerce_to_defaults() {
        let header = vec![text("Name"), text("Target"), text("Hour 1"), text("Hour 2")];
        let row = vec![text("Finn"), text("lots"), text("12"), text("n/a")];
        let records = normalize_grid(&[header, row], &ImportConfig::default()).unwrap();

        assert_eq!(records[0].target, DEFAULT_TARGET);
        assert_eq!(records[0].hours()[0], 12.0);
        assert_eq!(records[0].total(), 12.0);
    }

    #[test]
    fn hour_label_parsing() {
        assert_eq!(parse_hour_label("hour 1"), Some(1));
        assert_eq!(parse_hour_label("hour10"), Some(10));
        assert_eq!(parse_hour_label("hour 0"), None);
        assert_eq!(parse_hour_label("hours"), None);
        assert_eq!(parse_hour_label("total hours hour 4"), Some(4));
    }

    #[test]
    fn csv_files_are_read_as_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.csv");
        std::fs::write(
            &path,
            "Name,Hour 1,Hour 2\nAlice,10,20\n,,\nTotal,10,20\n",
        )
        .unwrap();

        let grid = read_grid(&path).unwrap();
        assert_eq!(grid[1], vec![text("Alice"), num(10.0), num(20.0)]);

        let records = normalize_grid(&grid, &ImportConfig::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total(), 30.0);
    }

    #[test]
    fn unreadable_workbook_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        assert!(matches!(read_grid(&path), Err(ImportError::SourceUnreadable(_))));
    }
}
