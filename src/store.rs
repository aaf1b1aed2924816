use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use calamine::{Data, Reader};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};

use crate::error::{FeeError, Result};

pub const DEFAULT_STORE_NAME: &str = "fees_data.xlsx";
const DEFAULT_SHEET: &str = "Sheet1";

/// Workbook-level name covering column A of every register row. Blank rows
/// write no cells, so the used range alone undercounts them.
const ROW_EXTENT_NAME: &str = "FeebookRows";

// Appends are whole-file read-modify-write; one at a time per process.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// Cell conversion
// ---------------------------------------------------------------------------

pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Error(e) => e.to_string(),
    }
}

/// Number formats for cells calamine reported as dates or durations.
struct DateFormats {
    date: Format,
    datetime: Format,
    duration: Format,
}

impl DateFormats {
    fn new() -> Self {
        Self {
            date: Format::new().set_num_format("yyyy-mm-dd"),
            datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
            duration: Format::new().set_num_format("[h]:mm:ss"),
        }
    }
}

/// Write one loaded cell back with its original type.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Data,
    formats: &DateFormats,
) -> Result<()> {
    match cell {
        Data::Empty => {}
        Data::String(s) if s.is_empty() => {}
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Data::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Data::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Data::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            let format = if dt.is_duration() {
                &formats.duration
            } else if serial.fract() == 0.0 {
                &formats.date
            } else {
                &formats.datetime
            };
            worksheet.write_number_with_format(row, col, serial, format)?;
        }
        Data::Error(e) => {
            worksheet.write_string(row, col, e.to_string())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Workbook load / save
// ---------------------------------------------------------------------------

/// A worksheet as a grid of typed cells anchored at A1, plus its formulas.
#[derive(Debug, Clone, Default, PartialEq)]
struct Sheet {
    name: String,
    rows: Vec<Vec<Data>>,
    formulas: HashMap<(usize, usize), String>,
}

/// Row count recorded by a previous save, read from the last row of the
/// `ROW_EXTENT_NAME` reference (`'Sheet1'!$A$1:$A$3` gives 3).
fn recorded_row_count(names: &[(String, String)]) -> Option<usize> {
    names
        .iter()
        .find(|(name, _)| name == ROW_EXTENT_NAME)
        .and_then(|(_, range)| range.rsplit('$').next()?.parse().ok())
}

fn load_sheets(path: &Path) -> Result<Vec<Sheet>> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let recorded = recorded_row_count(workbook.defined_names());
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = Vec::new();
        if let Some((row0, col0)) = range.start() {
            rows.resize(row0 as usize, Vec::new());
            for row in range.rows() {
                let mut cells = vec![Data::Empty; col0 as usize];
                cells.extend(row.iter().cloned());
                rows.push(cells);
            }
        }

        let mut formulas = HashMap::new();
        let formula_range = workbook.worksheet_formula(&name)?;
        if let Some((row0, col0)) = formula_range.start() {
            for (r, c, formula) in formula_range.used_cells() {
                formulas.insert((row0 as usize + r, col0 as usize + c), formula.clone());
            }
        }

        sheets.push(Sheet {
            name,
            rows,
            formulas,
        });
    }

    if let (Some(first), Some(count)) = (sheets.first_mut(), recorded) {
        if first.rows.len() < count {
            first.rows.resize(count, Vec::new());
        }
    }
    Ok(sheets)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write every sheet to a sibling temp file, sync it, then rename it over `path`.
fn save_sheets(path: &Path, sheets: &[Sheet]) -> Result<()> {
    let formats = DateFormats::new();
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if sheet.formulas.contains_key(&(r, c)) {
                    continue;
                }
                write_cell(worksheet, r as u32, c as u16, cell, &formats)?;
            }
        }
        for (&(r, c), formula) in &sheet.formulas {
            // Date results are cached as serials, not display text.
            let cached = match sheet.rows.get(r).and_then(|row| row.get(c)) {
                Some(Data::DateTime(dt)) => dt.as_f64().to_string(),
                Some(cell) => cell_text(cell),
                None => String::new(),
            };
            let mut formula = Formula::new(formula);
            if !cached.is_empty() {
                formula = formula.set_result(cached);
            }
            worksheet.write_formula(r as u32, c as u16, formula)?;
        }
    }

    if let Some(first) = sheets.first().filter(|s| !s.rows.is_empty()) {
        let extent = format!(
            "='{}'!$A$1:$A${}",
            first.name.replace('\'', "''"),
            first.rows.len()
        );
        workbook.define_name(ROW_EXTENT_NAME, &extent)?;
    }

    let tmp = temp_path(path);
    if let Err(e) = workbook.save(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    std::fs::File::open(&tmp)?.sync_all()?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Store operations
// ---------------------------------------------------------------------------

fn text_row(values: &[String]) -> Vec<Data> {
    values.iter().map(|v| Data::String(v.clone())).collect()
}

/// Create a store holding only `header`. Returns false if `path` already exists.
pub fn create(path: &Path, header: &[&str]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let sheet = Sheet {
        name: DEFAULT_SHEET.to_string(),
        rows: vec![header.iter().map(|h| Data::String(h.to_string())).collect()],
        formulas: HashMap::new(),
    };
    save_sheets(path, &[sheet])?;
    Ok(true)
}

/// Add `row` after the last register row of the first worksheet. Cells
/// already in the workbook are written back with their original types.
pub fn append(path: &Path, row: &[String]) -> Result<()> {
    let _guard = WRITE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut sheets = load_sheets(path).map_err(FeeError::into_store_unavailable)?;
    if sheets.is_empty() {
        sheets.push(Sheet {
            name: DEFAULT_SHEET.to_string(),
            ..Sheet::default()
        });
    }
    sheets[0].rows.push(text_row(row));
    save_sheets(path, &sheets).map_err(FeeError::into_store_unavailable)
}

/// All register rows of the first worksheet as text, header included.
pub fn read(path: &Path) -> Result<Vec<Vec<String>>> {
    let sheets = load_sheets(path).map_err(FeeError::into_store_unavailable)?;
    let rows = sheets.into_iter().next().map(|s| s.rows).unwrap_or_default();
    Ok(rows
        .iter()
        .map(|r| r.iter().map(cell_text).collect::<Vec<_>>())
        .skip_while(|r| r.iter().all(|c| c.is_empty()))
        .collect())
}
