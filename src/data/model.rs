use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result, bail};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a CSV/Parquet column can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Text is parsed, so a numeric column that
    /// arrived as strings still compares numerically.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Interpret the value as text. Numbers keep their plain representation
    /// (a branch code read as `Integer(101)` becomes `"101"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Table – one loaded file before it is typed
// ---------------------------------------------------------------------------

/// One row of a source table: column name → cell.
pub type Row = BTreeMap<String, CellValue>;

/// A raw table as produced by the loader.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column names in source order.
    pub column_names: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Table { column_names, rows }
    }

    /// Fail with the first column of `required` the table does not carry.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        for col in required {
            if !self.column_names.iter().any(|c| c == col) {
                bail!("missing required column '{col}'");
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn text_cell(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(CellValue::as_text)
}

/// A numeric cell. NaN counts as missing, so a Parquet or JSON NaN behaves
/// like an empty CSV cell.
fn number_cell(row: &Row, row_no: usize, col: &str) -> Result<Option<f64>> {
    match row.get(col) {
        None | Some(CellValue::Null) => Ok(None),
        Some(cell) => cell
            .as_f64()
            .map(|v| (!v.is_nan()).then_some(v))
            .with_context(|| format!("Row {row_no}: column '{col}' value '{cell}' is not a number")),
    }
}

// ---------------------------------------------------------------------------
// AdmissionRecord – one row of the cutoff table
// ---------------------------------------------------------------------------

pub const CUTOFF_COLUMNS: [&str; 5] = ["college_name", "branch", "seat_type", "score_type", "min"];

/// One college × branch × seat type × score type cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionRecord {
    pub college_name: String,
    pub branch: Option<String>,
    pub seat_type: Option<String>,
    pub score_type: Option<String>,
    /// Minimum qualifying percentile. A candidate qualifies iff their
    /// percentile is at least this value; `None` never qualifies.
    pub min_percentile: Option<f64>,
    /// Derived from `college_name`, see [`guess_city`].
    pub city: Option<String>,
}

impl AdmissionRecord {
    pub fn new(
        college_name: &str,
        branch: &str,
        seat_type: &str,
        score_type: &str,
        min_percentile: f64,
    ) -> Self {
        AdmissionRecord {
            city: guess_city(college_name),
            college_name: college_name.to_string(),
            branch: Some(branch.to_string()),
            seat_type: Some(seat_type.to_string()),
            score_type: Some(score_type.to_string()),
            min_percentile: Some(min_percentile),
        }
    }

    fn from_row(row: &Row, row_no: usize) -> Result<Self> {
        let college_name = text_cell(row, "college_name")
            .with_context(|| format!("Row {row_no}: empty 'college_name'"))?;
        Ok(AdmissionRecord {
            city: guess_city(&college_name),
            branch: text_cell(row, "branch"),
            seat_type: text_cell(row, "seat_type"),
            score_type: text_cell(row, "score_type"),
            min_percentile: number_cell(row, row_no, "min")?,
            college_name,
        })
    }
}

/// Extract the city from a college name: the text after the last comma with
/// leading whitespace removed. `None` when there is no comma or nothing but
/// whitespace follows it.
///
/// `"ABC College of Engineering, Pune"` → `Some("Pune")`.
pub fn guess_city(college_name: &str) -> Option<String> {
    let (_, tail) = college_name.rsplit_once(',')?;
    let city = tail.trim_start();
    if city.is_empty() {
        None
    } else {
        Some(city.to_string())
    }
}

// ---------------------------------------------------------------------------
// HistoricalRecord – one row of the raw admissions table
// ---------------------------------------------------------------------------

pub const HISTORICAL_COLUMNS: [&str; 4] = ["college_name", "branch", "seat_type", "percentile"];

/// One historical admission event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalRecord {
    pub college_name: Option<String>,
    pub branch: Option<String>,
    pub seat_type: Option<String>,
    pub percentile: Option<f64>,
}

impl HistoricalRecord {
    pub fn new(college_name: &str, branch: &str, seat_type: &str, percentile: f64) -> Self {
        HistoricalRecord {
            college_name: Some(college_name.to_string()),
            branch: Some(branch.to_string()),
            seat_type: Some(seat_type.to_string()),
            percentile: Some(percentile),
        }
    }

    fn from_row(row: &Row, row_no: usize) -> Result<Self> {
        Ok(HistoricalRecord {
            college_name: text_cell(row, "college_name"),
            branch: text_cell(row, "branch"),
            seat_type: text_cell(row, "seat_type"),
            percentile: number_cell(row, row_no, "percentile")?,
        })
    }
}

// ---------------------------------------------------------------------------
// DatasetStore – both tables, loaded once and never mutated
// ---------------------------------------------------------------------------

/// The in-memory dataset every request reads from.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    /// Cutoff table rows in file order.
    pub cutoffs: Vec<AdmissionRecord>,
    /// Historical rows in file order. Row position drives year assignment.
    pub history: Vec<HistoricalRecord>,
    /// Every column of the historical source, including ones not typed above.
    pub history_columns: Vec<String>,
}

impl DatasetStore {
    /// Type both raw tables, checking that the required columns are present.
    pub fn from_tables(cutoff: Table, historical: Table) -> Result<Self> {
        cutoff
            .require_columns(&CUTOFF_COLUMNS)
            .context("cutoff table")?;
        historical
            .require_columns(&HISTORICAL_COLUMNS)
            .context("historical table")?;

        let cutoffs = cutoff
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| AdmissionRecord::from_row(row, i))
            .collect::<Result<Vec<_>>>()
            .context("cutoff table")?;
        let history = historical
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| HistoricalRecord::from_row(row, i))
            .collect::<Result<Vec<_>>>()
            .context("historical table")?;

        Ok(DatasetStore {
            cutoffs,
            history,
            history_columns: historical.column_names,
        })
    }

    /// Build a store directly from typed records.
    pub fn from_records(cutoffs: Vec<AdmissionRecord>, history: Vec<HistoricalRecord>) -> Self {
        DatasetStore {
            cutoffs,
            history,
            history_columns: HISTORICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}
