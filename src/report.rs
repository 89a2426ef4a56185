//! Text classification flow and the report shown after every analysis.

use crate::classify::{AnalysisMode, classify};
use crate::error::AppError;
use crate::sentiment::PolarityScorer;
use crate::table::{ColumnDescription, DataTable};
use serde::Serialize;

/// Column an uploaded table must provide
pub const TEXT_COLUMN: &str = "text";
/// Column the labels are written to
pub const LABEL_COLUMN: &str = "analysis";

/// Classify one manually entered text
///
/// # Errors
/// * `AppError::EmptyInput` if `text` is empty; nothing is scored
pub fn analyze_text<S: PolarityScorer + ?Sized>(
    scorer: &S,
    text: &str,
    mode: AnalysisMode,
) -> Result<DataTable, AppError> {
    if text.is_empty() {
        return Err(AppError::EmptyInput);
    }

    let label = classify(scorer, text, mode);
    let mut table = DataTable::new([TEXT_COLUMN, LABEL_COLUMN]);
    table.push_row(vec![Some(text.to_string()), Some(label.to_string())]);
    Ok(table)
}

/// Classify every row of an uploaded table
///
/// Null texts are filled with the empty string first. The labels go into
/// the `analysis` column, replacing it if the upload already had one.
///
/// # Errors
/// * `AppError::MissingTextColumn` if the table has no `text` column; the
///   table is left untouched
pub fn analyze_table<S: PolarityScorer + ?Sized>(
    scorer: &S,
    table: &mut DataTable,
    mode: AnalysisMode,
) -> Result<(), AppError> {
    if !table.has_column(TEXT_COLUMN) {
        return Err(AppError::MissingTextColumn);
    }

    table.fill_column_nulls(TEXT_COLUMN, "");
    let labels = table
        .column_values(TEXT_COLUMN)
        .unwrap_or_default()
        .into_iter()
        .map(|text| Some(classify(scorer, text.unwrap_or_default(), mode).to_string()))
        .collect();
    table.set_column(LABEL_COLUMN, labels);
    Ok(())
}

/// Frequency of one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Everything the dashboard renders for one analysis
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: AnalysisMode,
    pub table: DataTable,
    pub statistics: Vec<ColumnDescription>,
    pub label_counts: Vec<LabelCount>,
    pub has_nulls: bool,
}

impl Report {
    pub fn build(table: &DataTable, mode: AnalysisMode) -> Self {
        Self {
            mode,
            table: table.clone(),
            statistics: table.describe(),
            label_counts: label_counts(table),
            has_nulls: table.has_nulls(),
        }
    }
}

/// Label frequencies, most common first
pub fn label_counts(table: &DataTable) -> Vec<LabelCount> {
    table
        .value_counts(LABEL_COLUMN)
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect()
}
