use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;

lazy_static! {
    static ref INT_REGEX: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref FLOAT_REGEX: Regex =
        Regex::new(r"^[+-]?(([0-9]+\.?[0-9]*)|(\.[0-9]+))([eE][+-]?[0-9]+)?$").unwrap();
    static ref BOOL_REGEX: Regex = Regex::new(r"^(True|False|TRUE|FALSE|true|false)$").unwrap();
}

/// A nullable cell
pub type Cell = Option<String>;

/// Column type inferred from its non-null values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Object,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Object => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    /// Text a value of this type becomes when the column is cast to strings
    ///
    /// Integers are normalised, floats use the shortest round-trip form with a
    /// `.0` or an exponent, and booleans are capitalised. Values that do not
    /// parse come back untouched.
    pub fn display_value<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        let value = raw.trim();
        match self {
            DType::Int64 => match value.parse::<i64>() {
                Ok(n) => Cow::Owned(n.to_string()),
                Err(_) => Cow::Borrowed(raw),
            },
            DType::Float64 => match value.parse::<f64>() {
                Ok(x) => Cow::Owned(float_repr(x)),
                Err(_) => Cow::Borrowed(raw),
            },
            DType::Bool => match value.to_lowercase().as_str() {
                "true" => Cow::Borrowed("True"),
                "false" => Cow::Borrowed("False"),
                _ => Cow::Borrowed(raw),
            },
            DType::Object => Cow::Borrowed(raw),
        }
    }
}

/// In-memory table with named columns and nullable string cells
///
/// Rows always have exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// One entry of [`DataTable::info`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub column: String,
    pub non_null: usize,
    pub dtype: DType,
}

/// Output of [`DataTable::info`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub entries: usize,
    pub columns: Vec<ColumnInfo>,
}

/// Summary statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColumnStats {
    Numeric {
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        #[serde(rename = "25%")]
        q25: Option<f64>,
        #[serde(rename = "50%")]
        q50: Option<f64>,
        #[serde(rename = "75%")]
        q75: Option<f64>,
        max: Option<f64>,
    },
    Object {
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: String,
    pub stats: ColumnStats,
}

impl DataTable {
    /// Create an empty table with the given columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with nulls and dropping extra cells
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Replace a column's values, appending the column if it does not exist
    ///
    /// `values` must have one entry per row; missing trailing entries become null.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.columns.len() - 1
            }
        };

        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[idx] = values.next().flatten();
        }
    }

    /// Replace nulls in one column only
    pub fn fill_column_nulls(&mut self, name: &str, value: &str) {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                if row[idx].is_none() {
                    row[idx] = Some(value.to_string());
                }
            }
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> DataTable {
        DataTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> DataTable {
        let skip = self.rows.len().saturating_sub(n);
        DataTable {
            columns: self.columns.clone(),
            rows: self.rows[skip..].to_vec(),
        }
    }

    /// Infer a column's type from its non-null values
    ///
    /// Integers with nulls widen to float64 and an all-null column is float64,
    /// the same way pandas reads a CSV.
    pub fn dtype(&self, idx: usize) -> DType {
        let values: Vec<&str> = self.rows.iter().filter_map(|row| row[idx].as_deref()).collect();
        let has_nulls = values.len() < self.rows.len();

        if values.is_empty() {
            return DType::Float64;
        }
        if values.iter().all(|v| INT_REGEX.is_match(v.trim())) {
            return if has_nulls { DType::Float64 } else { DType::Int64 };
        }
        if values.iter().all(|v| is_float_literal(v.trim())) {
            return DType::Float64;
        }
        if !has_nulls && values.iter().all(|v| BOOL_REGEX.is_match(v.trim())) {
            return DType::Bool;
        }
        DType::Object
    }

    /// Column name and inferred type for every column
    pub fn dtypes(&self) -> Vec<(String, DType)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), self.dtype(idx)))
            .collect()
    }

    pub fn info(&self) -> TableInfo {
        TableInfo {
            entries: self.rows.len(),
            columns: self
                .columns
                .iter()
                .enumerate()
                .map(|(idx, name)| ColumnInfo {
                    column: name.clone(),
                    non_null: self.rows.iter().filter(|row| row[idx].is_some()).count(),
                    dtype: self.dtype(idx),
                })
                .collect(),
        }
    }

    pub fn has_nulls(&self) -> bool {
        self.rows.iter().any(|row| row.iter().any(Option::is_none))
    }

    /// Null count per column, in column order
    pub fn null_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let nulls = self.rows.iter().filter(|row| row[idx].is_none()).count();
                (name.clone(), nulls)
            })
            .collect()
    }

    /// Remove every row that contains a null; returns how many were removed
    pub fn drop_nulls(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().all(Option::is_some));
        before - self.rows.len()
    }

    /// Replace every null with `value`; returns how many cells changed
    pub fn fill_nulls(&mut self, value: &str) -> usize {
        let mut filled = 0;
        for cell in self.rows.iter_mut().flat_map(|row| row.iter_mut()) {
            if cell.is_none() {
                *cell = Some(value.to_string());
                filled += 1;
            }
        }
        filled
    }

    /// Descriptive statistics for every column
    ///
    /// Numeric columns get count/mean/std/quartiles, everything else gets
    /// count/unique/top/freq.
    pub fn describe(&self) -> Vec<ColumnDescription> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<&str> =
                    self.rows.iter().filter_map(|row| row[idx].as_deref()).collect();

                let stats = if self.dtype(idx).is_numeric() {
                    let numbers: Vec<f64> =
                        values.iter().filter_map(|v| v.trim().parse().ok()).collect();
                    numeric_stats(&numbers)
                } else {
                    object_stats(&values)
                };

                ColumnDescription {
                    column: name.clone(),
                    stats,
                }
            })
            .collect()
    }

    /// Frequency of each distinct non-null value in a column
    ///
    /// Sorted by descending count; ties keep first-appearance order.
    pub fn value_counts(&self, name: &str) -> Vec<(String, usize)> {
        let Some(values) = self.column_values(name) else {
            return Vec::new();
        };
        value_counts(values.into_iter().flatten())
    }
}

fn is_float_literal(value: &str) -> bool {
    if FLOAT_REGEX.is_match(value) {
        return true;
    }
    matches!(
        value.to_lowercase().as_str(),
        "inf" | "+inf" | "-inf" | "infinity" | "-infinity"
    )
}

/// Shortest round-trip text for a float, as Python's `repr` writes it
fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", x);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
        }
        return formatted;
    }

    let text = x.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

pub(crate) fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| (value.to_string(), counts[value]))
        .collect();
    // sort_by is stable, so equal counts stay in first-appearance order
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

fn object_stats(values: &[&str]) -> ColumnStats {
    let counts = value_counts(values.iter().copied());
    let top = counts.first();

    ColumnStats::Object {
        count: values.len(),
        unique: counts.len(),
        top: top.map(|(value, _)| value.clone()),
        freq: top.map(|(_, freq)| *freq),
    }
}

fn numeric_stats(numbers: &[f64]) -> ColumnStats {
    let count = numbers.len();
    if count == 0 {
        return ColumnStats::Numeric {
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            q50: None,
            q75: None,
            max: None,
        };
    }

    let mut sorted = numbers.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = numbers.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(var.sqrt())
    } else {
        None
    };

    ColumnStats::Numeric {
        count,
        mean: Some(mean),
        std,
        min: sorted.first().copied(),
        q25: Some(quantile(&sorted, 0.25)),
        q50: Some(quantile(&sorted, 0.5)),
        q75: Some(quantile(&sorted, 0.75)),
        max: sorted.last().copied(),
    }
}

/// Linear-interpolated quantile of an already sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: &str) -> Cell {
        Some(value.to_string())
    }

    fn sample() -> DataTable {
        let mut table = DataTable::new(["text", "score", "ok"]);
        table.push_row(vec![cell("good day"), cell("1"), cell("True")]);
        table.push_row(vec![None, cell("3"), cell("False")]);
        table.push_row(vec![cell("bad day"), None, cell("True")]);
        table.push_row(vec![cell("good day"), cell("4"), cell("True")]);
        table
    }

    #[test]
    fn values_render_through_their_dtype() {
        assert_eq!(DType::Int64.display_value("007"), "7");
        assert_eq!(DType::Int64.display_value("+12"), "12");
        assert_eq!(DType::Float64.display_value("3"), "3.0");
        assert_eq!(DType::Float64.display_value("1.50"), "1.5");
        assert_eq!(DType::Float64.display_value("-0"), "-0.0");
        assert_eq!(DType::Float64.display_value("0.00001"), "1e-05");
        assert_eq!(DType::Float64.display_value("15000000000000000"), "1.5e+16");
        assert_eq!(DType::Float64.display_value("123.456"), "123.456");
        assert_eq!(DType::Float64.display_value("-inf"), "-inf");
        assert_eq!(DType::Bool.display_value("TRUE"), "True");
        assert_eq!(DType::Bool.display_value("false"), "False");
        assert_eq!(DType::Object.display_value(" 007 "), " 007 ");
    }

    #[test]
    fn shape_head_and_tail() {
        let table = sample();
        assert_eq!(table.shape(), (4, 3));
        assert_eq!(table.head(2).len(), 2);
        assert_eq!(table.head(10).len(), 4);

        let tail = table.tail(1);
        assert_eq!(tail.rows()[0][0].as_deref(), Some("good day"));
        assert_eq!(table.tail(0).len(), 0);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = DataTable::new(["a", "b"]);
        table.push_row(vec![cell("1")]);
        assert_eq!(table.rows()[0], vec![cell("1"), None]);
    }

    #[test]
    fn dtype_inference() {
        let table = sample();
        let dtypes: Vec<DType> = table.dtypes().into_iter().map(|(_, d)| d).collect();
        // ints with a null widen to float
        assert_eq!(dtypes, vec![DType::Object, DType::Float64, DType::Bool]);

        let mut ints = DataTable::new(["n", "x", "empty"]);
        ints.push_row(vec![cell("1"), cell("1.5"), None]);
        ints.push_row(vec![cell("-2"), cell("2e3"), None]);
        let dtypes: Vec<DType> = ints.dtypes().into_iter().map(|(_, d)| d).collect();
        assert_eq!(dtypes, vec![DType::Int64, DType::Float64, DType::Float64]);
    }

    #[test]
    fn info_counts_non_null_cells() {
        let info = sample().info();
        assert_eq!(info.entries, 4);
        assert_eq!(info.columns[0].non_null, 3);
        assert_eq!(info.columns[1].non_null, 3);
        assert_eq!(info.columns[2].non_null, 4);
    }

    #[test]
    fn null_detection() {
        let table = sample();
        assert!(table.has_nulls());
        assert_eq!(
            table.null_counts(),
            vec![("text".to_string(), 1), ("score".to_string(), 1), ("ok".to_string(), 0)]
        );
    }

    #[test]
    fn drop_nulls_is_idempotent() {
        let mut table = sample();
        assert_eq!(table.drop_nulls(), 2);
        assert_eq!(table.len(), 2);
        assert!(!table.has_nulls());

        let snapshot = table.clone();
        assert_eq!(table.drop_nulls(), 0);
        assert_eq!(table, snapshot);
    }

    #[test]
    fn fill_nulls_is_idempotent() {
        let mut table = sample();
        assert_eq!(table.fill_nulls("0"), 2);
        assert!(!table.has_nulls());
        assert_eq!(table.rows()[1][0].as_deref(), Some("0"));

        let snapshot = table.clone();
        assert_eq!(table.fill_nulls("0"), 0);
        assert_eq!(table, snapshot);
    }

    #[test]
    fn set_column_appends_or_overwrites() {
        let mut table = sample();
        table.set_column("analysis", vec![cell("a"), cell("b"), cell("c"), cell("d")]);
        assert_eq!(table.columns().last().map(String::as_str), Some("analysis"));

        table.set_column("analysis", vec![cell("z")]);
        assert_eq!(table.shape(), (4, 4));
        assert_eq!(
            table.column_values("analysis").unwrap(),
            vec![Some("z"), None, None, None]
        );
    }

    #[test]
    fn describe_object_column() {
        let stats = &sample().describe()[0].stats;
        assert_eq!(
            stats,
            &ColumnStats::Object {
                count: 3,
                unique: 2,
                top: Some("good day".to_string()),
                freq: Some(2),
            }
        );
    }

    #[test]
    fn describe_numeric_column() {
        let mut table = DataTable::new(["n"]);
        for v in ["1", "2", "3", "4"] {
            table.push_row(vec![cell(v)]);
        }

        match &table.describe()[0].stats {
            ColumnStats::Numeric {
                count,
                mean,
                std,
                min,
                q25,
                q50,
                q75,
                max,
            } => {
                assert_eq!(*count, 4);
                assert_eq!(*mean, Some(2.5));
                assert!((std.unwrap() - 1.2909944).abs() < 1e-6);
                assert_eq!(*min, Some(1.0));
                assert_eq!(*q25, Some(1.75));
                assert_eq!(*q50, Some(2.5));
                assert_eq!(*q75, Some(3.25));
                assert_eq!(*max, Some(4.0));
            }
            other => panic!("expected numeric stats, got {:?}", other),
        }
    }

    #[test]
    fn single_value_has_no_std() {
        let mut table = DataTable::new(["n"]);
        table.push_row(vec![cell("7")]);
        match &table.describe()[0].stats {
            ColumnStats::Numeric { std, .. } => assert_eq!(*std, None),
            other => panic!("expected numeric stats, got {:?}", other),
        }
    }

    #[test]
    fn value_counts_order() {
        let mut table = DataTable::new(["analysis"]);
        for v in ["Neutral", "Positive", "Positive", "Negative", "Neutral", "Positive"] {
            table.push_row(vec![cell(v)]);
        }
        assert_eq!(
            table.value_counts("analysis"),
            vec![
                ("Positive".to_string(), 3),
                ("Neutral".to_string(), 2),
                ("Negative".to_string(), 1)
            ]
        );
        assert!(table.value_counts("missing").is_empty());
    }
}
