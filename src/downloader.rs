use crate::table::{Cell, DType, DataTable};
#[cfg(feature = "web")]
use crate::error::AppError;
use std::borrow::Cow;

/// File name offered for the CSV download
pub const CSV_FILE_NAME: &str = "results.csv";
/// MIME type of the CSV download
pub const CSV_MIME: &str = "text/csv";
/// File name offered for the workbook download
pub const XLSX_FILE_NAME: &str = "results.xlsx";
/// MIME type of the workbook download
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Text written for a missing cell once every column is cast to a string
const NULL_TEXT: &str = "nan";

/// Convert a table to UTF-8 encoded CSV
///
/// Every column is cast to text through its inferred dtype, so numbers and
/// booleans are normalised (`3` in a float column becomes `3.0`, `TRUE` in a
/// bool column becomes `True`) and nulls are written as `nan`. Output is a
/// header line, then one line per row, each terminated by `\n`. Fields
/// containing a comma, a quote or a line break are quoted with inner quotes
/// doubled.
///
/// # Examples
/// ```
/// use sentiscope::downloader::to_csv;
/// use sentiscope::table::DataTable;
///
/// let mut table = DataTable::new(["text", "analysis"]);
/// table.push_row(vec![Some("I love this".into()), Some("Positive".into())]);
///
/// assert_eq!(to_csv(&table), b"text,analysis\nI love this,Positive\n".to_vec());
/// ```
pub fn to_csv(table: &DataTable) -> Vec<u8> {
    let mut csv_content = String::new();

    let dtypes = column_types(table);

    write_record(&mut csv_content, table.columns().iter().map(String::as_str));
    for row in table.rows() {
        let fields = row_text(row, &dtypes);
        write_record(&mut csv_content, fields.iter().map(|field| field.as_ref()));
    }

    csv_content.into_bytes()
}

fn column_types(table: &DataTable) -> Vec<DType> {
    table.dtypes().into_iter().map(|(_, dtype)| dtype).collect()
}

/// A row as the strings a cast-to-text export writes
fn row_text<'a>(row: &'a [Cell], dtypes: &[DType]) -> Vec<Cow<'a, str>> {
    row.iter()
        .zip(dtypes)
        .map(|(cell, dtype)| match cell {
            Some(value) => dtype.display_value(value),
            None => Cow::Borrowed(NULL_TEXT),
        })
        .collect()
}

fn write_record<'a>(out: &mut String, fields: impl ExactSizeIterator<Item = &'a str>) {
    let single = fields.len() == 1;

    for (i, value) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }

        // A lone empty field is quoted so the line is not read back as blank
        if value.contains([',', '"', '\n', '\r']) || (single && value.is_empty()) {
            let escaped = value.replace('"', "\"\"");
            out.push('"');
            out.push_str(&escaped);
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

/// Convert a table to XLSX format
///
/// Uses the rust_xlsxwriter library; cells are written as the same strings
/// the CSV export uses, with the header in the first row.
///
/// # Errors
/// * `AppError::Export` if the workbook cannot be built
#[cfg(feature = "web")]
pub fn to_xlsx(table: &DataTable) -> Result<Vec<u8>, AppError> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let export_err = |e: rust_xlsxwriter::XlsxError| AppError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("results").map_err(export_err)?;

    for (c, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string(0, c as u16, name.as_str())
            .map_err(export_err)?;
    }

    let dtypes = column_types(table);
    for (r, row) in table.rows().iter().enumerate() {
        for (c, value) in row_text(row, &dtypes).iter().enumerate() {
            worksheet
                .write_string((r + 1) as u32, c as u16, value.as_ref())
                .map_err(export_err)?;
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().map_err(export_err)
}
