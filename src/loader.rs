use crate::error::AppError;
use crate::table::{Cell, DataTable};
use std::path::Path;

/// Tokens read as missing values, on top of the empty field
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a table from a CSV file on disk
///
/// # Examples
/// ```no_run
/// use sentiscope::loader::from_path;
///
/// match from_path("reviews.csv") {
///     Ok(table) => println!("Loaded {} rows", table.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_path(filepath: impl AsRef<Path>) -> Result<DataTable, AppError> {
    let bytes = std::fs::read(filepath)?;
    from_bytes(&bytes)
}

/// Parse an uploaded CSV file
///
/// The first record is the header. Quoted fields may contain commas,
/// doubled quotes and line breaks. Blank lines are skipped, short rows are
/// padded with nulls, and empty fields or NA tokens become nulls.
///
/// # Errors
/// * `AppError::MalformedCsv` for non UTF-8 input, an empty file, an
///   unterminated quote, or a row with more fields than the header
pub fn from_bytes(bytes: &[u8]) -> Result<DataTable, AppError> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| AppError::MalformedCsv(format!("file is not valid UTF-8: {}", e)))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records = parse_records(content)?.into_iter();

    let Some((_, header)) = records.next() else {
        return Err(AppError::MalformedCsv("No columns to parse from file".to_string()));
    };
    let mut table = DataTable::new(header);

    let width = table.columns().len();
    for (line, record) in records {
        if record.len() > width {
            return Err(AppError::MalformedCsv(format!(
                "Expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            )));
        }
        table.push_row(record.into_iter().map(into_cell).collect());
    }

    Ok(table)
}

fn into_cell(value: String) -> Cell {
    if value.is_empty() || NA_VALUES.contains(&value.as_str()) {
        None
    } else {
        Some(value)
    }
}

// Split the whole input into records, tracking the 1-based line each starts on
fn parse_records(content: &str) -> Result<Vec<(usize, Vec<String>)>, AppError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    // Double quote inside quoted field - add a single quote
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' | '\n' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                let is_blank = record.is_empty() && field.is_empty() && !quoted;
                if !is_blank {
                    record.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut record)));
                }
                quoted = false;
                line += 1;
                record_line = line;
            }
            '\n' => {
                field.push(c);
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::MalformedCsv(format!(
            "unterminated quoted field starting on line {}",
            record_line
        )));
    }
    if !record.is_empty() || !field.is_empty() || quoted {
        record.push(field);
        records.push((record_line, record));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_and_rows() {
        let table = from_bytes(b"id,text\n1,I love this\n2,I hate this\n").unwrap();
        assert_eq!(table.columns(), ["id", "text"]);
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(
            table.column_values("text").unwrap(),
            vec![Some("I love this"), Some("I hate this")]
        );
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let csv = "text,n\r\n\"Hello, world\",1\r\n\"She said \"\"hi\"\"\",2\r\n\"two\nlines\",3\r\n";
        let table = from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(
            table.column_values("text").unwrap(),
            vec![Some("Hello, world"), Some("She said \"hi\""), Some("two\nlines")]
        );
    }

    #[test]
    fn empty_fields_and_na_tokens_are_null() {
        let table = from_bytes(b"text,score\n,1\nNaN,2\nfine,\nNA,N/A\n").unwrap();
        assert_eq!(
            table.column_values("text").unwrap(),
            vec![None, None, Some("fine"), None]
        );
        assert_eq!(
            table.column_values("score").unwrap(),
            vec![Some("1"), Some("2"), None, None]
        );
    }

    #[test]
    fn blank_lines_are_skipped_and_short_rows_padded() {
        let table = from_bytes(b"a,b\n\n1\n\n2,3").unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.rows()[0], vec![Some("1".to_string()), None]);
        assert_eq!(table.rows()[1], vec![Some("2".to_string()), Some("3".to_string())]);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let table = from_bytes("\u{feff}text\nhi\n".as_bytes()).unwrap();
        assert!(table.has_column("text"));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(from_bytes(b""), Err(AppError::MalformedCsv(_))));
        assert!(matches!(from_bytes(b"\n\n"), Err(AppError::MalformedCsv(_))));
    }

    #[test]
    fn too_many_fields_is_rejected() {
        let err = from_bytes(b"a,b\n1,2\n1,2,3\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed CSV: Expected 2 fields in line 3, saw 3"
        );
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert!(matches!(
            from_bytes(b"text\n\"never closed\n"),
            Err(AppError::MalformedCsv(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            from_bytes(&[b't', b'\n', 0xff, 0xfe]),
            Err(AppError::MalformedCsv(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "text").unwrap();
        writeln!(file, "great stuff").unwrap();

        let table = from_path(file.path()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            from_path("/definitely/not/here.csv"),
            Err(AppError::Io(_))
        ));
    }
}
