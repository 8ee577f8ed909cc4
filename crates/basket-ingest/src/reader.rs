use std::path::Path;

use basket_core::{BasketError, Cell, IngestConfig, RawTable};
use tracing::debug;

/// A table together with the delimiter that produced it.
///
/// # Examples
///
/// ```
/// use basket_core::IngestConfig;
/// use basket_ingest::reader::sniff_table;
///
/// let sniffed = sniff_table(b"bread;milk\n1;0\n", &IngestConfig::default()).unwrap();
/// assert_eq!(sniffed.delimiter, ';');
/// assert_eq!(sniffed.table.columns, vec!["bread", "milk"]);
/// ```
#[derive(Debug, Clone)]
pub struct SniffedTable {
    /// Delimiter chosen by sniffing.
    pub delimiter: char,
    /// Parsed table.
    pub table: RawTable,
}

/// Read CSV-like bytes into a [`RawTable`], sniffing the delimiter.
///
/// # Errors
///
/// Returns [`BasketError::Parse`] if no candidate delimiter yields a
/// consistent table, or [`BasketError::Config`] if no delimiters are configured.
///
/// # Examples
///
/// ```
/// use basket_core::IngestConfig;
/// use basket_ingest::reader::read_table;
///
/// let csv = "items\n\"bread,milk\"\n\"milk,eggs\"\n";
/// let table = read_table(csv.as_bytes(), &IngestConfig::default()).unwrap();
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.column_count(), 1);
/// ```
pub fn read_table(bytes: &[u8], config: &IngestConfig) -> Result<RawTable, BasketError> {
    sniff_table(bytes, config).map(|sniffed| sniffed.table)
}

/// Read a file from disk into a [`RawTable`].
///
/// # Errors
///
/// Returns [`BasketError::FileNotFound`] if `path` does not exist,
/// [`BasketError::Io`] if it cannot be read, and the errors of [`read_table`].
pub fn read_table_from_path(path: &Path, config: &IngestConfig) -> Result<RawTable, BasketError> {
    if !path.exists() {
        return Err(BasketError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    read_table(&bytes, config)
}

/// Parse `bytes` with each configured delimiter in turn and keep the first
/// whose rows all fit the header width.
///
/// A delimiter giving a multi-column header wins over an earlier one that
/// only produced a single column, so `a;b` files are not read as one column.
///
/// # Errors
///
/// See [`read_table`].
pub fn sniff_table(bytes: &[u8], config: &IngestConfig) -> Result<SniffedTable, BasketError> {
    if config.delimiters.is_empty() {
        return Err(BasketError::Config(
            "ingest.delimiters must list at least one delimiter".into(),
        ));
    }

    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);

    let mut single_column: Option<(char, Vec<Vec<String>>)> = None;
    let mut last_error = None;

    for &delimiter in &config.delimiters {
        let records = match parse_records(text, delimiter) {
            Ok(records) => records,
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };

        let Some(header) = records.first() else {
            return Ok(SniffedTable {
                delimiter,
                table: RawTable::default(),
            });
        };

        let width = header.len();
        if let Some(pos) = records.iter().position(|r| r.len() > width) {
            debug!(
                delimiter = ?delimiter,
                record = pos,
                "record wider than header, trying next delimiter"
            );
            continue;
        }

        if width > 1 {
            return Ok(build_table(delimiter, records));
        }
        if single_column.is_none() {
            single_column = Some((delimiter, records));
        }
    }

    if let Some((delimiter, records)) = single_column {
        return Ok(build_table(delimiter, records));
    }

    Err(last_error.unwrap_or_else(|| {
        BasketError::Parse("no candidate delimiter produced a consistent table".into())
    }))
}

fn build_table(delimiter: char, mut records: Vec<Vec<String>>) -> SniffedTable {
    let header = records.remove(0);
    let columns = header.into_iter().map(|h| h.trim().to_string()).collect();
    let rows = records
        .iter()
        .map(|record| record.iter().map(|field| Cell::parse(field)).collect())
        .collect();
    let table = RawTable::new(columns, rows);
    debug!(
        delimiter = ?delimiter,
        rows = table.row_count(),
        columns = table.column_count(),
        "parsed table"
    );
    SniffedTable { delimiter, table }
}

/// Split `text` into records of raw fields.
///
/// Double-quoted fields may contain the delimiter, newlines, and `""`
/// escapes. Lines with no characters at all are skipped. `\r` outside quotes
/// is ignored so CRLF input parses like LF input.
///
/// # Errors
///
/// Returns [`BasketError::Parse`] when a quoted field is never closed.
///
/// # Examples
///
/// ```
/// use basket_ingest::reader::parse_records;
///
/// let records = parse_records("id,item\n1,\"say \"\"hi\"\"\"\n", ',').unwrap();
/// assert_eq!(records[1], vec!["1", "say \"hi\""]);
/// ```
pub fn parse_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, BasketError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut has_content = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
                has_content = true;
                quote_line = line;
            }
            c if c == delimiter => {
                record.push(std::mem::take(&mut field));
                has_content = true;
            }
            '\r' => {}
            '\n' => {
                if has_content {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                field.clear();
                has_content = false;
                line += 1;
            }
            _ => {
                field.push(c);
                has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(BasketError::Parse(format!(
            "unterminated quoted field starting on line {quote_line}"
        )));
    }
    if has_content {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IngestConfig {
        IngestConfig::default()
    }

    #[test]
    fn comma_one_hot_table() {
        let csv = "bread,milk,eggs\n1,0,1\n0,1,1\n";
        let sniffed = sniff_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(sniffed.delimiter, ',');
        assert_eq!(sniffed.table.columns, vec!["bread", "milk", "eggs"]);
        assert_eq!(sniffed.table.rows[0][0].as_number(), Some(1.0));
        assert_eq!(sniffed.table.rows[1][0].as_number(), Some(0.0));
    }

    #[test]
    fn unquoted_item_lists_fall_back_to_semicolon() {
        // Comma splitting makes rows wider than the one-field header.
        let csv = "items\nbread,milk\nmilk\n";
        let sniffed = sniff_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(sniffed.delimiter, ';');
        assert_eq!(sniffed.table.column_count(), 1);
        assert_eq!(sniffed.table.rows[0][0], Cell::Text("bread,milk".into()));
    }

    #[test]
    fn quoted_item_lists_stay_on_comma() {
        let csv = "items\n\"a,b\"\n\"a,c\"\n\"b,c\"\n";
        let sniffed = sniff_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(sniffed.delimiter, ',');
        assert_eq!(sniffed.table.row_count(), 3);
        assert_eq!(sniffed.table.rows[2][0], Cell::Text("b,c".into()));
    }

    #[test]
    fn tab_separated_table() {
        let csv = "order\tproduct\n1\tbread\n1\tmilk\n";
        let sniffed = sniff_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(sniffed.delimiter, '\t');
        assert_eq!(sniffed.table.columns, vec!["order", "product"]);
    }

    #[test]
    fn crlf_and_blank_lines() {
        let csv = "id,item\r\n1,bread\r\n\r\n2,milk\r\n";
        let table = read_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1][1], Cell::Text("milk".into()));
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let mut bytes = "\u{feff}items\n\"x,y\"\n".as_bytes().to_vec();
        bytes.push(b'\n');
        let table = read_table(&bytes, &config()).unwrap();
        assert_eq!(table.columns, vec!["items"]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let bytes = b"items\n\"bre\xffad,milk\"\n";
        let table = read_table(bytes, &config()).unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn short_rows_are_padded() {
        let csv = "a,b,c\n1\n";
        let table = read_table(csv.as_bytes(), &config()).unwrap();
        assert_eq!(table.rows[0], vec![Cell::parse("1"), Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = read_table(b"", &config()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn header_only_has_no_rows() {
        let table = read_table(b"items\n", &config()).unwrap();
        assert_eq!(table.columns, vec!["items"]);
        assert!(table.is_empty());
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let err = read_table(b"items\n\"a,b\n", &config()).unwrap_err();
        assert!(matches!(err, BasketError::Parse(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn quoted_field_keeps_newline() {
        let records = parse_records("a\n\"x\ny\"\n", ',').unwrap();
        assert_eq!(records, vec![vec!["a".to_string()], vec!["x\ny".to_string()]]);
    }

    #[test]
    fn no_delimiters_is_config_error() {
        let config = IngestConfig { delimiters: vec![] };
        let err = read_table(b"a\n", &config).unwrap_err();
        assert!(matches!(err, BasketError::Config(_)));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = read_table_from_path(Path::new("/nonexistent/baskets.csv"), &config()).unwrap_err();
        assert!(matches!(err, BasketError::FileNotFound(_)));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baskets.csv");
        std::fs::write(&path, "id,item\n1,bread\n").unwrap();
        let table = read_table_from_path(&path, &config()).unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
