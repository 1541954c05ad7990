//! CSV table loading with encoding and delimiter auto-detection.
//!
//! Produces a [`Table`]: header labels plus raw cell strings. Cells are kept
//! exactly as written (no trimming); typing them is the engine's job.

use csv::ReaderBuilder;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// One data row with its position in the file (header is row 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub number: usize,
    pub cells: Vec<String>,
}

/// A loaded CSV resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Header labels (empty for an empty file)
    pub labels: Vec<String>,
    /// Data rows
    pub rows: Vec<TableRow>,
    /// Detected encoding
    pub encoding: String,
    /// Detected or declared delimiter
    pub delimiter: char,
    /// Size of the source in bytes
    pub bytes: usize,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8. A UTF-8 byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        // WHATWG maps latin1 labels onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Comma wins ties and is used when no candidate occurs at all.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse decoded CSV text into labels and rows.
pub fn parse_table(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<TableRow>)> {
    if !delimiter.is_ascii() {
        return Err(CsvError::UnsupportedDelimiter(delimiter));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut labels = Vec::new();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CsvError::ParseError {
            path: String::new(),
            message: e.to_string(),
        })?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();

        if index == 0 {
            labels = cells;
        } else {
            rows.push(TableRow {
                number: index + 1,
                cells,
            });
        }
    }

    Ok((labels, rows))
}

/// Parse CSV bytes with auto-detection of encoding, and of the delimiter unless given.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let (labels, rows) = parse_table(&content, delimiter)?;

    Ok(Table {
        labels,
        rows,
        encoding,
        delimiter,
        bytes: bytes.len(),
    })
}

/// Load a CSV file.
pub fn read_table(path: &Path, delimiter: Option<char>) -> CsvResult<Table> {
    let bytes = std::fs::read(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let table = parse_bytes(&bytes, delimiter).map_err(|e| match e {
        CsvError::ParseError { message, .. } => CsvError::ParseError {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })?;

    tracing::debug!(
        path = %path.display(),
        encoding = %table.encoding,
        delimiter = ?table.delimiter,
        rows = table.rows.len(),
        "loaded table"
    );
    Ok(table)
}
