//! CSV parser with encoding and delimiter auto-detection.
//!
//! Turns an uploaded order export into [`RawRow`]s. No ticket logic here.
//!
//! Cells are kept verbatim; only header names are trimmed. Rows shorter than
//! the header read their missing cells as empty, extra cells are ignored.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::RawRow;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed data rows
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Parsing knobs. Everything not set is auto-detected.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Force a delimiter instead of detecting it from the header line.
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always read as UTF-8; chardet only guesses for the rest.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// A leading UTF-8 byte order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        // Latin-1 labels decode as windows-1252, as in WHATWG
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(CsvError::EncodingError {
                        encoding: other.to_string(),
                        message: "malformed byte sequence".to_string(),
                    });
                }
                text.into_owned()
            }
            // Fallback: lossy UTF-8
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    })
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to a comma when the line has none of the candidates.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use sweeper::parse_str;
///
/// let rows = parse_str("Email,Order ID\na@b.c,1001", ',').unwrap();
/// assert_eq!(rows[0].get("Order ID"), "1001");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Vec<RawRow>> {
    parse_string_with_metadata(content, delimiter, "utf-8".to_string()).map(|r| r.rows)
}

/// Parse CSV file with the given options.
pub fn parse_csv_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, options)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    parse_bytes(bytes, &ParseOptions::default())
}

/// Parse CSV bytes, detecting whatever `options` leaves open.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(CsvError::ParseError {
            line: 0,
            message: format!("delimiter '{}' is not a single-byte character", delimiter),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(CsvError::from_csv)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(CsvError::from_csv)?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            // First column wins on duplicate header names
            if !row.contains(header) {
                row.insert(header.as_str(), record.get(i).unwrap_or(""));
            }
        }
        rows.push(row);
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}
