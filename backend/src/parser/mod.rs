//! CSV to record parser with encoding detection.
//!
//! Turns delimited text into [`RawRecord`]s keyed by normalized header names.
//! Values are kept as the literal cell text; typing happens later in the
//! entity transforms.

use serde_json::Value;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::RawRecord;

/// A structural problem on one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl LineError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Field delimiter, comma unless told otherwise.
    pub delimiter: char,
    /// Guess the delimiter from the header line instead.
    pub detect_delimiter: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            detect_delimiter: false,
        }
    }
}

impl ParseOptions {
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            detect_delimiter: false,
        }
    }

    pub fn detecting() -> Self {
        Self {
            detect_delimiter: true,
            ..Self::default()
        }
    }
}

/// Records plus the metadata gathered while parsing.
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub records: Vec<RawRecord>,
    /// Normalized column headers, in file order.
    pub headers: Vec<String>,
    pub encoding: String,
    pub delimiter: char,
}

/// Canonical header form: trimmed, lowercased, inner whitespace runs
/// collapsed to a single underscore.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Detect the encoding of raw bytes. Valid UTF-8 wins outright, anything else
/// is left to chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding, lossy on failure.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best = ',';
    let mut best_count = 0;
    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

/// Parse CSV text into raw records.
///
/// # Example
/// ```ignore
/// use maintdesk::parser::{parse_str, ParseOptions};
///
/// let rows = parse_str("Name,Phone\nAlice,+966501234567", &ParseOptions::default()).unwrap();
/// assert_eq!(rows[0]["name"], "Alice");
/// ```
pub fn parse_str(input: &str, options: &ParseOptions) -> ParseResult<Vec<RawRecord>> {
    parse_with_headers(input, options).map(|parsed| parsed.records)
}

/// Parse CSV text, keeping the normalized headers.
///
/// Every malformed row is reported; if any is found no records are returned.
pub fn parse_with_headers(input: &str, options: &ParseOptions) -> ParseResult<ParsedCsv> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let delimiter = if options.detect_delimiter {
        detect_delimiter(input)
    } else {
        options.delimiter
    };
    if !delimiter.is_ascii() {
        return Err(ParseError::unreadable(format!(
            "Unsupported delimiter '{}'",
            delimiter
        )));
    }

    let unterminated = unterminated_quote(input, delimiter)
        .map(|line| LineError::new(line, "Quoted field unterminated"));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(input.as_bytes());
    let mut rows = reader.records();

    let (headers, header_line) = loop {
        match rows.next() {
            None if unterminated.is_some() => {
                return Err(ParseError::new(unterminated.into_iter().collect()))
            }
            None => {
                return Ok(ParsedCsv {
                    records: Vec::new(),
                    headers: Vec::new(),
                    encoding: "utf-8".to_string(),
                    delimiter,
                })
            }
            Some(Err(e)) => {
                return Err(ParseError::new(vec![LineError::new(error_line(&e), e.to_string())]))
            }
            Some(Ok(row)) if is_blank(&row) => continue,
            Some(Ok(row)) => {
                let headers: Vec<String> = row.iter().map(normalize_header).collect();
                break (headers, record_line(&row));
            }
        }
    };

    let mut errors = duplicate_headers(&headers, header_line);
    let mut records = Vec::new();

    for result in rows {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                errors.push(LineError::new(error_line(&e), e.to_string()));
                continue;
            }
        };
        if is_blank(&row) {
            continue;
        }

        if row.len() != headers.len() {
            let problem = if row.len() < headers.len() {
                "Too few fields"
            } else {
                "Too many fields"
            };
            errors.push(LineError::new(
                record_line(&row),
                format!(
                    "{}: expected {} fields but parsed {}",
                    problem,
                    headers.len(),
                    row.len()
                ),
            ));
            continue;
        }

        let record: RawRecord = headers
            .iter()
            .cloned()
            .zip(row.iter().map(|cell| Value::String(cell.to_string())))
            .collect();
        records.push(record);
    }

    errors.extend(unterminated);
    if !errors.is_empty() {
        return Err(ParseError::new(errors));
    }

    Ok(ParsedCsv {
        records,
        headers,
        encoding: "utf-8".to_string(),
        delimiter,
    })
}

/// Parse CSV bytes, detecting their encoding first.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> ParseResult<ParsedCsv> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let mut parsed = parse_with_headers(&content, options)?;
    parsed.encoding = encoding;
    Ok(parsed)
}

/// Read a CSV file completely, then parse it.
pub async fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> ParseResult<ParsedCsv> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ParseError::unreadable(format!("Cannot read file '{}': {}", path.display(), e))
    })?;
    parse_bytes(&bytes, options)
}

/// Lines holding nothing but whitespace count as empty.
fn is_blank(row: &csv::StringRecord) -> bool {
    row.len() <= 1 && row.get(0).map_or(true, |cell| cell.trim().is_empty())
}

fn record_line(row: &csv::StringRecord) -> usize {
    row.position().map_or(0, |p| p.line() as usize)
}

fn error_line(error: &csv::Error) -> usize {
    error.position().map_or(0, |p| p.line() as usize)
}

/// Line on which a quoted field opens without ever closing.
///
/// The csv reader takes an open quote as running to end of input, which would
/// silently fold every following row into one cell.
fn unterminated_quote(input: &str, delimiter: char) -> Option<usize> {
    let mut line = 1;
    let mut opened_on = 0;
    let mut quoted = false;
    let mut field_start = true;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                }
                '"' => quoted = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if field_start => {
                quoted = true;
                opened_on = line;
                field_start = false;
            }
            '\n' => {
                line += 1;
                field_start = true;
            }
            '\r' => field_start = true,
            c if c == delimiter => field_start = true,
            _ => field_start = false,
        }
    }

    quoted.then_some(opened_on)
}

fn duplicate_headers(headers: &[String], line: usize) -> Vec<LineError> {
    let mut errors = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        if headers[..i].contains(header) && !errors.iter().any(|e: &LineError| e.column.as_ref() == Some(header)) {
            errors.push(LineError::new(line, "Duplicate column").with_column(header.clone()));
        }
    }
    errors
}
