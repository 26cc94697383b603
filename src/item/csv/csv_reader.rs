use log::{debug, warn};
use std::{fs::File, io::Read, path::Path};

use crate::{core::item::Row, error::CsvError};

/// Headers and rows parsed out of one CSV stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    headers: Vec<String>,
    rows: Vec<Row>,
    skipped_lines: usize,
}

impl ParsedCsv {
    /// Header names in physical column order, verbatim.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in file order; malformed lines are not part of it.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data lines dropped because of a column count mismatch.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Consumes the result, handing back the header list and the rows.
    ///
    /// The rows keep their file order, so the n-th row is record number `n`.
    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.headers, self.rows)
    }
}

/// A minimal CSV reader turning a stream into a header list and rows.
///
/// The dialect is deliberately small: fields are separated by commas, with
/// no quoting and no escaping, and values are kept verbatim (no trimming).
/// Lines whose number of fields differs from the header line are dropped
/// with a warning instead of failing the whole stream. A blank line is a
/// line holding one empty field.
///
/// # Examples
///
/// ```
/// use smart_csv_rs::item::csv::csv_reader::CsvRowReader;
///
/// let data = "name,age\nAlice,30\nBob,40,extra\nCarol,25";
///
/// let parsed = CsvRowReader::from_reader(data.as_bytes()).parse().unwrap();
///
/// assert_eq!(parsed.headers(), ["name", "age"]);
/// assert_eq!(parsed.rows().len(), 2);
/// assert_eq!(parsed.rows()[1]["name"], "Carol");
/// assert_eq!(parsed.skipped_lines(), 1);
/// ```
pub struct CsvRowReader<R> {
    /// Source of the CSV text, header line included
    rdr: R,
}

impl<R: Read> CsvRowReader<R> {
    /// Creates a `CsvRowReader` from any source implementing `Read`.
    ///
    /// # Dialect Applied
    ///
    /// - Comma delimiter, every comma splits
    /// - Quoting disabled, quote characters are plain data
    /// - No trimming
    /// - `\n`, `\r\n` and `\r` end a line
    pub fn from_reader(rdr: R) -> Self {
        Self { rdr }
    }

    /// Reads the whole stream.
    ///
    /// # Returns
    /// - `Ok(ParsedCsv)` with empty headers and rows for an empty stream
    /// - `Err(CsvError::StreamRead)` if the stream fails or is not UTF-8
    pub fn parse(mut self) -> Result<ParsedCsv, CsvError> {
        let mut text = String::new();
        self.rdr.read_to_string(&mut text)?;

        let mut lines = lines(&text);

        let headers: Vec<String> = match lines.next() {
            Some(line) => fields(line).map(str::to_owned).collect(),
            None => {
                debug!("Empty CSV stream");
                return Ok(ParsedCsv::default());
            }
        };

        let mut rows = Vec::new();
        let mut skipped_lines = 0;

        // Line 1 holds the headers
        for (line_number, line) in (2_usize..).zip(lines) {
            let values: Vec<&str> = fields(line).collect();

            if values.len() != headers.len() {
                warn!("Line {} has incorrect number of columns", line_number);
                skipped_lines += 1;
                continue;
            }

            // Duplicate headers collapse, the last column wins
            let row: Row = headers
                .iter()
                .cloned()
                .zip(values.into_iter().map(str::to_owned))
                .collect();
            rows.push(row);
        }

        debug!(
            "Parsed {} headers, {} rows, {} malformed lines",
            headers.len(),
            rows.len(),
            skipped_lines
        );

        Ok(ParsedCsv {
            headers,
            rows,
            skipped_lines,
        })
    }
}

impl CsvRowReader<File> {
    /// Creates a `CsvRowReader` from a file path.
    ///
    /// # Errors
    /// Returns `CsvError::StreamRead` if the file cannot be opened
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CsvError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

/// Splits `text` into lines, blank lines included.
///
/// A terminator at the very end does not open another line, so `"a\n"` is
/// one line while `"a\n\n"` is `a` followed by a blank line.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let body = text.strip_suffix('\n').unwrap_or(text);

    (!text.is_empty())
        .then_some(body)
        .into_iter()
        .flat_map(|body| body.split('\n'))
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',')
}

/// Parses a CSV stream into headers and rows.
///
/// Shorthand for `CsvRowReader::from_reader(rdr).parse()`.
pub fn parse<R: Read>(rdr: R) -> Result<ParsedCsv, CsvError> {
    CsvRowReader::from_reader(rdr).parse()
}
