/// CSV support for reading tabular data into rows.
///
/// This module turns a raw text stream into a header list and a sequence of
/// rows, each row mapping a column name to its raw string value. Rows are then
/// handed to the processing engine, which maps them onto caller records.
///
/// # Dialect
///
/// The accepted format is deliberately minimal:
///
/// - The first line holds the column names
/// - Fields are separated by a comma
/// - No quoting and no escaping: a quote character is plain data
/// - Values are kept verbatim, without trimming
/// - `\n`, `\r\n` and `\r` all end a line
/// - A blank line is a line with one empty field
///
/// A data line whose number of fields differs from the header line is dropped
/// with a warning. It never reaches the engine and never becomes a record
/// error.
///
/// # Examples
///
/// ```
/// use smart_csv_rs::item::csv::csv_reader::parse;
///
/// let csv_data = "\
/// city,country,pop
/// Boston,United States,4628910
/// Concord,United States,42695
/// ";
///
/// let parsed = parse(csv_data.as_bytes()).unwrap();
///
/// assert_eq!(parsed.headers(), ["city", "country", "pop"]);
/// assert_eq!(parsed.rows().len(), 2);
/// assert_eq!(parsed.rows()[0]["city"], "Boston");
/// assert_eq!(parsed.rows()[1]["pop"], "42695");
/// ```

/// A module providing facilities for reading CSV rows.
pub mod csv_reader;
