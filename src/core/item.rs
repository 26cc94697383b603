use std::collections::HashMap;

use serde::Serialize;

use crate::error::CsvError;

/// One data line reduced to a column name to raw value mapping.
pub type Row = HashMap<String, String>;

/// Result of mapping a row onto a record.
pub type RowMapperResult<T> = Result<T, CsvError>;

/// Result of handling one mapped record.
pub type RecordHandlerResult = anyhow::Result<()>;

/// Builds one record out of one parsed row.
///
/// `RecordBindings` is the declarative implementation; callers with
/// unusual needs can implement this trait by hand.
pub trait RowMapper<T> {
    fn map_row(&self, row: &Row) -> RowMapperResult<T>;
}

/// Caller logic invoked once per successfully mapped record.
///
/// Handlers are shared by every worker of a run and may be called from any
/// thread, in any order.
pub trait RecordHandler<T>: Sync {
    fn handle(&self, record: T) -> RecordHandlerResult;
}

impl<T, F> RecordHandler<T> for F
where
    F: Fn(T) -> RecordHandlerResult + Sync,
{
    fn handle(&self, record: T) -> RecordHandlerResult {
        self(record)
    }
}

/// A failure attached to one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    /// 1-based position of the row among parsed data rows
    pub record_number: usize,
    /// Formatted failure message
    pub error_message: String,
}

impl RecordError {
    pub fn new(record_number: usize, error_message: String) -> Self {
        Self {
            record_number,
            error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::bail;

    use super::{RecordError, RecordHandler};

    #[test]
    fn closures_are_record_handlers() {
        let seen = Mutex::new(Vec::new());
        let handler = |value: i64| {
            if value < 0 {
                bail!("negative value {}", value);
            }
            seen.lock().unwrap().push(value);
            Ok(())
        };

        assert!(handler.handle(3).is_ok());
        let err = handler.handle(-1).unwrap_err();

        assert_eq!(err.to_string(), "negative value -1");
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn record_error_serializes_with_field_names() {
        let error = RecordError::new(2, "Error processing record 2: boom".to_string());

        let json = serde_json::to_string(&error).unwrap();

        assert_eq!(
            json,
            r#"{"record_number":2,"error_message":"Error processing record 2: boom"}"#
        );
    }
}
