use std::fmt::Debug;

use log::info;

use crate::core::item::{RecordHandler, RecordHandlerResult};

/// Record handler logging every mapped record at `info` level.
#[derive(Default)]
pub struct LoggerHandler {}

impl<T> RecordHandler<T> for LoggerHandler
where
    T: Debug,
{
    fn handle(&self, record: T) -> RecordHandlerResult {
        info!("Record:{:?}", record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::item::RecordHandler;

    use super::LoggerHandler;

    #[test]
    fn logging_never_fails() {
        let handler = LoggerHandler::default();

        assert!(handler.handle(("Alice", 30)).is_ok());
        assert!(handler.handle(vec![1.5, 2.5]).is_ok());
    }
}
