//! Mocks shared by the integration tests
use mockall::mock;

use smart_csv_rs::core::header::HeaderValidator;
use std::io::{self, Read};

mock! {
    pub Stream {}
    impl Read for Stream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    }
}

mock! {
    pub Validator {}
    impl HeaderValidator for Validator {
        fn validate_headers(&self, headers: &[String]) -> Vec<String>;
    }
}
