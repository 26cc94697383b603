#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 <div align="center">
   <h1>Smart CSV for Rust</h1>
   <h3>Declarative CSV record mapping with concurrent processing and failure policies</h3>

   ![license](https://shields.io/badge/license-MIT%2FApache--2.0-blue)

  </div>

 # Smart CSV for Rust

 **Smart CSV** reads a CSV stream, checks its header line, maps every data row onto
 one of your record types through declarative field bindings, and calls your logic once
 per mapped record on a pool of worker threads. Malformed lines are dropped, and record
 failures are handled according to the failure policy you pick.

 ## Core Concepts

- **CsvRowReader:** Turns a stream into a header list and rows (column name to raw value).
  Lines with the wrong number of fields are dropped with a warning.
- **HeaderValidator:** Inspects the header list before any row is processed. Any message
  it returns aborts the run.
- **FieldBinding / RecordBindings:** The declarative rules of a record type: source column,
  required flag, validation pattern, and the conversion (text, integer, float) of each field.
- **RecordHandler:** Your logic, invoked once per mapped record from any worker thread.
- **CsvProcessor:** The engine tying it all together under a `FailurePolicy`:
  `Stop` aborts on the first failure, `Skip` logs failures and carries on, `Collect`
  returns every failure.

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| logger        | Enables a logger `RecordHandler`, useful for debugging purposes |
| full          | Enables all available features                                |

 ## Getting Started

```rust
# use smart_csv_rs::{
#     core::{
#         header::RequiredHeadersValidator,
#         mapping::{CsvRecord, FieldBinding, RecordBindings},
#         policy::FailurePolicy,
#         processor::CsvProcessorBuilder,
#     },
#     CsvError,
# };
#[derive(Default, Debug)]
struct Car {
    year: i64,
    make: String,
    model: String,
}

impl CsvRecord for Car {
    fn bindings() -> Result<RecordBindings<Self>, CsvError> {
        RecordBindings::<Self>::builder()
            .integer("year", FieldBinding::new("year").validation("[0-9]{4}"), |c, v| c.year = v)
            .text("make", FieldBinding::new("make").required(true), |c, v| c.make = v)
            .text("model", FieldBinding::new("model"), |c, v| c.model = v)
            .build()
    }
}

fn main() -> Result<(), CsvError> {
    let csv = "year,make,model
1948,Porsche,356
19x5,Peugeot,205
2021,,CX-30
1967,Ford,Mustang";

    let validator = RequiredHeadersValidator::new(["year", "make"]);

    let processor = CsvProcessorBuilder::new()
        .validation_strategy(FailurePolicy::Collect)
        .header_validator(&validator)
        .build();

    let errors = processor.process_records::<Car, _, _>(csv.as_bytes(), &|car: Car| {
        assert!(car.year > 1900);
        Ok(())
    })?;

    assert_eq!(errors.len(), 2);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Core module: record mapping, header validation and the processing engine
pub mod core;

/// Error types for CSV processing
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of record sources and handlers (for exemple: the csv row reader)
pub mod item;
