use std::{
    io::Read,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info};
use uuid::Uuid;

use crate::{error::CsvError, item::csv::csv_reader::CsvRowReader};

use super::{
    build_name,
    header::{DefaultHeaderValidator, HeaderValidator},
    item::{RecordError, RecordHandler, Row, RowMapper},
    mapping::CsvRecord,
    policy::{FailurePolicy, ProcessorConfig},
};

/// Type alias for the outcome of a processing run.
///
/// - `Ok(errors)`: the run completed; `errors` holds the record failures
///   when the policy is [`FailurePolicy::Collect`], and is empty otherwise
/// - `Err(CsvError)`: the stream could not be read, the headers were
///   rejected, or a record failed under [`FailurePolicy::Stop`]
pub type ProcessResult = Result<Vec<RecordError>, CsvError>;

/// Represents the execution of one processing run.
#[derive(Debug)]
pub struct RunExecution {
    /// Unique identifier of the run
    pub id: Uuid,
    /// Human-readable name of the run
    pub name: String,
    /// Failure policy applied during the run
    pub policy: FailurePolicy,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    /// Number of rows parsed out of the stream
    pub read_count: usize,
    /// Number of data lines dropped for a column count mismatch
    pub skipped_line_count: usize,
    /// Number of record tasks that were started
    pub dispatched_count: usize,
    /// Number of records mapped and handled without error
    pub success_count: usize,
    /// Number of records whose mapping or handling failed
    pub error_count: usize,
    /// Record errors returned to the caller, per the failure policy
    pub errors: Vec<RecordError>,
}

/// One row waiting for a worker.
struct RecordTask {
    /// 1-based position among parsed rows
    record_number: usize,
    row: Row,
}

#[derive(Default)]
struct DispatchOutcome {
    dispatched: usize,
    errors: Vec<RecordError>,
}

/// State shared by the workers of one run.
struct Worker<'r> {
    policy: FailurePolicy,
    tasks: Receiver<RecordTask>,
    errors: Sender<RecordError>,
    halted: &'r AtomicBool,
    dispatched: &'r AtomicUsize,
}

impl Worker<'_> {
    fn run<T, M, H>(self, mapper: &M, handler: &H)
    where
        M: RowMapper<T> + ?Sized,
        H: RecordHandler<T> + ?Sized,
    {
        for task in self.tasks.iter() {
            // Pending tasks are cancelled once the run is halted
            if self.halted.load(Ordering::SeqCst) {
                debug!("Run halted, record {} cancelled", task.record_number);
                break;
            }

            self.dispatched.fetch_add(1, Ordering::SeqCst);

            if let Err(cause) = process_record(&task.row, mapper, handler) {
                let message = format!("Error processing record {}: {}", task.record_number, cause);
                error!("{}", message);

                if self.policy == FailurePolicy::Stop {
                    self.halted.store(true, Ordering::SeqCst);
                }

                if self
                    .errors
                    .send(RecordError::new(task.record_number, message))
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}

fn process_record<T, M, H>(row: &Row, mapper: &M, handler: &H) -> Result<(), CsvError>
where
    M: RowMapper<T> + ?Sized,
    H: RecordHandler<T> + ?Sized,
{
    let record = mapper.map_row(row)?;
    handler
        .handle(record)
        .map_err(|error| CsvError::Handler(format!("{:#}", error)))
}

/// Concurrent engine mapping every row of a CSV stream and handing the
/// records to caller logic.
///
/// A run goes through the following phases:
///
/// 1. **Parsing**: the stream is read into headers and rows; malformed
///    lines are dropped by the reader
/// 2. **Header validation**: any message from the header validator aborts
///    the run before a single row is processed
/// 3. **Dispatching**: one task per row is queued, numbered from 1, and a
///    worker pool scoped to the run maps each row and invokes the handler
/// 4. **Awaiting**: failures are collected as they complete; under
///    [`FailurePolicy::Stop`] the first one halts the pool and fails the run
/// 5. **Completed**: the record errors are returned per the failure policy
///
/// # Example
///
/// ```
/// use smart_csv_rs::core::mapping::{FieldBinding, RecordBindings};
/// use smart_csv_rs::core::policy::FailurePolicy;
/// use smart_csv_rs::core::processor::CsvProcessorBuilder;
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// let bindings = RecordBindings::<Person>::builder()
///     .text("name", FieldBinding::new("name").required(true), |p, v| p.name = v)
///     .integer("age", FieldBinding::new("age").required(true), |p, v| p.age = v)
///     .build()
///     .unwrap();
///
/// let processor = CsvProcessorBuilder::new()
///     .validation_strategy(FailurePolicy::Collect)
///     .build();
///
/// let handler = |person: Person| {
///     assert!(!person.name.is_empty());
///     Ok(())
/// };
///
/// let csv = "name,age\nAlice,30\nBob,thirty";
/// let errors = processor.process(csv.as_bytes(), &bindings, &handler).unwrap();
///
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].record_number, 2);
/// ```
pub struct CsvProcessor<'a> {
    /// Unique identifier of this processor, reported in every run log
    id: Uuid,
    name: String,
    policy: FailurePolicy,
    header_validator: &'a dyn HeaderValidator,
    /// Maximum number of worker threads of a run
    workers: usize,
}

impl CsvProcessor<'_> {
    pub fn get_id(&self) -> Uuid {
        self.id
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn get_workers(&self) -> usize {
        self.workers
    }

    /// Processes a CSV stream and returns the record errors.
    ///
    /// # Parameters
    /// - `rdr`: the CSV stream
    /// - `mapper`: builds one record out of one row
    /// - `handler`: invoked once per mapped record, from any worker thread
    ///
    /// # Returns
    /// See [`ProcessResult`]
    pub fn process<T, R, M, H>(&self, rdr: R, mapper: &M, handler: &H) -> ProcessResult
    where
        R: Read,
        M: RowMapper<T> + Sync + ?Sized,
        H: RecordHandler<T> + ?Sized,
    {
        self.execute(rdr, mapper, handler)
            .map(|execution| execution.errors)
    }

    /// Processes a CSV stream into a record type declaring its own bindings.
    ///
    /// The binding table is built once, before the stream is read.
    pub fn process_records<T, R, H>(&self, rdr: R, handler: &H) -> ProcessResult
    where
        T: CsvRecord,
        R: Read,
        H: RecordHandler<T> + ?Sized,
    {
        let bindings = T::bindings()?;
        self.process(rdr, &bindings, handler)
    }

    /// Processes a CSV stream and returns the details of the run.
    ///
    /// Fails exactly when [`CsvProcessor::process`] fails.
    pub fn execute<T, R, M, H>(
        &self,
        rdr: R,
        mapper: &M,
        handler: &H,
    ) -> Result<RunExecution, CsvError>
    where
        R: Read,
        M: RowMapper<T> + Sync + ?Sized,
        H: RecordHandler<T> + ?Sized,
    {
        let start = Instant::now();

        info!("Start of run: {}, id: {}", self.name, self.id);

        let parsed = CsvRowReader::from_reader(rdr)
            .parse()
            .inspect_err(|err| error!("Unable to read CSV stream: {}", err))?;
        let skipped_line_count = parsed.skipped_lines();
        let (headers, rows) = parsed.into_parts();

        let header_errors = self.header_validator.validate_headers(&headers);
        if !header_errors.is_empty() {
            error!("Header validation failed: {:?}", header_errors);
            return Err(CsvError::HeaderValidation(header_errors));
        }

        let read_count = rows.len();
        let outcome = self.dispatch(rows, mapper, handler)?;
        let error_count = outcome.errors.len();

        let errors = match self.policy {
            FailurePolicy::Collect => outcome.errors,
            FailurePolicy::Skip | FailurePolicy::Stop => {
                if error_count > 0 {
                    info!("{} records skipped on error", error_count);
                }
                Vec::new()
            }
        };

        info!("End of run: {}, id: {}", self.name, self.id);

        Ok(RunExecution {
            id: self.id,
            name: self.name.clone(),
            policy: self.policy,
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            read_count,
            skipped_line_count,
            dispatched_count: outcome.dispatched,
            success_count: outcome.dispatched - error_count,
            error_count,
            errors,
        })
    }

    fn dispatch<T, M, H>(
        &self,
        rows: Vec<Row>,
        mapper: &M,
        handler: &H,
    ) -> Result<DispatchOutcome, CsvError>
    where
        M: RowMapper<T> + Sync + ?Sized,
        H: RecordHandler<T> + ?Sized,
    {
        if rows.is_empty() {
            debug!("No record to dispatch");
            return Ok(DispatchOutcome::default());
        }

        let worker_count = self.workers.clamp(1, rows.len());

        let (task_sender, task_receiver) = unbounded();
        for (index, row) in rows.into_iter().enumerate() {
            task_sender
                .send(RecordTask {
                    record_number: index + 1,
                    row,
                })
                .map_err(|err| CsvError::WorkerPool(err.to_string()))?;
        }
        drop(task_sender);

        let (error_sender, error_receiver) = unbounded();
        let halted = AtomicBool::new(false);
        let dispatched = AtomicUsize::new(0);

        debug!(
            "Dispatching {} records to {} workers",
            task_receiver.len(),
            worker_count
        );

        // The pool lives as long as this scope: every worker is joined
        // before the outcome is returned, including on early returns.
        let errors = thread::scope(|scope| -> Result<Vec<RecordError>, CsvError> {
            for worker_id in 0..worker_count {
                let worker = Worker {
                    policy: self.policy,
                    tasks: task_receiver.clone(),
                    errors: error_sender.clone(),
                    halted: &halted,
                    dispatched: &dispatched,
                };

                thread::Builder::new()
                    .name(format!("{}-worker-{}", self.name, worker_id))
                    .spawn_scoped(scope, move || worker.run::<T, M, H>(mapper, handler))
                    .map_err(|err| {
                        halted.store(true, Ordering::SeqCst);
                        CsvError::WorkerPool(err.to_string())
                    })?;
            }
            drop(error_sender);

            let mut errors = Vec::new();
            for record_error in error_receiver.iter() {
                if self.policy == FailurePolicy::Stop {
                    halted.store(true, Ordering::SeqCst);
                    debug!("Halting run on record {}", record_error.record_number);
                    return Err(CsvError::RecordFailed(record_error));
                }
                errors.push(record_error);
            }

            Ok(errors)
        })?;

        Ok(DispatchOutcome {
            dispatched: dispatched.load(Ordering::SeqCst),
            errors,
        })
    }
}

/// Builder for creating a [`CsvProcessor`].
///
/// # Defaults
///
/// - Name: random 8 characters
/// - Failure policy: [`FailurePolicy::Skip`]
/// - Header validator: [`DefaultHeaderValidator`], accepting any header
/// - Workers: host parallelism
///
/// # Example
///
/// ```
/// use smart_csv_rs::core::header::RequiredHeadersValidator;
/// use smart_csv_rs::core::policy::FailurePolicy;
/// use smart_csv_rs::core::processor::CsvProcessorBuilder;
///
/// let validator = RequiredHeadersValidator::new(["id"]);
///
/// let processor = CsvProcessorBuilder::new()
///     .name("import-customers".to_string())
///     .validation_strategy(FailurePolicy::Stop)
///     .header_validator(&validator)
///     .workers(2)
///     .build();
///
/// assert_eq!(processor.get_name(), "import-customers");
/// assert_eq!(processor.get_workers(), 2);
/// ```
#[derive(Default)]
pub struct CsvProcessorBuilder<'a> {
    name: Option<String>,
    policy: FailurePolicy,
    header_validator: Option<&'a dyn HeaderValidator>,
    workers: Option<usize>,
}

impl<'a> CsvProcessorBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            policy: FailurePolicy::Skip,
            header_validator: None,
            workers: None,
        }
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn validation_strategy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the validator run on the header line; any `HeaderValidator`,
    /// including one picked at runtime behind a `Box<dyn HeaderValidator>`.
    pub fn header_validator(mut self, header_validator: &'a dyn HeaderValidator) -> Self {
        self.header_validator = Some(header_validator);
        self
    }

    /// Sets the maximum number of worker threads; `0` means host parallelism.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Applies an external configuration.
    ///
    /// Values absent from the configuration keep their current setting.
    pub fn config(mut self, config: &ProcessorConfig) -> Self {
        if let Some(name) = &config.name {
            self.name = Some(name.clone());
        }
        if let Some(workers) = config.workers {
            self.workers = Some(workers);
        }
        self.policy = config.validation_strategy;
        self
    }

    pub fn build(self) -> CsvProcessor<'a> {
        CsvProcessor {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            policy: self.policy,
            header_validator: self.header_validator.unwrap_or(&DefaultHeaderValidator),
            workers: self
                .workers
                .filter(|workers| *workers > 0)
                .unwrap_or_else(num_cpus::get),
        }
    }
}
