pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::sink::{JsonLinesSink, MemorySink, TimeoutSink};
pub use adapters::source::{ApiSource, CsvFileSource, JsonFileSource};
pub use adapters::storage::LocalStorage;
pub use core::{
    batch_pipeline::{BatchOutcome, BatchPipeline, CancelHandle, RunReport, TracingReporter},
    etl::{EtlEngine, RunSummary},
    transformer::{DefaultTransformer, FnTransformer},
    validator::{FnValidator, RequiredFieldsValidator},
};
pub use domain::model::{BatchFault, BatchInfo, CanonicalRecord, FaultStage, RawRecord, RunStatistics};
pub use utils::error::{EtlError, Result};
