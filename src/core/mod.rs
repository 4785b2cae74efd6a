pub mod batch_pipeline;
pub mod etl;
pub mod transformer;
pub mod validator;

pub use crate::domain::model::{BatchFault, BatchInfo, CanonicalRecord, FaultStage, RawRecord, RunStatistics};
pub use crate::domain::ports::{ConfigProvider, FaultReporter, RecordSource, Sink, Storage, Transformer, Validator};
pub use crate::utils::error::Result;
