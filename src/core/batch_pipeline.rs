use crate::core::transformer::DefaultTransformer;
use crate::core::validator::RequiredFieldsValidator;
use crate::domain::model::{
    BatchFault, BatchInfo, CanonicalRecord, FaultStage, RawRecord, RunStatistics,
};
use crate::domain::ports::{FaultReporter, Sink, Transformer, Validator};
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// 單一批次的處理結果
#[derive(Debug)]
pub enum BatchOutcome {
    /// 已寫入 sink 的有效記錄 (可能為空)
    Stored(Vec<CanonicalRecord>),
    Faulted(BatchFault),
}

/// Result of one `process_with_report` call.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<CanonicalRecord>,
    pub batches_total: usize,
    pub batches_succeeded: usize,
    pub batches_skipped: usize,
    pub faults: Vec<BatchFault>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn faulted_records(&self) -> usize {
        self.faults.iter().map(|f| f.batch.len).sum()
    }
}

/// 取消尚未開始的批次；已完成的批次不受影響
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Emits one `error` line per faulted batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn report(&self, fault: &BatchFault) {
        tracing::error!(
            batch = fault.batch.index,
            offset = fault.batch.offset,
            records = fault.batch.len,
            stage = %fault.stage,
            "❌ Batch processing failed: {}",
            fault
        );
    }
}

/// 分批處理記錄：transform -> validate -> store。
///
/// 每個批次獨立處理，單一批次的 transform 或 store 錯誤只會讓該批次的
/// 記錄計入 `error_count`，不會中斷整個執行。驗證失敗的記錄直接丟棄，
/// 不計入任何計數器。
pub struct BatchPipeline<K: Sink> {
    sink: K,
    transformer: Box<dyn Transformer>,
    validator: Box<dyn Validator>,
    reporter: Box<dyn FaultReporter>,
    batch_size: usize,
    processed_count: AtomicUsize,
    error_count: AtomicUsize,
    cancel: CancelHandle,
}

impl<K: Sink> BatchPipeline<K> {
    /// 建立 pipeline；`batch_size` 為 0 時回傳設定錯誤
    pub fn new(sink: K, batch_size: usize) -> Result<Self> {
        validate_positive_number("batch_size", batch_size, 1)?;
        Ok(Self::build(sink, batch_size))
    }

    pub fn with_default_batch_size(sink: K) -> Self {
        Self::build(sink, DEFAULT_BATCH_SIZE)
    }

    fn build(sink: K, batch_size: usize) -> Self {
        Self {
            sink,
            transformer: Box::new(DefaultTransformer::new()),
            validator: Box::new(RequiredFieldsValidator),
            reporter: Box::new(TracingReporter),
            batch_size,
            processed_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformer = Box::new(transformer);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn with_reporter(mut self, reporter: impl FaultReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// 使用外部建立的取消控制
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Lifetime counters, cumulative across every `process` call.
    pub fn stats(&self) -> RunStatistics {
        RunStatistics {
            processed_count: self.processed_count.load(Ordering::SeqCst),
            error_count: self.error_count.load(Ordering::SeqCst),
        }
    }

    /// 處理所有記錄，回傳通過驗證且所屬批次成功的記錄 (保持原順序)
    pub async fn process(&self, records: &[RawRecord]) -> Vec<CanonicalRecord> {
        self.process_with_report(records).await.records
    }

    pub async fn process_with_report(&self, records: &[RawRecord]) -> RunReport {
        let mut report = RunReport {
            batches_total: records.len().div_ceil(self.batch_size),
            ..RunReport::default()
        };

        tracing::debug!(
            "Processing {} records in {} batches of up to {}",
            records.len(),
            report.batches_total,
            self.batch_size
        );

        for (index, chunk) in records.chunks(self.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                report.batches_skipped = report.batches_total - index;
                tracing::warn!(
                    "⏹️ Run cancelled before batch #{}; {} batches skipped",
                    index,
                    report.batches_skipped
                );
                break;
            }

            let batch = BatchInfo {
                index,
                offset: index * self.batch_size,
                len: chunk.len(),
            };

            match self.process_batch(batch, chunk).await {
                BatchOutcome::Stored(valid) => {
                    self.processed_count.fetch_add(valid.len(), Ordering::SeqCst);
                    tracing::debug!("✅ {} stored {} records", batch, valid.len());
                    report.batches_succeeded += 1;
                    report.records.extend(valid);
                }
                BatchOutcome::Faulted(fault) => {
                    // 整個批次的原始記錄數都算錯誤
                    self.error_count.fetch_add(fault.batch.len, Ordering::SeqCst);
                    self.reporter.report(&fault);
                    report.faults.push(fault);
                }
            }
        }

        report
    }

    /// Runs one batch through transform, validate and store. Never touches
    /// the counters; the driver loop applies the outcome.
    pub async fn process_batch(&self, batch: BatchInfo, records: &[RawRecord]) -> BatchOutcome {
        let transformed: Result<Vec<CanonicalRecord>> = records
            .iter()
            .map(|raw| self.transformer.transform(raw))
            .collect();

        let transformed = match transformed {
            Ok(transformed) => transformed,
            Err(error) => {
                return BatchOutcome::Faulted(BatchFault {
                    batch,
                    stage: FaultStage::Transform,
                    error,
                })
            }
        };

        let valid: Vec<CanonicalRecord> = transformed
            .into_iter()
            .filter(|record| self.validator.validate(record))
            .collect();

        match self.sink.store(&valid).await {
            Ok(()) => BatchOutcome::Stored(valid),
            Err(error) => BatchOutcome::Faulted(BatchFault {
                batch,
                stage: FaultStage::Store,
                error,
            }),
        }
    }
}
