use crate::core::batch_pipeline::BatchPipeline;
use crate::domain::model::RunStatistics;
use crate::domain::ports::{RecordSource, Sink};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;
use std::time::Instant;

/// 單次執行的摘要，CLI 以 JSON 輸出
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub fetched: usize,
    pub stored: usize,
    pub batches: usize,
    pub faulted_batches: usize,
    pub faulted_records: usize,
    pub cancelled: bool,
    pub statistics: RunStatistics,
    pub duration_ms: u64,
}

pub struct EtlEngine<R: RecordSource, K: Sink> {
    source: R,
    pipeline: BatchPipeline<K>,
    monitor: SystemMonitor,
}

impl<R: RecordSource, K: Sink> EtlEngine<R, K> {
    pub fn new(source: R, pipeline: BatchPipeline<K>) -> Self {
        Self::new_with_monitoring(source, pipeline, false)
    }

    pub fn new_with_monitoring(source: R, pipeline: BatchPipeline<K>, monitor_enabled: bool) -> Self {
        Self {
            source,
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &BatchPipeline<K> {
        &self.pipeline
    }

    /// 讀取來源後分批處理。來源錯誤會直接回傳；批次錯誤只記錄在摘要中
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        let source = self.source.describe();
        tracing::info!("🚀 Starting batch ETL from {}", source);

        if self.monitor.is_enabled() {
            self.monitor.log_stats("Before extract");
        }

        let records = self.source.fetch().await?;
        tracing::info!("📥 Fetched {} records", records.len());

        let report = self.pipeline.process_with_report(&records).await;

        if self.monitor.is_enabled() {
            self.monitor.log_stats("After processing");
            self.monitor.log_final_stats();
        }

        let summary = RunSummary {
            source,
            fetched: records.len(),
            stored: report.records.len(),
            batches: report.batches_total,
            faulted_batches: report.faults.len(),
            faulted_records: report.faulted_records(),
            cancelled: report.cancelled,
            statistics: self.pipeline.stats(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        if summary.faulted_batches > 0 {
            tracing::warn!(
                "⚠️ Finished with {} failed batches ({} records)",
                summary.faulted_batches,
                summary.faulted_records
            );
        } else {
            tracing::info!("✅ Stored {} of {} records", summary.stored, summary.fetched);
        }

        Ok(summary)
    }
}
