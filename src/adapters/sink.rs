use crate::core::{CanonicalRecord, Sink, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// 記憶體內的 sink，用於 dry run 與測試
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<Vec<CanonicalRecord>>>>,
    calls: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty batches in store order.
    pub async fn batches(&self) -> Vec<Vec<CanonicalRecord>> {
        self.batches.lock().await.clone()
    }

    pub async fn records(&self) -> Vec<CanonicalRecord> {
        self.batches.lock().await.iter().flatten().cloned().collect()
    }

    /// 包含空批次在內的呼叫次數
    pub fn store_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if records.is_empty() {
            return Ok(());
        }
        self.batches.lock().await.push(records.to_vec());
        Ok(())
    }
}

/// 每筆記錄以一行 JSON 追加到輸出檔
#[derive(Debug, Clone)]
pub struct JsonLinesSink<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> JsonLinesSink<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[async_trait]
impl<S: Storage> Sink for JsonLinesSink<S> {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        tracing::debug!("Appending {} records to {}", records.len(), self.file_name);
        self.storage
            .append_file(&self.file_name, &buffer)
            .await
            .map_err(|e| EtlError::StoreError {
                message: format!("failed to append to {}: {}", self.file_name, e),
            })
    }
}

/// Bounds every `store` call of the wrapped sink.
#[derive(Debug, Clone)]
pub struct TimeoutSink<K: Sink> {
    inner: K,
    timeout: Duration,
}

impl<K: Sink> TimeoutSink<K> {
    pub fn new(inner: K, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

#[async_trait]
impl<K: Sink> Sink for TimeoutSink<K> {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.inner.store(records)).await {
            Ok(result) => result,
            Err(_) => Err(EtlError::StoreTimeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
