use crate::domain::model::{BatchFault, CanonicalRecord, RawRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 單筆原始記錄轉換成標準記錄；回傳錯誤會讓整個批次失敗
pub trait Transformer: Send + Sync {
    fn transform(&self, raw: &RawRecord) -> Result<CanonicalRecord>;
}

/// 純函式判斷，false 代表過濾掉而非錯誤
pub trait Validator: Send + Sync {
    fn validate(&self, record: &CanonicalRecord) -> bool;
}

/// 持久化一個批次。空序列必須視為成功
#[async_trait]
pub trait Sink: Send + Sync {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()>;
}

#[async_trait]
impl<K: Sink + ?Sized> Sink for Box<K> {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        (**self).store(records).await
    }
}

#[async_trait]
impl<K: Sink + ?Sized> Sink for std::sync::Arc<K> {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        (**self).store(records).await
    }
}

/// Supplies the full input for one engine run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRecord>>;

    fn describe(&self) -> String;
}

#[async_trait]
impl<R: RecordSource + ?Sized> RecordSource for Box<R> {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        (**self).fetch().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Receives one report per faulted batch.
pub trait FaultReporter: Send + Sync {
    fn report(&self, fault: &BatchFault);
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn batch_size(&self) -> usize;
    fn source(&self) -> Result<crate::config::SourceKind>;
    fn output_path(&self) -> &str;
    fn output_file(&self) -> &str;
    fn store_timeout(&self) -> Option<Duration>;
}
