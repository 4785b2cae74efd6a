use async_trait::async_trait;
use batch_etl::core::{FaultReporter, Sink, Transformer};
use batch_etl::{
    BatchFault, BatchPipeline, CanonicalRecord, DefaultTransformer, EtlError, FaultStage,
    FnTransformer, MemorySink, RawRecord, Result, RunStatistics,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Fails the store call for every batch whose first record id is listed.
#[derive(Clone, Default)]
struct FlakySink {
    inner: MemorySink,
    fail_first_ids: Vec<i64>,
}

#[async_trait]
impl Sink for FlakySink {
    async fn store(&self, records: &[CanonicalRecord]) -> Result<()> {
        let first = records.first().and_then(|r| r.id.as_ref()).and_then(|id| id.as_i64());
        if let Some(id) = first {
            if self.fail_first_ids.contains(&id) {
                return Err(EtlError::StoreError {
                    message: format!("rejected write starting at id {}", id),
                });
            }
        }
        self.inner.store(records).await
    }
}

#[derive(Clone, Default)]
struct CollectingReporter {
    faults: Arc<Mutex<Vec<(usize, usize, FaultStage, String)>>>,
}

impl CollectingReporter {
    fn faults(&self) -> Vec<(usize, usize, FaultStage, String)> {
        self.faults.lock().unwrap().clone()
    }
}

impl FaultReporter for CollectingReporter {
    fn report(&self, fault: &BatchFault) {
        self.faults.lock().unwrap().push((
            fault.batch.index,
            fault.batch.offset,
            fault.stage,
            fault.error.to_string(),
        ));
    }
}

fn user(id: i64) -> RawRecord {
    RawRecord::new()
        .with_field("id", id)
        .with_field("name", format!("user {}", id))
        .with_field("email", format!("user{}@example.com", id))
}

fn users(range: std::ops::Range<i64>) -> Vec<RawRecord> {
    range.map(user).collect()
}

fn ids(records: &[CanonicalRecord]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.id.as_ref().and_then(|id| id.as_i64()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_order_preserved_across_batches() {
    let pipeline = BatchPipeline::new(MemorySink::new(), 3).unwrap();
    let mut records = users(1..11);
    // 兩筆無效記錄夾在中間
    records[4] = RawRecord::new().with_field("id", 5);
    records[8] = RawRecord::new().with_field("name", "nobody");

    let output = pipeline.process(&records).await;

    assert_eq!(ids(&output), vec![1, 2, 3, 4, 6, 7, 8, 10]);
}

#[tokio::test]
async fn test_store_fault_isolated_to_one_batch() {
    let sink = FlakySink {
        fail_first_ids: vec![1001],
        ..FlakySink::default()
    };
    let reporter = CollectingReporter::default();
    let pipeline = BatchPipeline::new(sink.clone(), 1000)
        .unwrap()
        .with_reporter(reporter.clone());

    let output = pipeline.process(&users(1..3001)).await;

    let expected: Vec<i64> = (1..1001).chain(2001..3001).collect();
    assert_eq!(ids(&output), expected);
    assert_eq!(
        pipeline.stats(),
        RunStatistics {
            processed_count: 2000,
            error_count: 1000,
        }
    );
    assert_eq!(sink.inner.batches().await.len(), 2);

    let faults = reporter.faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].0, 1);
    assert_eq!(faults[0].1, 1000);
    assert_eq!(faults[0].2, FaultStage::Store);
    assert!(faults[0].3.contains("rejected write starting at id 1001"));
}

#[tokio::test]
async fn test_transform_fault_fails_whole_batch() {
    let reporter = CollectingReporter::default();
    let sink = MemorySink::new();
    let pipeline = BatchPipeline::new(sink.clone(), 1000)
        .unwrap()
        .with_reporter(reporter.clone())
        .with_transformer(FnTransformer(|raw: &RawRecord| -> Result<CanonicalRecord> {
            if raw.get("id") == Some(&json!(1500)) {
                return Err(EtlError::TransformError {
                    message: "malformed record 1500".to_string(),
                });
            }
            DefaultTransformer::new().transform(raw)
        }));

    let output = pipeline.process(&users(1..2501)).await;

    let expected: Vec<i64> = (1..1001).chain(2001..2501).collect();
    assert_eq!(ids(&output), expected);
    // 失敗批次的全部 1000 筆都計入錯誤
    assert_eq!(pipeline.stats().error_count, 1000);
    assert_eq!(pipeline.stats().processed_count, 1500);
    // transform 失敗時 sink 不會被呼叫
    assert_eq!(sink.store_calls(), 2);

    let faults = reporter.faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].2, FaultStage::Transform);
}

#[tokio::test]
async fn test_default_transformer_fault_on_non_string_email() {
    let pipeline = BatchPipeline::new(MemorySink::new(), 2).unwrap();
    let mut records = users(1..5);
    records[3] = user(4).with_field("email", json!(["not", "a", "string"]));

    let output = pipeline.process(&records).await;

    assert_eq!(ids(&output), vec![1, 2]);
    assert_eq!(
        pipeline.stats(),
        RunStatistics {
            processed_count: 2,
            error_count: 2,
        }
    );
}

#[tokio::test]
async fn test_validation_rejections_are_silent() {
    let reporter = CollectingReporter::default();
    let pipeline = BatchPipeline::new(MemorySink::new(), 2)
        .unwrap()
        .with_reporter(reporter.clone());

    let records = vec![
        user(1),
        RawRecord::new().with_field("id", 0).with_field("name", "zero").with_field("email", "z@x.com"),
        RawRecord::new().with_field("id", 3).with_field("name", "   ").with_field("email", "c@x.com"),
        user(4),
    ];

    let report = pipeline.process_with_report(&records).await;

    assert_eq!(ids(&report.records), vec![1, 4]);
    assert!(report.faults.is_empty());
    assert!(reporter.faults().is_empty());
    assert_eq!(pipeline.stats().error_count, 0);
    assert_eq!(pipeline.stats().processed_count, 2);
}

#[tokio::test]
async fn test_counters_match_output_without_faults() {
    let pipeline = BatchPipeline::new(MemorySink::new(), 7).unwrap();
    let mut records = users(1..51);
    records.push(RawRecord::new());

    let output = pipeline.process(&records).await;

    assert_eq!(output.len(), 50);
    assert_eq!(pipeline.stats().processed_count, output.len());
    assert_eq!(pipeline.stats().error_count, 0);
}

#[tokio::test]
async fn test_all_invalid_batch_still_stores_empty() {
    let sink = MemorySink::new();
    let reporter = CollectingReporter::default();
    let pipeline = BatchPipeline::new(sink.clone(), 2)
        .unwrap()
        .with_reporter(reporter.clone());

    let records = vec![
        RawRecord::new().with_field("id", 1),
        RawRecord::new().with_field("email", "x@x.com"),
    ];

    let report = pipeline.process_with_report(&records).await;

    assert_eq!(sink.store_calls(), 1);
    assert!(sink.batches().await.is_empty());
    assert_eq!(report.batches_succeeded, 1);
    assert!(report.records.is_empty());
    assert_eq!(pipeline.stats(), RunStatistics::default());
    assert!(reporter.faults().is_empty());
}

#[tokio::test]
async fn test_field_normalization() {
    let pipeline = BatchPipeline::new(MemorySink::new(), 10).unwrap();
    let raw = RawRecord::new()
        .with_field("id", 7)
        .with_field("name", "  jane doe ")
        .with_field("email", " JANE@EXAMPLE.COM ");

    let output = pipeline.process(&[raw]).await;

    assert_eq!(output.len(), 1);
    let record = &output[0];
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.email, "jane@example.com");
    assert_eq!(record.id, Some(json!(7)));
    assert!(record.processed);
    assert!(!record.created_at.is_empty());
}

#[tokio::test]
async fn test_null_name_faults_whole_batch() {
    let reporter = CollectingReporter::default();
    let pipeline = BatchPipeline::new(MemorySink::new(), 2)
        .unwrap()
        .with_reporter(reporter.clone());
    let records = vec![
        user(1),
        user(2).with_field("name", serde_json::Value::Null),
        user(3),
    ];

    let output = pipeline.process(&records).await;

    assert_eq!(ids(&output), vec![3]);
    assert_eq!(
        pipeline.stats(),
        RunStatistics {
            processed_count: 1,
            error_count: 2,
        }
    );
    let faults = reporter.faults();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].2, FaultStage::Transform);
}

static TICKS: AtomicI64 = AtomicI64::new(0);

/// 每次呼叫前進一秒
fn ticking_clock() -> DateTime<Utc> {
    let tick = TICKS.fetch_add(1, Ordering::SeqCst);
    Utc.timestamp_opt(1_700_000_000 + tick, 0).unwrap()
}

#[tokio::test]
async fn test_created_at_taken_per_record() {
    let pipeline = BatchPipeline::new(MemorySink::new(), 10)
        .unwrap()
        .with_transformer(DefaultTransformer::with_clock(ticking_clock));

    let output = pipeline.process(&users(1..6)).await;

    assert_eq!(output.len(), 5);
    let stamps: HashSet<&str> = output.iter().map(|r| r.created_at.as_str()).collect();
    assert_eq!(stamps.len(), 5);
    // 同一批次內的時間戳依處理順序遞增
    assert!(output.windows(2).all(|w| w[0].created_at < w[1].created_at));
}

#[tokio::test]
async fn test_end_to_end_example() {
    let sink = MemorySink::new();
    let pipeline = BatchPipeline::new(sink.clone(), 2).unwrap();
    let records = vec![
        RawRecord::new().with_field("id", 1).with_field("name", "a").with_field("email", "a@x.com"),
        RawRecord::new().with_field("id", 2).with_field("name", "").with_field("email", ""),
        RawRecord::new().with_field("id", 3).with_field("name", "c").with_field("email", "c@x.com"),
    ];

    let output = pipeline.process(&records).await;

    assert_eq!(ids(&output), vec![1, 3]);
    assert_eq!(output[0].name, "A");
    assert_eq!(output[1].name, "C");
    assert_eq!(pipeline.stats().processed_count, 2);
    assert_eq!(pipeline.stats().error_count, 0);
    assert_eq!(sink.batches().await.len(), 2);
}

#[tokio::test]
async fn test_empty_input() {
    let sink = MemorySink::new();
    let pipeline = BatchPipeline::new(sink.clone(), 5).unwrap();

    let report = pipeline.process_with_report(&[]).await;

    assert!(report.records.is_empty());
    assert_eq!(report.batches_total, 0);
    assert_eq!(sink.store_calls(), 0);
}

#[tokio::test]
async fn test_short_final_batch() {
    let reporter = CollectingReporter::default();
    let sink = FlakySink {
        fail_first_ids: vec![9],
        ..FlakySink::default()
    };
    let pipeline = BatchPipeline::new(sink, 4)
        .unwrap()
        .with_reporter(reporter.clone());

    let report = pipeline.process_with_report(&users(1..11)).await;

    assert_eq!(report.batches_total, 3);
    assert_eq!(report.faulted_records(), 2);
    assert_eq!(pipeline.stats().error_count, 2);
    assert_eq!(reporter.faults()[0].1, 8);
}

#[test]
fn test_zero_batch_size_rejected_before_processing() {
    let err = BatchPipeline::new(MemorySink::new(), 0).err().unwrap();
    assert!(matches!(err, EtlError::InvalidConfigValueError { .. }));
}
