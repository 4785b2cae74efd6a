use crate::adapters::sink::{JsonLinesSink, MemorySink, TimeoutSink};
use crate::adapters::source::{ApiSource, CsvFileSource, JsonFileSource};
use crate::adapters::storage::LocalStorage;
use crate::config::SourceKind;
use crate::core::batch_pipeline::BatchPipeline;
use crate::core::etl::EtlEngine;
use crate::core::{ConfigProvider, RecordSource, Sink};
use crate::utils::error::Result;

pub type DynEngine = EtlEngine<Box<dyn RecordSource>, Box<dyn Sink>>;

/// 輸入檔路徑相對於目前工作目錄
pub fn build_source(kind: &SourceKind) -> Box<dyn RecordSource> {
    let storage = LocalStorage::new(".".to_string());
    match kind {
        SourceKind::Json { path } => Box::new(JsonFileSource::new(storage, path.clone())),
        SourceKind::Csv { path } => Box::new(CsvFileSource::new(storage, path.clone())),
        SourceKind::Api { endpoint } => Box::new(ApiSource::new(endpoint.clone())),
    }
}

/// dry run 時寫入記憶體；有設定 timeout 時包一層 TimeoutSink
pub fn build_sink<C: ConfigProvider>(config: &C, dry_run: bool) -> Box<dyn Sink> {
    let sink: Box<dyn Sink> = if dry_run {
        Box::new(MemorySink::new())
    } else {
        let storage = LocalStorage::new(config.output_path().to_string());
        Box::new(JsonLinesSink::new(storage, config.output_file()))
    };

    match config.store_timeout() {
        Some(timeout) => Box::new(TimeoutSink::new(sink, timeout)),
        None => sink,
    }
}

pub fn build_engine<C: ConfigProvider>(config: &C, dry_run: bool, monitor: bool) -> Result<DynEngine> {
    let source = build_source(&config.source()?);
    let pipeline = BatchPipeline::new(build_sink(config, dry_run), config.batch_size())?;
    Ok(EtlEngine::new_with_monitoring(source, pipeline, monitor))
}
