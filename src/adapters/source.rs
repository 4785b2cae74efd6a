use crate::core::{RawRecord, RecordSource, Storage};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;

/// 讀取 JSON 陣列或 JSON Lines 檔案
#[derive(Debug, Clone)]
pub struct JsonFileSource<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> JsonFileSource<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    fn parse(content: &str) -> Result<Vec<RawRecord>> {
        let trimmed = content.trim_start();

        let values: Vec<serde_json::Value> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            // JSON Lines：每行一個物件，忽略空行
            trimmed
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str)
                .collect::<std::result::Result<_, _>>()?
        };

        Ok(into_records(values))
    }
}

#[async_trait]
impl<S: Storage> RecordSource for JsonFileSource<S> {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let bytes = self.storage.read_file(&self.path).await?;
        let content = String::from_utf8(bytes).map_err(|e| EtlError::SourceError {
            message: format!("{} is not valid UTF-8: {}", self.path, e),
        })?;
        Self::parse(&content)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path)
    }
}

/// Headered CSV. Integer cells become JSON numbers, everything else a string.
#[derive(Debug, Clone)]
pub struct CsvFileSource<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> CsvFileSource<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    fn parse(bytes: &[u8]) -> Result<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::None)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let mut records = Vec::new();

        for row in reader.records() {
            let row = row?;
            let data: HashMap<String, serde_json::Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.to_string(), cell_value(cell)))
                .collect();
            records.push(RawRecord { data });
        }

        Ok(records)
    }
}

#[async_trait]
impl<S: Storage> RecordSource for CsvFileSource<S> {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let bytes = self.storage.read_file(&self.path).await?;
        Self::parse(&bytes)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path)
    }
}

pub struct ApiSource {
    client: Client,
    endpoint: String,
}

impl ApiSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RecordSource for ApiSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        tracing::debug!("API response status: {}", response.status());
        if !response.status().is_success() {
            return Err(EtlError::SourceError {
                message: format!("{} returned {}", self.endpoint, response.status()),
            });
        }

        let json_data: serde_json::Value = response.json().await?;
        match json_data {
            serde_json::Value::Array(items) => Ok(into_records(items)),
            // 單一物件視為一筆記錄
            serde_json::Value::Object(_) => Ok(RawRecord::from_json(json_data).into_iter().collect()),
            other => Err(EtlError::SourceError {
                message: format!("{} returned a non-object payload: {}", self.endpoint, other),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("api {}", self.endpoint)
    }
}

fn into_records(values: Vec<serde_json::Value>) -> Vec<RawRecord> {
    let total = values.len();
    let records: Vec<RawRecord> = values.into_iter().filter_map(RawRecord::from_json).collect();

    if records.len() < total {
        tracing::warn!("Skipped {} non-object entries", total - records.len());
    }
    records
}

fn cell_value(cell: &str) -> serde_json::Value {
    match cell.parse::<i64>() {
        Ok(n) => serde_json::Value::Number(n.into()),
        Err(_) => serde_json::Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .await
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.entry(path.to_string()).or_default().extend_from_slice(data);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_json_array_source() {
        let storage = MockStorage::with_file(
            "users.json",
            r#"[{"id": 1, "name": "a"}, 42, {"id": 2, "email": "b@x.com"}]"#,
        )
        .await;
        let source = JsonFileSource::new(storage, "users.json");

        let records = source.fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&json!(1)));
        assert_eq!(records[1].get("email"), Some(&json!("b@x.com")));
        assert_eq!(source.describe(), "json file users.json");
    }

    #[tokio::test]
    async fn test_json_lines_source() {
        let storage = MockStorage::with_file(
            "users.jsonl",
            "{\"id\": 1}\n\n{\"id\": 2}\n{\"id\": 3}\n",
        )
        .await;
        let records = JsonFileSource::new(storage, "users.jsonl").fetch().await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.get("id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    }

    #[tokio::test]
    async fn test_json_source_malformed() {
        let storage = MockStorage::with_file("bad.json", "[{\"id\": 1,").await;
        let err = JsonFileSource::new(storage, "bad.json").fetch().await.unwrap_err();
        assert!(matches!(err, EtlError::SerializationError(_)));

        let err = JsonFileSource::new(MockStorage::default(), "missing.json")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }

    #[tokio::test]
    async fn test_csv_source() {
        let storage = MockStorage::with_file(
            "users.csv",
            "id,name,email\n7,  jane doe ,JANE@EXAMPLE.COM\nabc,bob,\n",
        )
        .await;
        let records = CsvFileSource::new(storage, "users.csv").fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&json!(7)));
        assert_eq!(records[0].get("name"), Some(&json!("  jane doe ")));
        assert_eq!(records[1].get("id"), Some(&json!("abc")));
        assert_eq!(records[1].get("email"), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_api_source_array() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([
                    {"id": 1, "name": "a", "email": "a@x.com"},
                    {"id": 2, "name": "b", "email": "b@x.com"}
                ]));
        });

        let records = ApiSource::new(server.url("/users")).fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("name"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_api_source_single_object() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/user");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"id": 9, "name": "solo"}));
        });

        let records = ApiSource::new(server.url("/user")).fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("id"), Some(&json!(9)));
    }

    #[tokio::test]
    async fn test_api_source_failure_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(500);
        });

        let err = ApiSource::new(server.url("/")).fetch().await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, EtlError::SourceError { .. }));
    }
}
