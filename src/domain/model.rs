use crate::utils::error::EtlError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始輸入記錄：欄位名稱對應任意 JSON 值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只接受 JSON 物件，其他型別回傳 None
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(obj) => Some(Self {
                data: obj.into_iter().collect(),
            }),
            _ => None,
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// 經過正規化的記錄，只由 Transformer 產生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: Option<serde_json::Value>,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub processed: bool,
}

/// A contiguous slice of the input, identified by its position in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchInfo {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
}

impl BatchInfo {
    /// 最後一筆記錄的位置 (不含)
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl std::fmt::Display for BatchInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batch #{} (records {}..{})",
            self.index,
            self.offset,
            self.end()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultStage {
    Transform,
    Store,
}

impl std::fmt::Display for FaultStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultStage::Transform => f.write_str("transform"),
            FaultStage::Store => f.write_str("store"),
        }
    }
}

/// 批次失敗的描述；整個批次的記錄都算進 error_count
#[derive(Debug)]
pub struct BatchFault {
    pub batch: BatchInfo,
    pub stage: FaultStage,
    pub error: EtlError,
}

impl std::fmt::Display for BatchFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed during {}: {}", self.batch, self.stage, self.error)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub processed_count: usize,
    pub error_count: usize,
}
