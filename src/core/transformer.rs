use crate::domain::model::{CanonicalRecord, RawRecord};
use crate::domain::ports::Transformer;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// 預設轉換規則：
/// - `name` 去除前後空白後每個字首字母大寫
/// - `email` 去除前後空白並轉小寫
/// - `id` 原樣保留 (null 或缺少時為 None)
/// - `created_at` 為轉換當下的 ISO-8601 時間
/// - `processed` 固定為 true
#[derive(Debug, Clone)]
pub struct DefaultTransformer {
    clock: fn() -> DateTime<Utc>,
}

impl DefaultTransformer {
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// 測試時可注入固定時鐘
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }

    /// A missing field normalizes to an empty string. Any present value that
    /// is not a string (`null` included) is a malformed record.
    fn text_field<'a>(raw: &'a RawRecord, field: &str) -> Result<&'a str> {
        match raw.get(field) {
            None => Ok(""),
            Some(serde_json::Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(EtlError::TransformError {
                message: format!(
                    "field `{}` must be a string, got {}",
                    field,
                    json_type_name(other)
                ),
            }),
        }
    }
}

impl Default for DefaultTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for DefaultTransformer {
    fn transform(&self, raw: &RawRecord) -> Result<CanonicalRecord> {
        let name = Self::text_field(raw, "name")?;
        let email = Self::text_field(raw, "email")?;

        let id = match raw.get("id") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(value.clone()),
        };

        Ok(CanonicalRecord {
            id,
            name: title_case(name.trim()),
            email: email.trim().to_lowercase(),
            created_at: (self.clock)().to_rfc3339_opts(SecondsFormat::Micros, true),
            processed: true,
        })
    }
}

/// Wraps a plain function or closure as a [`Transformer`].
pub struct FnTransformer<F>(pub F);

impl<F> Transformer for FnTransformer<F>
where
    F: Fn(&RawRecord) -> Result<CanonicalRecord> + Send + Sync,
{
    fn transform(&self, raw: &RawRecord) -> Result<CanonicalRecord> {
        (self.0)(raw)
    }
}

/// 每段有大小寫之分的字元序列，第一個字大寫、其餘小寫 ("o'neil" -> "O'Neil")。
/// 無大小寫的字元 (數字、標點、CJK) 會切斷字詞。
pub fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_is_cased = false;

    for c in input.chars() {
        if previous_is_cased {
            output.extend(c.to_lowercase());
        } else {
            output.push_str(&titlecase_char(c));
        }
        previous_is_cased = c.is_lowercase() || c.is_uppercase();
    }

    output
}

/// Unicode title case for the handful of characters whose title form differs
/// from their upper form; everything else falls back to `to_uppercase`.
fn titlecase_char(c: char) -> String {
    match c {
        'ß' => "Ss".to_string(),
        'ﬀ' => "Ff".to_string(),
        'ﬁ' => "Fi".to_string(),
        'ﬂ' => "Fl".to_string(),
        _ => c.to_uppercase().collect(),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
