use crate::domain::model::CanonicalRecord;
use crate::domain::ports::Validator;

/// `id`, `name`, `email` 必須存在且為 truthy 值。不會失敗。
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsValidator;

impl Validator for RequiredFieldsValidator {
    fn validate(&self, record: &CanonicalRecord) -> bool {
        record.id.as_ref().is_some_and(is_truthy)
            && !record.name.is_empty()
            && !record.email.is_empty()
    }
}

/// Wraps a plain predicate as a [`Validator`].
pub struct FnValidator<F>(pub F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&CanonicalRecord) -> bool + Send + Sync,
{
    fn validate(&self, record: &CanonicalRecord) -> bool {
        (self.0)(record)
    }
}

/// null, false, 0, 空字串、空陣列與空物件皆為 falsy
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}
