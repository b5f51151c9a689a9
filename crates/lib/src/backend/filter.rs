//! Document selection.

use serde_json::Value;

use super::Document;

/// A conjunction of field equality conditions.
///
/// The empty filter matches every document. Field names address top-level
/// fields only; values compare by JSON equality, so `"1"` does not match `1`.
///
/// ```
/// use userbase::backend::Filter;
/// use serde_json::json;
///
/// let filter = Filter::eq("username", "alice");
/// let doc = json!({"_id": "1", "username": "alice"});
/// assert!(filter.matches(doc.as_object().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Add another equality condition.
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// True when the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The single condition of a one-field filter.
    pub fn single(&self) -> Option<(&str, &Value)> {
        match self.conditions.as_slice() {
            [(field, value)] => Some((field.as_str(), value)),
            _ => None,
        }
    }

    /// Check a document against every condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}
