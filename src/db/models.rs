use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Operator-supplied WHERE clause. Never parsed, only forwarded to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate(String);

impl Predicate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Joins lines typed at the prompt into a single clause.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Partition key of one document, kept as JSON so numeric and boolean keys route correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKeyValue(Value);

impl PartitionKeyValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    /// Value of the `x-ms-documentdb-partitionkey` header. A missing key maps to `[{}]`.
    pub fn header_value(key: Option<&Self>) -> String {
        match key {
            Some(key) => Value::Array(vec![key.0.clone()]).to_string(),
            None => "[{}]".to_string(),
        }
    }
}

impl fmt::Display for PartitionKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for PartitionKeyValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One row of a page: the id and, in cross-partition mode, its partition key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRef {
    pub id: DocumentId,
    #[serde(default, rename = "partitionKey")]
    pub partition_key: Option<PartitionKeyValue>,
}

impl DocumentRef {
    pub fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            id: id.into(),
            partition_key: None,
        }
    }

    pub fn with_partition_key(mut self, key: impl Into<PartitionKeyValue>) -> Self {
        self.partition_key = Some(key.into());
        self
    }
}
