use std::collections::BTreeMap;

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const REQUESTS_COLLECTION: &str = "requests";
pub const CATEGORIES_COLLECTION: &str = "categories";
pub const USERS_COLLECTION: &str = "users";
pub const ADMINS_COLLECTION: &str = "admins";

/// A single document field. The store is schemaless; the app layer converts
/// documents to and from its typed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FieldValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Str(s) => serde_json::Value::from(s.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// One stored document: a generated id plus its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_str)
    }

    #[must_use]
    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(FieldValue::as_int)
    }

    #[must_use]
    pub fn str_field_or_empty(&self, name: &str) -> String {
        self.str_field(name).unwrap_or_default().to_string()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("id".into(), serde_json::Value::from(self.id.clone()));
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

/// Equality filter over one field. The store supports no other predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub field: String,
    pub equals: FieldValue,
}

impl DocumentFilter {
    #[must_use]
    pub fn field_eq(field: impl Into<String>, equals: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }
}

/// Identifies one live watch so snapshots can be matched to their consumer
/// and the watch can be released when that consumer goes away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchToken(pub String);

impl WatchToken {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WatchToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum StoreOperation {
    Create {
        collection: String,
        fields: Fields,
    },
    Get {
        collection: String,
        id: String,
    },
    Query {
        collection: String,
        filter: Option<DocumentFilter>,
    },
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    Delete {
        collection: String,
        id: String,
    },
    Watch {
        collection: String,
        filter: Option<DocumentFilter>,
        token: WatchToken,
    },
    Unwatch {
        token: WatchToken,
    },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("operation timed out")]
    Timeout,

    #[error("permission denied")]
    PermissionDenied,

    #[error("malformed document: {message}")]
    Malformed { message: String },

    #[error("unknown store error: {message}")]
    Unknown { message: String },
}

impl StoreError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StoreOutput {
    Created { id: String },
    Document(Option<Document>),
    Documents(Vec<Document>),
    Snapshot {
        token: WatchToken,
        documents: Vec<Document>,
    },
    Updated { id: String },
    Deleted { id: String },
    Unwatched { token: WatchToken },
}

#[must_use = "store operation results must be handled"]
pub type StoreResult = Result<StoreOutput, StoreError>;

impl Operation for StoreOperation {
    type Output = StoreResult;
}

#[derive(Clone)]
pub struct Store<E> {
    context: CapabilityContext<StoreOperation, E>,
}

impl<Ev> Capability<Ev> for Store<Ev> {
    type Operation = StoreOperation;
    type MappedSelf<MappedEv> = Store<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Store::new(self.context.map_event(f))
    }
}

impl<E> Store<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<StoreOperation, E>) -> Self {
        Self { context }
    }

    /// Create a document with a store-generated id.
    pub fn create<F>(&self, collection: &str, fields: Fields, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        self.request(
            StoreOperation::Create {
                collection: collection.to_string(),
                fields,
            },
            callback,
        );
    }

    /// Point lookup by id. A missing document is `Ok(Document(None))`, not an
    /// error.
    pub fn get<F>(&self, collection: &str, id: &str, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        self.request(
            StoreOperation::Get {
                collection: collection.to_string(),
                id: id.to_string(),
            },
            callback,
        );
    }

    /// One-shot equality-filtered query; `None` fetches the whole collection.
    pub fn query<F>(&self, collection: &str, filter: Option<DocumentFilter>, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        self.request(
            StoreOperation::Query {
                collection: collection.to_string(),
                filter,
            },
            callback,
        );
    }

    /// Merge `fields` into an existing document (last writer wins).
    pub fn update<F>(&self, collection: &str, id: &str, fields: Fields, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        self.request(
            StoreOperation::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
            callback,
        );
    }

    pub fn delete<F>(&self, collection: &str, id: &str, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        self.request(
            StoreOperation::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
            callback,
        );
    }

    /// Open a live watch. The callback fires once per snapshot until the
    /// token is released with [`Store::unwatch`].
    pub fn watch<F>(
        &self,
        collection: &str,
        filter: Option<DocumentFilter>,
        token: WatchToken,
        callback: F,
    ) where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        use futures::StreamExt;
        let ctx = self.context.clone();
        let operation = StoreOperation::Watch {
            collection: collection.to_string(),
            filter,
            token,
        };
        self.context.spawn(async move {
            let mut stream = ctx.stream_from_shell(operation);
            while let Some(output) = stream.next().await {
                ctx.update_app(callback(output));
            }
        });
    }

    pub fn unwatch(&self, token: WatchToken) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(StoreOperation::Unwatch { token }).await;
        });
    }

    fn request<F>(&self, operation: StoreOperation, callback: F)
    where
        F: Fn(StoreResult) -> E + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(output));
        });
    }
}
