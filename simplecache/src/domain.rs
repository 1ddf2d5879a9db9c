use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::config::Config;
use shared::{Result, TtlMs};
use std::collections::HashMap;

pub mod response {
    use super::{CacheEntry, CacheValue, ValueKind};
    use chrono::{DateTime, Utc};

    #[derive(Clone, Debug)]
    pub struct PutResponse {
        pub created: bool,
        pub message: String,
    }

    impl PutResponse {
        pub fn new(created: bool, message: impl Into<String>) -> Self {
            Self {
                created,
                message: message.into(),
            }
        }
    }

    #[derive(Clone, Debug)]
    pub struct DeleteResponse {
        pub deleted: bool,
    }

    impl DeleteResponse {
        pub fn new(deleted: bool) -> Self {
            Self { deleted }
        }
    }

    /// A value read back from the cache together with its stored kind.
    #[derive(Clone, Debug, PartialEq)]
    pub struct Lookup {
        pub value: CacheValue,
        pub kind: ValueKind,
        pub stored_at: DateTime<Utc>,
    }

    impl From<CacheEntry> for Lookup {
        fn from(entry: CacheEntry) -> Self {
            Self {
                kind: entry.value.kind(),
                stored_at: entry.ts,
                value: entry.value,
            }
        }
    }
}

/// The stored type of a [`CacheValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Int,
    Bool,
    Float,
    Map,
    Record,
}

/// A single value held by the cache.
///
/// Records carry any serde-serializable type as a JSON tree, tagged with the
/// Rust type name they were built from. Non-finite floats are written as
/// the strings `"NaN"`, `"inf"` and `"-inf"` so snapshots always load back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Float(#[serde(with = "float_repr")] f64),
    Map(HashMap<String, String>),
    Record {
        type_name: String,
        fields: serde_json::Value,
    },
}

impl CacheValue {
    pub fn record<T: Serialize>(value: &T) -> Result<Self> {
        Ok(CacheValue::Record {
            type_name: std::any::type_name::<T>().to_string(),
            fields: serde_json::to_value(value)?,
        })
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            CacheValue::Text(_) => ValueKind::Text,
            CacheValue::Int(_) => ValueKind::Int,
            CacheValue::Bool(_) => ValueKind::Bool,
            CacheValue::Float(_) => ValueKind::Float,
            CacheValue::Map(_) => ValueKind::Map,
            CacheValue::Record { .. } => ValueKind::Record,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CacheValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CacheValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CacheValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, String>> {
        match self {
            CacheValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Type name recorded when the record was stored.
    pub fn record_type(&self) -> Option<&str> {
        match self {
            CacheValue::Record { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Rebuild a record into `T`
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            CacheValue::Record { fields, .. } => Ok(T::deserialize(fields)?),
            other => Err(shared::Error::TypeMismatch {
                expected: format!("{:?}", ValueKind::Record),
                found: format!("{:?}", other.kind()),
            }),
        }
    }
}

mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Special(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Special(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                _ => Err(serde::de::Error::custom(format!(
                    "invalid float value '{}'",
                    text
                ))),
            },
        }
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(impl From<$t> for CacheValue {
            fn from(value: $t) -> Self {
                CacheValue::Int(i64::from(value))
            }
        })*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<f32> for CacheValue {
    fn from(value: f32) -> Self {
        CacheValue::Float(f64::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Float(value)
    }
}

impl From<HashMap<String, String>> for CacheValue {
    fn from(value: HashMap<String, String>) -> Self {
        CacheValue::Map(value)
    }
}

/// A stored value plus the instant it was written and how long it lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub ts: DateTime<Utc>,
    pub life_time: Option<TtlMs>,
    pub value: CacheValue,
}

impl CacheEntry {
    pub fn new(value: CacheValue, life_time: Option<TtlMs>) -> Self {
        Self {
            ts: Utc::now(),
            life_time,
            value,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.life_time {
            Some(ttl) if !ttl.is_unbounded() => {
                let elapsed = now.signed_duration_since(self.ts).num_milliseconds();
                elapsed >= 0 && elapsed as u64 >= ttl.0
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheOptions {
    pub file_name: String, // snapshot file under <cache_dir>/SimpleCache
    pub auto_save: bool,   // write a snapshot after every mutation
}

impl CacheOptions {
    pub fn new(file_name: impl Into<String>, auto_save: bool) -> Self {
        Self {
            file_name: file_name.into(),
            auto_save,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.file_name.clone(), config.auto_save)
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new(Config::DEFAULT_FILE_NAME, true)
    }
}
