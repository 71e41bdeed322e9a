//! Typed per-operation contracts.
//!
//! Each wire method is a struct implementing [`Operation`]: its fields are
//! the named arguments and its `Output` declares the result shape. Clients
//! encode arguments from the struct and decode replies through
//! [`WireValue::from_wire`], which rejects anything that does not match the
//! declared shape with a plugin-bug error. Plugin sessions run the same
//! contract in reverse.

pub mod ops;
mod shapes;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use stormgr_types::{
    AccessGroup, Capabilities, Disk, FileSystem, FsSnapshot, JobId, NfsExport, Pool, Record,
    StorageError, System, TargetPort, Volume,
};

pub use shapes::{JobOr, JobProgress, PluginDescription};

/// One wire method with typed arguments and a declared result shape.
pub trait Operation: Serialize + DeserializeOwned {
    /// Wire method name.
    const METHOD: &'static str;

    /// Declared result shape.
    type Output: WireValue;

    /// Checks arguments locally before anything is sent.
    ///
    /// # Errors
    ///
    /// Listing operations reject search keys the entity does not support.
    fn validate(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Value with a fixed JSON shape on the wire.
pub trait WireValue: Sized {
    /// Shape name used in diagnostics.
    const SHAPE: &'static str;

    /// Encodes the value.
    ///
    /// # Errors
    ///
    /// Fails with a plugin-bug error if the value cannot be represented.
    fn to_wire(&self) -> Result<Value, StorageError>;

    /// Decodes and verifies a value.
    ///
    /// # Errors
    ///
    /// Fails with a plugin-bug error when `value` does not have the shape.
    fn from_wire(value: Value) -> Result<Self, StorageError>;
}

/// Encodes an operation's named arguments.
///
/// # Errors
///
/// Fails with a library-bug error if the arguments are not a JSON object.
pub fn encode_arguments<O: Operation>(operation: &O) -> Result<Map<String, Value>, StorageError> {
    match serde_json::to_value(operation) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StorageError::new(
            stormgr_types::ErrorCode::LibBug,
            format!("arguments for {} encoded as {other}", O::METHOD),
        )),
        Err(error) => Err(StorageError::new(
            stormgr_types::ErrorCode::LibBug,
            format!("failed to encode arguments for {}: {error}", O::METHOD),
        )),
    }
}

/// Decodes an operation's named arguments on the plugin side.
///
/// # Errors
///
/// Fails with an invalid-argument error naming the method.
pub fn decode_arguments<O: Operation>(arguments: Map<String, Value>) -> Result<O, StorageError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|error| {
        StorageError::invalid_argument(format!("invalid arguments for {}: {error}", O::METHOD))
    })
}

pub(crate) fn mismatch(expected: &str, value: &Value) -> StorageError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    StorageError::plugin_bug(format!("expected {expected} in reply, found {found}"))
}

fn encode_serde<T: Serialize>(value: &T, shape: &str) -> Result<Value, StorageError> {
    serde_json::to_value(value)
        .map_err(|error| StorageError::plugin_bug(format!("failed to encode {shape}: {error}")))
}

fn decode_tagged<T: DeserializeOwned>(value: Value, class: &str) -> Result<T, StorageError> {
    let tag = match &value {
        Value::Object(map) => map.get("class").and_then(Value::as_str),
        other => return Err(mismatch(class, other)),
    };
    if tag != Some(class) {
        return Err(StorageError::plugin_bug(format!(
            "expected {class} in reply, found class {}",
            tag.unwrap_or("<missing>")
        )));
    }
    serde_json::from_value(value)
        .map_err(|error| StorageError::plugin_bug(format!("malformed {class}: {error}")))
}

macro_rules! record_wire_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl WireValue for $ty {
                const SHAPE: &'static str = <$ty as Record>::CLASS;

                fn to_wire(&self) -> Result<Value, StorageError> {
                    encode_serde(self, Self::SHAPE)
                }

                fn from_wire(value: Value) -> Result<Self, StorageError> {
                    decode_tagged(value, Self::SHAPE)
                }
            }
        )+
    };
}

record_wire_value!(
    System,
    Pool,
    Volume,
    Disk,
    AccessGroup,
    FileSystem,
    FsSnapshot,
    NfsExport,
    TargetPort,
);

impl WireValue for Capabilities {
    const SHAPE: &'static str = "Capabilities";

    fn to_wire(&self) -> Result<Value, StorageError> {
        encode_serde(self, Self::SHAPE)
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        decode_tagged(value, Self::SHAPE)
    }
}

impl WireValue for () {
    const SHAPE: &'static str = "null";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::Null)
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Null => Ok(()),
            other => Err(mismatch(Self::SHAPE, &other)),
        }
    }
}

impl WireValue for bool {
    const SHAPE: &'static str = "bool";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::Bool(*self))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        value.as_bool().ok_or_else(|| mismatch(Self::SHAPE, &value))
    }
}

impl WireValue for u32 {
    const SHAPE: &'static str = "unsigned integer";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::from(*self))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        value
            .as_u64()
            .and_then(|number| Self::try_from(number).ok())
            .ok_or_else(|| mismatch(Self::SHAPE, &value))
    }
}

impl WireValue for String {
    const SHAPE: &'static str = "string";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::String(self.clone()))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::String(text) => Ok(text),
            other => Err(mismatch(Self::SHAPE, &other)),
        }
    }
}

impl WireValue for JobId {
    const SHAPE: &'static str = "job id";

    fn to_wire(&self) -> Result<Value, StorageError> {
        Ok(Value::String(self.as_str().to_owned()))
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::String(text) => Ok(Self::new(text)),
            other => Err(mismatch(Self::SHAPE, &other)),
        }
    }
}

impl<T: WireValue> WireValue for Vec<T> {
    const SHAPE: &'static str = "sequence";

    fn to_wire(&self) -> Result<Value, StorageError> {
        self.iter()
            .map(WireValue::to_wire)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_wire).collect(),
            other => Err(mismatch(Self::SHAPE, &other)),
        }
    }
}

impl<T: WireValue> WireValue for Option<T> {
    const SHAPE: &'static str = T::SHAPE;

    fn to_wire(&self) -> Result<Value, StorageError> {
        self.as_ref().map_or(Ok(Value::Null), WireValue::to_wire)
    }

    fn from_wire(value: Value) -> Result<Self, StorageError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_wire(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests;
