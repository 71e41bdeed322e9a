//! Request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stormgr_types::StorageError;

use crate::frame::FrameError;

/// One call on the wire: `{"method", "arguments", "id"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Wire method name.
    pub method: String,
    /// Named arguments.
    #[serde(default)]
    pub arguments: Map<String, Value>,
    /// Correlation id echoed by the response.
    pub id: u64,
}

impl Request {
    /// Decodes a request envelope.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Envelope`] when required fields are missing.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        serde_json::from_value(value).map_err(|error| FrameError::envelope(error.to_string()))
    }

    /// Encodes the request envelope.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if encoding fails.
    pub fn to_value(&self) -> Result<Value, FrameError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default)]
    pub data: Value,
}

impl From<&StorageError> for Fault {
    fn from(error: &StorageError) -> Self {
        Self {
            code: i64::from(error.code().number()),
            message: error.message().to_owned(),
            data: Value::Null,
        }
    }
}

impl From<Fault> for StorageError {
    fn from(fault: Fault) -> Self {
        Self::from_wire(fault.code, &fault.message)
    }
}

/// Reply to one [`Request`]: `{"id", "result"}` or `{"id", "error"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Id of the request being answered.
    pub id: u64,
    /// Result value or fault.
    pub outcome: Result<Value, Fault>,
}

impl Response {
    /// Successful reply.
    #[must_use]
    pub const fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            outcome: Ok(result),
        }
    }

    /// Failed reply.
    #[must_use]
    pub fn failure(id: u64, error: &StorageError) -> Self {
        Self {
            id,
            outcome: Err(Fault::from(error)),
        }
    }

    /// Encodes the response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Json`] if the fault cannot be encoded.
    pub fn to_value(&self) -> Result<Value, FrameError> {
        let mut map = Map::new();
        map.insert("id".to_owned(), Value::from(self.id));
        match &self.outcome {
            Ok(result) => {
                map.insert("result".to_owned(), result.clone());
            }
            Err(fault) => {
                map.insert("error".to_owned(), serde_json::to_value(fault)?);
            }
        }
        Ok(Value::Object(map))
    }

    /// Decodes a response envelope.
    ///
    /// A present `error` member wins over `result`; a missing `result` on a
    /// successful reply is a protocol violation, while an explicit `null`
    /// is a valid empty result.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Envelope`] for any layout violation.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        let Value::Object(mut map) = value else {
            return Err(FrameError::envelope("response is not a JSON object"));
        };
        let id = map
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| FrameError::envelope("response lacks a numeric id"))?;
        if let Some(error) = map.remove("error").filter(|error| !error.is_null()) {
            let fault: Fault = serde_json::from_value(error)
                .map_err(|source| FrameError::envelope(format!("malformed error: {source}")))?;
            return Ok(Self {
                id,
                outcome: Err(fault),
            });
        }
        let result = map
            .remove("result")
            .ok_or_else(|| FrameError::envelope("response has neither result nor error"))?;
        Ok(Self::success(id, result))
    }
}
