//! Value codecs.
//!
//! A codec translates between the raw JSON stored in the log and the value
//! type a caller works with. Codecs run only at the public boundary, when an
//! entry is handed to or taken from the caller. Repair, verification and
//! chain traversal work on raw JSON and never call into a codec, so a narrow
//! or lossy codec cannot break entries written by a differently-typed client.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("cannot decode value: {0}")]
    Decode(String),

    #[error("cannot encode value: {0}")]
    Encode(String),
}

/// Paired decoder and encoder for one value type.
pub trait ValueCodec<V>: Send + Sync {
    fn decode(&self, raw: &Value) -> Result<V, CodecError>;

    fn encode(&self, value: &V) -> Result<Value, CodecError>;
}

/// Identity codec over untyped JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl ValueCodec<Value> for JsonCodec {
    fn decode(&self, raw: &Value) -> Result<Value, CodecError> {
        Ok(raw.clone())
    }

    fn encode(&self, value: &Value) -> Result<Value, CodecError> {
        Ok(value.clone())
    }
}

/// Codec for any serde type.
pub struct SerdeCodec<T>(PhantomData<fn() -> T>);

impl<T> SerdeCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T: Serialize + DeserializeOwned> ValueCodec<T> for SerdeCodec<T> {
    fn decode(&self, raw: &Value) -> Result<T, CodecError> {
        T::deserialize(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Value, CodecError> {
        serde_json::to_value(value).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

/// Codec assembled from a pair of functions.
pub struct FnCodec<D, E> {
    decode: D,
    encode: E,
}

impl<D, E> FnCodec<D, E> {
    pub fn new(decode: D, encode: E) -> Self {
        Self { decode, encode }
    }
}

impl<V, D, E> ValueCodec<V> for FnCodec<D, E>
where
    D: Fn(&Value) -> Result<V, CodecError> + Send + Sync,
    E: Fn(&V) -> Result<Value, CodecError> + Send + Sync,
{
    fn decode(&self, raw: &Value) -> Result<V, CodecError> {
        (self.decode)(raw)
    }

    fn encode(&self, value: &V) -> Result<Value, CodecError> {
        (self.encode)(value)
    }
}
