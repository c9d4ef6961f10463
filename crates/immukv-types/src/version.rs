//! Opaque identifiers minted by the object store.
//!
//! The store hands these out and the protocol only ever compares and echoes
//! them back, so they carry no structure beyond being non-empty. Keeping one
//! type per role stops a key-object version id from being used as a log
//! cursor, or an etag from being used as a version id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a store-provided identifier. Empty strings are rejected.
            pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(TypeError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

store_id!(
    /// Version id of one log-object version, i.e. of one log entry.
    LogVersionId,
    "log version id"
);

store_id!(
    /// Version id of one key-object version. Used as the `history` cursor.
    KeyVersionId,
    "key version id"
);

store_id!(
    /// Content fingerprint returned by the store, used in `If-Match`.
    ETag,
    "etag"
);
