use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::codec;

/// A 32-byte Blake3 hash of a value's canonical CBOR encoding.
///
/// Two snapshots with the same content key are treated as the same state.
/// Keys are serialized as CBOR byte strings (major type 2), not as arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey([u8; 32]);

impl Serialize for ContentKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl serde::de::Visitor<'_> for KeyVisitor {
            type Value = ContentKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("32-byte content key")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                <[u8; 32]>::try_from(v)
                    .map(ContentKey)
                    .map_err(|_| E::invalid_length(v.len(), &"32 bytes"))
            }
        }

        deserializer.deserialize_bytes(KeyVisitor)
    }
}

impl ContentKey {
    /// Hashes raw bytes.
    pub fn from_data(data: &[u8]) -> Self {
        ContentKey(*blake3::hash(data).as_bytes())
    }

    /// Hashes the canonical encoding of a value.
    ///
    /// Values must serialize deterministically: ordered maps only.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::from_data(&codec::to_bytes(value))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({})", self)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
