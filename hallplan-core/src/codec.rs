//! CBOR encoding shared by content keys and persisted records.

use serde::Serialize;
use serde::de::DeserializeOwned;

pub type DecodeError = ciborium::de::Error<std::io::Error>;

/// Serializes a value to CBOR bytes.
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).expect("serialization should not fail");
    bytes
}

/// Deserializes a value from CBOR bytes.
pub fn from_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T, DecodeError> {
    ciborium::from_reader(data)
}
