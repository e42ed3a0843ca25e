use crate::error::{MerkleTreeError, Result};

pub type Bytes32 = [u8; 32];
pub type HexString = String;

pub fn hex_to_bytes32(s: &str) -> Result<Bytes32> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| MerkleTreeError::HexDecode(e.to_string()))?;
    bytes.try_into().map_err(|_| MerkleTreeError::InvalidNodeLength)
}

#[must_use]
pub fn bytes32_to_hex(bytes: &Bytes32) -> HexString {
    format!("0x{}", hex::encode(bytes))
}

/// Concatenates two hashes as `left ‖ right`.
#[must_use]
pub fn concat(left: &Bytes32, right: &Bytes32) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(left);
    out[32..].copy_from_slice(right);
    out
}

/// Concatenates two hashes smallest first, so that the result does not
/// depend on argument order.
#[must_use]
pub fn concat_sorted(a: &Bytes32, b: &Bytes32) -> [u8; 64] {
    if a <= b { concat(a, b) } else { concat(b, a) }
}

/// Serde adapter storing a `Bytes32` as a `0x`-prefixed hex string.
pub mod hex32 {
    use super::{Bytes32, bytes32_to_hex, hex_to_bytes32};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Bytes32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes32_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes32, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex_to_bytes32(&s).map_err(D::Error::custom)
    }
}

/// Serde adapter for a list of hex encoded hashes.
pub mod hex32_vec {
    use super::{Bytes32, bytes32_to_hex, hex_to_bytes32};
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(values: &[Bytes32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&bytes32_to_hex(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Bytes32>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| hex_to_bytes32(s).map_err(D::Error::custom))
            .collect()
    }
}
