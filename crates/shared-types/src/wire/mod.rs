//! # Wire Generations
//!
//! | Generation | Paths                  | Body                                   |
//! |------------|------------------------|----------------------------------------|
//! | legacy     | `/agent/`, `/object/`  | JSON structured string-keyed maps      |
//! | binary     | `/agent2/`, `/object2/`| 4-byte length prefix + bincode message |

pub mod binary;
pub mod legacy;

/// Serde adapter for byte blobs: base64 text in JSON, raw bytes in bincode.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(bytes))
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
