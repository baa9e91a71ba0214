//! Store-assigned native identifiers.
//!
//! An [`ObjectId`] is 12 bytes rendered as 24 hex characters:
//!
//! | bytes | content                                |
//! |-------|----------------------------------------|
//! | 0..4  | seconds since the Unix epoch (BE)      |
//! | 4..9  | process-unique value, fixed per process |
//! | 9..12 | counter (BE), incremented per id        |
//!
//! Ids generated by one process therefore sort by creation order, and ids from
//! different processes sort by creation second.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Length of the rendered hex form.
pub const OBJECT_ID_HEX_LEN: usize = 24;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Native record identifier, ordered by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

/// Reasons a string is not a valid [`ObjectId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("expected {OBJECT_ID_HEX_LEN} hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex character {0:?}")]
    InvalidCharacter(char),
}

struct Generator {
    process: [u8; 5],
    counter: AtomicU32,
}

static GENERATOR: LazyLock<Generator> = LazyLock::new(|| {
    let seed = Uuid::new_v4().into_bytes();
    let mut process = [0u8; 5];
    process.copy_from_slice(&seed[..5]);
    // Start in the lower half of the counter space so a process has to mint
    // millions of ids within one second before the counter wraps.
    let start = u32::from_be_bytes([0, seed[5], seed[6], seed[7]]) >> 1;
    Generator {
        process,
        counter: AtomicU32::new(start),
    }
});

impl ObjectId {
    /// Mint a fresh id stamped with the current time.
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Mint a fresh id stamped with `time`. Times outside the 32-bit second
    /// range are clamped.
    pub fn with_timestamp(time: DateTime<Utc>) -> Self {
        let secs = u32::try_from(time.timestamp().max(0)).unwrap_or(u32::MAX);
        let count = GENERATOR.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&GENERATOR.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Creation time encoded in the id, at second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default()
    }

    /// Lowercase hex form, always [`OBJECT_ID_HEX_LEN`] characters.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != OBJECT_ID_HEX_LEN {
            return Err(ObjectIdError::InvalidLength(s.chars().count()));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, .. } => ObjectIdError::InvalidCharacter(c),
            _ => ObjectIdError::InvalidLength(s.chars().count()),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_24_lowercase_hex_chars() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), OBJECT_ID_HEX_LEN);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hex.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn parse_accepts_uppercase() {
        let id: ObjectId = "65A1B2C3D4E5F60718293A4B".parse().unwrap();
        assert_eq!(id.to_hex(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            "doesnotexist".parse::<ObjectId>(),
            Err(ObjectIdError::InvalidLength(12))
        );
        assert!("".parse::<ObjectId>().is_err());
        assert!("65a1b2c3d4e5f60718293a4b0".parse::<ObjectId>().is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert_eq!(
            "zza1b2c3d4e5f60718293a4b".parse::<ObjectId>(),
            Err(ObjectIdError::InvalidCharacter('z'))
        );
    }

    #[test]
    fn parse_rejects_multibyte_input_of_matching_byte_length() {
        // 22 ASCII bytes + one 2-byte char = 24 bytes, 23 chars.
        let input = format!("{}é", "a".repeat(22));
        assert_eq!(input.len(), OBJECT_ID_HEX_LEN);
        assert!(input.parse::<ObjectId>().is_err());
    }

    #[test]
    fn ids_from_one_process_sort_by_creation() {
        let ids: Vec<ObjectId> = (0..64).map(|_| ObjectId::new()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn embeds_creation_second() {
        let time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let id = ObjectId::with_timestamp(time);
        assert_eq!(id.timestamp(), time);
        assert_eq!(&id.to_hex()[..8], "6553f100");
    }

    #[test]
    fn serializes_as_hex_string() {
        let id: ObjectId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("65a1b2c3d4e5f60718293a4b"));
        let back: ObjectId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
