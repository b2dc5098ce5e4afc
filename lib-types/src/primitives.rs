//! Canonical primitive types for Agora ledger state
//!
//! Rule: no free-form string identifiers in ledger state. Entities are keyed
//! by fixed-size wallet addresses or monotonically assigned integer IDs; ID 0
//! is never assigned and serves as the "absent" sentinel (e.g. a top-level
//! comment has `parent_id == 0`).

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Seconds since the UNIX epoch, as observed by the sequencer
pub type Timestamp = u64;

/// Token amounts in atomic units (see [`crate::constants::ONE_TOKEN`])
pub type Amount = u64;

/// Per-wallet reputation score; may go negative
pub type Karma = i64;

/// Community identifier (1-indexed)
pub type CommunityId = u64;

/// Post identifier (1-indexed)
pub type PostId = u64;

/// Comment identifier (1-indexed)
pub type CommentId = u64;

/// Moderation report identifier (1-indexed)
pub type ReportId = u64;

/// Governance proposal identifier (1-indexed)
pub type ProposalId = u64;

// ============================================================================
// WALLET ADDRESS
// ============================================================================

/// 32-byte wallet address
///
/// Opaque to the ledger: addresses are supplied by the caller's signing
/// layer, which is outside this crate's scope. Serializes as a hex string
/// so wallet-keyed maps survive a JSON snapshot.
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct Wallet(pub [u8; 32]);

impl Wallet {
    /// Create a wallet address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The zero address, never valid as an actor
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wallet({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Wallet {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Wallet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Wallet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// CONTENT REFERENCE
// ============================================================================

/// Reference to a votable/reportable piece of content
///
/// Votes, reports and moderation actions are keyed by this rather than a
/// bare integer so that post 7 and comment 7 can never collide. Serializes
/// as `"post:N"` / `"comment:N"` so content-keyed maps survive a JSON
/// snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ContentRef {
    /// A post
    Post(PostId),
    /// A comment
    Comment(CommentId),
}

impl ContentRef {
    /// The raw entity ID
    pub fn id(&self) -> u64 {
        match self {
            ContentRef::Post(id) => *id,
            ContentRef::Comment(id) => *id,
        }
    }

    /// True if this references a post
    pub fn is_post(&self) -> bool {
        matches!(self, ContentRef::Post(_))
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRef::Post(id) => write!(f, "post:{id}"),
            ContentRef::Comment(id) => write!(f, "comment:{id}"),
        }
    }
}

impl FromStr for ContentRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed content ref {s:?}"))?;
        let id: u64 = id
            .parse()
            .map_err(|_| format!("malformed content ref id {id:?}"))?;
        match kind {
            "post" => Ok(ContentRef::Post(id)),
            "comment" => Ok(ContentRef::Comment(id)),
            other => Err(format!("unknown content kind {other:?}")),
        }
    }
}

impl Serialize for ContentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_debug_is_short_hex() {
        let w = Wallet::new([0xab; 32]);
        assert_eq!(format!("{:?}", w), "Wallet(abababababababab)");
    }

    #[test]
    fn test_zero_wallet() {
        assert!(Wallet::zero().is_zero());
        assert!(!Wallet::new([1; 32]).is_zero());
    }

    #[test]
    fn test_string_forms_round_trip() {
        let w = Wallet::new([7; 32]);
        assert_eq!(w.to_string().parse::<Wallet>().unwrap(), w);
        for r in [ContentRef::Post(3), ContentRef::Comment(12)] {
            assert_eq!(r.to_string().parse::<ContentRef>().unwrap(), r);
        }
        assert!("post".parse::<ContentRef>().is_err());
        assert!("thread:1".parse::<ContentRef>().is_err());
    }

    #[test]
    fn test_content_ref_distinguishes_kinds() {
        assert_ne!(ContentRef::Post(7), ContentRef::Comment(7));
        assert_eq!(ContentRef::Post(7).id(), ContentRef::Comment(7).id());
        assert!(ContentRef::Post(1).is_post());
        assert!(!ContentRef::Comment(1).is_post());
    }
}
