//! Generated results
//!
//! A [`ResultEntry`] is created once per successful render and never mutated.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hotbar_model::{LegendEntry, SlotAssignment};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result identifier: milliseconds since the epoch, strictly increasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(u64);

impl ResultId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for ResultId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResultId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Issues time-derived ids that never repeat or go backwards
#[derive(Debug, Default)]
pub struct ResultIdGenerator {
    last: AtomicU64,
}

impl ResultIdGenerator {
    /// Create generator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create generator whose ids all exceed `last`
    #[must_use]
    pub fn starting_after(last: Option<ResultId>) -> Self {
        Self {
            last: AtomicU64::new(last.map_or(0, ResultId::as_u64)),
        }
    }

    /// Next id: the current time in milliseconds, bumped past the previous id
    pub fn next_id(&self) -> ResultId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let bump = |last: u64| now.max(last.saturating_add(1));
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        ResultId(bump(previous))
    }
}

/// Encoded image bytes; serialized as standard base64
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Artifact(Vec<u8>);

impl Artifact {
    /// Wrap encoded bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no bytes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64 encoding of the bytes
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl From<Vec<u8>> for Artifact {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Debug for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Artifact({} bytes)", self.0.len())
    }
}

impl Serialize for Artifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Artifact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// One generated result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    id: ResultId,
    artifact: Artifact,
    legend: Vec<LegendEntry>,
    source: SlotAssignment,
    created_at: DateTime<Utc>,
}

impl ResultEntry {
    /// Create entry stamped with the current time
    #[must_use]
    pub fn new(
        id: ResultId,
        artifact: impl Into<Artifact>,
        legend: Vec<LegendEntry>,
        source: SlotAssignment,
    ) -> Self {
        Self {
            id,
            artifact: artifact.into(),
            legend,
            source,
            created_at: Utc::now(),
        }
    }

    /// Override the creation time
    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    #[inline]
    #[must_use]
    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    /// Slot assignment that produced this result
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SlotAssignment {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_strictly_increase() {
        let ids = ResultIdGenerator::new();
        let mut previous = ids.next_id();
        for _ in 0..1000 {
            let next = ids.next_id();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn ids_continue_after_restored_history() {
        let far_future = ResultId::from_raw(u64::MAX / 2);
        let ids = ResultIdGenerator::starting_after(Some(far_future));
        assert_eq!(ids.next_id(), ResultId::from_raw(u64::MAX / 2 + 1));
    }

    #[test]
    fn artifact_serializes_as_base64() {
        let artifact = Artifact::new(vec![0x89, b'P', b'N', b'G']);
        let json = serde_json::to_string(&artifact).unwrap();
        assert_eq!(json, "\"iVBORw==\"");
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn artifact_rejects_bad_base64() {
        assert!(serde_json::from_str::<Artifact>("\"***\"").is_err());
    }

    #[test]
    fn artifact_debug_hides_bytes() {
        assert_eq!(format!("{:?}", Artifact::new(vec![1, 2, 3])), "Artifact(3 bytes)");
    }

    #[test]
    fn result_id_parses() {
        assert_eq!("42".parse::<ResultId>(), Ok(ResultId::from_raw(42)));
        assert!("abc".parse::<ResultId>().is_err());
    }
}
