use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A replica identifier (`S1`, `S2`, `S3`, ...).
///
/// Ordered by priority number: `S1` sorts before `S2`, which sorts before
/// `S3`. The election rule (§4.4) is "lowest-priority-numbered live
/// replica", i.e. the minimum `ReplicaId` in the active set.
///
/// Serializes as the `"S<n>"` string the wire format uses, not as the bare
/// integer, so `ReplicaId` round-trips through JSON exactly like the
/// original `server_id` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplicaId(u16);

impl ReplicaId {
    /// Constructs the replica identifier `S{n}`.
    pub fn new(n: u16) -> Self {
        Self(n)
    }

    /// The bare priority number (1 for `S1`, etc).
    pub fn number(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Error parsing a replica identifier from a string such as an environment
/// variable or a wire field.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid replica id {0:?}: expected S<number>")]
pub struct ParseReplicaIdError(pub String);

impl FromStr for ReplicaId {
    type Err = ParseReplicaIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suffix = s
            .strip_prefix('S')
            .ok_or_else(|| ParseReplicaIdError(s.to_string()))?;
        let n: u16 = suffix
            .parse()
            .map_err(|_| ParseReplicaIdError(s.to_string()))?;
        Ok(ReplicaId(n))
    }
}

impl PartialOrd for ReplicaId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReplicaId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

// serde(transparent) serializes the inner u16, but the wire format carries
// "S1"/"S2"/"S3" strings. We implement the string form explicitly instead of
// relying on the transparent derive for (de)serialization.
impl Serialize for ReplicaId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReplicaId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("S1", 1)]
    #[test_case("S2", 2)]
    #[test_case("S3", 3)]
    fn parses_valid_ids(input: &str, expected: u16) {
        assert_eq!(input.parse::<ReplicaId>().unwrap().number(), expected);
    }

    #[test_case("X1")]
    #[test_case("S")]
    #[test_case("")]
    #[test_case("Sabc")]
    fn rejects_invalid_ids(input: &str) {
        assert!(input.parse::<ReplicaId>().is_err());
    }

    #[test]
    fn orders_by_priority_number() {
        assert!(ReplicaId::new(1) < ReplicaId::new(2));
        assert!(ReplicaId::new(2) < ReplicaId::new(3));
        assert_eq!(
            vec![ReplicaId::new(3), ReplicaId::new(1), ReplicaId::new(2)]
                .into_iter()
                .min()
                .unwrap(),
            ReplicaId::new(1)
        );
    }

    #[test]
    fn roundtrips_through_json() {
        let id = ReplicaId::new(2);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"S2\"");
        let back: ReplicaId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn displays_as_s_prefixed() {
        assert_eq!(ReplicaId::new(1).to_string(), "S1");
    }
}
