// Data models for choredice

use chrono::{DateTime, Local, TimeZone};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Largest id a snapshot may carry (2^53 - 1, the JSON-safe integer limit)
pub const MAX_CHORE_ID: i64 = (1 << 53) - 1;

/// A single household chore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    pub id: i64,
    pub text: String,
    pub completed: bool,
}

impl Chore {
    /// Build a pending chore. `text` must already be trimmed and non-empty.
    pub(crate) fn new(id: i64, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
        }
    }

    /// Local creation time, derived from the millisecond id
    pub fn created_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.id).single()
    }
}

/// Persisted form of the whole store: both collections in one blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub chores: Vec<Chore>,
    #[serde(default, rename = "completedChores")]
    pub completed_chores: Vec<Chore>,
}

impl Snapshot {
    /// Parse and validate a snapshot
    ///
    /// Rejects anything that would break store invariants: duplicate or
    /// out-of-range ids, blank text, or a `completed` flag that disagrees with the collection
    /// the chore sits in.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for chore in self.chores.iter().chain(self.completed_chores.iter()) {
            if !(0..=MAX_CHORE_ID).contains(&chore.id) {
                return Err(eyre!("Chore id out of range: {}", chore.id));
            }
            if !seen.insert(chore.id) {
                return Err(eyre!("Duplicate chore id: {}", chore.id));
            }
            if chore.text.trim().is_empty() {
                return Err(eyre!("Chore {} has empty text", chore.id));
            }
        }

        if let Some(chore) = self.chores.iter().find(|c| c.completed) {
            return Err(eyre!("Pending chore {} is marked completed", chore.id));
        }
        if let Some(chore) = self.completed_chores.iter().find(|c| !c.completed) {
            return Err(eyre!("Completed chore {} is not marked completed", chore.id));
        }

        Ok(())
    }

    /// Highest id in either collection
    pub fn max_id(&self) -> Option<i64> {
        self.chores
            .iter()
            .chain(self.completed_chores.iter())
            .map(|c| c.id)
            .max()
    }
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chore(id: i64, text: &str, completed: bool) -> Chore {
        Chore {
            id,
            text: text.to_string(),
            completed,
        }
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let snapshot = Snapshot {
            chores: vec![chore(1, "Dishes", false)],
            completed_chores: vec![chore(2, "Laundry", true)],
        };

        let json = snapshot.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"chores":[{"id":1,"text":"Dishes","completed":false}],"completedChores":[{"id":2,"text":"Laundry","completed":true}]}"#
        );
    }

    #[test]
    fn test_snapshot_missing_fields_default_empty() {
        let snapshot = Snapshot::from_json(r#"{"chores":[{"id":5,"text":"Mop","completed":false}]}"#).unwrap();
        assert_eq!(snapshot.chores.len(), 1);
        assert!(snapshot.completed_chores.is_empty());

        let snapshot = Snapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_snapshot_rejects_duplicate_ids() {
        let json = r#"{"chores":[{"id":1,"text":"A","completed":false}],
                       "completedChores":[{"id":1,"text":"B","completed":true}]}"#;
        assert!(Snapshot::from_json(json).is_err());
    }

    #[test]
    fn test_snapshot_rejects_inconsistent_flags() {
        let json = r#"{"chores":[{"id":1,"text":"A","completed":true}]}"#;
        assert!(Snapshot::from_json(json).is_err());

        let json = r#"{"completedChores":[{"id":1,"text":"A","completed":false}]}"#;
        assert!(Snapshot::from_json(json).is_err());
    }

    #[test]
    fn test_snapshot_rejects_out_of_range_ids() {
        let json = r#"{"chores":[{"id":9223372036854775807,"text":"A","completed":false}]}"#;
        assert!(Snapshot::from_json(json).is_err());

        let json = r#"{"chores":[{"id":-1,"text":"A","completed":false}]}"#;
        assert!(Snapshot::from_json(json).is_err());

        let json = format!(r#"{{"chores":[{{"id":{},"text":"A","completed":false}}]}}"#, MAX_CHORE_ID);
        assert!(Snapshot::from_json(&json).is_ok());
    }

    #[test]
    fn test_snapshot_rejects_blank_text() {
        let json = r#"{"chores":[{"id":1,"text":"   ","completed":false}]}"#;
        assert!(Snapshot::from_json(json).is_err());
    }

    #[test]
    fn test_snapshot_max_id() {
        let snapshot = Snapshot {
            chores: vec![chore(3, "A", false)],
            completed_chores: vec![chore(9, "B", true)],
        };
        assert_eq!(snapshot.max_id(), Some(9));
        assert_eq!(Snapshot::default().max_id(), None);
    }

    #[test]
    fn test_created_at_from_id() {
        let c = chore(1_700_000_000_000, "A", false);
        let created = c.created_at().unwrap();
        assert_eq!(created.timestamp_millis(), 1_700_000_000_000);
    }
}
