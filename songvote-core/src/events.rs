use serde::{Deserialize, Serialize};

/// The stores a change can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTable {
    Songs,
    Votes,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Describes a mutation reported by the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    #[serde(rename = "event")]
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, kind: ChangeKind) -> Self {
        Self { table, kind }
    }

    /// Parses a notification payload, e.g. `{"table":"votes","event":"insert"}`.
    /// Table and event names are matched case-insensitively.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&payload.to_lowercase())
    }

    /// Whether this change can affect the rankings
    pub fn affects_rankings(&self) -> bool {
        matches!(self.table, ChangeTable::Songs | ChangeTable::Votes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_payload() {
        let event = ChangeEvent::from_payload(r#"{"table":"votes","event":"INSERT"}"#)
            .expect("parses");

        assert_eq!(event, ChangeEvent::new(ChangeTable::Votes, ChangeKind::Insert));
        assert!(event.affects_rankings());

        let event =
            ChangeEvent::from_payload(r#"{"table":"users","event":"update"}"#).expect("parses");
        assert!(!event.affects_rankings());

        assert!(ChangeEvent::from_payload(r#"{"table":"rooms","event":"insert"}"#).is_err());
    }
}
