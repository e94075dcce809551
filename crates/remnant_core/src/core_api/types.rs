use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentEntry {
    pub path: String,
    pub name: String,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentListing {
    pub current: Vec<SegmentEntry>,
    pub valid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrismSummary {
    pub path: String,
    pub segments: Vec<SegmentEntry>,
    pub current_seed: Option<i32>,
    pub pending_experience: Option<f32>,
    pub total_level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceOutcome {
    pub from: String,
    pub to: String,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub coop: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventEntry {
    /// Translated world, the text report's grouping key.
    pub world: String,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub location: String,
    /// The identifier the event was recovered from.
    pub raw_id: String,
    pub known: bool,
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeListing {
    pub path: String,
    pub kind: String,
    pub summary: Option<String>,
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_kind_serializes_as_type() {
        let item = ItemEntry {
            name: "Wisp Weave".to_string(),
            kind: "Ring".to_string(),
            coop: false,
            notes: String::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "Ring");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{"from":"A","to":"B","replaced":1,"extra":true}"#;
        assert!(serde_json::from_str::<ReplaceOutcome>(raw).is_err());
    }
}
