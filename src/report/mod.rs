// Report and review records - the data the two workflows accumulate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Abuse categories a reporter (or the classifier) can pick. Chosen once per
/// report and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    SexualThreat,
    OffensiveContent,
    SpamScam,
    Danger,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::SexualThreat,
        Category::OffensiveContent,
        Category::SpamScam,
        Category::Danger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SexualThreat => "Sexual Threat",
            Category::OffensiveContent => "Offensive Content",
            Category::SpamScam => "Spam/Scam",
            Category::Danger => "Danger",
        }
    }

    /// Parse the stored value of a category menu option.
    pub fn from_label(label: &str) -> Option<Category> {
        match label {
            "Sexual Threat" => Some(Category::SexualThreat),
            "Offensive Content" => Some(Category::OffensiveContent),
            "Spam/Scam" => Some(Category::SpamScam),
            "Danger" | "Imminent Danger" => Some(Category::Danger),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderator-assigned severity. Absent severity is treated as `S1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    S1,
    S2,
    S3,
}

impl Severity {
    pub fn from_label(label: &str) -> Option<Severity> {
        match label {
            "1" => Some(Severity::S1),
            "2" => Some(Severity::S2),
            "3" => Some(Severity::S3),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Severity::S1 => 1,
            Severity::S2 => 2,
            Severity::S3 => 3,
        }
    }
}

/// Enforcement outcome of a completed review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModAction {
    NoAction,
    WarnAndKick,
    WarnKickAndEscalate,
}

impl ModAction {
    pub fn text(&self) -> &'static str {
        match self {
            ModAction::NoAction => "Manual review complete. No action taken.",
            ModAction::WarnAndKick => {
                "Manual review complete. The author has been warned and kicked from the server."
            }
            ModAction::WarnKickAndEscalate => {
                "Manual review complete. The author has been warned and kicked from the server, \
                 and the report has been escalated to the safety team."
            }
        }
    }
}

/// Identity of an actor on the messaging platform (reporter or moderator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        ActorId(id.into())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier for a filed report, used to address queued reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn generate() -> Self {
        ReportId(Uuid::new_v4())
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Accumulator for one report. Created when the target message is identified,
/// mutated only by the owning intake instance, and frozen once intake reaches
/// a terminal state. The author name and message text are snapshots; later
/// edits to the source message do not affect the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: ReportId,
    pub reporter: ActorId,
    pub subject_name: String,
    pub subject_content: String,
    pub category: Option<Category>,
    /// Category-specific attributes in the order the workflow collected them.
    attributes: Vec<(String, String)>,
    pub additional_context: Option<String>,
    pub block_requested: bool,
    /// True when the record was seeded by the classifier instead of a human.
    pub machine_filed: bool,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(reporter: ActorId, subject_name: String, subject_content: String) -> Self {
        Self {
            id: ReportId::generate(),
            reporter,
            subject_name,
            subject_content,
            category: None,
            attributes: Vec::new(),
            additional_context: None,
            block_requested: false,
            machine_filed: false,
            created_at: Utc::now(),
        }
    }

    /// Store a collected attribute, replacing any previous value for the key.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.attributes.push((key.to_string(), value.to_string()));
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in collection order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn attribute_keys(&self) -> Vec<&str> {
        self.attributes.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// Accumulator for one moderator review, keyed to the report it re-examines.
/// The review-side category is authoritative for action determination; the
/// reporter's category is provenance only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub report: ReportRecord,
    pub legitimate: bool,
    pub category: Option<Category>,
    pub subtype: Option<String>,
    pub severity: Option<Severity>,
}

impl ReviewRecord {
    pub fn new(report: ReportRecord) -> Self {
        Self {
            report,
            legitimate: false,
            category: None,
            subtype: None,
            severity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_label("Imminent Danger"), Some(Category::Danger));
        assert_eq!(Category::from_label("Gossip"), None);
    }

    #[test]
    fn severity_parses_menu_values_only() {
        assert_eq!(Severity::from_label("1"), Some(Severity::S1));
        assert_eq!(Severity::from_label("3"), Some(Severity::S3));
        assert_eq!(Severity::from_label("4"), None);
        assert_eq!(Severity::from_label(""), None);
    }

    #[test]
    fn review_record_survives_serialization() {
        let mut record = ReportRecord::new(
            ActorId::new("reporter"),
            "badguy".to_string(),
            "worrying message".to_string(),
        );
        record.category = Some(Category::Danger);
        record.set_attribute("danger_type", "Safety Threat");
        record.additional_context = Some("second time this week".to_string());

        let mut review = ReviewRecord::new(record);
        review.legitimate = true;
        review.severity = Some(Severity::S2);

        let json = serde_json::to_string(&review).expect("serialize");
        let restored: ReviewRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, review);
        assert_eq!(restored.report.attribute("danger_type"), Some("Safety Threat"));
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut record = ReportRecord::new(
            ActorId::new("reporter"),
            "author".to_string(),
            "text".to_string(),
        );
        record.set_attribute("danger_type", "Safety Threat");
        record.set_attribute("safety_threat_type", "Violence");
        record.set_attribute("danger_type", "Criminal Behavior");

        assert_eq!(record.attribute("danger_type"), Some("Criminal Behavior"));
        assert_eq!(
            record.attribute_keys(),
            vec!["danger_type", "safety_threat_type"]
        );
    }
}
