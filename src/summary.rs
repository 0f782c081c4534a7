// Renders completed reports into the moderator hand-off text

use crate::report::ReportRecord;

/// Human-readable form of a stored attribute key, e.g. `safety_threat_type`
/// becomes `Safety Threat Type`.
fn attribute_title(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a completed report for the moderator channel: subject snapshot,
/// category, every collected attribute in graph order, context, and the
/// block decision.
pub fn render_report_summary(record: &ReportRecord) -> String {
    let mut out = String::from("New Report\n");
    out.push_str(&format!(
        "Reported message:```{}: {}```\n",
        record.subject_name, record.subject_content
    ));
    if let Some(category) = record.category {
        out.push_str(&format!("Category: {category}\n"));
    }
    for (key, value) in record.attributes() {
        out.push_str(&format!("{}: {}\n", attribute_title(key), value));
    }
    if let Some(context) = &record.additional_context {
        out.push_str(&format!("Additional Context: {context}\n"));
    }
    out.push_str(&format!(
        "Block Requested: {}\n",
        if record.block_requested { "Yes" } else { "No" }
    ));
    if record.machine_filed {
        out.push_str("Filed automatically by the classifier.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ActorId, Category};

    fn danger_record() -> ReportRecord {
        let mut record = ReportRecord::new(
            ActorId::new("reporter"),
            "badguy".to_string(),
            "worrying message".to_string(),
        );
        record.category = Some(Category::Danger);
        record.set_attribute("danger_type", "Safety Threat");
        record.set_attribute("safety_threat_type", "Suicide/Self-Harm");
        record
    }

    #[test]
    fn attribute_titles_read_naturally() {
        assert_eq!(attribute_title("danger_type"), "Danger Type");
        assert_eq!(attribute_title("safety_threat_type"), "Safety Threat Type");
        assert_eq!(attribute_title("demand"), "Demand");
    }

    #[test]
    fn summary_lists_attributes_in_collection_order() {
        let summary = render_report_summary(&danger_record());
        let danger = summary.find("Danger Type: Safety Threat").unwrap();
        let safety = summary.find("Safety Threat Type: Suicide/Self-Harm").unwrap();
        assert!(danger < safety);
        assert!(summary.contains("Category: Danger"));
        assert!(summary.contains("Block Requested: No"));
        assert!(!summary.contains("Additional Context"));
        assert!(!summary.contains("Filed automatically"));
    }

    #[test]
    fn summary_includes_context_and_machine_flag_when_present() {
        let mut record = danger_record();
        record.additional_context = Some("second report this week".to_string());
        record.machine_filed = true;
        let summary = render_report_summary(&record);
        assert!(summary.contains("Additional Context: second report this week"));
        assert!(summary.contains("Filed automatically"));
    }
}
