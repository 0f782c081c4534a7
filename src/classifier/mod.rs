// Classifier seam - optional machine pre-classification of reports
//
// The model is asked to pick one label from an enumerated set at each step of
// the intake graph. Anything outside the set degrades to Unknown; a failed or
// confused classifier can never unwind workflow state.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::gateway::ResolvedMessage;
use crate::report::{ActorId, Category, ReportRecord};
use crate::workflow::graph::{NextHop, CATEGORY_OPTIONS, CATEGORY_PROMPT, INTAKE_GRAPH};

/// One classification answer: a label from the supplied set, or Unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Label(String),
    Unknown,
}

/// Coerce a raw model answer into the enumerated set. Trims whitespace and
/// maps anything unrecognized to Unknown.
pub fn coerce(answer: &str, labels: &[&str]) -> Verdict {
    let answer = answer.trim();
    match labels.iter().find(|l| **l == answer) {
        Some(label) => Verdict::Label(label.to_string()),
        None => Verdict::Unknown,
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Pick one of `labels` for the given content, or Unknown.
    async fn classify(&self, content: &str, prompt: &str, labels: &[&str]) -> Verdict;
}

/// Walk the intake graph asking the classifier at each node, producing a
/// machine-filed report without any human menu turn. Returns `None` (and
/// files nothing) as soon as any answer is Unknown.
pub async fn build_auto_report(
    classifier: &dyn Classifier,
    reporter: ActorId,
    resolved: &ResolvedMessage,
) -> Option<ReportRecord> {
    let category_labels: Vec<&str> = CATEGORY_OPTIONS.iter().map(|o| o.value).collect();
    let verdict = classifier
        .classify(&resolved.content, CATEGORY_PROMPT, &category_labels)
        .await;
    let Verdict::Label(label) = verdict else {
        tracing::warn!("classifier could not categorize message; auto-report abandoned");
        return None;
    };
    let category = Category::from_label(&label)?;

    let mut record = ReportRecord::new(
        reporter,
        resolved.author_name.clone(),
        resolved.content.clone(),
    );
    record.category = Some(category);
    record.machine_filed = true;

    let mut node = INTAKE_GRAPH.entry(category)?;
    loop {
        let labels: Vec<&str> = node.options.iter().map(|o| o.value).collect();
        let verdict = classifier
            .classify(&resolved.content, node.prompt, &labels)
            .await;
        let Verdict::Label(value) = verdict else {
            tracing::warn!(
                attribute = node.attribute,
                "classifier answer outside label set; auto-report abandoned"
            );
            return None;
        };
        record.set_attribute(node.attribute, &value);

        let hop = INTAKE_GRAPH.resolve_next(node, |key| record.attribute(key));
        match hop {
            NextHop::Node(next) => node = next,
            // Machine-filed reports skip the context invite and never request
            // a block on the reporter's behalf.
            NextHop::Context | NextHop::Block | NextHop::Complete => break,
        }
    }

    tracing::info!(report = %record.id, %category, "report filed automatically");
    Some(record)
}

/// Deterministic classifier for tests and the demo binary: answers from a
/// fixed script, Unknown once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedClassifier {
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _content: &str, _prompt: &str, labels: &[&str]) -> Verdict {
        match self.answers.lock().unwrap().pop_front() {
            Some(answer) => coerce(&answer, labels),
            None => Verdict::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedMessage {
        ResolvedMessage {
            author_name: "badguy".to_string(),
            content: "send money or else".to_string(),
        }
    }

    #[test]
    fn coerce_maps_out_of_set_answers_to_unknown() {
        let labels = ["Spam", "Fraud"];
        assert_eq!(coerce("Fraud", &labels), Verdict::Label("Fraud".to_string()));
        assert_eq!(coerce("  Spam \n", &labels), Verdict::Label("Spam".to_string()));
        assert_eq!(coerce("fraudulent", &labels), Verdict::Unknown);
        assert_eq!(coerce("", &labels), Verdict::Unknown);
    }

    #[tokio::test]
    async fn auto_report_walks_the_danger_branch() {
        let classifier =
            ScriptedClassifier::new(["Danger", "Safety Threat", "Suicide/Self-Harm"]);
        let record = build_auto_report(&classifier, ActorId::new("automod"), &resolved())
            .await
            .expect("auto report");

        assert_eq!(record.category, Some(Category::Danger));
        assert_eq!(record.attribute("danger_type"), Some("Safety Threat"));
        assert_eq!(record.attribute("safety_threat_type"), Some("Suicide/Self-Harm"));
        assert!(record.machine_filed);
        assert!(!record.block_requested);
    }

    #[tokio::test]
    async fn unknown_category_abandons_the_auto_report() {
        let classifier = ScriptedClassifier::new(["definitely spam, I think"]);
        let record = build_auto_report(&classifier, ActorId::new("automod"), &resolved()).await;
        assert_eq!(record, None);
    }

    #[tokio::test]
    async fn unknown_mid_branch_abandons_the_auto_report() {
        let classifier = ScriptedClassifier::new(["Sexual Threat", "Money"]);
        let record = build_auto_report(&classifier, ActorId::new("automod"), &resolved()).await;
        assert_eq!(record, None);
    }

    #[tokio::test]
    async fn exhausted_script_degrades_to_unknown() {
        let classifier = ScriptedClassifier::new(Vec::<String>::new());
        let record = build_auto_report(&classifier, ActorId::new("automod"), &resolved()).await;
        assert_eq!(record, None);
    }
}
