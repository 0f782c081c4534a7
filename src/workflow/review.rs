// Moderator review workflow - re-derives a verdict and an enforcement action

use serde::{Deserialize, Serialize};

use crate::gateway::PromptId;
use crate::report::{Category, ModAction, ReportRecord, ReviewRecord, Severity};
use crate::workflow::graph::{
    NextHop, PromptNode, CATEGORY_OPTIONS, LEGITIMACY_OPTIONS, LEGITIMACY_PROMPT, REVIEW_GRAPH,
};
use crate::workflow::{MenuPrompt, Reply};

const LEGITIMATE_MESSAGE: &str = "Thank you. We've logged this as legitimate abuse.";
const DISCARDED_MESSAGE: &str = "Thank you. This report will be discarded.";
const NO_ABUSE_MESSAGE: &str = "Manual review complete. No abuse found. No action taken.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    ReviewStart,
    AwaitingLegitimacy,
    CategoryConfirm,
    Level,
    ReviewComplete,
}

/// Pure, total over {1,2,3} with absent severity treated as 1. The action
/// depends on severity alone, never on which category branch produced it.
pub fn determine_action(review: &ReviewRecord) -> ModAction {
    match review.severity.unwrap_or(Severity::S1) {
        Severity::S1 => ModAction::NoAction,
        Severity::S2 => ModAction::WarnAndKick,
        Severity::S3 => ModAction::WarnKickAndEscalate,
    }
}

/// The single active moderator review. Owns the report it re-examines and the
/// ReviewRecord it builds.
#[derive(Debug)]
pub struct ReviewInstance {
    state: ReviewState,
    level: u8,
    current_node: Option<&'static PromptNode>,
    pending_prompt: Option<PromptId>,
    review: ReviewRecord,
}

impl ReviewInstance {
    /// Accept a queued report into review. Issues the legitimacy menu.
    pub fn new(report: ReportRecord) -> (Self, Vec<Reply>) {
        let instance = Self {
            state: ReviewState::AwaitingLegitimacy,
            level: 0,
            current_node: None,
            pending_prompt: None,
            review: ReviewRecord::new(report),
        };
        tracing::info!(report = %instance.review.report.id, "review started");
        let replies = vec![Reply::Menu(MenuPrompt {
            prompt: LEGITIMACY_PROMPT.to_string(),
            options: LEGITIMACY_OPTIONS,
            follow_up: false,
        })];
        (instance, replies)
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn pending_prompt(&self) -> Option<PromptId> {
        self.pending_prompt
    }

    pub fn is_complete(&self) -> bool {
        self.state == ReviewState::ReviewComplete
    }

    pub fn review(&self) -> &ReviewRecord {
        &self.review
    }

    /// Consume the instance; yields the finalized review only once complete.
    pub fn finalize(self) -> Option<ReviewRecord> {
        match self.state {
            ReviewState::ReviewComplete => Some(self.review),
            _ => None,
        }
    }

    pub fn prompt_issued(&mut self, prompt_id: PromptId) {
        self.pending_prompt = Some(prompt_id);
    }

    /// Handle a moderator's menu selection. The correlation and unknown-option
    /// rules mirror intake: anything stale is ignored without state change.
    pub fn submit_choice(&mut self, prompt_id: PromptId, option_key: &str) -> Vec<Reply> {
        if self.is_complete() || self.pending_prompt != Some(prompt_id) {
            tracing::debug!(%prompt_id, "stale review choice ignored");
            return Vec::new();
        }
        match self.state {
            ReviewState::AwaitingLegitimacy => self.choose_legitimacy(option_key),
            ReviewState::CategoryConfirm => self.choose_category(option_key),
            ReviewState::Level => self.choose_attribute(option_key),
            ReviewState::ReviewStart | ReviewState::ReviewComplete => Vec::new(),
        }
    }

    fn choose_legitimacy(&mut self, option_key: &str) -> Vec<Reply> {
        let Some(option) = LEGITIMACY_OPTIONS.iter().find(|o| o.key == option_key) else {
            return Vec::new();
        };
        self.pending_prompt = None;
        if option.value == "Yes" {
            self.review.legitimate = true;
            self.state = ReviewState::CategoryConfirm;
            tracing::info!(report = %self.review.report.id, "logged as legitimate abuse");
            vec![
                Reply::Text(LEGITIMATE_MESSAGE.to_string()),
                Reply::Menu(MenuPrompt {
                    prompt: "What type of abuse is this message?".to_string(),
                    options: CATEGORY_OPTIONS,
                    follow_up: false,
                }),
            ]
        } else {
            // Not abuse: jump straight to complete with an empty review.
            self.state = ReviewState::ReviewComplete;
            tracing::info!(report = %self.review.report.id, "report discarded as not abuse");
            vec![
                Reply::Text(DISCARDED_MESSAGE.to_string()),
                Reply::Text(self.completion_text()),
            ]
        }
    }

    fn choose_category(&mut self, option_key: &str) -> Vec<Reply> {
        let Some(option) = CATEGORY_OPTIONS.iter().find(|o| o.key == option_key) else {
            return Vec::new();
        };
        let Some(category) = Category::from_label(option.value) else {
            return Vec::new();
        };
        self.pending_prompt = None;
        self.review.category = Some(category);
        tracing::info!(report = %self.review.report.id, %category, "review category confirmed");

        let entry = REVIEW_GRAPH
            .entry(category)
            .expect("every category has a review entry");
        self.current_node = Some(entry);
        self.state = ReviewState::Level;
        self.level += 1;
        vec![
            Reply::Text(format!("Thank you. We've logged the category as \"{category}\".")),
            Reply::Menu(MenuPrompt {
                prompt: entry.prompt.to_string(),
                options: entry.options,
                follow_up: false,
            }),
        ]
    }

    fn choose_attribute(&mut self, option_key: &str) -> Vec<Reply> {
        let node = self.current_node.expect("level state has a current node");
        let Some(option) = node.option_by_key(option_key) else {
            return Vec::new();
        };
        self.pending_prompt = None;
        match node.attribute {
            "severity" => self.review.severity = Severity::from_label(option.value),
            "subtype" => self.review.subtype = Some(option.value.to_string()),
            other => {
                tracing::warn!(attribute = other, "unmapped review attribute");
            }
        }

        let subtype = self.review.subtype.as_deref();
        let hop = REVIEW_GRAPH.resolve_next(node, |key| {
            (key == "subtype").then_some(subtype).flatten()
        });
        match hop {
            NextHop::Node(next) => {
                self.current_node = Some(next);
                self.level += 1;
                vec![Reply::Menu(MenuPrompt {
                    prompt: next.prompt.to_string(),
                    options: next.options,
                    follow_up: false,
                })]
            }
            NextHop::Complete | NextHop::Block | NextHop::Context => {
                self.state = ReviewState::ReviewComplete;
                self.current_node = None;
                tracing::info!(
                    report = %self.review.report.id,
                    severity = ?self.review.severity,
                    "review complete"
                );
                vec![Reply::Text(self.completion_text())]
            }
        }
    }

    fn completion_text(&self) -> String {
        if !self.review.legitimate {
            return NO_ABUSE_MESSAGE.to_string();
        }
        determine_action(&self.review).text().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ActorId;

    fn sample_report(category: Category) -> ReportRecord {
        let mut record = ReportRecord::new(
            ActorId::new("reporter"),
            "badguy".to_string(),
            "bad message".to_string(),
        );
        record.category = Some(category);
        record
    }

    fn answer(instance: &mut ReviewInstance, key: &str) -> Vec<Reply> {
        let prompt_id = PromptId::generate();
        instance.prompt_issued(prompt_id);
        instance.submit_choice(prompt_id, key)
    }

    #[test]
    fn action_is_a_total_function_of_severity() {
        let mut review = ReviewRecord::new(sample_report(Category::Danger));
        review.legitimate = true;

        review.severity = None;
        assert_eq!(determine_action(&review), ModAction::NoAction);
        review.severity = Some(Severity::S1);
        assert_eq!(determine_action(&review), ModAction::NoAction);
        review.severity = Some(Severity::S2);
        assert_eq!(determine_action(&review), ModAction::WarnAndKick);
        review.severity = Some(Severity::S3);
        assert_eq!(determine_action(&review), ModAction::WarnKickAndEscalate);
    }

    #[test]
    fn same_severity_means_same_action_across_branches() {
        let mut actions = Vec::new();
        for (category_key, subtype_key) in [("2", "1"), ("3", "2"), ("4", "1")] {
            let (mut instance, _) = ReviewInstance::new(sample_report(Category::Danger));
            answer(&mut instance, "1"); // legitimate
            answer(&mut instance, category_key);
            answer(&mut instance, subtype_key);
            let replies = answer(&mut instance, "2"); // severity 2
            actions.push(replies);
        }
        let first = &actions[0];
        for other in &actions[1..] {
            assert_eq!(first, other);
        }
    }

    #[test]
    fn illegitimate_report_short_circuits_to_no_action() {
        let (mut instance, _) = ReviewInstance::new(sample_report(Category::SpamScam));
        let replies = answer(&mut instance, "2"); // not legitimate
        assert!(instance.is_complete());
        assert!(replies
            .iter()
            .any(|r| matches!(r, Reply::Text(t) if t.contains("No action taken"))));

        // Further input changes nothing.
        let prompt_id = PromptId::generate();
        assert!(instance.submit_choice(prompt_id, "1").is_empty());

        let review = instance.finalize().expect("complete review");
        assert!(!review.legitimate);
        assert_eq!(review.category, None);
        assert_eq!(review.subtype, None);
        assert_eq!(review.severity, None);
    }

    #[test]
    fn severity_three_escalates() {
        let (mut instance, replies) = ReviewInstance::new(sample_report(Category::Danger));
        assert!(matches!(&replies[0], Reply::Menu(m) if m.prompt == LEGITIMACY_PROMPT));

        answer(&mut instance, "1"); // legitimate
        answer(&mut instance, "4"); // Danger
        answer(&mut instance, "1"); // Safety Threat
        let replies = answer(&mut instance, "3"); // severity 3

        assert!(instance.is_complete());
        assert!(replies
            .iter()
            .any(|r| matches!(r, Reply::Text(t) if t.contains("escalated") && t.contains("kicked"))));

        let review = instance.finalize().unwrap();
        assert_eq!(review.severity, Some(Severity::S3));
        assert_eq!(review.subtype.as_deref(), Some("Safety Threat"));
    }

    #[test]
    fn review_category_may_diverge_from_reporter_category() {
        let (mut instance, _) = ReviewInstance::new(sample_report(Category::SpamScam));
        answer(&mut instance, "1"); // legitimate
        answer(&mut instance, "2"); // moderator says Offensive Content
        answer(&mut instance, "2"); // Hateful Content
        answer(&mut instance, "1"); // severity 1

        let review = instance.finalize().unwrap();
        assert_eq!(review.category, Some(Category::OffensiveContent));
        assert_eq!(review.report.category, Some(Category::SpamScam));
    }

    #[test]
    fn stale_prompt_is_ignored_mid_review() {
        let (mut instance, _) = ReviewInstance::new(sample_report(Category::Danger));
        let live = PromptId::generate();
        instance.prompt_issued(live);

        assert!(instance.submit_choice(PromptId::generate(), "1").is_empty());
        assert_eq!(instance.state(), ReviewState::AwaitingLegitimacy);
        assert!(!instance.submit_choice(live, "1").is_empty());
        assert_eq!(instance.state(), ReviewState::CategoryConfirm);
    }

    #[test]
    fn severity_is_always_the_final_question() {
        for category_key in ["1", "2", "3", "4"] {
            let (mut instance, _) = ReviewInstance::new(sample_report(Category::Danger));
            answer(&mut instance, "1");
            answer(&mut instance, category_key);
            let replies = answer(&mut instance, "1"); // subtype
            assert!(
                matches!(&replies[0], Reply::Menu(m) if m.prompt.contains("severe")),
                "category {category_key} should ask severity next"
            );
            answer(&mut instance, "1");
            assert!(instance.is_complete());
        }
    }
}
