//! Review workflow tests: intake-to-review round trips and the
//! severity-only action rule.

use mod_triage::gateway::{PromptId, ResolvedMessage};
use mod_triage::report::{ActorId, Category, ModAction, ReportRecord, Severity};
use mod_triage::workflow::intake::{IntakeInstance, TextOutcome};
use mod_triage::workflow::review::{determine_action, ReviewInstance, ReviewState};
use mod_triage::workflow::Reply;

fn intake_answer(instance: &mut IntakeInstance, key: &str) {
    let prompt_id = PromptId::generate();
    instance.prompt_issued(prompt_id);
    instance.submit_choice(prompt_id, key);
}

fn review_answer(instance: &mut ReviewInstance, key: &str) -> Vec<Reply> {
    let prompt_id = PromptId::generate();
    instance.prompt_issued(prompt_id);
    instance.submit_choice(prompt_id, key)
}

/// Run a real intake to completion and hand its record over.
fn completed_report(category_key: &str, mid_keys: &[&str], context: bool) -> ReportRecord {
    let mut instance = IntakeInstance::new(ActorId::new("reporter"));
    instance.submit_text("report");
    match instance.submit_text("/1/2/3") {
        TextOutcome::ResolveTarget(_) => {}
        other => panic!("unexpected outcome {other:?}"),
    }
    instance.target_resolved(&ResolvedMessage {
        author_name: "badguy".to_string(),
        content: "awful message".to_string(),
    });
    intake_answer(&mut instance, category_key);
    for key in mid_keys {
        intake_answer(&mut instance, key);
    }
    if context {
        instance.submit_text("skip");
    }
    intake_answer(&mut instance, "2"); // decline block
    instance.take_record().expect("intake completed")
}

#[test]
fn intake_record_round_trips_into_review() {
    let record = completed_report("4", &["1", "1"], true);
    let report_id = record.id;

    let (mut review, replies) = ReviewInstance::new(record);
    assert_eq!(review.state(), ReviewState::AwaitingLegitimacy);
    assert!(matches!(&replies[0], Reply::Menu(_)));

    review_answer(&mut review, "1"); // legitimate
    review_answer(&mut review, "4"); // Danger confirmed
    review_answer(&mut review, "1"); // Safety Threat
    let replies = review_answer(&mut review, "3"); // severity 3

    assert!(review.is_complete());
    assert!(replies
        .iter()
        .any(|r| matches!(r, Reply::Text(t) if t.contains("escalated"))));

    let finalized = review.finalize().unwrap();
    assert_eq!(finalized.report.id, report_id);
    assert_eq!(finalized.severity, Some(Severity::S3));
    assert_eq!(determine_action(&finalized), ModAction::WarnKickAndEscalate);
}

#[test]
fn action_depends_only_on_severity_not_the_branch() {
    // Same severity reached through three different category branches.
    let cases = [
        ("4", &["1", "1"][..], true, "4", "1"),  // Danger / Safety Threat
        ("2", &["2"][..], false, "2", "2"),      // Offensive / Hateful
        ("3", &["1"][..], false, "3", "1"),      // Spam/Scam / Spam
    ];

    let mut completion_texts = Vec::new();
    for (category_key, mid_keys, context, review_category, subtype) in cases {
        let record = completed_report(category_key, mid_keys, context);
        let (mut review, _) = ReviewInstance::new(record);
        review_answer(&mut review, "1");
        review_answer(&mut review, review_category);
        review_answer(&mut review, subtype);
        let replies = review_answer(&mut review, "2"); // severity 2 everywhere
        let text = replies
            .iter()
            .find_map(|r| match r {
                Reply::Text(t) => Some(t.clone()),
                Reply::Menu(_) => None,
            })
            .expect("completion text");
        completion_texts.push(text);

        let finalized = review.finalize().unwrap();
        assert_eq!(determine_action(&finalized), ModAction::WarnAndKick);
    }

    assert!(completion_texts.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn illegitimate_verdict_ends_review_regardless_of_further_input() {
    let record = completed_report("1", &["1", "1"], true);
    let (mut review, _) = ReviewInstance::new(record);

    let replies = review_answer(&mut review, "2"); // not legitimate
    assert!(review.is_complete());
    assert!(replies
        .iter()
        .any(|r| matches!(r, Reply::Text(t) if t.contains("No action taken"))));

    // Any further choices are dead.
    let prompt_id = PromptId::generate();
    assert!(review.submit_choice(prompt_id, "1").is_empty());
    assert!(review.submit_choice(prompt_id, "3").is_empty());

    let finalized = review.finalize().unwrap();
    assert!(!finalized.legitimate);
    assert_eq!(finalized.severity, None);
    assert_eq!(determine_action(&finalized), ModAction::NoAction);
}

#[test]
fn reviewer_category_overrides_reporter_category_for_the_action() {
    // Reporter filed Spam/Scam; moderator reviews it as Danger.
    let record = completed_report("3", &["1"], false);
    assert_eq!(record.category, Some(Category::SpamScam));

    let (mut review, _) = ReviewInstance::new(record);
    review_answer(&mut review, "1");
    review_answer(&mut review, "4"); // Danger
    review_answer(&mut review, "2"); // Criminal Behavior
    review_answer(&mut review, "3");

    let finalized = review.finalize().unwrap();
    assert_eq!(finalized.category, Some(Category::Danger));
    assert_eq!(finalized.report.category, Some(Category::SpamScam));
    assert_eq!(determine_action(&finalized), ModAction::WarnKickAndEscalate);
}
