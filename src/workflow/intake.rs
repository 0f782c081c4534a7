// Report intake workflow - one guided exchange with one reporter

use serde::{Deserialize, Serialize};

use crate::gateway::{GatewayError, MessageLink, PromptId, ResolvedMessage};
use crate::report::{ActorId, Category, ReportRecord};
use crate::workflow::graph::{
    NextHop, PromptNode, BLOCK_OPTIONS, BLOCK_PROMPT, CATEGORY_OPTIONS, CATEGORY_PROMPT,
    CONTEXT_PROMPT, INTAKE_GRAPH,
};
use crate::workflow::{MenuPrompt, Reply};

pub const START_INSTRUCTIONS: &str =
    "Thank you for starting the reporting process. Say `help` at any time for more information.\n\n\
     Please copy paste the link to the message you want to report.\n\
     You can obtain this link by right-clicking the message and clicking `Copy Message Link`.";

pub const BAD_LINK_MESSAGE: &str =
    "I'm sorry, I couldn't read that link. Please try again or say `cancel` to cancel.";

pub const CANCELLED_MESSAGE: &str = "Report cancelled.";

const COMPLETE_MESSAGE: &str =
    "Thank you for reporting. Our moderation team will review the message and take appropriate action.";

const BLOCKED_MESSAGE: &str = "The user has been blocked from contacting you.";

/// Intake states. `TargetIdentified` and `Level` each have exactly one menu
/// outstanding; `AwaitingTarget` and `AwaitingContext` wait on free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeState {
    Start,
    AwaitingTarget,
    TargetIdentified,
    Level,
    AwaitingContext,
    AwaitingBlockDecision,
    Complete,
    Cancelled,
}

/// What a text submission needs from the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    /// A link was parsed; the dispatcher must dereference it through the
    /// gateway and call `target_resolved` / `target_unresolvable`.
    ResolveTarget(MessageLink),
    Replies(Vec<Reply>),
    /// The text does not apply to the current state.
    Ignored,
}

/// One in-flight report intake. Owns its `ReportRecord` until the workflow
/// reaches a terminal state.
#[derive(Debug)]
pub struct IntakeInstance {
    reporter: ActorId,
    state: IntakeState,
    level: u8,
    current_node: Option<&'static PromptNode>,
    pending_prompt: Option<PromptId>,
    record: Option<ReportRecord>,
}

impl IntakeInstance {
    pub fn new(reporter: ActorId) -> Self {
        Self {
            reporter,
            state: IntakeState::Start,
            level: 0,
            current_node: None,
            pending_prompt: None,
            record: None,
        }
    }

    pub fn reporter(&self) -> &ActorId {
        &self.reporter
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn pending_prompt(&self) -> Option<PromptId> {
        self.pending_prompt
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, IntakeState::Complete | IntakeState::Cancelled)
    }

    pub fn record(&self) -> Option<&ReportRecord> {
        self.record.as_ref()
    }

    /// Consume the instance; yields the record only for completed (not
    /// cancelled) intakes, which is the point ownership moves to review.
    pub fn take_record(self) -> Option<ReportRecord> {
        match self.state {
            IntakeState::Complete => self.record,
            _ => None,
        }
    }

    /// Attach the prompt id the gateway returned for the menu just posted.
    pub fn prompt_issued(&mut self, prompt_id: PromptId) {
        self.pending_prompt = Some(prompt_id);
    }

    /// Handle a plain text submission from the reporter.
    pub fn submit_text(&mut self, text: &str) -> TextOutcome {
        match self.state {
            IntakeState::Start => {
                self.state = IntakeState::AwaitingTarget;
                tracing::info!(reporter = %self.reporter, "intake started");
                TextOutcome::Replies(vec![Reply::Text(START_INSTRUCTIONS.to_string())])
            }
            IntakeState::AwaitingTarget => match MessageLink::parse(text) {
                Some(link) => TextOutcome::ResolveTarget(link),
                None => TextOutcome::Replies(vec![Reply::Text(BAD_LINK_MESSAGE.to_string())]),
            },
            IntakeState::AwaitingContext => {
                if text.trim() != "skip" {
                    if let Some(record) = self.record.as_mut() {
                        record.additional_context = Some(text.trim().to_string());
                    }
                }
                self.state = IntakeState::AwaitingBlockDecision;
                TextOutcome::Replies(vec![Reply::Menu(MenuPrompt {
                    prompt: BLOCK_PROMPT.to_string(),
                    options: BLOCK_OPTIONS,
                    follow_up: true,
                })])
            }
            _ => TextOutcome::Ignored,
        }
    }

    /// The dispatcher resolved the pasted link; snapshot the target into the
    /// record and issue the category menu.
    pub fn target_resolved(&mut self, resolved: &ResolvedMessage) -> Vec<Reply> {
        if self.state != IntakeState::AwaitingTarget {
            return Vec::new();
        }
        self.record = Some(ReportRecord::new(
            self.reporter.clone(),
            resolved.author_name.clone(),
            resolved.content.clone(),
        ));
        self.state = IntakeState::TargetIdentified;
        tracing::info!(
            reporter = %self.reporter,
            author = %resolved.author_name,
            "target message identified"
        );
        let prompt = format!(
            "This is the author and their message we found:```{}: {}```\n{}",
            resolved.author_name, resolved.content, CATEGORY_PROMPT
        );
        vec![Reply::Menu(MenuPrompt {
            prompt,
            options: CATEGORY_OPTIONS,
            follow_up: false,
        })]
    }

    /// The pasted link could not be dereferenced. Recoverable: the instance
    /// stays in `AwaitingTarget` and the reporter is asked to retry.
    pub fn target_unresolvable(&self, error: &GatewayError) -> Vec<Reply> {
        let text = match error {
            GatewayError::UnknownGuild(_) => {
                "I cannot accept reports of messages from guilds that I'm not in. \
                 Please have the guild owner add me to the guild and try again."
            }
            GatewayError::UnknownChannel(_) => {
                "It seems this channel was deleted or never existed. \
                 Please try again or say `cancel` to cancel."
            }
            GatewayError::UnknownMessage(_) => {
                "It seems this message was deleted or never existed. \
                 Please try again or say `cancel` to cancel."
            }
            GatewayError::Transport(_) => {
                "Something went wrong looking that message up. \
                 Please try again or say `cancel` to cancel."
            }
        };
        vec![Reply::Text(text.to_string())]
    }

    /// Handle a menu selection. Stale prompt ids and unknown option keys are
    /// ignored without any state change.
    pub fn submit_choice(&mut self, prompt_id: PromptId, option_key: &str) -> Vec<Reply> {
        if self.is_terminal() || self.pending_prompt != Some(prompt_id) {
            tracing::debug!(reporter = %self.reporter, %prompt_id, "stale choice ignored");
            return Vec::new();
        }
        match self.state {
            IntakeState::TargetIdentified => self.choose_category(option_key),
            IntakeState::Level => self.choose_attribute(option_key),
            IntakeState::AwaitingBlockDecision => self.choose_block(option_key),
            _ => Vec::new(),
        }
    }

    /// Cancel from any non-terminal state, regardless of prompt correlation.
    pub fn cancel(&mut self) -> Vec<Reply> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.state = IntakeState::Cancelled;
        self.pending_prompt = None;
        tracing::info!(reporter = %self.reporter, "intake cancelled");
        vec![Reply::Text(CANCELLED_MESSAGE.to_string())]
    }

    fn choose_category(&mut self, option_key: &str) -> Vec<Reply> {
        let Some(option) = CATEGORY_OPTIONS.iter().find(|o| o.key == option_key) else {
            tracing::debug!(reporter = %self.reporter, option_key, "unknown option ignored");
            return Vec::new();
        };
        let Some(category) = Category::from_label(option.value) else {
            return Vec::new();
        };
        self.pending_prompt = None;
        let record = self.record.as_mut().expect("record exists after target");
        record.category = Some(category);
        tracing::info!(reporter = %self.reporter, %category, "category selected");

        let entry = INTAKE_GRAPH
            .entry(category)
            .expect("every category has an intake entry");
        self.enter_node(entry);
        vec![
            Reply::Text(format!("Selected Category: {category}")),
            Reply::Menu(MenuPrompt {
                prompt: entry.prompt.to_string(),
                options: entry.options,
                follow_up: true,
            }),
        ]
    }

    fn choose_attribute(&mut self, option_key: &str) -> Vec<Reply> {
        let node = self.current_node.expect("level state has a current node");
        let Some(option) = node.option_by_key(option_key) else {
            tracing::debug!(reporter = %self.reporter, option_key, "unknown option ignored");
            return Vec::new();
        };
        self.pending_prompt = None;
        let record = self.record.as_mut().expect("record exists at level state");
        record.set_attribute(node.attribute, option.value);
        tracing::info!(
            reporter = %self.reporter,
            attribute = node.attribute,
            value = option.value,
            level = self.level,
            "attribute recorded"
        );

        let hop = {
            let record = self.record.as_ref().expect("record exists at level state");
            INTAKE_GRAPH.resolve_next(node, |key| record.attribute(key))
        };
        match hop {
            NextHop::Node(next) => {
                self.enter_node(next);
                vec![Reply::Menu(MenuPrompt {
                    prompt: next.prompt.to_string(),
                    options: next.options,
                    follow_up: true,
                })]
            }
            NextHop::Context => {
                self.state = IntakeState::AwaitingContext;
                self.current_node = None;
                vec![Reply::Text(CONTEXT_PROMPT.to_string())]
            }
            // All intake branches converge on the block step.
            NextHop::Block | NextHop::Complete => {
                self.state = IntakeState::AwaitingBlockDecision;
                self.current_node = None;
                vec![Reply::Menu(MenuPrompt {
                    prompt: BLOCK_PROMPT.to_string(),
                    options: BLOCK_OPTIONS,
                    follow_up: true,
                })]
            }
        }
    }

    fn choose_block(&mut self, option_key: &str) -> Vec<Reply> {
        let Some(option) = BLOCK_OPTIONS.iter().find(|o| o.key == option_key) else {
            tracing::debug!(reporter = %self.reporter, option_key, "unknown option ignored");
            return Vec::new();
        };
        self.pending_prompt = None;
        let blocked = option.value == "Yes";
        if let Some(record) = self.record.as_mut() {
            record.block_requested = blocked;
        }
        self.state = IntakeState::Complete;
        tracing::info!(reporter = %self.reporter, blocked, "intake complete");

        let mut replies = Vec::new();
        if blocked {
            replies.push(Reply::Text(BLOCKED_MESSAGE.to_string()));
        }
        replies.push(Reply::Text(COMPLETE_MESSAGE.to_string()));
        replies
    }

    fn enter_node(&mut self, node: &'static PromptNode) {
        self.current_node = Some(node);
        self.state = IntakeState::Level;
        self.level += 1;
    }
}
