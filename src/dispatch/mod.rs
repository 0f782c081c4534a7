// SessionRegistry / Dispatcher - correlates inbound events to workflow
// instances and enforces the one-active-review invariant.
//
// All shared mutable state lives here, behind a single owner: the caller
// funnels every inbound event through one Dispatcher, so workflow
// transitions run to completion without internal locking.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::gateway::{ChannelRef, GatewayError, MessagingGateway, PromptId};
use crate::report::{ActorId, ReportId, ReportRecord, ReviewRecord};
use crate::summary::render_report_summary;
use crate::telemetry::{create_dispatch_span, generate_correlation_id};
use crate::workflow::graph::MenuOption;
use crate::workflow::intake::{IntakeInstance, IntakeState, TextOutcome};
use crate::workflow::review::{ReviewInstance, ReviewState};
use crate::workflow::Reply;

pub const START_KEYWORD: &str = "report";
pub const CANCEL_KEYWORD: &str = "cancel";
pub const HELP_KEYWORD: &str = "help";

pub const HELP_TEXT: &str = "Use the `report` command to begin the reporting process.\n\
                             Use the `cancel` command to cancel the report process.";

const EXPIRY_MESSAGE: &str = "No reaction detected. Cancelling report.";

const ACCEPT_OPTIONS: &[MenuOption] = &[MenuOption {
    key: "1",
    label: "Review Report",
    value: "Review Report",
}];

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A review is already in progress; the report stays queued.
    #[error("a review is already active; report {0} remains queued")]
    ReviewAlreadyActive(ReportId),
    #[error("report {0} is not queued for review")]
    UnknownReport(ReportId),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

struct IntakeSession {
    instance: IntakeInstance,
    channel: ChannelRef,
    /// Expiry of the outstanding follow-up prompt, when the timeout is on.
    deadline: Option<DateTime<Utc>>,
    /// Ties the log events of one guided exchange together.
    correlation: String,
}

struct QueuedReport {
    record: ReportRecord,
    /// Prompt id of the "Review Report" accept option posted with the
    /// summary. None when the summary post failed; the record still queues
    /// and stays acceptable through `accept_for_review`.
    accept_prompt: Option<PromptId>,
}

pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
    mod_channel: ChannelRef,
    follow_up_timeout: Option<Duration>,
    intakes: HashMap<ActorId, IntakeSession>,
    review_queue: VecDeque<QueuedReport>,
    active_review: Option<ReviewInstance>,
}

impl Dispatcher {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        mod_channel: ChannelRef,
        follow_up_timeout: Option<Duration>,
    ) -> Self {
        Self {
            gateway,
            mod_channel,
            follow_up_timeout,
            intakes: HashMap::new(),
            review_queue: VecDeque::new(),
            active_review: None,
        }
    }

    /// Route an inbound text message from a reporter.
    pub async fn route_message(&mut self, identity: &ActorId, channel: ChannelRef, text: &str) {
        let span = create_dispatch_span("route_message", Some(&identity.0));
        self.handle_message(identity, channel, text)
            .instrument(span)
            .await
    }

    async fn handle_message(&mut self, identity: &ActorId, channel: ChannelRef, text: &str) {
        if text == HELP_KEYWORD {
            self.send_text(channel, HELP_TEXT).await;
            return;
        }
        if text == CANCEL_KEYWORD {
            if let Some(mut session) = self.intakes.remove(identity) {
                let replies = session.instance.cancel();
                tracing::info!(correlation = %session.correlation, "intake session closed");
                self.send_replies_plain(session.channel, replies).await;
            }
            return;
        }
        if !self.intakes.contains_key(identity) {
            if !text.starts_with(START_KEYWORD) {
                tracing::debug!(%identity, "message with no active intake ignored");
                return;
            }
            let correlation = generate_correlation_id();
            tracing::info!(%identity, %correlation, "intake session opened");
            let instance = IntakeInstance::new(identity.clone());
            self.intakes.insert(
                identity.clone(),
                IntakeSession {
                    instance,
                    channel,
                    deadline: None,
                    correlation,
                },
            );
        }

        let session = self
            .intakes
            .get_mut(identity)
            .expect("session inserted above");
        match session.instance.submit_text(text) {
            TextOutcome::ResolveTarget(link) => {
                let gateway = Arc::clone(&self.gateway);
                let replies = match gateway.resolve_target_message(link).await {
                    Ok(resolved) => {
                        let session = self.intakes.get_mut(identity).expect("session exists");
                        session.instance.target_resolved(&resolved)
                    }
                    Err(error) => {
                        tracing::info!(%identity, %error, "target not resolvable, reprompting");
                        let session = self.intakes.get(identity).expect("session exists");
                        session.instance.target_unresolvable(&error)
                    }
                };
                self.deliver_intake(identity, replies).await;
            }
            TextOutcome::Replies(replies) => {
                if !replies.is_empty() {
                    let session = self.intakes.get_mut(identity).expect("session exists");
                    session.deadline = None;
                }
                self.deliver_intake(identity, replies).await;
            }
            TextOutcome::Ignored => {
                tracing::debug!(%identity, "text did not apply to the current intake state");
            }
        }
    }

    /// Route an inbound menu selection: an accept on a queued report, a step
    /// of the active review, or a step of the sender's intake. Anything that
    /// matches none of those is ignored.
    pub async fn route_choice(&mut self, identity: &ActorId, prompt_id: PromptId, option_key: &str) {
        let span = create_dispatch_span("route_choice", Some(&identity.0));
        self.handle_choice(identity, prompt_id, option_key)
            .instrument(span)
            .await
    }

    async fn handle_choice(&mut self, identity: &ActorId, prompt_id: PromptId, option_key: &str) {
        // Review admission signal on a queued report summary.
        if let Some(queued) = self
            .review_queue
            .iter()
            .find(|q| q.accept_prompt == Some(prompt_id))
        {
            if option_key != ACCEPT_OPTIONS[0].key {
                return;
            }
            let report_id = queued.record.id;
            match self.accept_for_review(report_id).await {
                Ok(()) => {}
                Err(DispatchError::ReviewAlreadyActive(id)) => {
                    tracing::debug!(report = %id, "accept ignored while a review is active");
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to admit report into review");
                }
            }
            return;
        }

        // The single active review.
        if let Some(review) = self.active_review.as_mut() {
            if review.pending_prompt() == Some(prompt_id) {
                let replies = review.submit_choice(prompt_id, option_key);
                self.deliver_review(replies).await;
                if self
                    .active_review
                    .as_ref()
                    .is_some_and(|r| r.is_complete())
                {
                    let review = self.complete_review();
                    tracing::info!(
                        legitimate = review.as_ref().map(|r| r.legitimate),
                        "review finalized"
                    );
                }
                return;
            }
        }

        // The sender's own intake.
        if let Some(session) = self.intakes.get_mut(identity) {
            let replies = session.instance.submit_choice(prompt_id, option_key);
            if !replies.is_empty() {
                session.deadline = None;
            }
            self.deliver_intake(identity, replies).await;
            let finished = self
                .intakes
                .get(identity)
                .is_some_and(|s| s.instance.is_terminal());
            if finished {
                let session = self.intakes.remove(identity).expect("session exists");
                tracing::info!(correlation = %session.correlation, "intake session closed");
                if let Some(record) = session.instance.take_record() {
                    self.enqueue_for_review(record).await;
                }
            }
            return;
        }

        tracing::debug!(%identity, %prompt_id, "choice with no active instance ignored");
    }

    /// Admit a queued report into a new review instance. Fails while another
    /// review is active; the record stays queued either way.
    pub async fn accept_for_review(&mut self, report_id: ReportId) -> Result<(), DispatchError> {
        if self.active_review.is_some() {
            return Err(DispatchError::ReviewAlreadyActive(report_id));
        }
        let position = self
            .review_queue
            .iter()
            .position(|q| q.record.id == report_id)
            .ok_or(DispatchError::UnknownReport(report_id))?;
        let queued = self
            .review_queue
            .remove(position)
            .expect("position is in bounds");
        let (instance, replies) = ReviewInstance::new(queued.record);
        self.active_review = Some(instance);
        self.deliver_review(replies).await;
        Ok(())
    }

    /// Clear the active review slot, yielding the finalized record when the
    /// review actually ran to completion.
    pub fn complete_review(&mut self) -> Option<ReviewRecord> {
        self.active_review.take().and_then(ReviewInstance::finalize)
    }

    /// Post a completed report to the moderator channel and queue it (FIFO)
    /// for acceptance. Also the entry point for machine-filed reports.
    pub async fn enqueue_for_review(&mut self, record: ReportRecord) {
        let summary = render_report_summary(&record);
        let accept_prompt = match self
            .gateway
            .send_menu(self.mod_channel, &summary, ACCEPT_OPTIONS)
            .await
        {
            Ok(prompt_id) => Some(prompt_id),
            Err(error) => {
                tracing::warn!(%error, report = %record.id, "could not post report summary");
                None
            }
        };
        tracing::info!(report = %record.id, "report queued for review");
        self.review_queue.push_back(QueuedReport {
            record,
            accept_prompt,
        });
    }

    /// Cancel intakes whose follow-up prompt deadline has passed. Owned by
    /// the dispatcher; workflow instances never block waiting on a human.
    pub async fn expire_prompts(&mut self, now: DateTime<Utc>) {
        let expired: Vec<ActorId> = self
            .intakes
            .iter()
            .filter(|(_, s)| s.deadline.is_some_and(|d| d <= now))
            .map(|(id, _)| id.clone())
            .collect();
        for identity in expired {
            if let Some(mut session) = self.intakes.remove(&identity) {
                session.instance.cancel();
                tracing::info!(
                    reporter = %identity,
                    correlation = %session.correlation,
                    "prompt expired, intake cancelled"
                );
                self.send_text(session.channel, EXPIRY_MESSAGE).await;
            }
        }
    }

    // ------------------------------------------------------------------
    // Introspection (used by the binary and tests)
    // ------------------------------------------------------------------

    pub fn intake_state(&self, identity: &ActorId) -> Option<IntakeState> {
        self.intakes.get(identity).map(|s| s.instance.state())
    }

    pub fn review_state(&self) -> Option<ReviewState> {
        self.active_review.as_ref().map(|r| r.state())
    }

    pub fn queued_report_ids(&self) -> Vec<ReportId> {
        self.review_queue.iter().map(|q| q.record.id).collect()
    }

    // ------------------------------------------------------------------
    // Delivery helpers
    // ------------------------------------------------------------------

    async fn deliver_intake(&mut self, identity: &ActorId, replies: Vec<Reply>) {
        let Some(channel) = self.intakes.get(identity).map(|s| s.channel) else {
            return;
        };
        let gateway = Arc::clone(&self.gateway);
        for reply in replies {
            match reply {
                Reply::Text(text) => {
                    if let Err(error) = gateway.send_text(channel, &text).await {
                        tracing::warn!(%error, "failed to send text");
                    }
                }
                Reply::Menu(menu) => {
                    match gateway.send_menu(channel, &menu.prompt, menu.options).await {
                        Ok(prompt_id) => {
                            if let Some(session) = self.intakes.get_mut(identity) {
                                session.instance.prompt_issued(prompt_id);
                                session.deadline = if menu.follow_up {
                                    self.follow_up_timeout.map(|t| Utc::now() + t)
                                } else {
                                    None
                                };
                            }
                        }
                        Err(error) => {
                            // The instance keeps its state; the reporter can
                            // still cancel or the prompt can be re-answered
                            // once the transport recovers.
                            tracing::warn!(%error, "failed to post menu");
                        }
                    }
                }
            }
        }
    }

    async fn deliver_review(&mut self, replies: Vec<Reply>) {
        let gateway = Arc::clone(&self.gateway);
        for reply in replies {
            match reply {
                Reply::Text(text) => {
                    if let Err(error) = gateway.send_text(self.mod_channel, &text).await {
                        tracing::warn!(%error, "failed to send review text");
                    }
                }
                Reply::Menu(menu) => {
                    match gateway
                        .send_menu(self.mod_channel, &menu.prompt, menu.options)
                        .await
                    {
                        Ok(prompt_id) => {
                            if let Some(review) = self.active_review.as_mut() {
                                review.prompt_issued(prompt_id);
                            }
                        }
                        Err(error) => {
                            tracing::warn!(%error, "failed to post review menu");
                        }
                    }
                }
            }
        }
    }

    async fn send_text(&self, channel: ChannelRef, text: &str) {
        if let Err(error) = self.gateway.send_text(channel, text).await {
            tracing::warn!(%error, "failed to send text");
        }
    }

    async fn send_replies_plain(&self, channel: ChannelRef, replies: Vec<Reply>) {
        for reply in replies {
            if let Reply::Text(text) = reply {
                self.send_text(channel, &text).await;
            }
        }
    }
}
