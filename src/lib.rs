// mod-triage - guided abuse-report intake and moderator review
// This exposes the core components for testing and integration

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod report;
pub mod summary;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use classifier::{build_auto_report, Classifier, ScriptedClassifier, Verdict};
pub use config::ModTriageConfig;
pub use dispatch::{DispatchError, Dispatcher, CANCEL_KEYWORD, HELP_KEYWORD, START_KEYWORD};
pub use gateway::{
    ChannelRef, GatewayError, GuildRef, MessageLink, MessageRef, MessagingGateway, PromptId,
    ResolvedMessage,
};
pub use report::{
    ActorId, Category, ModAction, ReportId, ReportRecord, ReviewRecord, Severity,
};
pub use summary::render_report_summary;
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workflow::graph::{MenuOption, WorkflowGraph, INTAKE_GRAPH, REVIEW_GRAPH};
pub use workflow::intake::{IntakeInstance, IntakeState, TextOutcome};
pub use workflow::review::{determine_action, ReviewInstance, ReviewState};
pub use workflow::{MenuPrompt, Reply};
