// Workflow state machines and the graphs they walk

pub mod graph;
pub mod intake;
pub mod review;

use graph::MenuOption;

/// Outbound effect of a workflow transition. The dispatcher turns these into
/// gateway calls; the instances themselves never touch the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Menu(MenuPrompt),
}

/// A menu the dispatcher should post. The prompt id comes back from the
/// gateway and is attached to the instance via `prompt_issued`.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuPrompt {
    pub prompt: String,
    pub options: &'static [MenuOption],
    /// Follow-up menus are eligible for the optional intake expiry timeout.
    pub follow_up: bool,
}
