// Declarative workflow graphs - the branching is data, not code.
//
// Each category's question sequence is a small directed tree of prompt nodes.
// Adding a category or a level is a table change here; the instances in
// intake.rs / review.rs only ever walk the tables.

use crate::report::Category;

/// One selectable menu entry: the key the transport reports back, the label
/// shown to the actor, and the value stored into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuOption {
    pub key: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}

/// Where the flow goes after a node's attribute has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Fixed next node.
    Node(&'static str),
    /// Next node chosen by a previously stored attribute.
    Branch {
        on: &'static str,
        arms: &'static [(&'static str, &'static str)],
    },
    /// Invite free-text context, then the block step.
    Context,
    /// The common "offer block / skip" step.
    Block,
    /// Terminal; the owning workflow completes.
    Complete,
}

/// A single step: one outstanding menu, one stored attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptNode {
    pub id: &'static str,
    pub prompt: &'static str,
    pub attribute: &'static str,
    pub options: &'static [MenuOption],
    pub next: Next,
}

impl PromptNode {
    /// Look up a menu option by the key the transport reported.
    pub fn option_by_key(&self, key: &str) -> Option<&'static MenuOption> {
        self.options.iter().find(|o| o.key == key)
    }
}

/// Resolved successor of a node, with branches already decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHop {
    Node(&'static PromptNode),
    Context,
    Block,
    Complete,
}

/// Immutable definition of one flow's steps, menus, and branch edges.
#[derive(Debug)]
pub struct WorkflowGraph {
    nodes: &'static [PromptNode],
    entries: &'static [(Category, &'static str)],
}

impl WorkflowGraph {
    pub fn node(&self, id: &str) -> Option<&'static PromptNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// First node of a category's branch.
    pub fn entry(&self, category: Category) -> Option<&'static PromptNode> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .and_then(|(_, id)| self.node(id))
    }

    /// Resolve a node's successor, deciding branch edges with the attribute
    /// lookup supplied by the caller. A branch whose stored value matches no
    /// arm resolves to `Complete`; the tables keep arms in sync with options,
    /// so this only happens for hand-built records.
    pub fn resolve_next<'a, F>(&self, node: &PromptNode, attribute: F) -> NextHop
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        match node.next {
            Next::Node(id) => self
                .node(id)
                .map(NextHop::Node)
                .unwrap_or(NextHop::Complete),
            Next::Branch { on, arms } => {
                let Some(value) = attribute(on) else {
                    return NextHop::Complete;
                };
                arms.iter()
                    .find(|(arm, _)| *arm == value)
                    .and_then(|(_, id)| self.node(id))
                    .map(NextHop::Node)
                    .unwrap_or(NextHop::Complete)
            }
            Next::Context => NextHop::Context,
            Next::Block => NextHop::Block,
            Next::Complete => NextHop::Complete,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared menus
// ---------------------------------------------------------------------------

pub const CATEGORY_PROMPT: &str = "Why are you reporting this message?";

pub const CATEGORY_OPTIONS: &[MenuOption] = &[
    MenuOption { key: "1", label: "Sexual Threat", value: "Sexual Threat" },
    MenuOption { key: "2", label: "Offensive Content", value: "Offensive Content" },
    MenuOption { key: "3", label: "Spam/Scam", value: "Spam/Scam" },
    MenuOption { key: "4", label: "Imminent Danger", value: "Danger" },
];

pub const BLOCK_PROMPT: &str =
    "Would you like to block this user so they can no longer contact you?";

pub const BLOCK_OPTIONS: &[MenuOption] = &[
    MenuOption { key: "1", label: "Yes", value: "Yes" },
    MenuOption { key: "2", label: "No", value: "No" },
];

pub const CONTEXT_PROMPT: &str =
    "If you would like, reply with additional context for the report in 50 words or less, \
     or say `skip` to continue.";

pub const LEGITIMACY_PROMPT: &str = "Is this legitimate abuse?";

pub const LEGITIMACY_OPTIONS: &[MenuOption] = &[
    MenuOption { key: "1", label: "Yes", value: "Yes" },
    MenuOption { key: "2", label: "No", value: "No" },
];

// ---------------------------------------------------------------------------
// Intake flow
// ---------------------------------------------------------------------------

static INTAKE_NODES: &[PromptNode] = &[
    PromptNode {
        id: "sexual_threat_demand",
        prompt: "What is the sender demanding or asking for?",
        attribute: "demand",
        options: &[
            MenuOption { key: "1", label: "Nude Content", value: "Nude Content" },
            MenuOption { key: "2", label: "Financial Payment", value: "Financial Payment" },
            MenuOption { key: "3", label: "Sexual Service", value: "Sexual Service" },
            MenuOption { key: "4", label: "Other", value: "Other" },
        ],
        next: Next::Node("sexual_threat_threat"),
    },
    PromptNode {
        id: "sexual_threat_threat",
        prompt: "Got it, thanks. One more question: what is the sender threatening to do?",
        attribute: "threat",
        options: &[
            MenuOption { key: "1", label: "Physical Harm", value: "Physical Harm" },
            MenuOption { key: "2", label: "Public Exposure", value: "Public Exposure" },
            MenuOption { key: "3", label: "Unclear", value: "Unclear" },
        ],
        next: Next::Context,
    },
    PromptNode {
        id: "offensive_content_type",
        prompt: "Please select the type of offensive content.",
        attribute: "offensive_content_type",
        options: &[
            MenuOption { key: "1", label: "Violent Content", value: "Violent Content" },
            MenuOption { key: "2", label: "Hateful Content", value: "Hateful Content" },
            MenuOption { key: "3", label: "Pornography", value: "Pornography" },
        ],
        next: Next::Block,
    },
    PromptNode {
        id: "spam_scam_type",
        prompt: "Please select the type of spam/scam.",
        attribute: "spam_scam_type",
        options: &[
            MenuOption { key: "1", label: "Spam", value: "Spam" },
            MenuOption { key: "2", label: "Fraud", value: "Fraud" },
            MenuOption {
                key: "3",
                label: "Impersonation or Fake Account",
                value: "Impersonation or Fake Account",
            },
        ],
        next: Next::Block,
    },
    PromptNode {
        id: "danger_type",
        prompt: "If someone is in immediate danger, please get help before reporting. Don't wait.\n\
                 When you are ready to continue, please select the nature of the danger.",
        attribute: "danger_type",
        options: &[
            MenuOption { key: "1", label: "Safety Threat", value: "Safety Threat" },
            MenuOption { key: "2", label: "Criminal Behavior", value: "Criminal Behavior" },
        ],
        next: Next::Branch {
            on: "danger_type",
            arms: &[
                ("Safety Threat", "safety_threat_type"),
                ("Criminal Behavior", "criminal_behavior_type"),
            ],
        },
    },
    PromptNode {
        id: "safety_threat_type",
        prompt: "Please select the type of safety threat.",
        attribute: "safety_threat_type",
        options: &[
            MenuOption { key: "1", label: "Suicide/Self-Harm", value: "Suicide/Self-Harm" },
            MenuOption { key: "2", label: "Violence", value: "Violence" },
        ],
        next: Next::Context,
    },
    PromptNode {
        id: "criminal_behavior_type",
        prompt: "Please select the type of criminal behavior.",
        attribute: "criminal_behavior_type",
        options: &[
            MenuOption { key: "1", label: "Theft/Robbery", value: "Theft/Robbery" },
            MenuOption { key: "2", label: "Child Abuse", value: "Child Abuse" },
            MenuOption { key: "3", label: "Human Exploitation", value: "Human Exploitation" },
        ],
        next: Next::Context,
    },
];

static INTAKE_ENTRIES: &[(Category, &str)] = &[
    (Category::SexualThreat, "sexual_threat_demand"),
    (Category::OffensiveContent, "offensive_content_type"),
    (Category::SpamScam, "spam_scam_type"),
    (Category::Danger, "danger_type"),
];

pub static INTAKE_GRAPH: WorkflowGraph = WorkflowGraph {
    nodes: INTAKE_NODES,
    entries: INTAKE_ENTRIES,
};

// ---------------------------------------------------------------------------
// Review flow
// ---------------------------------------------------------------------------

static REVIEW_NODES: &[PromptNode] = &[
    PromptNode {
        id: "review_sexual_threat",
        prompt: "Please select the sub-type of this sexual threat.",
        attribute: "subtype",
        options: &[
            MenuOption { key: "1", label: "Nude Content", value: "Nude Content" },
            MenuOption { key: "2", label: "Financial Payment", value: "Financial Payment" },
            MenuOption { key: "3", label: "Sexual Service", value: "Sexual Service" },
            MenuOption { key: "4", label: "Other", value: "Other" },
        ],
        next: Next::Node("review_severity"),
    },
    PromptNode {
        id: "review_offensive_content",
        prompt: "Please select the sub-type of this offensive content.",
        attribute: "subtype",
        options: &[
            MenuOption { key: "1", label: "Violent Content", value: "Violent Content" },
            MenuOption { key: "2", label: "Hateful Content", value: "Hateful Content" },
            MenuOption { key: "3", label: "Pornography", value: "Pornography" },
        ],
        next: Next::Node("review_severity"),
    },
    PromptNode {
        id: "review_spam_scam",
        prompt: "Please select the sub-type of this spam/scam.",
        attribute: "subtype",
        options: &[
            MenuOption { key: "1", label: "Spam", value: "Spam" },
            MenuOption { key: "2", label: "Fraud", value: "Fraud" },
            MenuOption {
                key: "3",
                label: "Impersonation or Fake Account",
                value: "Impersonation or Fake Account",
            },
        ],
        next: Next::Node("review_severity"),
    },
    PromptNode {
        id: "review_danger",
        prompt: "Please select the sub-type of this danger.",
        attribute: "subtype",
        options: &[
            MenuOption { key: "1", label: "Safety Threat", value: "Safety Threat" },
            MenuOption { key: "2", label: "Criminal Behavior", value: "Criminal Behavior" },
        ],
        next: Next::Node("review_severity"),
    },
    // Severity is the final attribute of every review branch.
    PromptNode {
        id: "review_severity",
        prompt: "How severe is this abuse?",
        attribute: "severity",
        options: &[
            MenuOption { key: "1", label: "1 - Low", value: "1" },
            MenuOption { key: "2", label: "2 - Medium", value: "2" },
            MenuOption { key: "3", label: "3 - High", value: "3" },
        ],
        next: Next::Complete,
    },
];

static REVIEW_ENTRIES: &[(Category, &str)] = &[
    (Category::SexualThreat, "review_sexual_threat"),
    (Category::OffensiveContent, "review_offensive_content"),
    (Category::SpamScam, "review_spam_scam"),
    (Category::Danger, "review_danger"),
];

pub static REVIEW_GRAPH: WorkflowGraph = WorkflowGraph {
    nodes: REVIEW_NODES,
    entries: REVIEW_ENTRIES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_an_intake_entry() {
        for category in Category::ALL {
            assert!(
                INTAKE_GRAPH.entry(category).is_some(),
                "missing intake entry for {category}"
            );
        }
    }

    #[test]
    fn every_category_has_a_review_entry() {
        for category in Category::ALL {
            let entry = REVIEW_GRAPH.entry(category).expect("review entry");
            assert_eq!(entry.attribute, "subtype");
            assert_eq!(entry.next, Next::Node("review_severity"));
        }
    }

    #[test]
    fn option_keys_are_unique_within_each_node() {
        for node in INTAKE_NODES.iter().chain(REVIEW_NODES) {
            let mut keys: Vec<_> = node.options.iter().map(|o| o.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), node.options.len(), "duplicate key in {}", node.id);
        }
    }

    #[test]
    fn danger_branches_on_stored_danger_type() {
        let danger = INTAKE_GRAPH.entry(Category::Danger).unwrap();

        let hop = INTAKE_GRAPH.resolve_next(danger, |key| {
            (key == "danger_type").then_some("Safety Threat")
        });
        match hop {
            NextHop::Node(node) => assert_eq!(node.id, "safety_threat_type"),
            other => panic!("expected safety threat node, got {other:?}"),
        }

        let hop = INTAKE_GRAPH.resolve_next(danger, |key| {
            (key == "danger_type").then_some("Criminal Behavior")
        });
        match hop {
            NextHop::Node(node) => assert_eq!(node.id, "criminal_behavior_type"),
            other => panic!("expected criminal behavior node, got {other:?}"),
        }
    }

    #[test]
    fn branch_with_no_stored_attribute_completes() {
        let danger = INTAKE_GRAPH.entry(Category::Danger).unwrap();
        let hop = INTAKE_GRAPH.resolve_next(danger, |_| None);
        assert_eq!(hop, NextHop::Complete);
    }

    #[test]
    fn sexual_threat_and_danger_invite_context_before_block() {
        let threat = INTAKE_GRAPH.node("sexual_threat_threat").unwrap();
        assert_eq!(threat.next, Next::Context);
        let safety = INTAKE_GRAPH.node("safety_threat_type").unwrap();
        assert_eq!(safety.next, Next::Context);
        let criminal = INTAKE_GRAPH.node("criminal_behavior_type").unwrap();
        assert_eq!(criminal.next, Next::Context);
    }

    #[test]
    fn offensive_and_spam_go_straight_to_block() {
        assert_eq!(INTAKE_GRAPH.node("offensive_content_type").unwrap().next, Next::Block);
        assert_eq!(INTAKE_GRAPH.node("spam_scam_type").unwrap().next, Next::Block);
    }

    #[test]
    fn severity_menu_values_parse() {
        use crate::report::Severity;
        let severity = REVIEW_GRAPH.node("review_severity").unwrap();
        for option in severity.options {
            assert!(Severity::from_label(option.value).is_some());
        }
    }
}
