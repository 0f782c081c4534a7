// Messaging Gateway seam - the only place the core touches a chat transport.
//
// The dispatcher consumes this trait; the core never formats transport
// payloads beyond plain prompt/option text.

pub mod console;
pub mod mock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::graph::MenuOption;

/// Identifies the container (guild/server) a message lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildRef(pub u64);

/// Identifies a channel within a guild, or a direct-message channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef(pub u64);

/// Identifies a single message within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(pub u64);

/// Identifies one outstanding menu. Choice events carry the prompt id they
/// answer; anything else is stale and gets ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptId(pub Uuid);

impl PromptId {
    pub fn generate() -> Self {
        PromptId(Uuid::new_v4())
    }
}

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A reporter-pasted link to the message being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLink {
    pub guild: GuildRef,
    pub channel: ChannelRef,
    pub message: MessageRef,
}

static LINK_RE: OnceLock<Regex> = OnceLock::new();

impl MessageLink {
    /// Extract the three id segments from a pasted message link. Returns
    /// `None` when the text carries no recognizable link.
    pub fn parse(text: &str) -> Option<MessageLink> {
        let re = LINK_RE.get_or_init(|| Regex::new(r"/(\d+)/(\d+)/(\d+)").expect("link regex"));
        let caps = re.captures(text)?;
        Some(MessageLink {
            guild: GuildRef(caps[1].parse().ok()?),
            channel: ChannelRef(caps[2].parse().ok()?),
            message: MessageRef(caps[3].parse().ok()?),
        })
    }
}

/// Snapshot of a resolved target message. The workflow copies these fields
/// into the record so later edits to the source cannot change the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMessage {
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway is not a member of guild {0:?}")]
    UnknownGuild(GuildRef),
    #[error("channel {0:?} was deleted or never existed")]
    UnknownChannel(ChannelRef),
    #[error("message {0:?} was deleted or never existed")]
    UnknownMessage(MessageRef),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Narrow interface to the chat transport. Implementations own all
/// platform-specific formatting and delivery concerns.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Post a prompt with selectable options; returns the id that correlates
    /// the eventual choice event back to this menu.
    async fn send_menu(
        &self,
        channel: ChannelRef,
        prompt: &str,
        options: &[MenuOption],
    ) -> Result<PromptId, GatewayError>;

    /// Post plain text.
    async fn send_text(&self, channel: ChannelRef, text: &str) -> Result<(), GatewayError>;

    /// Dereference a pasted message link into an author/content snapshot.
    async fn resolve_target_message(
        &self,
        link: MessageLink,
    ) -> Result<ResolvedMessage, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_message_link() {
        let link = MessageLink::parse(
            "https://discord.com/channels/1211760623969370122/1211760624000000000/42",
        )
        .expect("link should parse");
        assert_eq!(link.guild, GuildRef(1211760623969370122));
        assert_eq!(link.channel, ChannelRef(1211760624000000000));
        assert_eq!(link.message, MessageRef(42));
    }

    #[test]
    fn rejects_text_without_a_link() {
        assert_eq!(MessageLink::parse("no link here"), None);
        assert_eq!(MessageLink::parse("/123/456"), None);
    }

    #[test]
    fn finds_a_link_embedded_in_other_text() {
        let link = MessageLink::parse("here it is /1/2/3 thanks").unwrap();
        assert_eq!(link.message, MessageRef(3));
    }
}
