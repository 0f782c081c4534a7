// Recording gateway for tests - no side effects, stores everything sent

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{
    ChannelRef, GatewayError, GuildRef, MessageLink, MessagingGateway, PromptId, ResolvedMessage,
};
use crate::workflow::graph::MenuOption;

/// Everything a test gateway has delivered, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        channel: ChannelRef,
        text: String,
    },
    Menu {
        channel: ChannelRef,
        prompt: String,
        option_labels: Vec<String>,
        prompt_id: PromptId,
    },
}

/// In-memory gateway seeded with resolvable messages. Records every outbound
/// call so tests can assert on the exact conversation.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    known_guilds: Mutex<HashSet<GuildRef>>,
    known_channels: Mutex<HashSet<ChannelRef>>,
    messages: Mutex<HashMap<(u64, u64, u64), ResolvedMessage>>,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `link` resolvable to the given author/content snapshot.
    pub fn seed_message(&self, link: MessageLink, author: &str, content: &str) {
        self.known_guilds.lock().unwrap().insert(link.guild);
        self.known_channels.lock().unwrap().insert(link.channel);
        self.messages.lock().unwrap().insert(
            (link.guild.0, link.channel.0, link.message.0),
            ResolvedMessage {
                author_name: author.to_string(),
                content: content.to_string(),
            },
        );
    }

    /// Make the guild and channel known without any resolvable message, so
    /// lookups fail with `UnknownMessage` rather than `UnknownGuild`.
    pub fn seed_channel(&self, guild: GuildRef, channel: ChannelRef) {
        self.known_guilds.lock().unwrap().insert(guild);
        self.known_channels.lock().unwrap().insert(channel);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                Sent::Menu { .. } => None,
            })
            .collect()
    }

    /// Prompt id of the most recently posted menu.
    pub fn last_prompt_id(&self) -> Option<PromptId> {
        self.sent()
            .into_iter()
            .rev()
            .find_map(|s| match s {
                Sent::Menu { prompt_id, .. } => Some(prompt_id),
                Sent::Text { .. } => None,
            })
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_menu(
        &self,
        channel: ChannelRef,
        prompt: &str,
        options: &[MenuOption],
    ) -> Result<PromptId, GatewayError> {
        let prompt_id = PromptId::generate();
        self.sent.lock().unwrap().push(Sent::Menu {
            channel,
            prompt: prompt.to_string(),
            option_labels: options.iter().map(|o| o.label.to_string()).collect(),
            prompt_id,
        });
        Ok(prompt_id)
    }

    async fn send_text(&self, channel: ChannelRef, text: &str) -> Result<(), GatewayError> {
        self.sent.lock().unwrap().push(Sent::Text {
            channel,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn resolve_target_message(
        &self,
        link: MessageLink,
    ) -> Result<ResolvedMessage, GatewayError> {
        if !self.known_guilds.lock().unwrap().contains(&link.guild) {
            return Err(GatewayError::UnknownGuild(link.guild));
        }
        if !self.known_channels.lock().unwrap().contains(&link.channel) {
            return Err(GatewayError::UnknownChannel(link.channel));
        }
        self.messages
            .lock()
            .unwrap()
            .get(&(link.guild.0, link.channel.0, link.message.0))
            .cloned()
            .ok_or(GatewayError::UnknownMessage(link.message))
    }
}
