// Console gateway - stdin/stdout transport for the demo binary

use async_trait::async_trait;
use std::sync::Mutex;

use super::{
    ChannelRef, GatewayError, MessageLink, MessagingGateway, PromptId, ResolvedMessage,
};
use crate::workflow::graph::MenuOption;

/// Prints prompts to stdout and treats every syntactically valid message link
/// as resolvable. Useful for exercising the flows end to end without a chat
/// platform attached.
#[derive(Debug, Default)]
pub struct ConsoleGateway {
    last_menu: Mutex<Option<(PromptId, Vec<String>)>>,
}

impl ConsoleGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent menu and its option keys, so the console loop can turn
    /// `!<key>` input into a correlated choice event.
    pub fn last_menu(&self) -> Option<(PromptId, Vec<String>)> {
        self.last_menu.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingGateway for ConsoleGateway {
    async fn send_menu(
        &self,
        channel: ChannelRef,
        prompt: &str,
        options: &[MenuOption],
    ) -> Result<PromptId, GatewayError> {
        let prompt_id = PromptId::generate();
        println!("[channel {}] {prompt}", channel.0);
        for option in options {
            println!("  !{}: {}", option.key, option.label);
        }
        *self.last_menu.lock().unwrap() = Some((
            prompt_id,
            options.iter().map(|o| o.key.to_string()).collect(),
        ));
        Ok(prompt_id)
    }

    async fn send_text(&self, channel: ChannelRef, text: &str) -> Result<(), GatewayError> {
        println!("[channel {}] {text}", channel.0);
        Ok(())
    }

    async fn resolve_target_message(
        &self,
        link: MessageLink,
    ) -> Result<ResolvedMessage, GatewayError> {
        Ok(ResolvedMessage {
            author_name: format!("user-{}", link.message.0 % 1000),
            content: format!("(message {} from channel {})", link.message.0, link.channel.0),
        })
    }
}
