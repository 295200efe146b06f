//! Gateway ↔ Channels bridge — translates between gateway events and channel messages.

use crate::channels::{ChannelMessage, ChannelType, ChannelUser};
use crate::gateway::events::{GatewayEvent, ServerMessage};

/// Bridge connecting Gateway events to the Channel system.
pub struct ChannelBridge;

impl ChannelBridge {
    pub fn new() -> Self {
        Self
    }

    /// Translate a gateway event into channel messages (if applicable).
    pub fn handle_gateway_event(&self, event: &GatewayEvent) -> Vec<ChannelMessage> {
        match event {
            GatewayEvent::TaskSubmitted { description, .. } => {
                let sender = ChannelUser::new("gateway", ChannelType::WebChat);
                vec![ChannelMessage::text(
                    ChannelType::WebChat,
                    "gateway",
                    sender,
                    description,
                )]
            }
            GatewayEvent::AssistantMessage { content } => {
                let sender = ChannelUser::new("assistant", ChannelType::WebChat);
                vec![ChannelMessage::text(
                    ChannelType::WebChat,
                    "gateway",
                    sender,
                    content,
                )]
            }
            _ => Vec::new(),
        }
    }

    /// Translate a channel message into a gateway event.
    pub fn gateway_event_from_channel_message(msg: &ChannelMessage) -> GatewayEvent {
        let channel_type = format!("{:?}", msg.channel_type);
        let text = msg.content.as_text().unwrap_or("").to_string();
        GatewayEvent::ChannelMessageReceived {
            channel_type,
            message: text,
        }
    }

    /// Translate a channel message into a ServerMessage.
    pub fn server_message_from_channel_message(msg: &ChannelMessage) -> ServerMessage {
        ServerMessage::Event {
            event: Self::gateway_event_from_channel_message(msg),
        }
    }
}

impl Default for ChannelBridge {
    fn default() -> Self {
        Self::new()
    }
}
