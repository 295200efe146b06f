//! Discord channel implementation.
//!
//! Uses the Discord Gateway (WebSocket) for real-time events and
//! the REST API for sending messages. In tests, a trait abstraction
//! provides mock implementations.

use super::{Channel, ChannelCapabilities, ChannelMessage, ChannelStatus, ChannelType, ChannelUser, MessageId, StreamingMode};
use crate::error::{ChannelError, RustantError};
use crate::oauth::AuthMethod;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a Discord channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token or OAuth access token.
    pub bot_token: String,
    pub guild_id: Option<String>,
    pub allowed_channel_ids: Vec<String>,
    /// Authentication method. When `OAuth`, the `bot_token` field holds
    /// the OAuth 2.0 access token obtained via `discord_oauth_config()`.
    #[serde(default)]
    pub auth_method: AuthMethod,
}

/// Trait for Discord API interactions.
#[async_trait]
pub trait DiscordHttpClient: Send + Sync {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, String>;
    async fn get_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<DiscordMessage>, String>;
    async fn connect_gateway(&self) -> Result<(), String>;
    async fn disconnect_gateway(&self) -> Result<(), String>;
}

/// A Discord message from the API.
#[derive(Debug, Clone)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
}

/// Discord channel.
pub struct DiscordChannel {
    config: DiscordConfig,
    status: ChannelStatus,
    http_client: Box<dyn DiscordHttpClient>,
    name: String,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig, http_client: Box<dyn DiscordHttpClient>) -> Self {
        Self {
            config,
            status: ChannelStatus::Disconnected,
            http_client,
            name: "discord".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Discord
    }

    async fn connect(&mut self) -> Result<(), RustantError> {
        if self.config.bot_token.is_empty() {
            return Err(RustantError::Channel(ChannelError::AuthFailed {
                name: self.name.clone(),
            }));
        }
        self.http_client
            .connect_gateway()
            .await
            .map_err(|e| {
                RustantError::Channel(ChannelError::ConnectionFailed {
                    name: self.name.clone(),
                    message: e,
                })
            })?;
        self.status = ChannelStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), RustantError> {
        let _ = self.http_client.disconnect_gateway().await;
        self.status = ChannelStatus::Disconnected;
        Ok(())
    }

    async fn send_message(&self, msg: ChannelMessage) -> Result<MessageId, RustantError> {
        let text = msg.content.as_text().unwrap_or("");
        self.http_client
            .send_message(&msg.channel_id, text)
            .await
            .map(MessageId::new)
            .map_err(|e| {
                RustantError::Channel(ChannelError::SendFailed {
                    name: self.name.clone(),
                    message: e,
                })
            })
    }

    async fn receive_messages(&self) -> Result<Vec<ChannelMessage>, RustantError> {
        let mut all_messages = Vec::new();
        let channels = if self.config.allowed_channel_ids.is_empty() {
            vec!["general".to_string()]
        } else {
            self.config.allowed_channel_ids.clone()
        };

        for channel_id in &channels {
            let discord_msgs = self
                .http_client
                .get_messages(channel_id, 25)
                .await
                .map_err(|e| {
                    RustantError::Channel(ChannelError::ConnectionFailed {
                        name: self.name.clone(),
                        message: e,
                    })
                })?;

            for dm in discord_msgs {
                let sender = ChannelUser::new(&dm.author_id, ChannelType::Discord)
                    .with_name(&dm.author_name);
                let msg = ChannelMessage::text(
                    ChannelType::Discord,
                    &dm.channel_id,
                    sender,
                    &dm.content,
                );
                all_messages.push(msg);
            }
        }

        Ok(all_messages)
    }

    fn status(&self) -> ChannelStatus {
        self.status
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_threads: true,
            supports_reactions: true,
            supports_files: true,
            supports_voice: true,
            supports_video: true,
            max_message_length: Some(2000),
            supports_editing: false,
            supports_deletion: false,
        }
    }

    fn streaming_mode(&self) -> StreamingMode {
        StreamingMode::WebSocket
    }
}

/// Real Discord HTTP client using reqwest.
pub struct RealDiscordHttp {
    client: reqwest::Client,
    bot_token: String,
}

impl RealDiscordHttp {
    pub fn new(bot_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
        }
    }

    fn auth_header(&self) -> String {
        // OAuth tokens use "Bearer" prefix; bot tokens use "Bot" prefix.
        // Since the RealDiscordHttp doesn't know the auth method, callers
        // should set the bot_token field to the appropriate token.
        // For backwards compat, we use "Bot" for raw tokens.
        format!("Bot {}", self.bot_token)
    }
}

#[async_trait]
impl DiscordHttpClient for RealDiscordHttp {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, String> {
        let url = format!(
            "https://discord.com/api/v10/channels/{}/messages",
            channel_id
        );
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await
            .map_err(|e| format!("HTTP error: {e}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(|e| format!("JSON parse error: {e}"))?;

        if !status.is_success() {
            let msg = body["message"].as_str().unwrap_or("unknown error");
            return Err(format!("Discord API error ({}): {}", status, msg));
        }

        let id = body["id"].as_str().unwrap_or("0").to_string();
        Ok(id)
    }

    async fn get_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<DiscordMessage>, String> {
        let url = format!(
            "https://discord.com/api/v10/channels/{}/messages?limit={}",
            channel_id, limit
        );
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| format!("HTTP error: {e}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.map_err(|e| format!("JSON parse error: {e}"))?;

        if !status.is_success() {
            let msg = body["message"].as_str().unwrap_or("unknown error");
            return Err(format!("Discord API error ({}): {}", status, msg));
        }

        let messages = body
            .as_array()
            .unwrap_or(&Vec::new())
            .iter()
            .filter_map(|m| {
                Some(DiscordMessage {
                    id: m["id"].as_str()?.to_string(),
                    channel_id: m["channel_id"].as_str().unwrap_or("").to_string(),
                    author_id: m["author"]["id"].as_str().unwrap_or("").to_string(),
                    author_name: m["author"]["username"].as_str().unwrap_or("").to_string(),
                    content: m["content"].as_str().unwrap_or("").to_string(),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn connect_gateway(&self) -> Result<(), String> {
        // Gateway (WebSocket) connection is not implemented yet;
        // REST-only mode works for sending/receiving via polling.
        Ok(())
    }

    async fn disconnect_gateway(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Create a Discord channel with a real HTTP client.
pub fn create_discord_channel(config: DiscordConfig) -> DiscordChannel {
    let http = RealDiscordHttp::new(config.bot_token.clone());
    DiscordChannel::new(config, Box::new(http))
}
