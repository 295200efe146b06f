//! End-to-end test wiring a channel message through the agent bridge,
//! multi-agent orchestrator, task handler, and back to a channel response.
//!
//! This validates the full message flow:
//! Channel → Bridge → Orchestrator → TaskHandler → Orchestrator → Bridge → Channel

use async_trait::async_trait;
use rustant_core::channels::agent_bridge::ChannelAgentBridge;
use rustant_core::channels::{ChannelMessage, ChannelType, ChannelUser};
use rustant_core::multi::messaging::{AgentEnvelope, AgentPayload, MessageBus};
use rustant_core::multi::routing::{AgentRoute, AgentRouter, RouteCondition};
use rustant_core::multi::spawner::AgentSpawner;
use rustant_core::multi::{AgentOrchestrator, TaskHandler};
use std::collections::HashMap;

/// A handler that echoes the task description back with a prefix.
struct EchoTaskHandler;

#[async_trait]
impl TaskHandler for EchoTaskHandler {
    async fn handle_task(
        &self,
        description: &str,
        _args: &HashMap<String, String>,
    ) -> Result<String, String> {
        Ok(format!("Agent reply: {description}"))
    }
}

/// Full round-trip: Slack message → route to agent → handle → response → channel message
#[tokio::test]
async fn test_e2e_slack_message_through_agent_and_back() {
    // 1. Set up multi-agent system
    let mut spawner = AgentSpawner::default();
    let agent_id = spawner.spawn("slack-agent").unwrap();
    let bridge_id = spawner.spawn("bridge").unwrap();

    let mut bus = MessageBus::new(100);
    bus.register(agent_id);
    bus.register(bridge_id);

    // 2. Set up routing: Slack messages → slack-agent
    let mut orch_router = AgentRouter::new();
    orch_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: agent_id,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Slack)],
    });

    let mut orch = AgentOrchestrator::new(spawner, bus, orch_router);
    orch.register_handler(agent_id, Box::new(EchoTaskHandler));

    // 3. Create bridge with its own router and incoming channel message
    let mut bridge_router = AgentRouter::new();
    bridge_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: agent_id,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Slack)],
    });
    let bridge = ChannelAgentBridge::new(bridge_router);
    let sender = ChannelUser::new("alice", ChannelType::Slack).with_name("Alice");
    let incoming = ChannelMessage::text(
        ChannelType::Slack,
        "general",
        sender,
        "What is the weather today?",
    );

    // 4. Route message through bridge
    let target = bridge.route_channel_message(&incoming, bridge_id);
    assert_eq!(target, agent_id, "Message should route to slack-agent");

    // 5. Convert to envelope and send to orchestrator
    let envelope = ChannelAgentBridge::channel_message_to_envelope(&incoming, bridge_id, target);
    orch.bus_mut().send(envelope).unwrap();

    // 6. Process the task
    orch.process_pending().await;

    // 7. Receive the response
    let response = orch.bus_mut().receive(&bridge_id).unwrap();
    match &response.payload {
        AgentPayload::TaskResult { output, success } => {
            assert!(success);
            assert_eq!(output, "Agent reply: What is the weather today?");
        }
        other => panic!("Expected TaskResult, got {other:?}"),
    }

    // 8. Convert response back to channel message
    let reply =
        ChannelAgentBridge::envelope_to_channel_message(&response, ChannelType::Slack).unwrap();
    assert_eq!(reply.channel_type, ChannelType::Slack);
    assert_eq!(
        reply.content.as_text(),
        Some("Agent reply: What is the weather today?")
    );
}

/// Verify that different channels route to different agents.
#[tokio::test]
async fn test_e2e_multi_channel_routing() {
    let mut spawner = AgentSpawner::default();
    let slack_agent = spawner.spawn("slack-agent").unwrap();
    let telegram_agent = spawner.spawn("telegram-agent").unwrap();
    let default_agent = spawner.spawn("default").unwrap();

    let mut bus = MessageBus::new(100);
    bus.register(slack_agent);
    bus.register(telegram_agent);
    bus.register(default_agent);

    let mut router = AgentRouter::new();
    router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: slack_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Slack)],
    });
    router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: telegram_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Telegram)],
    });

    let bridge = ChannelAgentBridge::new(router);

    // Slack message routes to slack-agent
    let slack_msg = ChannelMessage::text(
        ChannelType::Slack,
        "general",
        ChannelUser::new("bob", ChannelType::Slack),
        "hello from slack",
    );
    assert_eq!(
        bridge.route_channel_message(&slack_msg, default_agent),
        slack_agent
    );

    // Telegram message routes to telegram-agent
    let tg_msg = ChannelMessage::text(
        ChannelType::Telegram,
        "chat123",
        ChannelUser::new("carol", ChannelType::Telegram),
        "hello from telegram",
    );
    assert_eq!(
        bridge.route_channel_message(&tg_msg, default_agent),
        telegram_agent
    );

    // Discord message (no route) falls back to default
    let discord_msg = ChannelMessage::text(
        ChannelType::Discord,
        "server1",
        ChannelUser::new("dave", ChannelType::Discord),
        "hello from discord",
    );
    assert_eq!(
        bridge.route_channel_message(&discord_msg, default_agent),
        default_agent
    );
}

/// Test that channel metadata is preserved through the bridge round-trip.
#[test]
fn test_e2e_channel_metadata_preservation() {
    let sender = ChannelUser::new("alice", ChannelType::Email).with_name("Alice Smith");
    let msg = ChannelMessage::text(ChannelType::Email, "inbox", sender, "Check my schedule")
        .with_metadata("subject", "Schedule Request")
        .with_metadata("from_addr", "alice@example.com");

    let from = uuid::Uuid::new_v4();
    let to = uuid::Uuid::new_v4();
    let envelope = ChannelAgentBridge::channel_message_to_envelope(&msg, from, to);

    match &envelope.payload {
        AgentPayload::TaskRequest { description, args } => {
            assert_eq!(description, "Check my schedule");
            assert_eq!(args.get("channel_type").unwrap(), "Email");
            assert_eq!(args.get("sender").unwrap(), "alice");
        }
        _ => panic!("Expected TaskRequest"),
    }
}

/// Full round-trip for Email: message → bridge → orchestrator → handler → bridge → channel
#[tokio::test]
async fn test_e2e_email_message_through_agent_and_back() {
    let mut spawner = AgentSpawner::default();
    let email_agent = spawner.spawn("email-agent").unwrap();
    let bridge_id = spawner.spawn("bridge").unwrap();

    let mut bus = MessageBus::new(100);
    bus.register(email_agent);
    bus.register(bridge_id);

    let mut orch_router = AgentRouter::new();
    orch_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: email_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Email)],
    });

    let mut orch = AgentOrchestrator::new(spawner, bus, orch_router);
    orch.register_handler(email_agent, Box::new(EchoTaskHandler));

    let mut bridge_router = AgentRouter::new();
    bridge_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: email_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Email)],
    });
    let bridge = ChannelAgentBridge::new(bridge_router);
    let sender = ChannelUser::new("alice@example.com", ChannelType::Email).with_name("Alice");
    let incoming = ChannelMessage::text(
        ChannelType::Email,
        "alice@example.com",
        sender,
        "Please schedule a meeting",
    )
    .with_metadata("subject", "Meeting Request");

    // Route + convert + send
    let target = bridge.route_channel_message(&incoming, bridge_id);
    assert_eq!(target, email_agent, "Email should route to email-agent");

    let envelope = ChannelAgentBridge::channel_message_to_envelope(&incoming, bridge_id, target);
    orch.bus_mut().send(envelope).unwrap();
    orch.process_pending().await;

    // Receive and convert back
    let response = orch.bus_mut().receive(&bridge_id).unwrap();
    match &response.payload {
        AgentPayload::TaskResult { output, success } => {
            assert!(success);
            assert_eq!(output, "Agent reply: Please schedule a meeting");
        }
        other => panic!("Expected TaskResult, got {other:?}"),
    }

    let reply =
        ChannelAgentBridge::envelope_to_channel_message(&response, ChannelType::Email).unwrap();
    assert_eq!(reply.channel_type, ChannelType::Email);
    assert_eq!(
        reply.content.as_text(),
        Some("Agent reply: Please schedule a meeting")
    );
}

/// Full round-trip for iMessage channel through the bridge.
#[tokio::test]
async fn test_e2e_imessage_message_through_agent_and_back() {
    let mut spawner = AgentSpawner::default();
    let imessage_agent = spawner.spawn("imessage-agent").unwrap();
    let bridge_id = spawner.spawn("bridge").unwrap();

    let mut bus = MessageBus::new(100);
    bus.register(imessage_agent);
    bus.register(bridge_id);

    let mut orch_router = AgentRouter::new();
    orch_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: imessage_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::IMessage)],
    });

    let mut orch = AgentOrchestrator::new(spawner, bus, orch_router);
    orch.register_handler(imessage_agent, Box::new(EchoTaskHandler));

    let mut bridge_router = AgentRouter::new();
    bridge_router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: imessage_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::IMessage)],
    });
    let bridge = ChannelAgentBridge::new(bridge_router);
    let sender = ChannelUser::new("+31644709979", ChannelType::IMessage).with_name("Chaitu");
    let incoming = ChannelMessage::text(
        ChannelType::IMessage,
        "+31644709979",
        sender,
        "Hi! What can you do?",
    );

    let target = bridge.route_channel_message(&incoming, bridge_id);
    assert_eq!(target, imessage_agent);

    let envelope = ChannelAgentBridge::channel_message_to_envelope(&incoming, bridge_id, target);
    orch.bus_mut().send(envelope).unwrap();
    orch.process_pending().await;

    let response = orch.bus_mut().receive(&bridge_id).unwrap();
    match &response.payload {
        AgentPayload::TaskResult { output, success } => {
            assert!(success);
            assert_eq!(output, "Agent reply: Hi! What can you do?");
        }
        other => panic!("Expected TaskResult, got {other:?}"),
    }

    let reply =
        ChannelAgentBridge::envelope_to_channel_message(&response, ChannelType::IMessage).unwrap();
    assert_eq!(reply.channel_type, ChannelType::IMessage);
}

/// Verify all 13 channel types can be routed through the bridge without panics.
#[test]
fn test_e2e_all_channel_types_route_through_bridge() {
    let mut router = AgentRouter::new();
    let default_agent = uuid::Uuid::new_v4();

    // Add routes for a few channels, rest fall back to default
    let email_agent = uuid::Uuid::new_v4();
    let imessage_agent = uuid::Uuid::new_v4();
    router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: email_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::Email)],
    });
    router.add_route(AgentRoute {
        priority: 1,
        target_agent_id: imessage_agent,
        conditions: vec![RouteCondition::ChannelType(ChannelType::IMessage)],
    });

    let bridge = ChannelAgentBridge::new(router);

    let all_types = vec![
        ChannelType::Slack,
        ChannelType::Discord,
        ChannelType::Telegram,
        ChannelType::Email,
        ChannelType::Matrix,
        ChannelType::Signal,
        ChannelType::WhatsApp,
        ChannelType::Sms,
        ChannelType::Irc,
        ChannelType::Teams,
        ChannelType::IMessage,
        ChannelType::WebChat,
        ChannelType::Webhook,
    ];

    for ch_type in &all_types {
        let sender = ChannelUser::new("test-user", *ch_type);
        let msg = ChannelMessage::text(*ch_type, "test-channel", sender, "hello");
        let target = bridge.route_channel_message(&msg, default_agent);

        match ch_type {
            ChannelType::Email => assert_eq!(target, email_agent),
            ChannelType::IMessage => assert_eq!(target, imessage_agent),
            _ => assert_eq!(target, default_agent),
        }
    }
}

// ── DM Pairing Integration ──────────────────────────────────────────────

/// A pairing code approval adds the account to the channel's allow-from list;
/// un-approved accounts never show up there.
#[test]
fn test_e2e_pairing_approval_grants_allow_from() {
    use rustant_core::pairing::PairingStore;
    use tempfile::TempDir;

    let dir = TempDir::new().unwrap();
    let store = PairingStore::new(dir.path());

    let outcome = store
        .upsert_pairing_request("imessage", Some("chaitu-phone"), "chaitu-phone", None)
        .unwrap();
    assert!(outcome.created);

    // Unapproved: not yet on the allow list.
    assert!(
        store
            .read_allow_from("imessage", Some("chaitu-phone"))
            .unwrap()
            .is_empty()
    );

    let approved = store
        .approve_pairing_code("imessage", &outcome.code, Some("chaitu-phone"))
        .unwrap();
    assert_eq!(approved, Some("chaitu-phone".to_string()));

    let allow_from = store.read_allow_from("imessage", Some("chaitu-phone")).unwrap();
    assert!(allow_from.iter().any(|e| e == "chaitu-phone"));

    // A stranger's code never matches.
    let stranger = store.approve_pairing_code("imessage", "ZZZZZZZZ", Some("stranger"));
    assert_eq!(stranger.unwrap(), None);
}

/// Removing an allow-from entry blocks future matches for that account.
#[test]
fn test_e2e_pairing_removal_blocks_allow_from() {
    use rustant_core::pairing::PairingStore;
    use tempfile::TempDir;

    let dir = TempDir::new().unwrap();
    let store = PairingStore::new(dir.path());

    let outcome = store
        .upsert_pairing_request("email", Some("revoke-me"), "revoke-me", None)
        .unwrap();
    store
        .approve_pairing_code("email", &outcome.code, Some("revoke-me"))
        .unwrap();
    assert!(
        store
            .read_allow_from("email", Some("revoke-me"))
            .unwrap()
            .iter()
            .any(|e| e == "revoke-me")
    );

    let removed = store
        .remove_allow_from_entry("email", Some("revoke-me"), "revoke-me")
        .unwrap();
    assert!(removed.changed);

    assert!(
        store
            .read_allow_from("email", Some("revoke-me"))
            .unwrap()
            .is_empty()
    );
}

/// Verify bidirectional envelope conversion works for all channel types.
#[test]
fn test_e2e_envelope_conversion_all_channel_types() {
    let all_types = vec![
        ChannelType::Slack,
        ChannelType::Discord,
        ChannelType::Telegram,
        ChannelType::Email,
        ChannelType::Matrix,
        ChannelType::Signal,
        ChannelType::WhatsApp,
        ChannelType::Sms,
        ChannelType::Irc,
        ChannelType::Teams,
        ChannelType::IMessage,
        ChannelType::WebChat,
        ChannelType::Webhook,
    ];

    for ch_type in &all_types {
        // channel → envelope
        let sender = ChannelUser::new("user1", *ch_type);
        let msg = ChannelMessage::text(*ch_type, "chan1", sender, "test message");
        let from = uuid::Uuid::new_v4();
        let to = uuid::Uuid::new_v4();
        let envelope = ChannelAgentBridge::channel_message_to_envelope(&msg, from, to);

        match &envelope.payload {
            AgentPayload::TaskRequest { description, args } => {
                assert_eq!(description, "test message");
                assert_eq!(args.get("channel_type").unwrap(), &format!("{ch_type:?}"));
            }
            _ => panic!("Expected TaskRequest for {ch_type:?}"),
        }

        // envelope → channel (TaskResult)
        let response_envelope = AgentEnvelope::new(
            to,
            from,
            AgentPayload::TaskResult {
                success: true,
                output: format!("reply for {ch_type:?}"),
            },
        );
        let reply =
            ChannelAgentBridge::envelope_to_channel_message(&response_envelope, *ch_type).unwrap();
        assert_eq!(reply.channel_type, *ch_type);
        assert_eq!(
            reply.content.as_text().unwrap(),
            &format!("reply for {ch_type:?}")
        );
    }
}
