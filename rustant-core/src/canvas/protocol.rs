//! Canvas protocol — A2UI-inspired message types for agent-to-UI communication.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages exchanged between the agent and UI canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CanvasMessage {
    /// Push new content to the canvas.
    Push {
        target: CanvasTarget,
        content_type: ContentType,
        content: String,
    },
    /// Clear all content from a canvas target.
    Clear { target: CanvasTarget },
    /// Update existing content (partial replacement).
    Update {
        target: CanvasTarget,
        content_type: ContentType,
        content: String,
    },
    /// User interaction event from the UI.
    Interact {
        action: String,
        selector: String,
        data: serde_json::Value,
    },
    /// Event notification from UI to agent.
    Event {
        event_type: String,
        target: CanvasTarget,
        data: serde_json::Value,
    },
    /// Request the current canvas state.
    State { target: CanvasTarget },
    /// Full snapshot of canvas state.
    Snapshot {
        target: CanvasTarget,
        items: Vec<CanvasItem>,
    },
}

/// A content type for canvas items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    Markdown,
    Code,
    Chart,
    Table,
    Form,
    Image,
    Diagram,
}

impl ContentType {
    /// Parse a content type from a string.
    pub fn from_str_loose(s: &str) -> Option<ContentType> {
        match s.to_lowercase().as_str() {
            "html" => Some(ContentType::Html),
            "markdown" | "md" => Some(ContentType::Markdown),
            "code" => Some(ContentType::Code),
            "chart" => Some(ContentType::Chart),
            "table" => Some(ContentType::Table),
            "form" => Some(ContentType::Form),
            "image" | "img" => Some(ContentType::Image),
            "diagram" | "mermaid" => Some(ContentType::Diagram),
            _ => None,
        }
    }
}

/// Target for canvas operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanvasTarget {
    /// Broadcast to all connected canvases.
    #[default]
    Broadcast,
    /// Target a specific canvas by name.
    Named(String),
}

/// An item stored in the canvas state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: Uuid,
    pub content_type: ContentType,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl CanvasItem {
    pub fn new(content_type: ContentType, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_type,
            content,
            created_at: chrono::Utc::now(),
        }
    }
}
