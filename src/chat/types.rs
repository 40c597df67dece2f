use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single imported chat message. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub text: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub is_media: bool,
    #[serde(default)]
    pub media_url: Option<String>,
}

impl Message {
    /// Calendar day used for date separators
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Text shown in the timeline. Media messages without a caption get a marker.
    pub fn display_text(&self) -> &str {
        if self.is_media && self.text.trim().is_empty() {
            "[media]"
        } else {
            &self.text
        }
    }
}

/// Where a conversation was imported from
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WhatsApp,
    Instagram,
    #[default]
    Other,
}

impl Platform {
    pub fn from_category(category: &str) -> Self {
        match category.to_ascii_lowercase().as_str() {
            "whatsapp" => Self::WhatsApp,
            "instagram" | "insta" => Self::Instagram,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Instagram => "Instagram",
            Self::Other => "Chat",
        }
    }
}

/// Everything about a conversation except its message bodies.
///
/// This is what the source manifest lists and what the conversation list renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub platform: Platform,
    /// Manifest category this conversation was listed under
    #[serde(default)]
    pub category: String,
    pub message_count: usize,
    #[serde(default)]
    pub last_message_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub preview: String,
}

impl ConversationSummary {
    /// Fields that affect the list card. Message bodies are never compared.
    pub fn card_fields(&self) -> (Option<NaiveDateTime>, usize, &str) {
        (self.last_message_time, self.message_count, &self.preview)
    }

    pub fn card_changed(&self, other: &Self) -> bool {
        self.card_fields() != other.card_fields()
    }
}

/// A refreshed listing of one source category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub category: String,
    pub conversations: Vec<ConversationSummary>,
    /// Cheap fingerprint input for change detection (usually the raw index payload)
    pub change_token: String,
}
