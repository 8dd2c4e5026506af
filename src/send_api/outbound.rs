//! Outbound Send API message model.
//!
//! These types serialize to the exact JSON bodies the Graph Send API
//! expects: a recipient plus either a `message` or a `sender_action`,
//! with attachments tagged by `type` and templates by `template_type`.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub recipient: Recipient,
    #[serde(flatten)]
    pub payload: OutboundPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub id: String,
}

/// Exactly one of `message` or `sender_action` per send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundPayload {
    Message(MessageBody),
    SenderAction(SenderAction),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<QuickReply>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Attachment {
    Image(MediaPayload),
    Audio(MediaPayload),
    Video(MediaPayload),
    File(MediaPayload),
    Template(TemplatePayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaPayload {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "template_type", rename_all = "snake_case")]
pub enum TemplatePayload {
    Button {
        text: String,
        buttons: Vec<Button>,
    },
    Generic {
        elements: Vec<GenericElement>,
    },
    Receipt {
        recipient_name: String,
        order_number: String,
        currency: String,
        payment_method: String,
        timestamp: String,
        elements: Vec<ReceiptElement>,
        address: Address,
        summary: Summary,
        adjustments: Vec<Adjustment>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    WebUrl { url: String, title: String },
    Postback { title: String, payload: String },
    PhoneNumber { title: String, payload: String },
    AccountLink { url: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct GenericElement {
    pub title: String,
    pub subtitle: String,
    pub item_url: String,
    pub image_url: String,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptElement {
    pub title: String,
    pub subtitle: String,
    pub quantity: u32,
    pub price: f64,
    pub currency: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub street_1: String,
    pub street_2: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total_tax: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Adjustment {
    pub name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub content_type: String,
    pub title: String,
    pub payload: String,
}

impl OutboundMessage {
    /// Plain text send. Carries the developer metadata marker the platform
    /// echoes back on `is_echo` events.
    pub fn text(recipient_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.into(),
            },
            payload: OutboundPayload::Message(MessageBody {
                text: Some(text.into()),
                metadata: Some("DEVELOPER_DEFINED_METADATA".to_string()),
                ..MessageBody::default()
            }),
        }
    }

    pub fn attachment(recipient_id: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.into(),
            },
            payload: OutboundPayload::Message(MessageBody {
                attachment: Some(attachment),
                ..MessageBody::default()
            }),
        }
    }

    pub fn sender_action(recipient_id: impl Into<String>, action: SenderAction) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.into(),
            },
            payload: OutboundPayload::SenderAction(action),
        }
    }

    /// Text carried by this message, when it is a plain text send.
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            OutboundPayload::Message(body) => body.text.as_deref(),
            OutboundPayload::SenderAction(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}
