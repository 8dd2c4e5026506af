//! Inbound webhook payload types.
//!
//! Meta delivers one notification per HTTP POST: an envelope with an
//! `object` discriminator and a batch of page entries, each carrying an
//! ordered list of messaging events. An event is a union keyed by which of
//! six payload fields is present; [`MessagingEvent::kind`] decodes that
//! union and rejects events that set none or several of them.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

/// One page's batch of messaging events.
#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

/// Sender or recipient reference.
#[derive(Debug, Deserialize)]
pub struct Principal {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagingEvent {
    pub sender: Principal,
    pub recipient: Principal,
    #[serde(default)]
    pub timestamp: u64,
    optin: Option<Optin>,
    message: Option<Message>,
    delivery: Option<Delivery>,
    postback: Option<Postback>,
    read: Option<Read>,
    account_linking: Option<AccountLinking>,
}

/// Authentication callback from the "Send to Messenger" plugin.
#[derive(Debug, Deserialize)]
pub struct Optin {
    /// Developer-defined pass-through value (`data-ref`).
    #[serde(rename = "ref")]
    pub pass_through: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub mid: String,
    pub text: Option<String>,
    /// Absent means "no attachments", never an empty list.
    pub attachments: Option<Vec<serde_json::Value>>,
    pub quick_reply: Option<QuickReplyTap>,
    #[serde(default)]
    pub is_echo: bool,
    pub app_id: Option<u64>,
    pub metadata: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuickReplyTap {
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Delivery {
    pub mids: Option<Vec<String>>,
    pub watermark: Option<u64>,
    pub seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Postback {
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Read {
    pub watermark: Option<u64>,
    pub seq: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AccountLinking {
    pub status: Option<String>,
    pub authorization_code: Option<String>,
}

/// A messaging event decoded to exactly one payload.
#[derive(Debug)]
pub enum EventKind<'a> {
    Optin(&'a Optin),
    Message(&'a Message),
    Delivery(&'a Delivery),
    Postback(&'a Postback),
    Read(&'a Read),
    AccountLinking(&'a AccountLinking),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("messaging event carries no recognized payload")]
    Empty,
    #[error("messaging event carries {0} conflicting payloads")]
    Conflicting(usize),
}

impl MessagingEvent {
    /// Decode the presence-of-field union into a single [`EventKind`].
    ///
    /// Fails closed: an event with zero populated payload fields, or with
    /// more than one, is rejected instead of being dispatched on whichever
    /// field happens to be checked first.
    pub fn kind(&self) -> Result<EventKind<'_>, EventError> {
        let mut kinds: Vec<EventKind<'_>> = Vec::with_capacity(1);
        if let Some(optin) = &self.optin {
            kinds.push(EventKind::Optin(optin));
        }
        if let Some(message) = &self.message {
            kinds.push(EventKind::Message(message));
        }
        if let Some(delivery) = &self.delivery {
            kinds.push(EventKind::Delivery(delivery));
        }
        if let Some(postback) = &self.postback {
            kinds.push(EventKind::Postback(postback));
        }
        if let Some(read) = &self.read {
            kinds.push(EventKind::Read(read));
        }
        if let Some(account_linking) = &self.account_linking {
            kinds.push(EventKind::AccountLinking(account_linking));
        }

        match kinds.len() {
            0 => Err(EventError::Empty),
            1 => Ok(kinds.remove(0)),
            n => Err(EventError::Conflicting(n)),
        }
    }
}
