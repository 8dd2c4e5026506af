//! Outbound side of the bridge: the Send API message model and the HTTP
//! client that delivers it.

pub mod client;
pub mod outbound;

pub use client::SendApiClient;
pub use outbound::{
    Address, Adjustment, Attachment, Button, GenericElement, MediaPayload, MessageBody,
    OutboundMessage, OutboundPayload, QuickReply, Recipient, ReceiptElement, SenderAction, Summary,
    TemplatePayload,
};

use async_trait::async_trait;

/// Seam between the dispatcher and the Graph API so replies can be
/// captured in tests without a network.
#[async_trait]
pub trait SendApi: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()>;
}
