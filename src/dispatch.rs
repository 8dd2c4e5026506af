//! Maps decoded messaging events to canned replies.
//!
//! The dispatcher is the only caller of the Send API. It never returns an
//! error: a reply that cannot be delivered is logged and dropped, so the
//! gateway's acknowledgment to the platform is never affected.

use crate::config::SERVER_URL_PLACEHOLDER;
use crate::events::{Entry, EventKind, Message, MessagingEvent};
use crate::replies;
use crate::send_api::{OutboundMessage, SendApi};
use std::sync::Arc;

pub struct ReplyDispatcher {
    send_api: Arc<dyn SendApi>,
    server_url: String,
}

/// Canned behaviors reachable through the keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordAction {
    Greeting,
    Image,
    Gif,
    Audio,
    Video,
    File,
    Button,
    Generic,
    Receipt,
    QuickReply,
    ReadReceipt,
    TypingOn,
    TypingOff,
    AccountLinking,
}

impl KeywordAction {
    /// Actions whose payloads reference static assets or callbacks under
    /// the server URL, and therefore need it configured.
    fn requires_server_url(self) -> bool {
        matches!(
            self,
            Self::Image
                | Self::Gif
                | Self::Audio
                | Self::Video
                | Self::File
                | Self::Generic
                | Self::AccountLinking
        )
    }
}

/// Strip everything that is not an ASCII word character or whitespace,
/// then trim and lowercase. Idempotent.
pub fn normalize_text(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.trim().to_lowercase()
}

/// Look up a normalized message text in the keyword table. `None` means
/// the echo fallback.
pub fn keyword_action(normalized: &str) -> Option<KeywordAction> {
    match normalized {
        "hello" | "hi" => Some(KeywordAction::Greeting),
        "image" => Some(KeywordAction::Image),
        "gif" => Some(KeywordAction::Gif),
        "audio" => Some(KeywordAction::Audio),
        "video" => Some(KeywordAction::Video),
        "file" => Some(KeywordAction::File),
        "button" => Some(KeywordAction::Button),
        "generic" => Some(KeywordAction::Generic),
        "receipt" => Some(KeywordAction::Receipt),
        "quick reply" => Some(KeywordAction::QuickReply),
        "read receipt" => Some(KeywordAction::ReadReceipt),
        "typing on" => Some(KeywordAction::TypingOn),
        "typing off" => Some(KeywordAction::TypingOff),
        "account linking" => Some(KeywordAction::AccountLinking),
        _ => None,
    }
}

impl ReplyDispatcher {
    pub fn new(send_api: Arc<dyn SendApi>, server_url: String) -> Self {
        Self {
            send_api,
            server_url,
        }
    }

    /// Process a notification batch strictly in array order, awaiting each
    /// reply before moving to the next event.
    pub async fn process_entries(&self, entries: &[Entry]) {
        for entry in entries {
            tracing::debug!(
                "Processing {} messaging event(s) for page {}",
                entry.messaging.len(),
                entry.id
            );
            for event in &entry.messaging {
                self.dispatch(event).await;
            }
        }
    }

    pub async fn dispatch(&self, event: &MessagingEvent) {
        let sender = event.sender.id.as_str();
        match event.kind() {
            Ok(EventKind::Optin(optin)) => {
                tracing::info!(
                    "Received authentication for user {} and page {} with pass-through param {:?} at {}",
                    sender,
                    event.recipient.id,
                    optin.pass_through,
                    event.timestamp
                );
                self.submit(OutboundMessage::text(sender, replies::AUTH_SUCCESSFUL_TEXT))
                    .await;
            }
            Ok(EventKind::Message(message)) => self.handle_message(sender, message).await,
            Ok(EventKind::Delivery(delivery)) => {
                for mid in delivery.mids.as_deref().unwrap_or_default() {
                    tracing::info!("Received delivery confirmation for message ID: {mid}");
                }
                if let Some(watermark) = delivery.watermark {
                    tracing::info!("All messages before {watermark} were delivered");
                }
            }
            Ok(EventKind::Postback(postback)) => {
                tracing::info!(
                    "Received postback for user {} and page {} with payload {:?} at {}",
                    sender,
                    event.recipient.id,
                    postback.payload,
                    event.timestamp
                );
                self.submit(OutboundMessage::text(sender, replies::POSTBACK_CALLED_TEXT))
                    .await;
            }
            Ok(EventKind::Read(read)) => {
                tracing::info!(
                    "Received message read event for watermark {:?} and sequence number {:?}",
                    read.watermark,
                    read.seq
                );
            }
            Ok(EventKind::AccountLinking(link)) => {
                tracing::info!(
                    "Received account link event for user {} with status {:?} and auth code {:?}",
                    sender,
                    link.status,
                    link.authorization_code
                );
            }
            Err(err) => {
                tracing::warn!("Webhook received unknown messaging event from {sender}: {err}");
            }
        }
    }

    async fn handle_message(&self, sender: &str, message: &Message) {
        if message.is_echo {
            tracing::info!(
                "Received echo for message {} and app {:?} with metadata {:?}",
                message.mid,
                message.app_id,
                message.metadata
            );
            return;
        }

        if let Some(quick_reply) = &message.quick_reply {
            tracing::info!(
                "Quick reply for message {} with payload {:?}",
                message.mid,
                quick_reply.payload
            );
            self.submit(OutboundMessage::text(
                sender,
                replies::QUICK_REPLY_TAPPED_TEXT,
            ))
            .await;
            return;
        }

        if let Some(text) = message.text.as_deref() {
            match keyword_action(&normalize_text(text)) {
                Some(action) => self.run_keyword_action(sender, action).await,
                // Unmatched text is mirrored back verbatim.
                None => self.submit(OutboundMessage::text(sender, text)).await,
            }
        } else if message.attachments.is_some() {
            self.submit(OutboundMessage::text(
                sender,
                replies::ATTACHMENT_RECEIVED_TEXT,
            ))
            .await;
        }
    }

    async fn run_keyword_action(&self, recipient: &str, action: KeywordAction) {
        if action.requires_server_url() && self.server_url == SERVER_URL_PLACEHOLDER {
            self.submit(replies::configure_server_url(recipient)).await;
            return;
        }

        let message = match action {
            KeywordAction::Greeting => replies::greeting(recipient),
            KeywordAction::Image => replies::image(recipient, &self.server_url),
            KeywordAction::Gif => replies::gif(recipient, &self.server_url),
            KeywordAction::Audio => replies::audio(recipient, &self.server_url),
            KeywordAction::Video => replies::video(recipient, &self.server_url),
            KeywordAction::File => replies::file(recipient, &self.server_url),
            KeywordAction::Button => replies::button_template(recipient),
            KeywordAction::Generic => replies::generic_template(recipient, &self.server_url),
            KeywordAction::Receipt => replies::receipt_template(recipient, &self.server_url),
            KeywordAction::QuickReply => replies::quick_reply_prompt(recipient),
            KeywordAction::ReadReceipt => replies::read_receipt(recipient),
            KeywordAction::TypingOn => replies::typing_on(recipient),
            KeywordAction::TypingOff => replies::typing_off(recipient),
            KeywordAction::AccountLinking => replies::account_linking(recipient, &self.server_url),
        };
        self.submit(message).await;
    }

    async fn submit(&self, message: OutboundMessage) {
        if let Err(e) = self.send_api.send(&message).await {
            tracing::error!("Failed to send reply to {}: {e:#}", message.recipient.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSendApi {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl SendApi for RecordingSendApi {
        async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    struct FailingSendApi;

    #[async_trait]
    impl SendApi for FailingSendApi {
        async fn send(&self, _message: &OutboundMessage) -> anyhow::Result<()> {
            anyhow::bail!("connection reset by peer")
        }
    }

    fn dispatcher_with(server_url: &str) -> (ReplyDispatcher, Arc<RecordingSendApi>) {
        let recorder = Arc::new(RecordingSendApi::default());
        let dispatcher = ReplyDispatcher::new(recorder.clone(), server_url.to_string());
        (dispatcher, recorder)
    }

    fn event(json: serde_json::Value) -> MessagingEvent {
        serde_json::from_value(json).unwrap()
    }

    fn text_event(text: &str) -> MessagingEvent {
        event(serde_json::json!({
            "sender": {"id": "user-1"},
            "recipient": {"id": "page-1"},
            "timestamp": 1_458_692_752_478u64,
            "message": {"mid": "m1", "text": text}
        }))
    }

    // ── normalization ──────────────────────────────────────────────────

    #[test]
    fn normalize_strips_punctuation_and_lowercases() {
        assert_eq!(normalize_text("Hello!!"), "hello");
        assert_eq!(normalize_text("  Button  "), "button");
        assert_eq!(normalize_text("Quick Reply?"), "quick reply");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Hello!!", "  Button  ", "typing ON", "¿qué tal?", "a_b c"] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "input: {input}");
        }
    }

    // ── keyword table ──────────────────────────────────────────────────

    #[test]
    fn every_keyword_maps_to_its_action() {
        let table = [
            ("hello", KeywordAction::Greeting),
            ("hi", KeywordAction::Greeting),
            ("image", KeywordAction::Image),
            ("gif", KeywordAction::Gif),
            ("audio", KeywordAction::Audio),
            ("video", KeywordAction::Video),
            ("file", KeywordAction::File),
            ("button", KeywordAction::Button),
            ("generic", KeywordAction::Generic),
            ("receipt", KeywordAction::Receipt),
            ("quick reply", KeywordAction::QuickReply),
            ("read receipt", KeywordAction::ReadReceipt),
            ("typing on", KeywordAction::TypingOn),
            ("typing off", KeywordAction::TypingOff),
            ("account linking", KeywordAction::AccountLinking),
        ];
        for (keyword, expected) in table {
            assert_eq!(keyword_action(keyword), Some(expected), "{keyword}");
        }
    }

    #[test]
    fn non_keywords_fall_through_to_echo() {
        for text in ["", "howdy", "imagegif", "quickreply", "typing", "hello there"] {
            assert_eq!(keyword_action(text), None, "{text}");
        }
    }

    // ── event mapping ──────────────────────────────────────────────────

    #[tokio::test]
    async fn hello_message_gets_the_greeting() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher.dispatch(&text_event("HELLO!")).await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient.id, "user-1");
        assert!(sent[0]
            .text_content()
            .unwrap()
            .starts_with("Congrats on setting up your Messenger Bot!"));
    }

    #[tokio::test]
    async fn unmatched_text_is_echoed_verbatim() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher.dispatch(&text_event("What IS this?!")).await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text_content(), Some("What IS this?!"));
    }

    #[tokio::test]
    async fn echo_messages_are_ignored() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "page-1"},
                "recipient": {"id": "user-1"},
                "message": {"mid": "m1", "text": "hello", "is_echo": true, "app_id": 1}
            })))
            .await;
        assert!(recorder.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn quick_reply_tap_gets_fixed_ack() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"},
                "message": {
                    "mid": "m1",
                    "text": "Action",
                    "quick_reply": {"payload": "DEVELOPER_DEFINED_PAYLOAD_FOR_PICKING_ACTION"}
                }
            })))
            .await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text_content(), Some(replies::QUICK_REPLY_TAPPED_TEXT));
    }

    #[tokio::test]
    async fn attachment_message_gets_fixed_ack() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"},
                "message": {
                    "mid": "m1",
                    "attachments": [{"type": "image", "payload": {"url": "https://cdn.example.com/x.png"}}]
                }
            })))
            .await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text_content(), Some(replies::ATTACHMENT_RECEIVED_TEXT));
    }

    #[tokio::test]
    async fn optin_and_postback_get_their_fixed_replies() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"},
                "optin": {"ref": "PASS_THROUGH"}
            })))
            .await;
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"},
                "postback": {"payload": "DEVELOPER_DEFINED_PAYLOAD"}
            })))
            .await;

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text_content(), Some(replies::AUTH_SUCCESSFUL_TEXT));
        assert_eq!(sent[1].text_content(), Some(replies::POSTBACK_CALLED_TEXT));
    }

    #[tokio::test]
    async fn log_only_events_send_nothing() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        for payload in [
            serde_json::json!({"delivery": {"mids": ["m1"], "watermark": 123}}),
            serde_json::json!({"read": {"watermark": 123, "seq": 40}}),
            serde_json::json!({"account_linking": {"status": "linked", "authorization_code": "abc"}}),
        ] {
            let mut json = serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"}
            });
            json.as_object_mut()
                .unwrap()
                .extend(payload.as_object().unwrap().clone());
            dispatcher.dispatch(&event(json)).await;
        }
        assert!(recorder.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn malformed_events_send_nothing() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        // No payload field at all.
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"}
            })))
            .await;
        // Two conflicting payload fields.
        dispatcher
            .dispatch(&event(serde_json::json!({
                "sender": {"id": "user-1"},
                "recipient": {"id": "page-1"},
                "message": {"mid": "m1", "text": "hi"},
                "delivery": {"watermark": 1}
            })))
            .await;
        assert!(recorder.sent.lock().is_empty());
    }

    // ── keyword actions ────────────────────────────────────────────────

    #[tokio::test]
    async fn typing_keywords_send_sender_actions() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher.dispatch(&text_event("typing on")).await;
        dispatcher.dispatch(&text_event("Typing Off!")).await;
        dispatcher.dispatch(&text_event("read receipt")).await;

        let sent = recorder.sent.lock();
        let actions: Vec<serde_json::Value> = sent
            .iter()
            .map(|m| serde_json::to_value(m).unwrap()["sender_action"].clone())
            .collect();
        assert_eq!(actions, ["typing_on", "typing_off", "mark_seen"]);
    }

    #[tokio::test]
    async fn image_keyword_sends_the_asset_attachment() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        dispatcher.dispatch(&text_event("image")).await;

        let sent = recorder.sent.lock();
        let json = serde_json::to_value(&sent[0]).unwrap();
        assert_eq!(json["message"]["attachment"]["type"], "image");
        assert_eq!(
            json["message"]["attachment"]["payload"]["url"],
            "https://bot.example.com/assets/rift.png"
        );
    }

    // ── server-URL gate ────────────────────────────────────────────────

    #[tokio::test]
    async fn placeholder_url_substitutes_setup_instructions() {
        let (dispatcher, recorder) = dispatcher_with(SERVER_URL_PLACEHOLDER);
        for keyword in [
            "image",
            "gif",
            "audio",
            "video",
            "file",
            "generic",
            "account linking",
        ] {
            dispatcher.dispatch(&text_event(keyword)).await;
        }

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 7);
        for message in sent.iter() {
            assert_eq!(message.text_content(), Some(replies::CONFIGURE_SERVER_URL_TEXT));
        }
    }

    #[tokio::test]
    async fn ungated_keywords_work_without_a_server_url() {
        let (dispatcher, recorder) = dispatcher_with(SERVER_URL_PLACEHOLDER);
        for keyword in ["hello", "button", "receipt", "quick reply", "typing on"] {
            dispatcher.dispatch(&text_event(keyword)).await;
        }

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 5);
        for message in sent.iter() {
            assert_ne!(message.text_content(), Some(replies::CONFIGURE_SERVER_URL_TEXT));
        }
    }

    // ── batch processing and error swallowing ──────────────────────────

    #[tokio::test]
    async fn entries_are_processed_in_array_order() {
        let (dispatcher, recorder) = dispatcher_with("https://bot.example.com");
        let entries: Vec<Entry> = serde_json::from_value(serde_json::json!([
            {
                "id": "page-1",
                "time": 1,
                "messaging": [
                    {"sender": {"id": "u1"}, "recipient": {"id": "page-1"},
                     "message": {"mid": "m1", "text": "first"}},
                    {"sender": {"id": "u2"}, "recipient": {"id": "page-1"},
                     "message": {"mid": "m2", "text": "second"}}
                ]
            },
            {
                "id": "page-2",
                "time": 2,
                "messaging": [
                    {"sender": {"id": "u3"}, "recipient": {"id": "page-2"},
                     "message": {"mid": "m3", "text": "third"}}
                ]
            }
        ]))
        .unwrap();

        dispatcher.process_entries(&entries).await;

        let sent = recorder.sent.lock();
        let texts: Vec<&str> = sent.iter().filter_map(|m| m.text_content()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn send_failures_are_swallowed() {
        let dispatcher = ReplyDispatcher::new(
            Arc::new(FailingSendApi),
            "https://bot.example.com".to_string(),
        );
        // Must not panic or propagate.
        dispatcher.dispatch(&text_event("hello")).await;
        dispatcher.dispatch(&text_event("whatever")).await;
    }
}
