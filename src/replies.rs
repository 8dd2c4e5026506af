//! Canned reply payloads.
//!
//! One builder per bot behavior. Media and template replies address static
//! assets under the configured server URL; the dispatcher decides whether
//! the URL is usable before calling those builders.

use crate::send_api::{
    Address, Adjustment, Attachment, Button, GenericElement, MediaPayload, MessageBody,
    OutboundMessage, OutboundPayload, QuickReply, Recipient, ReceiptElement, SenderAction, Summary,
    TemplatePayload,
};
use rand::RngExt;

pub const AUTH_SUCCESSFUL_TEXT: &str = "Authentication successful";
pub const QUICK_REPLY_TAPPED_TEXT: &str = "Quick reply tapped";
pub const ATTACHMENT_RECEIVED_TEXT: &str = "Message with attachment received";
pub const POSTBACK_CALLED_TEXT: &str = "Postback called";

pub const GREETING_TEXT: &str = "Congrats on setting up your Messenger Bot!\n\n\
Right now, your bot can only respond to a few words. Try out \"quick reply\", \"typing on\", \
\"button\", or \"image\" to see how they work. You'll find a complete list of these commands in \
the keyword table in src/dispatch.rs. Anything else you type will just be mirrored until you \
create additional commands.\n\n\
For more details on how to create commands, go to \
https://developers.facebook.com/docs/messenger-platform/reference/send-api.";

pub const CONFIGURE_SERVER_URL_TEXT: &str = "We have static resources like images and videos \
available to test, but you need to tell the bot where this server is reachable first.\n\
1. Stop the bot with ctrl-c\n\
2. Set the SERVER_URL environment variable to this server's public URL (your tunnel URL works)\n\
3. Restart the bot\n\
Once you've finished these steps, try typing \"video\" or \"image\".";

pub fn greeting(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::text(recipient_id, GREETING_TEXT)
}

/// Setup instructions sent in place of any asset-backed reply while the
/// server URL still holds the bootstrap placeholder.
pub fn configure_server_url(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::text(recipient_id, CONFIGURE_SERVER_URL_TEXT)
}

pub fn image(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Image(MediaPayload {
            url: format!("{server_url}/assets/rift.png"),
        }),
    )
}

pub fn gif(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Image(MediaPayload {
            url: format!("{server_url}/assets/instagram_logo.gif"),
        }),
    )
}

pub fn audio(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Audio(MediaPayload {
            url: format!("{server_url}/assets/sample.mp3"),
        }),
    )
}

pub fn video(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Video(MediaPayload {
            url: format!("{server_url}/assets/allofus480.mov"),
        }),
    )
}

pub fn file(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::File(MediaPayload {
            url: format!("{server_url}/assets/test.txt"),
        }),
    )
}

pub fn button_template(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Template(TemplatePayload::Button {
            text: "This is test text".into(),
            buttons: vec![
                Button::WebUrl {
                    url: "https://www.oculus.com/en-us/rift/".into(),
                    title: "Open Web URL".into(),
                },
                Button::Postback {
                    title: "Trigger Postback".into(),
                    payload: "DEVELOPER_DEFINED_PAYLOAD".into(),
                },
                Button::PhoneNumber {
                    title: "Call Phone Number".into(),
                    payload: "+16505551234".into(),
                },
            ],
        }),
    )
}

/// Two-bubble carousel showing off the generic template.
pub fn generic_template(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Template(TemplatePayload::Generic {
            elements: vec![
                GenericElement {
                    title: "rift".into(),
                    subtitle: "Next-generation virtual reality".into(),
                    item_url: "https://www.oculus.com/en-us/rift/".into(),
                    image_url: format!("{server_url}/assets/rift.png"),
                    buttons: vec![
                        Button::WebUrl {
                            url: "https://www.oculus.com/en-us/rift/".into(),
                            title: "Open Web URL".into(),
                        },
                        Button::Postback {
                            title: "Call Postback".into(),
                            payload: "Payload for first bubble".into(),
                        },
                    ],
                },
                GenericElement {
                    title: "touch".into(),
                    subtitle: "Your Hands, Now in VR".into(),
                    item_url: "https://www.oculus.com/en-us/touch/".into(),
                    image_url: format!("{server_url}/assets/touch.png"),
                    buttons: vec![
                        Button::WebUrl {
                            url: "https://www.oculus.com/en-us/touch/".into(),
                            title: "Open Web URL".into(),
                        },
                        Button::Postback {
                            title: "Call Postback".into(),
                            payload: "Payload for second bubble".into(),
                        },
                    ],
                },
            ],
        }),
    )
}

/// The Send API requires order numbers to be unique per page.
fn random_order_id() -> u32 {
    rand::rng().random_range(0..1000)
}

pub fn receipt_template(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Template(TemplatePayload::Receipt {
            recipient_name: "Peter Chang".into(),
            order_number: format!("order{}", random_order_id()),
            currency: "USD".into(),
            payment_method: "Visa 1234".into(),
            timestamp: "1428444852".into(),
            elements: vec![
                ReceiptElement {
                    title: "Oculus Rift".into(),
                    subtitle: "Includes: headset, sensor, remote".into(),
                    quantity: 1,
                    price: 599.00,
                    currency: "USD".into(),
                    image_url: format!("{server_url}/assets/riftsq.png"),
                },
                ReceiptElement {
                    title: "Samsung Gear VR".into(),
                    subtitle: "Frost White".into(),
                    quantity: 1,
                    price: 99.99,
                    currency: "USD".into(),
                    image_url: format!("{server_url}/assets/gearvrsq.png"),
                },
            ],
            address: Address {
                street_1: "1 Hacker Way".into(),
                street_2: String::new(),
                city: "Menlo Park".into(),
                postal_code: "94025".into(),
                state: "CA".into(),
                country: "US".into(),
            },
            summary: Summary {
                subtotal: 698.99,
                shipping_cost: 20.00,
                total_tax: 57.67,
                total_cost: 626.66,
            },
            adjustments: vec![
                Adjustment {
                    name: "New Customer Discount".into(),
                    amount: -50,
                },
                Adjustment {
                    name: "$100 Off Coupon".into(),
                    amount: -100,
                },
            ],
        }),
    )
}

pub fn quick_reply_prompt(recipient_id: &str) -> OutboundMessage {
    OutboundMessage {
        recipient: Recipient {
            id: recipient_id.into(),
        },
        payload: OutboundPayload::Message(MessageBody {
            text: Some("What's your favorite movie genre?".into()),
            quick_replies: Some(vec![
                QuickReply {
                    content_type: "text".into(),
                    title: "Action".into(),
                    payload: "DEVELOPER_DEFINED_PAYLOAD_FOR_PICKING_ACTION".into(),
                },
                QuickReply {
                    content_type: "text".into(),
                    title: "Comedy".into(),
                    payload: "DEVELOPER_DEFINED_PAYLOAD_FOR_PICKING_COMEDY".into(),
                },
                QuickReply {
                    content_type: "text".into(),
                    title: "Drama".into(),
                    payload: "DEVELOPER_DEFINED_PAYLOAD_FOR_PICKING_DRAMA".into(),
                },
            ]),
            ..MessageBody::default()
        }),
    }
}

pub fn read_receipt(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::sender_action(recipient_id, SenderAction::MarkSeen)
}

pub fn typing_on(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::sender_action(recipient_id, SenderAction::TypingOn)
}

pub fn typing_off(recipient_id: &str) -> OutboundMessage {
    OutboundMessage::sender_action(recipient_id, SenderAction::TypingOff)
}

pub fn account_linking(recipient_id: &str, server_url: &str) -> OutboundMessage {
    OutboundMessage::attachment(
        recipient_id,
        Attachment::Template(TemplatePayload::Button {
            text: "Welcome. Link your account.".into(),
            buttons: vec![Button::AccountLink {
                url: format!("{server_url}/authorize"),
            }],
        }),
    )
}
