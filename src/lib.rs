//! pagebridge — Facebook Messenger webhook gateway with canned reply
//! dispatch.
//!
//! The gateway answers Meta's subscription handshake and accepts signed
//! event notifications; the dispatcher maps each messaging event to a
//! canned reply and delivers it through the Graph Send API.

pub mod config;
pub mod dispatch;
pub mod events;
pub mod gateway;
pub mod replies;
pub mod send_api;
