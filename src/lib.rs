//! # Cayenne MQTT for Embedded Systems
//!
//! `myrtio-cayenne` is a `no_std` compatible implementation of the Cayenne
//! MQTT conventions: topic and payload encoding, a fixed-size handler registry
//! and message router, and an async client facade that drives any MQTT engine.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** Designed to run on bare-metal microcontrollers without requiring a
//!   standard library or dynamic memory allocation. Buffers are managed using `heapless`.
//! - **Zero-copy parsing:** Decoded messages borrow their text from the receive buffer.
//! - **Engine Agnostic:** A flexible `MqttEngine` trait lets the client run on top of any MQTT
//!   session implementation.
//! - **Rust 2024 Edition:** Uses native `async fn` in traits, removing the need for `async-trait`.
//!
//! ## Wire Format
//!
//! Topics look like `<account>/<device>/<category>[/<channel>]`, for example
//! `u1/d1/data/2`. A data payload is an optional type tag followed by
//! value/unit groups: `temp=30.5:c`. Commands prefix the payload with a
//! correlation id (`abc,1`) and are answered on the `response` category with
//! `ok,abc` or `error,abc=<message>`.
//!
//! ## Architecture
//!
//! The crate can be used at two levels:
//!
//! ### 1. Codec Only
//!
//! ```ignore
//! let mut buf = [0u8; 64];
//! let len = build_topic(&mut buf, "u1", "d1", Topic::Data, Channel::Id(2))?;
//! let message = Message::parse("u1", topic_bytes, payload_bytes)?;
//! ```
//!
//! ### 2. Client with Handlers
//!
//! ```ignore
//! let relay = |msg: &Message<'_>, outbox: &mut dyn ReplyOutbox| {
//!     if let Some(id) = msg.id {
//!         let _ = outbox.respond(id, None, Some(msg.device));
//!     }
//! };
//!
//! let mut client = CayenneClient::<_>::new(engine, ClientOptions::new(user, pass, id));
//! client.connect().await?;
//! client.subscribe(Topic::Command, Channel::All, Some(&relay), None).await?;
//! loop {
//!     client.yield_for(Duration::from_millis(100)).await?;
//! }
//! ```
//!
//! Handlers never perform async I/O directly. They queue replies through the
//! `ReplyOutbox` they are given, and the client publishes them after the engine
//! poll returns.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod client;
pub mod engine;
pub mod error;
mod frame;
pub mod message;
pub mod payload;
pub mod router;
pub mod topic;
pub mod units;
mod util;

/// Maximum number of value/unit pairs carried by one message.
pub const MAX_MESSAGE_VALUES: usize = 4;
/// Default size of one encoded `topic NUL payload NUL` frame.
pub const MAX_PACKET_SIZE: usize = 134;

pub const DEFAULT_BROKER_HOST: &str = "mqtt.mydevices.com";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TLS_PORT: u16 = 8883;

// Re-export key types for easier access at the crate root.
pub use client::{CayenneClient, ClientOptions};
pub use engine::{Credentials, MqttEngine, QoS};
pub use error::{ClientError, Error};
pub use message::Message;
pub use payload::{Numeric, ValuePair, build_data_payload, build_response_payload, parse_payload};
pub use router::{Dispatch, HandlerPair, MessageHandler, ReplyOutbox, Router};
pub use topic::{Channel, Topic, build_topic, build_topic_filter, parse_topic};
