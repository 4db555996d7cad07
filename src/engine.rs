//! # MQTT Engine Abstraction
//!
//! This module defines the `MqttEngine` trait, which abstracts the MQTT session
//! the Cayenne client runs on top of. The client never touches sockets or
//! packets itself; it hands fully formed topics and payloads to the engine and
//! receives inbound publishes from it.
//!
//! With the Rust 2024 Edition, this trait uses native `async fn`, removing the
//! need for the `#[async_trait]` macro.

use embassy_time::Duration;

/// Represents the Quality of Service (QoS) levels for MQTT messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

/// Login details presented to the broker on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub client_id: &'a str,
}

/// An MQTT session the client can publish, subscribe and poll through.
///
/// `topic` and `filter` arguments are plain text without a NUL terminator.
#[allow(async_fn_in_trait)]
pub trait MqttEngine {
    /// The error type returned by the engine.
    type Error: core::fmt::Debug;

    /// Opens a session with the broker using `credentials`.
    async fn connect(&mut self, credentials: &Credentials<'_>) -> Result<(), Self::Error>;

    /// Closes the session.
    async fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Whether the session is currently established.
    fn is_connected(&self) -> bool;

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), Self::Error>;

    async fn subscribe(&mut self, filter: &str, qos: QoS) -> Result<(), Self::Error>;

    async fn unsubscribe(&mut self, filter: &str) -> Result<(), Self::Error>;

    /// Services the session for up to `timeout`, keeping it alive and calling
    /// `on_publish(topic, payload)` for every inbound publish.
    ///
    /// The slices handed to `on_publish` only live for the duration of the
    /// call.
    async fn poll(
        &mut self,
        timeout: Duration,
        on_publish: &mut dyn FnMut(&[u8], &[u8]),
    ) -> Result<(), Self::Error>;
}
