//! Message handler and reply outbox traits.
//!
//! Handlers run while the client is dispatching a delivery, so they cannot
//! call back into the client. Replies go through the [`ReplyOutbox`] instead:
//! they are encoded immediately and published by the client once dispatch is
//! over.

use crate::error::Error;
use crate::message::Message;
use crate::payload::ValuePair;
use crate::topic::{Channel, Topic};

/// Object-safe sink for replies queued from inside a handler.
///
/// `device` defaults to the client's own id when `None`.
pub trait ReplyOutbox {
    /// Queue a response to the command with correlation id `id`. `error` is
    /// `None` for success.
    fn respond(&mut self, id: &str, error: Option<&str>, device: Option<&str>) -> Result<(), Error>;

    /// Queue a data message carrying `values`.
    fn publish_values(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        values: &[ValuePair<'_>],
        device: Option<&str>,
    ) -> Result<(), Error>;

    /// Queue a data message carrying a single value.
    fn publish_data(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        unit: Option<&str>,
        value: &str,
        device: Option<&str>,
    ) -> Result<(), Error> {
        self.publish_values(
            topic,
            channel,
            data_type,
            &[ValuePair::new(value, unit)],
            device,
        )
    }
}

/// Receives decoded Cayenne messages.
///
/// Handlers are shared by reference between registry slots, so `on_message`
/// takes `&self`; keep mutable state in a `Cell` or `RefCell`.
///
/// # Example
///
/// ```ignore
/// struct Relay {
///     on: Cell<bool>,
/// }
///
/// impl MessageHandler for Relay {
///     fn on_message(&self, msg: &Message<'_>, outbox: &mut dyn ReplyOutbox) {
///         self.on.set(msg.value(0) == Some("1"));
///         if let Some(id) = msg.id {
///             let _ = outbox.respond(id, None, Some(msg.device));
///         }
///     }
/// }
/// ```
pub trait MessageHandler {
    fn on_message(&self, message: &Message<'_>, outbox: &mut dyn ReplyOutbox);
}

impl<F> MessageHandler for F
where
    F: Fn(&Message<'_>, &mut dyn ReplyOutbox),
{
    fn on_message(&self, message: &Message<'_>, outbox: &mut dyn ReplyOutbox) {
        self(message, outbox)
    }
}

/// Forwards every message to two handlers, first then second.
pub struct HandlerPair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> HandlerPair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> MessageHandler for HandlerPair<A, B>
where
    A: MessageHandler,
    B: MessageHandler,
{
    fn on_message(&self, message: &Message<'_>, outbox: &mut dyn ReplyOutbox) {
        self.first.on_message(message, outbox);
        self.second.on_message(message, outbox);
    }
}
