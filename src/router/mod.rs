//! Message Routing
//!
//! Inbound deliveries are decoded into a [`Message`] and handed to every
//! registered handler whose subscription matches. When nothing matches, the
//! default handler (if any) gets the message instead.
//!
//! # Matching
//!
//! A slot matches when its topic equals the message topic, its channel equals
//! the message channel or is [`Channel::All`], and its device id equals the
//! message's device id as text. All matches are invoked in slot order; one
//! handler seeing a message never stops the next one from seeing it.
//!
//! # Replies
//!
//! Handlers cannot publish directly because the message borrows from the
//! engine's receive buffer. They queue replies through the [`ReplyOutbox`] they
//! are given, and the client publishes those once dispatch returns.
//!
//! [`Channel::All`]: crate::topic::Channel::All

pub(crate) mod handler;
pub(crate) mod outbox;
pub(crate) mod registry;

pub use handler::{HandlerPair, MessageHandler, ReplyOutbox};
pub use outbox::{MAX_REPLY_ATTEMPTS, Outbox, OutboxWriter, QueuedPublish, ReplyQos};
pub use registry::HandlerRegistry;

use crate::error::Error;
use crate::message::Message;

/// What happened to an inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// This many registered handlers received the message.
    Handled(usize),
    /// No registered handler matched; the default handler received it.
    Default,
    /// No registered handler matched and there is no default handler.
    Unhandled,
    /// The topic or payload could not be decoded. No handler was called.
    Dropped(Error),
}

/// Handler registry plus the default handler.
pub struct Router<'h, const N: usize> {
    registry: HandlerRegistry<'h, N>,
    default_handler: Option<&'h dyn MessageHandler>,
}

impl<'h, const N: usize> Router<'h, N> {
    pub const fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            default_handler: None,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry<'h, N> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry<'h, N> {
        &mut self.registry
    }

    /// Set or clear the handler for messages no subscription matches.
    pub fn set_default_handler(&mut self, handler: Option<&'h dyn MessageHandler>) {
        self.default_handler = handler;
    }

    pub fn has_default_handler(&self) -> bool {
        self.default_handler.is_some()
    }

    /// Invoke every matching handler, or the default handler if none match.
    pub fn route(&self, message: &Message<'_>, outbox: &mut dyn ReplyOutbox) -> Dispatch {
        let mut handled = 0;
        for handler in self.registry.matching(message) {
            handler.on_message(message, outbox);
            handled += 1;
        }
        if handled > 0 {
            return Dispatch::Handled(handled);
        }

        match self.default_handler {
            Some(handler) => {
                trace!("No subscription for {:?}, using default handler", message.topic);
                handler.on_message(message, outbox);
                Dispatch::Default
            }
            None => Dispatch::Unhandled,
        }
    }

    /// Decode a raw delivery addressed to `account` and route it.
    ///
    /// Undecodable deliveries are dropped; the returned [`Dispatch::Dropped`]
    /// only says why.
    pub fn deliver(
        &self,
        account: &str,
        topic: &[u8],
        payload: &[u8],
        outbox: &mut dyn ReplyOutbox,
    ) -> Dispatch {
        match Message::parse(account, topic, payload) {
            Ok(message) => self.route(&message, outbox),
            Err(err) => {
                debug!("Dropping inbound message: {:?}", err);
                Dispatch::Dropped(err)
            }
        }
    }
}

impl<const N: usize> Default for Router<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use std::string::{String, ToString};
    use std::vec::Vec;

    use super::*;
    use crate::topic::{Channel, Topic};

    /// Records `name:device:channel:value` for each message it sees.
    struct Recorder<'l> {
        name: &'static str,
        log: &'l RefCell<Vec<String>>,
    }

    impl MessageHandler for Recorder<'_> {
        fn on_message(&self, message: &Message<'_>, _: &mut dyn ReplyOutbox) {
            let channel = match message.channel {
                Channel::Id(id) => id.to_string(),
                other => std::format!("{:?}", other),
            };
            self.log.borrow_mut().push(std::format!(
                "{}:{}:{}:{}",
                self.name,
                message.device,
                channel,
                message.value(0).unwrap_or("-")
            ));
        }
    }

    fn deliver<const N: usize>(router: &Router<'_, N>, topic: &str, payload: &str) -> Dispatch {
        let mut outbox = Outbox::<2, 128>::new();
        let qos = ReplyQos {
            data: crate::QoS::AtMostOnce,
            response: crate::QoS::AtLeastOnce,
        };
        let mut writer = outbox.writer("u1", "me", qos);
        router.deliver("u1", topic.as_bytes(), payload.as_bytes(), &mut writer)
    }

    #[test]
    fn every_match_is_invoked_and_default_is_skipped() {
        let log = RefCell::new(Vec::new());
        let a = Recorder { name: "a", log: &log };
        let b = Recorder { name: "b", log: &log };
        let fallback = Recorder { name: "default", log: &log };

        let mut router = Router::<4>::new();
        router.registry_mut().subscribe("A", Topic::Command, Channel::Id(5), &a).unwrap();
        router.registry_mut().subscribe("A", Topic::Command, Channel::All, &b).unwrap();
        router.set_default_handler(Some(&fallback));

        assert_eq!(deliver(&router, "u1/A/cmd/5", "c1,on"), Dispatch::Handled(2));
        assert_eq!(*log.borrow(), ["a:A:5:on", "b:A:5:on"]);
    }

    #[test]
    fn unmatched_device_goes_to_default() {
        let log = RefCell::new(Vec::new());
        let a = Recorder { name: "a", log: &log };
        let fallback = Recorder { name: "default", log: &log };

        let mut router = Router::<4>::new();
        router.registry_mut().subscribe("A", Topic::Command, Channel::All, &a).unwrap();
        assert_eq!(deliver(&router, "u1/C/cmd/5", "c1,on"), Dispatch::Unhandled);
        assert!(log.borrow().is_empty());

        router.set_default_handler(Some(&fallback));
        assert_eq!(deliver(&router, "u1/C/cmd/5", "c1,on"), Dispatch::Default);
        assert_eq!(*log.borrow(), ["default:C:5:on"]);
    }

    #[test]
    fn unsubscribed_entry_falls_back_to_default() {
        let log = RefCell::new(Vec::new());
        let a = Recorder { name: "a", log: &log };
        let fallback = Recorder { name: "default", log: &log };

        let mut router = Router::<2>::new();
        router.set_default_handler(Some(&fallback));
        router.registry_mut().subscribe("A", Topic::Config, Channel::Id(1), &a).unwrap();
        assert_eq!(deliver(&router, "u1/A/conf/1", "7"), Dispatch::Handled(1));

        router.registry_mut().unsubscribe("A", Topic::Config, Channel::Id(1));
        assert_eq!(deliver(&router, "u1/A/conf/1", "7"), Dispatch::Default);
        assert_eq!(*log.borrow(), ["a:A:1:7", "default:A:1:7"]);
    }

    #[test]
    fn duplicate_subscriptions_invoke_twice() {
        let log = RefCell::new(Vec::new());
        let a = Recorder { name: "a", log: &log };

        let mut router = Router::<2>::new();
        router.registry_mut().subscribe("A", Topic::Data, Channel::None, &a).unwrap();
        router.registry_mut().subscribe("A", Topic::Data, Channel::None, &a).unwrap();
        assert_eq!(deliver(&router, "u1/A/data", "1"), Dispatch::Handled(2));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn undecodable_deliveries_reach_nobody() {
        let log = RefCell::new(Vec::new());
        let fallback = Recorder { name: "default", log: &log };

        let mut router = Router::<1>::new();
        router.set_default_handler(Some(&fallback));
        assert_eq!(
            deliver(&router, "intruder/A/cmd/5", "c1,on"),
            Dispatch::Dropped(Error::AuthMismatch)
        );
        assert_eq!(
            deliver(&router, "u1/A/cmd/5", "no-id"),
            Dispatch::Dropped(Error::MalformedPayload)
        );
        assert_eq!(
            deliver(&router, "u1/A/what/5", "1"),
            Dispatch::Dropped(Error::UnknownTopic)
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn closures_and_pairs_are_handlers() {
        let log = RefCell::new(Vec::new());
        let closure = |message: &Message<'_>, outbox: &mut dyn ReplyOutbox| {
            log.borrow_mut().push(std::format!("closure:{}", message.device));
            if let Some(id) = message.id {
                let _ = outbox.respond(id, None, Some(message.device));
            }
        };
        let pair = HandlerPair::new(closure, Recorder { name: "pair", log: &log });

        let mut router = Router::<1>::new();
        router.registry_mut().subscribe("A", Topic::Command, Channel::All, &pair).unwrap();
        assert_eq!(deliver(&router, "u1/A/cmd/2", "c1,1"), Dispatch::Handled(1));
        assert_eq!(*log.borrow(), ["closure:A", "pair:A:2:1"]);
    }
}
