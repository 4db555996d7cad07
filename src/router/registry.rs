//! Fixed-capacity table of message handlers.

use super::handler::MessageHandler;
use crate::error::Error;
use crate::message::Message;
use crate::topic::{Channel, Topic};

#[derive(Clone, Copy)]
struct HandlerSlot<'h> {
    device: &'h str,
    topic: Topic,
    channel: Channel,
    handler: Option<&'h dyn MessageHandler>,
}

impl<'h> HandlerSlot<'h> {
    const FREE: Self = Self {
        device: "",
        topic: Topic::Undefined,
        channel: Channel::None,
        handler: None,
    };

    fn matches(&self, message: &Message<'_>) -> bool {
        self.handler.is_some()
            && self.topic == message.topic
            && (self.channel == message.channel || self.channel == Channel::All)
            && self.device == message.device
    }
}

/// A registry of `(device, topic, channel) -> handler` subscriptions.
///
/// Slots are scanned linearly in index order. The device id is borrowed, not
/// copied, so it must outlive the subscription. Subscribing the same tuple
/// twice occupies two slots and the handler is invoked twice.
///
/// # Example
///
/// ```ignore
/// let mut registry = HandlerRegistry::<4>::new();
/// registry.subscribe("device-1", Topic::Command, Channel::All, &relay)?;
///
/// for handler in registry.matching(&message) {
///     handler.on_message(&message, &mut outbox);
/// }
/// ```
pub struct HandlerRegistry<'h, const N: usize> {
    slots: [HandlerSlot<'h>; N],
}

impl<'h, const N: usize> HandlerRegistry<'h, N> {
    /// Create a registry with every slot free.
    pub const fn new() -> Self {
        Self {
            slots: [HandlerSlot::FREE; N],
        }
    }

    /// Attach `handler` to the first free slot and return that slot's index.
    ///
    /// Returns [`Error::RegistryFull`] without touching any slot if none is
    /// free, and [`Error::InvalidTopic`] for [`Topic::Undefined`].
    pub fn subscribe(
        &mut self,
        device: &'h str,
        topic: Topic,
        channel: Channel,
        handler: &'h dyn MessageHandler,
    ) -> Result<usize, Error> {
        if topic == Topic::Undefined {
            return Err(Error::InvalidTopic);
        }

        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.handler.is_none())
            .ok_or(Error::RegistryFull)?;

        *slot = HandlerSlot {
            device,
            topic,
            channel,
            handler: Some(handler),
        };
        Ok(index)
    }

    /// Free every slot subscribed to exactly `(device, topic, channel)`.
    ///
    /// Devices are compared by text. Returns the number of slots freed.
    pub fn unsubscribe(&mut self, device: &str, topic: Topic, channel: Channel) -> usize {
        let mut freed = 0;
        for slot in self.slots.iter_mut() {
            if slot.topic == topic && slot.channel == channel && slot.device == device {
                *slot = HandlerSlot::FREE;
                freed += 1;
            }
        }
        freed
    }

    /// Iterate, in slot order, over the handlers that should receive `message`.
    pub fn matching<'r>(
        &'r self,
        message: &'r Message<'_>,
    ) -> impl Iterator<Item = &'h dyn MessageHandler> + 'r {
        self.slots
            .iter()
            .filter(move |slot| slot.matches(message))
            .filter_map(|slot| slot.handler)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.handler.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free every slot.
    pub fn clear(&mut self) {
        self.slots = [HandlerSlot::FREE; N];
    }
}

impl<const N: usize> Default for HandlerRegistry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
