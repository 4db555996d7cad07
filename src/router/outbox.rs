//! Bounded queue of replies produced by message handlers.
//!
//! Replies are encoded into frames the moment a handler queues them, so
//! nothing borrowed from the inbound message has to survive dispatch. The
//! client drains the queue after each engine poll.

use heapless::Deque;

use super::handler::ReplyOutbox;
use crate::engine::QoS;
use crate::error::Error;
use crate::frame::{FrameLayout, compose_data, compose_response};
use crate::payload::ValuePair;
use crate::topic::{Channel, Topic};

/// Publish attempts a queued reply gets before it is dropped.
pub const MAX_REPLY_ATTEMPTS: u8 = 2;

/// A reply encoded and waiting to be published.
pub struct QueuedPublish<const PACKET: usize> {
    buf: [u8; PACKET],
    layout: FrameLayout,
    qos: QoS,
    failures: u8,
}

impl<const PACKET: usize> QueuedPublish<PACKET> {
    /// The topic and payload of this reply.
    pub fn frame(&self) -> Result<(&str, &[u8]), Error> {
        self.layout.split(&self.buf)
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// How many times publishing this reply has failed so far.
    pub fn failures(&self) -> u8 {
        self.failures
    }
}

/// A FIFO of up to `DEPTH` replies, each at most `PACKET` bytes of
/// `topic NUL payload NUL`.
pub struct Outbox<const DEPTH: usize, const PACKET: usize> {
    queue: Deque<QueuedPublish<PACKET>, DEPTH>,
}

impl<const DEPTH: usize, const PACKET: usize> Outbox<DEPTH, PACKET> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// A [`ReplyOutbox`] that queues into this outbox, addressing replies to
    /// `account` and defaulting the device to `device`.
    pub fn writer<'o>(
        &'o mut self,
        account: &'o str,
        device: &'o str,
        qos: ReplyQos,
    ) -> OutboxWriter<'o, DEPTH, PACKET> {
        OutboxWriter {
            outbox: self,
            account,
            device,
            qos,
        }
    }

    /// The oldest queued reply.
    pub fn front(&self) -> Option<&QueuedPublish<PACKET>> {
        self.queue.front()
    }

    /// Drop the oldest queued reply.
    pub fn pop_front(&mut self) {
        let _ = self.queue.pop_front();
    }

    /// Record that publishing the oldest reply failed.
    ///
    /// Once it has failed [`MAX_REPLY_ATTEMPTS`] times it is dropped, so one
    /// rejected reply cannot hold up the ones queued behind it. Returns `true`
    /// if it was dropped.
    pub fn record_failure(&mut self) -> bool {
        let Some(head) = self.queue.front_mut() else {
            return false;
        };
        head.failures += 1;
        if head.failures < MAX_REPLY_ATTEMPTS {
            return false;
        }
        self.pop_front();
        true
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    fn push<F>(&mut self, qos: QoS, compose: F) -> Result<(), Error>
    where
        F: FnOnce(&mut [u8]) -> Result<FrameLayout, Error>,
    {
        if self.queue.is_full() {
            return Err(Error::OutboxFull);
        }
        let mut buf = [0u8; PACKET];
        let layout = compose(&mut buf)?;
        self.queue
            .push_back(QueuedPublish {
                buf,
                layout,
                qos,
                failures: 0,
            })
            .map_err(|_| Error::OutboxFull)
    }
}

impl<const DEPTH: usize, const PACKET: usize> Default for Outbox<DEPTH, PACKET> {
    fn default() -> Self {
        Self::new()
    }
}

/// Delivery guarantees for queued replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyQos {
    pub data: QoS,
    pub response: QoS,
}

/// Queues replies into an [`Outbox`] on behalf of a handler.
pub struct OutboxWriter<'o, const DEPTH: usize, const PACKET: usize> {
    outbox: &'o mut Outbox<DEPTH, PACKET>,
    account: &'o str,
    device: &'o str,
    qos: ReplyQos,
}

impl<const DEPTH: usize, const PACKET: usize> ReplyOutbox for OutboxWriter<'_, DEPTH, PACKET> {
    fn respond(&mut self, id: &str, error: Option<&str>, device: Option<&str>) -> Result<(), Error> {
        let account = self.account;
        let device = device.unwrap_or(self.device);
        self.outbox.push(self.qos.response, |buf| {
            compose_response(buf, account, device, id, error)
        })
    }

    fn publish_values(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        values: &[ValuePair<'_>],
        device: Option<&str>,
    ) -> Result<(), Error> {
        let account = self.account;
        let device = device.unwrap_or(self.device);
        self.outbox.push(self.qos.data, |buf| {
            compose_data(buf, account, device, topic, channel, data_type, values)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QOS: ReplyQos = ReplyQos {
        data: QoS::AtMostOnce,
        response: QoS::AtLeastOnce,
    };

    #[test]
    fn replies_are_queued_in_order() {
        let mut outbox = Outbox::<4, 64>::new();
        {
            let mut writer = outbox.writer("u1", "d1", QOS);
            writer.respond("id-1", None, Some("d7")).unwrap();
            writer
                .publish_data(Topic::Data, Channel::Id(3), None, None, "1", None)
                .unwrap();
        }
        assert_eq!(outbox.len(), 2);

        let first = outbox.front().unwrap();
        assert_eq!(first.frame().unwrap(), ("u1/d7/response", &b"ok,id-1"[..]));
        assert_eq!(first.qos(), QoS::AtLeastOnce);
        outbox.pop_front();

        let second = outbox.front().unwrap();
        assert_eq!(second.frame().unwrap(), ("u1/d1/data/3", &b"1"[..]));
        assert_eq!(second.qos(), QoS::AtMostOnce);
        outbox.pop_front();
        assert!(outbox.is_empty());
    }

    #[test]
    fn full_outbox_rejects_without_dropping() {
        let mut outbox = Outbox::<1, 64>::new();
        let mut writer = outbox.writer("u1", "d1", QOS);
        writer.respond("a", None, None).unwrap();
        assert_eq!(writer.respond("b", None, None), Err(Error::OutboxFull));
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn repeatedly_failing_reply_is_dropped() {
        let mut outbox = Outbox::<2, 64>::new();
        {
            let mut writer = outbox.writer("u1", "d1", QOS);
            writer.respond("stuck", None, None).unwrap();
            writer.respond("next", None, None).unwrap();
        }
        assert!(!outbox.record_failure());
        assert_eq!(outbox.front().unwrap().failures(), 1);
        assert!(outbox.record_failure());

        assert_eq!(outbox.len(), 1);
        let head = outbox.front().unwrap();
        assert_eq!(head.frame().unwrap().1, b"ok,next");
        assert_eq!(head.failures(), 0);

        outbox.clear();
        assert!(!outbox.record_failure());
    }

    #[test]
    fn encoding_errors_do_not_queue() {
        let mut outbox = Outbox::<2, 64>::new();
        let mut writer = outbox.writer("u1", "d1", QOS);
        assert_eq!(writer.respond("", None, None), Err(Error::InvalidValue));
        assert!(outbox.is_empty());
    }
}
