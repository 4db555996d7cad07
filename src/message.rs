//! Decoded inbound messages.

use heapless::Vec;

use crate::MAX_MESSAGE_VALUES;
use crate::error::Error;
use crate::payload::{ValuePair, parse_payload};
use crate::topic::{Channel, Topic, parse_topic};

/// A message received from Cayenne, decoded from its topic and payload.
///
/// Every text field borrows from the buffers the message was parsed from, so a
/// `Message` cannot outlive them. Copy what you need before returning from a
/// handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    /// The device the topic addresses.
    pub device: &'a str,
    pub topic: Topic,
    pub channel: Channel,
    /// Correlation id; set for command topics (and for responses).
    pub id: Option<&'a str>,
    /// Data type tag, if the payload had one.
    pub data_type: Option<&'a str>,
    pub values: Vec<ValuePair<'a>, MAX_MESSAGE_VALUES>,
}

impl<'a> Message<'a> {
    /// Decodes a delivery addressed to `account`: first the topic, then the
    /// payload according to the topic's category.
    pub fn parse(account: &str, topic: &'a [u8], payload: &'a [u8]) -> Result<Self, Error> {
        let info = parse_topic(topic, account)?;
        let body = parse_payload::<MAX_MESSAGE_VALUES>(info.topic, payload)?;
        Ok(Self {
            device: info.device,
            topic: info.topic,
            channel: info.channel,
            id: body.id,
            data_type: body.data_type,
            values: body.values,
        })
    }

    /// The value at `index`, if there is one.
    pub fn value(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).map(|pair| pair.value)
    }

    /// The unit at `index`, if that pair has one.
    pub fn unit(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).and_then(|pair| pair.unit)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_delivery() {
        let msg = Message::parse("u1", b"u1/d1/cmd/5", b"id-9,on:d").unwrap();
        assert_eq!(msg.device, "d1");
        assert_eq!(msg.topic, Topic::Command);
        assert_eq!(msg.channel, Channel::Id(5));
        assert_eq!(msg.id, Some("id-9"));
        assert_eq!(msg.value(0), Some("on"));
        assert_eq!(msg.unit(0), Some("d"));
        assert_eq!(msg.value(1), None);
        assert_eq!(msg.unit(1), None);
        assert_eq!(msg.value_count(), 1);
    }

    #[test]
    fn topic_errors_win_over_payload_errors() {
        assert_eq!(
            Message::parse("u1", b"other/d1/cmd/5", b""),
            Err(Error::AuthMismatch)
        );
        assert_eq!(
            Message::parse("u1", b"u1/d1/cmd/5", b""),
            Err(Error::MalformedPayload)
        );
    }
}
