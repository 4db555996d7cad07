//! Publish frames.
//!
//! A frame is a topic and a payload laid out in one buffer as
//! `topic NUL payload NUL`, which is how both the client's scratch buffer and
//! queued replies hold an outbound message.

use crate::MAX_MESSAGE_VALUES;
use crate::error::Error;
use crate::payload::{ValuePair, build_data_payload, build_response_payload};
use crate::topic::{Channel, Topic, build_topic};

/// Lengths of the two halves of a frame written by [`compose_data`] or
/// [`compose_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameLayout {
    topic_len: usize,
    payload_len: usize,
}

impl FrameLayout {
    /// Split `buf` back into the topic text and the payload bytes.
    pub(crate) fn split<'b>(&self, buf: &'b [u8]) -> Result<(&'b str, &'b [u8]), Error> {
        let topic = buf.get(..self.topic_len).ok_or(Error::BufferTooSmall)?;
        let topic = core::str::from_utf8(topic).map_err(|_| Error::InvalidTopic)?;
        let start = self.topic_len + 1;
        let payload = buf
            .get(start..start + self.payload_len)
            .ok_or(Error::BufferTooSmall)?;
        Ok((topic, payload))
    }
}

fn compose<F>(
    buf: &mut [u8],
    account: &str,
    device: &str,
    topic: Topic,
    channel: Channel,
    payload: F,
) -> Result<FrameLayout, Error>
where
    F: FnOnce(&mut [u8]) -> Result<usize, Error>,
{
    let topic_len = build_topic(buf, account, device, topic, channel)?;
    let rest = buf.get_mut(topic_len + 1..).ok_or(Error::BufferTooSmall)?;
    let payload_len = payload(rest)?;
    Ok(FrameLayout {
        topic_len,
        payload_len,
    })
}

pub(crate) fn compose_data(
    buf: &mut [u8],
    account: &str,
    device: &str,
    topic: Topic,
    channel: Channel,
    data_type: Option<&str>,
    values: &[ValuePair<'_>],
) -> Result<FrameLayout, Error> {
    compose(buf, account, device, topic, channel, |rest| {
        build_data_payload::<MAX_MESSAGE_VALUES>(rest, data_type, values)
    })
}

pub(crate) fn compose_response(
    buf: &mut [u8],
    account: &str,
    device: &str,
    id: &str,
    error: Option<&str>,
) -> Result<FrameLayout, Error> {
    compose(buf, account, device, Topic::Response, Channel::None, |rest| {
        build_response_payload(rest, id, error)
    })
}
