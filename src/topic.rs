//! # Cayenne Topics
//!
//! Topics have the shape `<account>/<device>/<category>[/<channel>]`. The
//! category is one of the fixed [`Topic`] segments; some of them (`sys/...`)
//! contain slashes themselves, so parsing resolves the category before looking
//! for a trailing channel number.

use core::fmt::Write;

use crate::error::Error;
use crate::util::{SliceWriter, build_into, until_nul};

/// A Cayenne topic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Topic {
    /// Marks an unused handler slot. Never valid on the wire.
    Undefined,
    Data,
    Command,
    Config,
    Response,
    SysModel,
    SysVersion,
    SysCpuModel,
    SysCpuSpeed,
    Digital,
    DigitalCommand,
    DigitalConfig,
    Analog,
    AnalogCommand,
    AnalogConfig,
}

impl Topic {
    /// Every category that can appear on the wire.
    pub const ALL: [Topic; 14] = [
        Topic::Data,
        Topic::Command,
        Topic::Config,
        Topic::Response,
        Topic::SysModel,
        Topic::SysVersion,
        Topic::SysCpuModel,
        Topic::SysCpuSpeed,
        Topic::Digital,
        Topic::DigitalCommand,
        Topic::DigitalConfig,
        Topic::Analog,
        Topic::AnalogCommand,
        Topic::AnalogConfig,
    ];

    /// The wire segment for this category, or `None` for [`Topic::Undefined`].
    pub const fn segment(self) -> Option<&'static str> {
        let name = match self {
            Topic::Undefined => return None,
            Topic::Data => "data",
            Topic::Command => "cmd",
            Topic::Config => "conf",
            Topic::Response => "response",
            Topic::SysModel => "sys/model",
            Topic::SysVersion => "sys/version",
            Topic::SysCpuModel => "sys/cpu/model",
            Topic::SysCpuSpeed => "sys/cpu/speed",
            Topic::Digital => "digital",
            Topic::DigitalCommand => "digital-cmd",
            Topic::DigitalConfig => "digital-conf",
            Topic::Analog => "analog",
            Topic::AnalogCommand => "analog-cmd",
            Topic::AnalogConfig => "analog-conf",
        };
        Some(name)
    }

    /// Looks up a category by its exact wire segment.
    pub fn from_segment(segment: &str) -> Option<Topic> {
        Topic::ALL
            .iter()
            .copied()
            .find(|topic| topic.segment() == Some(segment))
    }

    /// Whether payloads on this topic carry a leading correlation id.
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            Topic::Command | Topic::DigitalCommand | Topic::AnalogCommand
        )
    }
}

/// The channel part of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Category-level message; the topic has no channel segment.
    None,
    /// Wildcard matching every channel. Only valid for subscriptions.
    All,
    /// A numbered channel.
    Id(u32),
}

impl From<u32> for Channel {
    fn from(id: u32) -> Self {
        Channel::Id(id)
    }
}

/// The routing fields recovered from an inbound topic. The device borrows from
/// the topic buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicInfo<'a> {
    pub device: &'a str,
    pub topic: Topic,
    pub channel: Channel,
}

/// Builds a publish topic into `buf` and NUL-terminates it.
///
/// Returns the topic length, excluding the terminator. [`Channel::All`] is
/// rejected since a wildcard cannot be published to.
pub fn build_topic(
    buf: &mut [u8],
    account: &str,
    device: &str,
    topic: Topic,
    channel: Channel,
) -> Result<usize, Error> {
    if channel == Channel::All {
        return Err(Error::InvalidTopic);
    }
    build_topic_filter(buf, account, device, topic, channel)
}

/// Builds a subscription filter into `buf` and NUL-terminates it.
///
/// Same as [`build_topic`], except that [`Channel::All`] is rendered as the MQTT
/// single-level wildcard `+`.
pub fn build_topic_filter(
    buf: &mut [u8],
    account: &str,
    device: &str,
    topic: Topic,
    channel: Channel,
) -> Result<usize, Error> {
    let category = topic.segment().ok_or(Error::InvalidTopic)?;
    check_segment(account)?;
    check_segment(device)?;

    build_into(buf, |w| {
        w.push_str(account)?;
        w.push_byte(b'/')?;
        w.push_str(device)?;
        w.push_byte(b'/')?;
        w.push_str(category)?;
        write_channel(w, channel)
    })
}

fn write_channel(w: &mut SliceWriter<'_>, channel: Channel) -> Result<(), Error> {
    match channel {
        Channel::None => Ok(()),
        Channel::All => w.push_str("/+"),
        Channel::Id(id) => write!(w, "/{}", id).map_err(|_| Error::BufferTooSmall),
    }
}

fn check_segment(segment: &str) -> Result<(), Error> {
    if segment.is_empty() || segment.contains(['/', '+', '#', '\0']) {
        return Err(Error::InvalidTopic);
    }
    Ok(())
}

/// Parses an inbound topic addressed to `account`.
///
/// The topic ends at the first NUL byte or at the end of the slice.
pub fn parse_topic<'a>(raw: &'a [u8], account: &str) -> Result<TopicInfo<'a>, Error> {
    let text = core::str::from_utf8(until_nul(raw)).map_err(|_| Error::InvalidTopic)?;

    let (owner, rest) = text.split_once('/').ok_or(Error::InvalidTopic)?;
    if owner != account {
        return Err(Error::AuthMismatch);
    }

    let (device, rest) = rest.split_once('/').ok_or(Error::InvalidTopic)?;
    if device.is_empty() {
        return Err(Error::InvalidTopic);
    }

    let (topic, channel) = parse_category(rest)?;
    Ok(TopicInfo {
        device,
        topic,
        channel,
    })
}

fn parse_category(rest: &str) -> Result<(Topic, Channel), Error> {
    if let Some(topic) = Topic::from_segment(rest) {
        return Ok((topic, Channel::None));
    }

    let (category, channel) = rest.rsplit_once('/').ok_or(Error::UnknownTopic)?;
    let topic = Topic::from_segment(category).ok_or(Error::UnknownTopic)?;
    Ok((topic, Channel::Id(parse_channel(channel)?)))
}

fn parse_channel(segment: &str) -> Result<u32, Error> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidTopic);
    }
    segment.parse().map_err(|_| Error::InvalidTopic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(account: &str, device: &str, topic: Topic, channel: Channel) -> std::string::String {
        let mut buf = [0u8; 96];
        let len = build_topic(&mut buf, account, device, topic, channel).unwrap();
        assert_eq!(buf[len], 0);
        std::string::String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn builds_channel_and_category_topics() {
        assert_eq!(built("u1", "d1", Topic::Data, Channel::Id(2)), "u1/d1/data/2");
        assert_eq!(
            built("u1", "d1", Topic::SysCpuSpeed, Channel::None),
            "u1/d1/sys/cpu/speed"
        );
    }

    #[test]
    fn every_category_round_trips() {
        let mut buf = [0u8; 96];
        for topic in Topic::ALL {
            for channel in [Channel::None, Channel::Id(0), Channel::Id(17), Channel::Id(u32::MAX)] {
                let len = build_topic(&mut buf, "acct", "dev-9", topic, channel).unwrap();
                let info = parse_topic(&buf[..len], "acct").unwrap();
                assert_eq!(info.topic, topic);
                assert_eq!(info.channel, channel);
                assert_eq!(info.device, "dev-9");
            }
        }
    }

    #[test]
    fn parse_stops_at_nul() {
        let info = parse_topic(b"u1/d1/cmd/5\0garbage", "u1").unwrap();
        assert_eq!(info.topic, Topic::Command);
        assert_eq!(info.channel, Channel::Id(5));
    }

    #[test]
    fn wildcard_only_in_filters() {
        let mut buf = [0u8; 32];
        assert_eq!(
            build_topic(&mut buf, "u1", "d1", Topic::Command, Channel::All),
            Err(Error::InvalidTopic)
        );
        let len = build_topic_filter(&mut buf, "u1", "d1", Topic::Command, Channel::All).unwrap();
        assert_eq!(&buf[..len], b"u1/d1/cmd/+");
    }

    #[test]
    fn undefined_topic_is_rejected() {
        let mut buf = [0u8; 32];
        assert_eq!(
            build_topic(&mut buf, "u1", "d1", Topic::Undefined, Channel::None),
            Err(Error::InvalidTopic)
        );
    }

    #[test]
    fn one_byte_short_fails_cleanly() {
        // "u1/d1/data/2" is 12 bytes plus the terminator.
        let mut buf = [0xAAu8; 12];
        assert_eq!(
            build_topic(&mut buf, "u1", "d1", Topic::Data, Channel::Id(2)),
            Err(Error::BufferTooSmall)
        );
        assert_eq!(buf[0], 0);

        let mut exact = [0u8; 13];
        assert_eq!(
            build_topic(&mut exact, "u1", "d1", Topic::Data, Channel::Id(2)),
            Ok(12)
        );
    }

    #[test]
    fn rejects_bad_segments_when_building() {
        let mut buf = [0u8; 32];
        for device in ["", "a/b", "a+", "#"] {
            assert_eq!(
                build_topic(&mut buf, "u1", device, Topic::Data, Channel::None),
                Err(Error::InvalidTopic)
            );
        }
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_topic(b"u2/d1/data", "u1"), Err(Error::AuthMismatch));
        assert_eq!(parse_topic(b"u1", "u1"), Err(Error::InvalidTopic));
        assert_eq!(parse_topic(b"u1/d1", "u1"), Err(Error::InvalidTopic));
        assert_eq!(parse_topic(b"u1//data", "u1"), Err(Error::InvalidTopic));
        assert_eq!(parse_topic(b"u1/d1/bogus", "u1"), Err(Error::UnknownTopic));
        assert_eq!(parse_topic(b"u1/d1/bogus/3", "u1"), Err(Error::UnknownTopic));
        assert_eq!(parse_topic(b"u1/d1/data/x", "u1"), Err(Error::InvalidTopic));
        assert_eq!(parse_topic(b"u1/d1/data/+5", "u1"), Err(Error::InvalidTopic));
        assert_eq!(parse_topic(b"u1/d1/data/", "u1"), Err(Error::InvalidTopic));
        assert_eq!(
            parse_topic(b"u1/d1/data/99999999999", "u1"),
            Err(Error::InvalidTopic)
        );
        assert_eq!(parse_topic(&[0xFF, b'/'], "u1"), Err(Error::InvalidTopic));
    }
}
