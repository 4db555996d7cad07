//! # Cayenne Payloads
//!
//! Payloads are short ASCII strings. The grammar, which is the wire contract
//! for this crate, is:
//!
//! ```text
//! data-payload     = [ type "=" ] group *( "," group )
//! group            = value [ ":" unit ]
//! command-payload  = id "," data-payload
//! response-payload = "ok," id / "error," id "=" message
//! ```
//!
//! So a temperature of 30.5 degrees Celsius is sent as `temp=30.5:c`, and a
//! command with correlation id `42` setting a value to `1` arrives as `42,1`.
//!
//! `type`, `value` and `unit` may not be empty and may not contain `=`, `,`,
//! `:` or NUL. Ids may not contain `,`, `=` or NUL. Error messages only exclude
//! NUL since they run to the end of the payload.
//!
//! Parsing never copies: every text field of a [`Payload`] borrows from the
//! input bytes.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::error::Error;
use crate::topic::Topic;
use crate::util::{SliceWriter, build_into, until_nul};

/// Capacity of the text a [`Numeric`] value is rendered into.
pub const NUMBER_TEXT_LEN: usize = 33;

/// Text form of a rendered numeric value.
pub type NumberText = String<NUMBER_TEXT_LEN>;

const STATUS_OK: &str = "ok";
const STATUS_ERROR: &str = "error";

/// A value with an optional unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValuePair<'a> {
    pub value: &'a str,
    pub unit: Option<&'a str>,
}

impl<'a> ValuePair<'a> {
    pub const fn new(value: &'a str, unit: Option<&'a str>) -> Self {
        Self { value, unit }
    }

    /// A value without a unit.
    pub const fn bare(value: &'a str) -> Self {
        Self { value, unit: None }
    }
}

/// The decoded body of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<'a, const N: usize> {
    /// Data type tag, if the payload carried one.
    pub data_type: Option<&'a str>,
    /// Correlation id, present for command and response topics.
    pub id: Option<&'a str>,
    /// Value/unit pairs in wire order.
    pub values: Vec<ValuePair<'a>, N>,
}

/// Numbers that can be sent as payload values.
///
/// Integers render in plain decimal; floating point values always carry
/// exactly three decimals, so `30.5` is sent as `30.500`.
pub trait Numeric: Copy {
    fn render(self) -> Result<NumberText, Error>;
}

macro_rules! impl_numeric {
    ($fmt:literal => $($ty:ty),+) => {
        $(
            impl Numeric for $ty {
                fn render(self) -> Result<NumberText, Error> {
                    let mut text = NumberText::new();
                    write!(text, $fmt, self).map_err(|_| Error::BufferTooSmall)?;
                    Ok(text)
                }
            }
        )+
    };
}

impl_numeric!("{}" => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_numeric!("{:.3}" => f32, f64);

/// Encodes a data payload into `buf` and NUL-terminates it.
///
/// Returns the payload length, excluding the terminator. At most `MAX` pairs
/// are accepted; callers pass the bound they will parse with.
pub fn build_data_payload<const MAX: usize>(
    buf: &mut [u8],
    data_type: Option<&str>,
    values: &[ValuePair<'_>],
) -> Result<usize, Error> {
    if values.len() > MAX {
        return Err(Error::TooManyValues);
    }
    if values.is_empty() {
        return Err(Error::InvalidValue);
    }
    if let Some(data_type) = data_type {
        check_field(data_type)?;
    }
    for pair in values {
        check_field(pair.value)?;
        if let Some(unit) = pair.unit {
            check_field(unit)?;
        }
    }

    build_into(buf, |w| {
        if let Some(data_type) = data_type {
            w.push_str(data_type)?;
            w.push_byte(b'=')?;
        }
        for (index, pair) in values.iter().enumerate() {
            if index > 0 {
                w.push_byte(b',')?;
            }
            write_pair(w, pair)?;
        }
        Ok(())
    })
}

fn write_pair(w: &mut SliceWriter<'_>, pair: &ValuePair<'_>) -> Result<(), Error> {
    w.push_str(pair.value)?;
    if let Some(unit) = pair.unit {
        w.push_byte(b':')?;
        w.push_str(unit)?;
    }
    Ok(())
}

/// Encodes a command response into `buf` and NUL-terminates it.
///
/// `error` is `None` for success.
pub fn build_response_payload(
    buf: &mut [u8],
    id: &str,
    error: Option<&str>,
) -> Result<usize, Error> {
    if id.is_empty() || id.contains([',', '=', '\0']) {
        return Err(Error::InvalidValue);
    }
    if let Some(message) = error
        && (message.is_empty() || message.contains('\0'))
    {
        return Err(Error::InvalidValue);
    }

    build_into(buf, |w| {
        match error {
            None => {
                w.push_str(STATUS_OK)?;
                w.push_byte(b',')?;
                w.push_str(id)
            }
            Some(message) => {
                w.push_str(STATUS_ERROR)?;
                w.push_byte(b',')?;
                w.push_str(id)?;
                w.push_byte(b'=')?;
                w.push_str(message)
            }
        }
    })
}

fn check_field(field: &str) -> Result<(), Error> {
    if is_field(field) {
        Ok(())
    } else {
        Err(Error::InvalidValue)
    }
}

fn is_field(field: &str) -> bool {
    !field.is_empty() && !field.contains(['=', ',', ':', '\0'])
}

/// Decodes an inbound payload received on `topic`.
///
/// The payload ends at the first NUL byte or at the end of the slice. More than
/// `N` value pairs is [`Error::TooManyValues`].
pub fn parse_payload<'a, const N: usize>(
    topic: Topic,
    raw: &'a [u8],
) -> Result<Payload<'a, N>, Error> {
    let text = core::str::from_utf8(until_nul(raw)).map_err(|_| Error::MalformedPayload)?;
    if text.is_empty() {
        return Err(Error::MalformedPayload);
    }

    match topic {
        Topic::Response => parse_response(text),
        topic if topic.is_command() => {
            let (id, data) = text.split_once(',').ok_or(Error::MalformedPayload)?;
            if id.is_empty() || id.contains('=') {
                return Err(Error::MalformedPayload);
            }
            let mut payload = parse_data(data)?;
            payload.id = Some(id);
            Ok(payload)
        }
        _ => parse_data(text),
    }
}

fn parse_data<'a, const N: usize>(text: &'a str) -> Result<Payload<'a, N>, Error> {
    let (data_type, body) = match text.split_once('=') {
        Some((data_type, body)) => {
            if !is_field(data_type) {
                return Err(Error::MalformedPayload);
            }
            (Some(data_type), body)
        }
        None => (None, text),
    };
    if body.is_empty() {
        return Err(Error::MalformedPayload);
    }

    let mut values = Vec::new();
    for group in body.split(',') {
        let pair = match group.split_once(':') {
            Some((value, unit)) => ValuePair::new(value, Some(unit)),
            None => ValuePair::bare(group),
        };
        if !is_field(pair.value) || pair.unit.is_some_and(|unit| !is_field(unit)) {
            return Err(Error::MalformedPayload);
        }
        values.push(pair).map_err(|_| Error::TooManyValues)?;
    }

    Ok(Payload {
        data_type,
        id: None,
        values,
    })
}

fn parse_response<'a, const N: usize>(text: &'a str) -> Result<Payload<'a, N>, Error> {
    let (status, rest) = text.split_once(',').ok_or(Error::MalformedPayload)?;
    let mut values = Vec::new();
    let id = match status {
        STATUS_OK => rest,
        STATUS_ERROR => {
            let (id, message) = rest.split_once('=').ok_or(Error::MalformedPayload)?;
            if message.is_empty() {
                return Err(Error::MalformedPayload);
            }
            values
                .push(ValuePair::bare(message))
                .map_err(|_| Error::TooManyValues)?;
            id
        }
        _ => return Err(Error::MalformedPayload),
    };
    if id.is_empty() || id.contains([',', '=']) {
        return Err(Error::MalformedPayload);
    }

    Ok(Payload {
        data_type: None,
        id: Some(id),
        values,
    })
}
