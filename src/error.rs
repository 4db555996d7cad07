//! # Error Types
//!
//! Codec, registry and outbox failures share the [`Error`] enum. Operations that
//! also talk to the MQTT engine return [`ClientError`], which wraps the engine's
//! own error type.

use core::fmt;

/// Failures raised by the topic/payload codec, the handler registry and the
/// reply outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The destination buffer cannot hold the encoded text and its NUL terminator.
    BufferTooSmall,
    /// More value/unit pairs than the declared maximum.
    TooManyValues,
    /// An inbound payload is empty or does not follow the payload grammar.
    MalformedPayload,
    /// A topic is structurally invalid, or the `Undefined` category was used.
    InvalidTopic,
    /// The category segment of an inbound topic is not a known category.
    UnknownTopic,
    /// The account segment of an inbound topic is not ours.
    AuthMismatch,
    /// Every handler slot is taken.
    RegistryFull,
    /// A field handed to a builder is empty or contains a reserved delimiter.
    InvalidValue,
    /// The reply outbox has no room for another message.
    OutboxFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferTooSmall => write!(f, "Buffer too small"),
            Error::TooManyValues => write!(f, "Too many values"),
            Error::MalformedPayload => write!(f, "Malformed payload"),
            Error::InvalidTopic => write!(f, "Invalid topic"),
            Error::UnknownTopic => write!(f, "Unknown topic"),
            Error::AuthMismatch => write!(f, "Topic account does not match"),
            Error::RegistryFull => write!(f, "Handler registry full"),
            Error::InvalidValue => write!(f, "Invalid value"),
            Error::OutboxFull => write!(f, "Reply outbox full"),
        }
    }
}

impl core::error::Error for Error {}

/// The error returned by [`CayenneClient`](crate::CayenneClient) operations.
///
/// It is generic over the engine error type `T`, so engine failures surface
/// unchanged to the application.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError<T> {
    /// The MQTT engine rejected or failed the operation.
    Transport(T),
    /// Topic/payload encoding or handler bookkeeping failed.
    Cayenne(Error),
}

impl<T> From<Error> for ClientError<T> {
    fn from(err: Error) -> Self {
        ClientError::Cayenne(err)
    }
}

impl<T: fmt::Debug> fmt::Display for ClientError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "Transport failure: {:?}", err),
            ClientError::Cayenne(err) => err.fmt(f),
        }
    }
}

impl<T> ClientError<T> {
    /// Returns the codec/registry error, if this is not a transport failure.
    pub fn cayenne(&self) -> Option<Error> {
        match self {
            ClientError::Cayenne(err) => Some(*err),
            ClientError::Transport(_) => None,
        }
    }
}
