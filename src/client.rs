//! # Cayenne Client
//!
//! [`CayenneClient`] ties the codec and the router to an [`MqttEngine`]. It owns
//! the handler registry, a scratch buffer for outbound frames and the reply
//! outbox, so nothing here allocates.
//!
//! ```ignore
//! let options = ClientOptions::new(USERNAME, PASSWORD, CLIENT_ID);
//! let mut client = CayenneClient::<_>::new(engine, options);
//! client.connect().await?;
//!
//! client
//!     .subscribe(Topic::Command, Channel::Id(1), Some(&relay), None)
//!     .await?;
//!
//! loop {
//!     client.yield_for(Duration::from_millis(100)).await?;
//!     client
//!         .publish_number(Topic::Data, Channel::Id(2), Some(data_type::TEMPERATURE), Some(unit::CELSIUS), 21.5f32, None)
//!         .await?;
//! }
//! ```

use embassy_time::Duration;

use crate::MAX_PACKET_SIZE;
use crate::engine::{Credentials, MqttEngine, QoS};
use crate::error::{ClientError, Error};
use crate::frame::{FrameLayout, compose_data, compose_response};
use crate::payload::{Numeric, ValuePair};
use crate::router::{MAX_REPLY_ATTEMPTS, MessageHandler, Outbox, ReplyQos, Router};
use crate::topic::{Channel, Topic, build_topic_filter};

/// Default number of handler slots.
pub const DEFAULT_HANDLERS: usize = 5;
/// Default number of replies handlers can queue per poll.
pub const DEFAULT_OUTBOX: usize = 2;

/// Configuration for a [`CayenneClient`].
///
/// The username doubles as the account segment of every topic, and the
/// client id is the device id used when an operation does not name one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClientOptions<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub client_id: &'a str,
    pub data_qos: QoS,
    pub response_qos: QoS,
    pub subscribe_qos: QoS,
    pub retain: bool,
}

impl<'a> ClientOptions<'a> {
    pub fn new(username: &'a str, password: &'a str, client_id: &'a str) -> Self {
        Self {
            username,
            password,
            client_id,
            data_qos: QoS::AtMostOnce,
            response_qos: QoS::AtLeastOnce,
            subscribe_qos: QoS::AtMostOnce,
            retain: true,
        }
    }

    pub fn with_data_qos(mut self, qos: QoS) -> Self {
        self.data_qos = qos;
        self
    }

    pub fn with_response_qos(mut self, qos: QoS) -> Self {
        self.response_qos = qos;
        self
    }

    pub fn with_subscribe_qos(mut self, qos: QoS) -> Self {
        self.subscribe_qos = qos;
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn credentials(&self) -> Credentials<'a> {
        Credentials {
            username: self.username,
            password: self.password,
            client_id: self.client_id,
        }
    }

    fn reply_qos(&self) -> ReplyQos {
        ReplyQos {
            data: self.data_qos,
            response: self.response_qos,
        }
    }
}

/// A Cayenne client over an MQTT engine `E`.
///
/// - `PACKET`: size of one encoded `topic NUL payload NUL` frame.
/// - `HANDLERS`: number of handler slots.
/// - `OUTBOX`: number of replies handlers can queue during one poll.
///
/// Handlers and device ids passed to [`subscribe`](Self::subscribe) are
/// borrowed for `'a`, the same lifetime as the credentials.
pub struct CayenneClient<
    'a,
    E,
    const PACKET: usize = MAX_PACKET_SIZE,
    const HANDLERS: usize = DEFAULT_HANDLERS,
    const OUTBOX: usize = DEFAULT_OUTBOX,
> where
    E: MqttEngine,
{
    engine: E,
    options: ClientOptions<'a>,
    router: Router<'a, HANDLERS>,
    outbox: Outbox<OUTBOX, PACKET>,
    scratch: [u8; PACKET],
}

impl<'a, E, const PACKET: usize, const HANDLERS: usize, const OUTBOX: usize>
    CayenneClient<'a, E, PACKET, HANDLERS, OUTBOX>
where
    E: MqttEngine,
{
    pub fn new(engine: E, options: ClientOptions<'a>) -> Self {
        Self {
            engine,
            options,
            router: Router::new(),
            outbox: Outbox::new(),
            scratch: [0; PACKET],
        }
    }

    /// Replaces the credentials used by the next [`connect`](Self::connect).
    ///
    /// Existing subscriptions keep the device ids they were made with.
    pub fn init(&mut self, username: &'a str, password: &'a str, client_id: &'a str) {
        self.options.username = username;
        self.options.password = password;
        self.options.client_id = client_id;
    }

    pub fn options(&self) -> &ClientOptions<'a> {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn router(&self) -> &Router<'a, HANDLERS> {
        &self.router
    }

    /// Number of replies still waiting to be published.
    pub fn pending_replies(&self) -> usize {
        self.outbox.len()
    }

    /// Drops every queued reply without publishing it and returns how many
    /// were dropped.
    pub fn discard_replies(&mut self) -> usize {
        let dropped = self.outbox.len();
        self.outbox.clear();
        dropped
    }

    pub async fn connect(&mut self) -> Result<(), ClientError<E::Error>> {
        debug!("Connecting as {}", self.options.client_id);
        self.engine
            .connect(&self.options.credentials())
            .await
            .map_err(ClientError::Transport)?;
        info!("Connected to Cayenne as {}", self.options.client_id);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), ClientError<E::Error>> {
        self.engine
            .disconnect()
            .await
            .map_err(ClientError::Transport)?;
        info!("Disconnected");
        Ok(())
    }

    pub fn connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// Lets the engine service the connection for up to `timeout`.
    ///
    /// Inbound publishes are decoded and routed to handlers as they arrive;
    /// undecodable ones are dropped. Replies the handlers queued are published
    /// afterwards, oldest first. A reply whose publish fails stays queued for
    /// the next call, and is dropped once it has failed
    /// [`MAX_REPLY_ATTEMPTS`] times.
    ///
    /// If the poll itself fails, its error is returned even when publishing
    /// the replies failed too.
    pub async fn yield_for(&mut self, timeout: Duration) -> Result<(), ClientError<E::Error>> {
        let Self {
            engine,
            options,
            router,
            outbox,
            ..
        } = &mut *self;
        let account = options.username;
        let router = &*router;

        let polled = {
            let mut writer = outbox.writer(account, options.client_id, options.reply_qos());
            engine
                .poll(timeout, &mut |topic: &[u8], payload: &[u8]| {
                    let _ = router.deliver(account, topic, payload, &mut writer);
                })
                .await
        };

        let flushed = self.flush_outbox().await;
        if let Err(err) = polled {
            if flushed.is_err() {
                warn!("Publishing replies failed after a failed poll");
            }
            return Err(ClientError::Transport(err));
        }
        flushed
    }

    async fn flush_outbox(&mut self) -> Result<(), ClientError<E::Error>> {
        while let Some(entry) = self.outbox.front() {
            let (topic, payload) = match entry.frame() {
                Ok(frame) => frame,
                Err(err) => {
                    self.outbox.pop_front();
                    return Err(err.into());
                }
            };
            trace!("Publishing queued reply to {}", topic);
            let published = self
                .engine
                .publish(topic, payload, entry.qos(), self.options.retain)
                .await;
            if let Err(err) = published {
                if self.outbox.record_failure() {
                    warn!("Dropped a reply after {} failed publishes", MAX_REPLY_ATTEMPTS);
                }
                return Err(ClientError::Transport(err));
            }
            self.outbox.pop_front();
        }
        Ok(())
    }

    async fn publish_frame(
        &mut self,
        layout: FrameLayout,
        qos: QoS,
    ) -> Result<(), ClientError<E::Error>> {
        let (topic, payload) = layout.split(&self.scratch)?;
        trace!("Publishing to {}", topic);
        self.engine
            .publish(topic, payload, qos, self.options.retain)
            .await
            .map_err(ClientError::Transport)
    }

    /// Publishes a data message carrying every pair in `values`.
    ///
    /// `device` defaults to the client id.
    pub async fn publish_values(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        values: &[ValuePair<'_>],
        device: Option<&str>,
    ) -> Result<(), ClientError<E::Error>> {
        let layout = compose_data(
            &mut self.scratch,
            self.options.username,
            device.unwrap_or(self.options.client_id),
            topic,
            channel,
            data_type,
            values,
        )?;
        self.publish_frame(layout, self.options.data_qos).await
    }

    /// Publishes a single text value.
    pub async fn publish_data(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        unit: Option<&str>,
        value: &str,
        device: Option<&str>,
    ) -> Result<(), ClientError<E::Error>> {
        self.publish_values(
            topic,
            channel,
            data_type,
            &[ValuePair::new(value, unit)],
            device,
        )
        .await
    }

    /// Publishes a single number, rendered as described on [`Numeric`].
    pub async fn publish_number<V: Numeric>(
        &mut self,
        topic: Topic,
        channel: Channel,
        data_type: Option<&str>,
        unit: Option<&str>,
        value: V,
        device: Option<&str>,
    ) -> Result<(), ClientError<E::Error>> {
        let text = value.render()?;
        self.publish_data(topic, channel, data_type, unit, &text, device)
            .await
    }

    /// Answers the command with correlation id `id`. `error` is `None` on
    /// success.
    pub async fn publish_response(
        &mut self,
        id: &str,
        error: Option<&str>,
        device: Option<&str>,
    ) -> Result<(), ClientError<E::Error>> {
        let layout = compose_response(
            &mut self.scratch,
            self.options.username,
            device.unwrap_or(self.options.client_id),
            id,
            error,
        )?;
        self.publish_frame(layout, self.options.response_qos).await
    }

    fn build_filter(
        &mut self,
        device: &str,
        topic: Topic,
        channel: Channel,
    ) -> Result<usize, Error> {
        build_topic_filter(
            &mut self.scratch,
            self.options.username,
            device,
            topic,
            channel,
        )
    }

    /// Subscribes to `topic`/`channel` of `device` (default: the client id).
    ///
    /// With a handler, matching messages are routed to it; without one they
    /// reach the default handler. The handler is only registered once the
    /// engine accepted the subscription. If every slot is taken this returns
    /// [`Error::RegistryFull`] but the engine subscription stays in place.
    pub async fn subscribe(
        &mut self,
        topic: Topic,
        channel: Channel,
        handler: Option<&'a dyn MessageHandler>,
        device: Option<&'a str>,
    ) -> Result<(), ClientError<E::Error>> {
        let device = device.unwrap_or(self.options.client_id);
        let len = self.build_filter(device, topic, channel)?;
        let filter = text_prefix(&self.scratch, len)?;
        debug!("Subscribing to {}", filter);
        self.engine
            .subscribe(filter, self.options.subscribe_qos)
            .await
            .map_err(ClientError::Transport)?;

        if let Some(handler) = handler {
            if let Err(err) = self
                .router
                .registry_mut()
                .subscribe(device, topic, channel, handler)
            {
                warn!("Subscribed to {:?} without a handler: {:?}", topic, err);
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Unsubscribes from `topic`/`channel` of `device` (default: the client id)
    /// and frees every handler slot registered for it.
    pub async fn unsubscribe(
        &mut self,
        topic: Topic,
        channel: Channel,
        device: Option<&str>,
    ) -> Result<(), ClientError<E::Error>> {
        let device = device.unwrap_or(self.options.client_id);
        let len = self.build_filter(device, topic, channel)?;
        let filter = text_prefix(&self.scratch, len)?;
        debug!("Unsubscribing from {}", filter);
        self.engine
            .unsubscribe(filter)
            .await
            .map_err(ClientError::Transport)?;

        let freed = self
            .router
            .registry_mut()
            .unsubscribe(device, topic, channel);
        trace!("Freed {} handler slots", freed);
        Ok(())
    }

    /// Sets or clears the handler for messages no subscription matches.
    pub fn set_default_handler(&mut self, handler: Option<&'a dyn MessageHandler>) {
        self.router.set_default_handler(handler);
    }
}

fn text_prefix(buf: &[u8], len: usize) -> Result<&str, Error> {
    let bytes = buf.get(..len).ok_or(Error::BufferTooSmall)?;
    core::str::from_utf8(bytes).map_err(|_| Error::InvalidTopic)
}
