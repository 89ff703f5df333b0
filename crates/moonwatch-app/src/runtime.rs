//! Generic runtime loop.
//!
//! All inputs (transport signals, reconnect timers, heartbeat ticks and user
//! commands) funnel into one `select!` loop and reach the client one at a
//! time. Handlers never overlap, so client state needs no locking.
//!
//! Reconnect timers run as spawned tasks that only post their generation
//! back into the queue; the client decides whether that generation is still
//! current.

use std::{collections::VecDeque, time::Duration};

use moonwatch_client::{ClientAction, ClientConfig, ClientEvent, ObserverClient};
use moonwatch_core::{
    Environment, Generation, Transport, TransportHandle, TransportSignal, TransportSink,
};
use moonwatch_proto::Outbound;
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::Driver;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How often the client is ticked to drive the heartbeat
    pub tick_interval: Duration,
    /// Connect as soon as the runtime starts
    pub connect_on_start: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_secs(1), connect_on_start: true }
    }
}

/// Runtime failure.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Frontend failed to read input or render output
    #[error("driver failed: {0}")]
    Driver(#[source] E),
}

/// Drives an [`ObserverClient`] with a transport, a clock and a frontend.
pub struct Runtime<E: Environment, T: Transport, D: Driver> {
    client: ObserverClient<E>,
    env: E,
    transport: T,
    driver: D,
    config: RuntimeConfig,
    handle: Option<TransportHandle>,
    reconnect: Option<JoinHandle<()>>,
    signals_tx: mpsc::UnboundedSender<TransportSignal>,
    signals_rx: mpsc::UnboundedReceiver<TransportSignal>,
    timers_tx: mpsc::UnboundedSender<Generation>,
    timers_rx: mpsc::UnboundedReceiver<Generation>,
}

impl<E: Environment, T: Transport, D: Driver> Runtime<E, T, D> {
    /// Create a runtime around a fresh client.
    pub fn new(
        env: E,
        transport: T,
        driver: D,
        client_config: ClientConfig,
        config: RuntimeConfig,
    ) -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (timers_tx, timers_rx) = mpsc::unbounded_channel();

        Self {
            client: ObserverClient::new(env.clone(), client_config),
            env,
            transport,
            driver,
            config,
            handle: None,
            reconnect: None,
            signals_tx,
            signals_rx,
            timers_tx,
            timers_rx,
        }
    }

    /// The client being driven.
    pub fn client(&self) -> &ObserverClient<E> {
        &self.client
    }

    /// The frontend.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run until the driver reports quit, then disconnect.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails. The client is disconnected
    /// before returning either way.
    pub async fn run(&mut self) -> Result<(), RuntimeError<D::Error>> {
        if self.config.connect_on_start {
            self.process(ClientEvent::Connect).await?;
        }

        let mut ticks = time::interval(self.config.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            let event = tokio::select! {
                Some(signal) = self.signals_rx.recv() => ClientEvent::Transport(signal),
                Some(generation) = self.timers_rx.recv() => {
                    ClientEvent::ReconnectTimerFired { generation }
                },
                _ = ticks.tick() => ClientEvent::Tick,
                command = self.driver.next_command() => match command {
                    Ok(Some(event)) => event,
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(RuntimeError::Driver(err)),
                },
            };

            if let Err(err) = self.process(event).await {
                break Err(err);
            }
        };

        tracing::debug!("runtime stopping");
        let teardown = self.process(ClientEvent::Disconnect).await;
        self.cancel_reconnect();
        outcome.and(teardown)
    }

    /// Feed one event to the client and execute everything it causes.
    ///
    /// Follow-up events produced while executing actions (a transport that
    /// refuses to open) are processed before returning, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render a notification.
    pub async fn process(&mut self, event: ClientEvent) -> Result<(), RuntimeError<D::Error>> {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for action in self.client.handle(event) {
                if let Some(follow_up) = self.execute(action).await? {
                    queue.push_back(follow_up);
                }
            }
        }

        Ok(())
    }

    async fn execute(
        &mut self,
        action: ClientAction,
    ) -> Result<Option<ClientEvent>, RuntimeError<D::Error>> {
        match action {
            ClientAction::OpenTransport { generation, url } => {
                if let Some(stale) = self.handle.take() {
                    tracing::debug!(generation = %stale.generation(), "replacing transport");
                    stale.close();
                }

                let sink = TransportSink::new(generation, self.signals_tx.clone());
                match self.transport.open(&url, sink) {
                    Ok(handle) => self.handle = Some(handle),
                    Err(err) => {
                        tracing::warn!(%generation, %url, error = %err, "transport rejected");
                        return Ok(Some(ClientEvent::TransportRejected {
                            generation,
                            reason: err.to_string(),
                        }));
                    },
                }
            },
            ClientAction::CloseTransport { generation } => {
                if let Some(handle) =
                    self.handle.take_if(|handle| handle.generation() == generation)
                {
                    handle.close();
                }
            },
            ClientAction::Send { generation, envelope } => self.send(generation, envelope),
            ClientAction::ScheduleReconnect { generation, delay } => {
                self.cancel_reconnect();

                let env = self.env.clone();
                let timers = self.timers_tx.clone();
                self.reconnect = Some(tokio::spawn(async move {
                    env.sleep(delay).await;
                    if timers.send(generation).is_err() {
                        tracing::trace!(%generation, "runtime gone before reconnect timer fired");
                    }
                }));
            },
            ClientAction::CancelReconnect => self.cancel_reconnect(),
            ClientAction::Notify(notification) => {
                self.driver.render(&notification).await.map_err(RuntimeError::Driver)?;
            },
        }

        Ok(None)
    }

    fn send(&self, generation: Generation, envelope: Outbound) {
        let Some(handle) = self.handle.as_ref().filter(|handle| handle.generation() == generation)
        else {
            tracing::warn!(%generation, "no open transport for send");
            return;
        };

        let text = match envelope.encode() {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode envelope");
                return;
            },
        };

        if let Err(err) = handle.send(text) {
            tracing::warn!(%generation, error = %err, "send failed");
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
    }
}

impl<E: Environment, T: Transport, D: Driver> Drop for Runtime<E, T, D> {
    fn drop(&mut self) {
        self.cancel_reconnect();
    }
}
