//! Scripted frontend.

use std::{
    convert::Infallible,
    future::{self, Future},
};

use moonwatch_app::Driver;
use moonwatch_client::{ClientEvent, Notification};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Input {
    Command(ClientEvent),
    Quit,
}

/// Frontend fed by a [`SimUser`].
///
/// Commands arrive in the order the user issued them. The driver quits when
/// told to or when the user is dropped.
#[derive(Debug)]
pub struct SimDriver {
    inputs: mpsc::UnboundedReceiver<Input>,
    rendered: mpsc::UnboundedSender<Notification>,
}

impl SimDriver {
    /// Driver plus the handle the test uses to play the user.
    pub fn new() -> (Self, SimUser) {
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (rendered_tx, rendered_rx) = mpsc::unbounded_channel();

        (Self { inputs: inputs_rx, rendered: rendered_tx }, SimUser {
            inputs: inputs_tx,
            rendered: rendered_rx,
        })
    }
}

impl Driver for SimDriver {
    type Error = Infallible;

    fn next_command(
        &mut self,
    ) -> impl Future<Output = Result<Option<ClientEvent>, Self::Error>> + Send {
        async move {
            match self.inputs.recv().await {
                Some(Input::Command(event)) => Ok(Some(event)),
                Some(Input::Quit) | None => Ok(None),
            }
        }
    }

    fn render(
        &mut self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        if self.rendered.send(notification.clone()).is_err() {
            tracing::trace!("user gone, notification dropped");
        }
        future::ready(Ok(()))
    }
}

/// Test's handle on the simulated user.
#[derive(Debug)]
pub struct SimUser {
    inputs: mpsc::UnboundedSender<Input>,
    rendered: mpsc::UnboundedReceiver<Notification>,
}

impl SimUser {
    /// Issue a command.
    pub fn command(&self, event: ClientEvent) {
        if self.inputs.send(Input::Command(event)).is_err() {
            tracing::trace!("driver gone, command dropped");
        }
    }

    /// Ask the runtime to stop.
    pub fn quit(&self) {
        if self.inputs.send(Input::Quit).is_err() {
            tracing::trace!("driver gone, quit dropped");
        }
    }

    /// Wait for the next rendered notification.
    pub async fn next_notification(&mut self) -> Option<Notification> {
        self.rendered.recv().await
    }

    /// Wait for the first notification matching `predicate`, discarding the
    /// ones before it.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&Notification) -> bool,
    ) -> Option<Notification> {
        while let Some(notification) = self.rendered.recv().await {
            if predicate(&notification) {
                return Some(notification);
            }
        }
        None
    }

    /// Everything rendered so far and not yet consumed.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.rendered.try_recv().ok()).collect()
    }
}
