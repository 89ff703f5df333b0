//! Line-oriented terminal driver.
//!
//! Reads slash commands line by line and prints every notification as one
//! line of text. Commands that issue nothing (help, typos) are answered
//! in place and never reach the runtime.

use std::future::Future;

use moonwatch_app::Driver;
use moonwatch_client::{ClientEvent, Notification};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::{
    commands::{self, Command, HELP},
    render,
};

/// Terminal I/O failure.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Reading input or writing output failed
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// [`Driver`] over an async line source and an async writer.
pub struct TerminalDriver<R, W> {
    lines: Lines<BufReader<R>>,
    out: W,
}

impl TerminalDriver<tokio::io::Stdin, tokio::io::Stdout> {
    /// Driver over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> TerminalDriver<R, W> {
    /// Driver over arbitrary input and output.
    pub fn new(input: R, out: W) -> Self {
        Self { lines: BufReader::new(input).lines(), out }
    }

    /// Output written so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    async fn say(&mut self, text: &str) -> Result<(), TerminalError> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

impl<R, W> Driver for TerminalDriver<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    type Error = TerminalError;

    fn next_command(
        &mut self,
    ) -> impl Future<Output = Result<Option<ClientEvent>, Self::Error>> + Send {
        async move {
            // `next_line` is cancel safe. Dropping the future mid-reply can
            // truncate the reply but never loses a line of input.
            while let Some(line) = self.lines.next_line().await? {
                match commands::parse(&line) {
                    Command::Quit => return Ok(None),
                    Command::Empty => {},
                    Command::Help => self.say(HELP).await?,
                    Command::Unknown { input } => {
                        self.say(&format!("unknown command: {input} (try /help)")).await?;
                    },
                    Command::InvalidArgs { command, error } => {
                        self.say(&format!("/{command}: {error}")).await?;
                    },
                    command => {
                        if let Some(event) = command.into_event() {
                            return Ok(Some(event));
                        }
                    },
                }
            }

            tracing::debug!("input closed");
            Ok(None)
        }
    }

    fn render(
        &mut self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let line = render::render(notification);
        async move { self.say(&line).await }
    }
}
