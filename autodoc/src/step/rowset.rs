//! Row sources and sinks for the async driver loop.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tokio::sync::mpsc;

use crate::core::Row;
use crate::errors::AutoDocError;

/// A source of input rows. `None` marks the end of the stream.
#[async_trait]
pub trait RowInput: Send {
    /// Returns the next row, waiting if none is available yet.
    async fn next_row(&mut self) -> Option<Row>;
}

/// A destination for output rows.
#[async_trait]
pub trait RowOutput: Send {
    /// Forwards one row.
    async fn put_row(&mut self, row: Row) -> Result<(), AutoDocError>;

    /// Signals that no more rows will follow.
    async fn finish(&mut self) {}
}

/// Rows from a pre-built list.
#[derive(Debug, Default)]
pub struct VecRowInput {
    rows: VecDeque<Row>,
}

impl VecRowInput {
    /// Creates an input yielding `rows` in order.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows: rows.into() }
    }
}

#[async_trait]
impl RowInput for VecRowInput {
    async fn next_row(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }
}

/// Rows from a tokio channel. The stream ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelRowInput {
    receiver: mpsc::Receiver<Row>,
}

impl ChannelRowInput {
    /// Wraps a receiver.
    #[must_use]
    pub const fn new(receiver: mpsc::Receiver<Row>) -> Self {
        Self { receiver }
    }
}

#[async_trait]
impl RowInput for ChannelRowInput {
    async fn next_row(&mut self) -> Option<Row> {
        self.receiver.recv().await
    }
}

/// Rows from any `Stream`.
pub struct StreamRowInput<S> {
    stream: S,
}

impl<S> StreamRowInput<S>
where
    S: Stream<Item = Row> + Unpin + Send,
{
    /// Wraps a stream.
    #[must_use]
    pub const fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> RowInput for StreamRowInput<S>
where
    S: Stream<Item = Row> + Unpin + Send,
{
    async fn next_row(&mut self) -> Option<Row> {
        self.stream.next().await
    }
}

/// Keeps output rows in memory.
#[derive(Debug, Default)]
pub struct CollectingRowOutput {
    rows: Vec<Row>,
    finished: bool,
}

impl CollectingRowOutput {
    /// Creates an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Takes the collected rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns true once `finish` was called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

#[async_trait]
impl RowOutput for CollectingRowOutput {
    async fn put_row(&mut self, row: Row) -> Result<(), AutoDocError> {
        if self.finished {
            return Err(AutoDocError::OutputClosed);
        }
        self.rows.push(row);
        Ok(())
    }

    async fn finish(&mut self) {
        self.finished = true;
    }
}

/// Rows into a tokio channel. Finishing drops the sender.
#[derive(Debug)]
pub struct ChannelRowOutput {
    sender: Option<mpsc::Sender<Row>>,
}

impl ChannelRowOutput {
    /// Wraps a sender.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<Row>) -> Self {
        Self {
            sender: Some(sender),
        }
    }
}

#[async_trait]
impl RowOutput for ChannelRowOutput {
    async fn put_row(&mut self, row: Row) -> Result<(), AutoDocError> {
        let sender = self.sender.as_ref().ok_or(AutoDocError::OutputClosed)?;
        sender.send(row).await.map_err(|_| AutoDocError::OutputClosed)
    }

    async fn finish(&mut self) {
        self.sender = None;
    }
}

/// Creates a bounded channel connecting one step's output to another's input.
#[must_use]
pub fn row_channel(capacity: usize) -> (ChannelRowOutput, ChannelRowInput) {
    let (sender, receiver) = mpsc::channel(capacity);
    (ChannelRowOutput::new(sender), ChannelRowInput::new(receiver))
}
