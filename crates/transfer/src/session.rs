//! The transfer session and its event interpreter.

use tracing::{debug, info, warn};

use waltz_protocol::{SelectionItem, TransferEvent};

use crate::channel::{ChannelLease, TransferLink};
use crate::projection::{ProgressView, project};
use crate::types::{
    Applied, CANCELLED_MESSAGE, CLOSED_MESSAGE, Counter, CounterOverflow, FINISHED_MESSAGE,
    SessionId, SessionState,
};

/// One end-to-end transfer attempt.
///
/// Not thread-safe by itself; the controller serializes access behind a
/// mutex. All transitions into a terminal state go through
/// [`finish`](Self::finish), which is the only place the channel is
/// released.
#[derive(Debug)]
pub struct TransferSession {
    id: SessionId,
    state: SessionState,
    items: Vec<SelectionItem>,
    total_units: u64,
    items_transferred: usize,
    units_transferred: u64,
    current_item: Option<String>,
    terminal_message: Option<String>,
    channel: Option<ChannelLease>,
}

impl TransferSession {
    /// Creates an idle session over a copy of the selection.
    pub fn new(items: Vec<SelectionItem>) -> Self {
        let total_units = items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.total_units));
        Self {
            id: SessionId::new(),
            state: SessionState::Idle,
            items,
            total_units,
            items_transferred: 0,
            units_transferred: 0,
            current_item: None,
            terminal_message: None,
            channel: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    pub fn items_transferred(&self) -> usize {
        self.items_transferred
    }

    pub fn units_transferred(&self) -> u64 {
        self.units_transferred
    }

    /// Sum of the declared totals of all items.
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    /// Name of the item in progress, `None` before the first `item-start`.
    pub fn current_item(&self) -> Option<&str> {
        self.current_item.as_deref()
    }

    pub fn terminal_message(&self) -> Option<&str> {
        self.terminal_message.as_deref()
    }

    /// Returns `true` while the session holds a channel lease.
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Returns `true` once a link is attached to the lease.
    pub fn channel_open(&self) -> bool {
        self.channel.as_ref().is_some_and(ChannelLease::is_open)
    }

    /// Current projection.
    pub fn projection(&self) -> ProgressView {
        project(self)
    }

    /// `Idle → Connecting`, taking ownership of the channel lease.
    ///
    /// Returns `false` (and releases `lease`) if the session was already
    /// started or ended.
    pub fn begin(&mut self, lease: ChannelLease) -> bool {
        if self.state != SessionState::Idle {
            debug!(session = %self.id, state = %self.state, "begin ignored");
            return false;
        }
        self.channel = Some(lease);
        self.state = SessionState::Connecting;
        info!(session = %self.id, items = self.items.len(), "session connecting");
        true
    }

    /// Hands the opened link to the lease.
    ///
    /// If the session is no longer live (cancelled while connecting) the
    /// link is closed immediately and `false` is returned.
    pub fn attach(&mut self, link: Box<dyn TransferLink>) -> bool {
        match self.channel.as_mut() {
            Some(lease) if self.state.is_live() => {
                lease.attach(link);
                debug!(session = %self.id, "channel attached");
                true
            }
            _ => {
                debug!(session = %self.id, state = %self.state, "session ended, closing late channel");
                link.close();
                false
            }
        }
    }

    /// Applies one inbound event.
    pub fn apply(&mut self, event: TransferEvent) -> Applied {
        if !self.state.is_live() {
            debug!(
                session = %self.id,
                state = %self.state,
                kind = %event.kind(),
                "discarding event, session not live"
            );
            return Applied::Ignored;
        }

        match event {
            TransferEvent::ItemStart { name } => {
                self.enter_running();
                debug!(session = %self.id, item = %name, "item started");
                self.current_item = Some(name);
                Applied::Progress
            }
            TransferEvent::UnitDone => {
                self.enter_running();
                if self.units_transferred >= self.total_units {
                    self.overflow(Counter::Units, self.total_units)
                } else {
                    self.units_transferred += 1;
                    Applied::Progress
                }
            }
            TransferEvent::ItemDone => {
                self.enter_running();
                if self.items_transferred >= self.items.len() {
                    self.overflow(Counter::Items, self.items.len() as u64)
                } else {
                    self.items_transferred += 1;
                    Applied::Progress
                }
            }
            TransferEvent::Done => {
                self.finish(SessionState::Finished, FINISHED_MESSAGE);
                Applied::Terminal
            }
            TransferEvent::Error { message } => {
                self.finish(SessionState::Failed, format!("error: {message}"));
                Applied::Terminal
            }
            TransferEvent::Unknown { kind } => {
                warn!(session = %self.id, kind = %kind, "protocol violation");
                self.finish(
                    SessionState::Failed,
                    format!("invalid message received from server: {kind}"),
                );
                Applied::Terminal
            }
        }
    }

    /// User cancellation. Returns `true` if this call ended the session.
    pub fn cancel(&mut self) -> bool {
        self.finish(SessionState::Failed, CANCELLED_MESSAGE)
    }

    /// The channel closed. Only fails the session if it was still live.
    pub fn channel_closed(&mut self) -> bool {
        if !self.state.is_live() {
            return false;
        }
        self.finish(SessionState::Failed, CLOSED_MESSAGE)
    }

    /// Fails a live session with a diagnostic.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.state.is_live() {
            return false;
        }
        self.finish(SessionState::Failed, message)
    }

    /// Enters `state` with `message` unless already terminal, releasing
    /// the channel. Returns `true` if the transition happened.
    fn finish(&mut self, state: SessionState, message: impl Into<String>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        let message = message.into();
        info!(session = %self.id, from = %self.state, to = %state, message = %message, "session ended");
        self.state = state;
        self.terminal_message = Some(message);
        if let Some(lease) = self.channel.take() {
            lease.release();
        }
        true
    }

    fn enter_running(&mut self) {
        if self.state == SessionState::Connecting {
            debug!(session = %self.id, "first event, session running");
            self.state = SessionState::Running;
        }
    }

    fn overflow(&self, counter: Counter, limit: u64) -> Applied {
        let overflow = CounterOverflow { counter, limit };
        warn!(session = %self.id, %overflow, "counter clamped");
        Applied::Overflow(overflow)
    }
}
