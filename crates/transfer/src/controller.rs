//! Session lifecycle manager.
//!
//! Owns the single active session, opens its channel, sends the start
//! command and feeds inbound events to the interpreter one at a time.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use waltz_protocol::{SelectionItem, StartCommand, TransferEvent};

use crate::TransferError;
use crate::channel::{ChannelConnector, ChannelEvent, ChannelLease, OpenChannel};
use crate::projection::ProgressView;
use crate::session::TransferSession;
use crate::sink::ProgressSink;
use crate::types::{SessionConfig, SessionId, SessionState};

/// A session plus everything needed to publish its changes.
struct SessionCell {
    id: SessionId,
    session: Mutex<TransferSession>,
    updates: watch::Sender<ProgressView>,
    sink: Arc<dyn ProgressSink>,
}

impl SessionCell {
    fn lock(&self) -> MutexGuard<'_, TransferSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Renders the current projection. Caller holds the session lock.
    fn publish(&self, session: &TransferSession) {
        let view = session.projection();
        self.sink.render(&view);
        self.updates.send_replace(view);
    }

    /// Runs a transition under the lock, publishing if it changed anything.
    fn transition(&self, f: impl FnOnce(&mut TransferSession) -> bool) -> bool {
        let mut session = self.lock();
        let changed = f(&mut session);
        if changed {
            self.publish(&session);
        }
        changed
    }

    /// Applies one event. Returns `true` once the session is terminal.
    fn apply(&self, event: TransferEvent) -> bool {
        let mut session = self.lock();
        if session.apply(event).changed() {
            self.publish(&session);
        }
        session.state().is_terminal()
    }
}

/// Handle to a started session.
///
/// Cheap to clone. Keeps the session alive for projection reads after it
/// ended.
#[derive(Clone)]
pub struct SessionHandle {
    cell: Arc<SessionCell>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.cell.id
    }

    pub fn state(&self) -> SessionState {
        self.cell.lock().state()
    }

    /// Current projection. Never waits on the network.
    pub fn projection(&self) -> ProgressView {
        self.cell.lock().projection()
    }

    /// Cancels the session, closing its channel.
    ///
    /// Returns `true` if this call ended the session; `false` if it had
    /// already ended (including by an earlier cancel).
    pub fn cancel(&self) -> bool {
        let cancelled = self.cell.transition(TransferSession::cancel);
        if cancelled {
            info!(session = %self.cell.id, "session cancelled");
        }
        cancelled
    }

    /// Subscribes to projection updates.
    pub fn subscribe(&self) -> watch::Receiver<ProgressView> {
        self.cell.updates.subscribe()
    }

    /// Waits until the session is terminal and returns the final view.
    pub async fn wait(&self) -> ProgressView {
        let mut rx = self.subscribe();
        loop {
            {
                let view = rx.borrow_and_update();
                if view.state.is_terminal() {
                    return view.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.projection();
            }
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.cell.id)
            .finish()
    }
}

/// Starts, tracks and cancels transfer sessions, one at a time.
pub struct TransferController {
    config: SessionConfig,
    connector: Arc<dyn ChannelConnector>,
    sink: Arc<dyn ProgressSink>,
    current: Mutex<Option<SessionHandle>>,
}

impl TransferController {
    /// Creates a controller.
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn ChannelConnector>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            connector,
            sink,
            current: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a session over `selection`.
    ///
    /// Returns as soon as the session is `Connecting`; the channel is
    /// opened by a background task on the current Tokio runtime. Fails
    /// with [`TransferError::AlreadyRunning`] if the previous session has
    /// not ended, leaving it untouched.
    pub fn start(&self, selection: Vec<SelectionItem>) -> Result<SessionHandle, TransferError> {
        if selection.is_empty() {
            return Err(TransferError::EmptySelection);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransferError::NoRuntime)?;

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = current.as_ref() {
            if !active.state().is_terminal() {
                warn!(session = %active.id(), "start rejected, session still running");
                return Err(TransferError::AlreadyRunning);
            }
        }

        let mut session = TransferSession::new(selection);
        let lease = ChannelLease::new();
        let token = lease.token();
        session.begin(lease);

        let view = session.projection();
        let (updates, _) = watch::channel(view.clone());
        let cell = Arc::new(SessionCell {
            id: session.id(),
            session: Mutex::new(session),
            updates,
            sink: self.sink.clone(),
        });
        self.sink.render(&view);

        let handle = SessionHandle { cell: cell.clone() };
        *current = Some(handle.clone());
        drop(current);

        runtime.spawn(drive(
            cell,
            self.connector.clone(),
            self.config.clone(),
            token,
        ));
        Ok(handle)
    }

    /// Cancels `handle`'s session. See [`SessionHandle::cancel`].
    pub fn cancel(&self, handle: &SessionHandle) -> bool {
        handle.cancel()
    }

    /// Projection of the most recent session, if any.
    pub fn current(&self) -> Option<ProgressView> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(SessionHandle::projection)
    }

    /// Cancels the active session, if any.
    pub fn shutdown(&self) {
        let active = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handle) = active {
            handle.cancel();
        }
        debug!("transfer controller shut down");
    }
}

/// Background task owning one session's channel traffic.
///
/// Every await is raced against the lease token, so a cancel (or any
/// other terminal transition) stops the task promptly.
async fn drive(
    cell: Arc<SessionCell>,
    connector: Arc<dyn ChannelConnector>,
    config: SessionConfig,
    token: CancellationToken,
) {
    let id = cell.id;
    let items = cell.lock().items().to_vec();

    if !config.embed_selection {
        if let Some(url) = config.announce_url.as_deref() {
            debug!(session = %id, %url, "announcing selection");
            let announced = tokio::select! {
                _ = token.cancelled() => return,
                r = connector.announce(url, &items) => r,
            };
            if let Err(e) = announced {
                warn!(session = %id, error = %e, "selection announcement failed");
                cell.transition(|s| s.fail(format!("failed to announce selection: {e}")));
                return;
            }
        }
    }

    debug!(session = %id, endpoint = %config.endpoint, "opening channel");
    let opened = tokio::select! {
        _ = token.cancelled() => return,
        r = connector.open(&config.endpoint) => r,
    };
    let OpenChannel { link, mut events } = match opened {
        Ok(channel) => channel,
        Err(e) => {
            warn!(session = %id, error = %e, "channel open failed");
            cell.transition(|s| s.fail(format!("failed to connect: {e}")));
            return;
        }
    };

    let command = if config.embed_selection {
        StartCommand::with_selection(&items)
    } else {
        StartCommand::bare()
    };
    let sent = match command.to_json() {
        Ok(json) => link.send(json).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = sent {
        warn!(session = %id, error = %e, "failed to send start command");
        link.close();
        cell.transition(TransferSession::channel_closed);
        return;
    }
    debug!(session = %id, "start command sent");

    if !cell.lock().attach(link) {
        return;
    }

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            ev = events.recv() => ev,
        };
        match next {
            Some(ChannelEvent::Text(text)) => {
                trace!(session = %id, frame = %text, "event received");
                if cell.apply(TransferEvent::decode(&text)) {
                    break;
                }
            }
            Some(ChannelEvent::Closed) | None => {
                debug!(session = %id, "channel closed");
                cell.transition(TransferSession::channel_closed);
                break;
            }
        }
    }
    debug!(session = %id, "session driver finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::channel::{BoxFuture, ChannelError, TransferLink};
    use crate::sink::RecordingSink;
    use crate::types::{CANCELLED_MESSAGE, CLOSED_MESSAGE};

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    struct MockLink {
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl TransferLink for MockLink {
        fn send(&self, text: String) -> BoxFuture<'_, Result<(), ChannelError>> {
            Box::pin(async move {
                self.sent.lock().unwrap().push(text);
                Ok(())
            })
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockConnector {
        inbound: Mutex<Option<mpsc::Receiver<ChannelEvent>>>,
        sent: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
        opened: Mutex<Vec<String>>,
        announced: Mutex<Vec<(String, Vec<SelectionItem>)>>,
        open_error: Option<String>,
        announce_error: Option<String>,
        hang_open: bool,
    }

    impl MockConnector {
        fn with_inbound(rx: mpsc::Receiver<ChannelEvent>) -> Self {
            Self {
                inbound: Mutex::new(Some(rx)),
                ..Self::default()
            }
        }
    }

    impl ChannelConnector for MockConnector {
        fn open<'a>(
            &'a self,
            endpoint: &'a str,
        ) -> BoxFuture<'a, Result<OpenChannel, ChannelError>> {
            Box::pin(async move {
                self.opened.lock().unwrap().push(endpoint.to_string());
                if self.hang_open {
                    std::future::pending::<()>().await;
                }
                if let Some(e) = &self.open_error {
                    return Err(ChannelError::Connect(e.clone()));
                }
                let events = self.inbound.lock().unwrap().take();
                let events = events.ok_or(ChannelError::Closed)?;
                Ok(OpenChannel {
                    link: Box::new(MockLink {
                        sent: self.sent.clone(),
                        closed: self.closed.clone(),
                    }),
                    events,
                })
            })
        }

        fn announce<'a>(
            &'a self,
            url: &'a str,
            items: &'a [SelectionItem],
        ) -> BoxFuture<'a, Result<(), ChannelError>> {
            Box::pin(async move {
                self.announced
                    .lock()
                    .unwrap()
                    .push((url.to_string(), items.to_vec()));
                match &self.announce_error {
                    Some(e) => Err(ChannelError::Request(e.clone())),
                    None => Ok(()),
                }
            })
        }
    }

    fn rock_pop() -> Vec<SelectionItem> {
        vec![
            SelectionItem::new("a", "Rock", 3),
            SelectionItem::new("b", "Pop", 2),
        ]
    }

    fn text(kind: &str, body: Option<&str>) -> ChannelEvent {
        let msg = waltz_protocol::ServerMessage::new(kind, body);
        ChannelEvent::Text(serde_json::to_string(&msg).unwrap())
    }

    fn controller(
        config: SessionConfig,
        connector: Arc<MockConnector>,
    ) -> (TransferController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let ctrl = TransferController::new(config, connector, sink.clone());
        (ctrl, sink)
    }

    async fn wait(handle: &SessionHandle) -> ProgressView {
        tokio::time::timeout(TEST_TIMEOUT, handle.wait())
            .await
            .expect("session should end")
    }

    async fn wait_for_state(handle: &SessionHandle, state: SessionState) {
        let mut rx = handle.subscribe();
        tokio::time::timeout(TEST_TIMEOUT, rx.wait_for(|v| v.state == state))
            .await
            .expect("state reached in time")
            .expect("session alive");
    }

    #[tokio::test]
    async fn full_transfer_reaches_finished() {
        let (tx, rx) = mpsc::channel(32);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, sink) = controller(SessionConfig::default(), connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        assert_eq!(handle.state(), SessionState::Connecting);

        for event in [
            text("item-start", Some("Rock")),
            text("unit-done", None),
            text("unit-done", None),
            text("unit-done", None),
            text("item-done", None),
            text("item-start", Some("Pop")),
            text("unit-done", None),
            text("unit-done", None),
            text("item-done", None),
            text("done", None),
        ] {
            tx.send(event).await.unwrap();
        }

        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Finished);
        assert_eq!(view.current_item.as_deref(), Some("Pop"));
        assert_eq!(view.items_transferred, 2);
        assert_eq!(view.total_items, 2);
        assert_eq!(view.units_transferred, 5);
        assert_eq!(view.total_units, 5);
        assert_eq!(view.terminal_message.as_deref(), Some("Finished"));

        assert_eq!(
            connector.sent.lock().unwrap().as_slice(),
            [r#"{"command":"START"}"#.to_string()]
        );
        assert!(connector.closed.load(Ordering::SeqCst));
        assert_eq!(
            connector.opened.lock().unwrap().as_slice(),
            [SessionConfig::default().endpoint]
        );

        let views = sink.views();
        assert_eq!(views.first().unwrap().state, SessionState::Connecting);
        assert_eq!(views.last().unwrap(), &view);
        assert_eq!(views.len(), 11);
        assert!(views.windows(2).all(|w| {
            w[1].units_transferred >= w[0].units_transferred
                && w[1].items_transferred >= w[0].items_transferred
        }));
    }

    #[tokio::test]
    async fn server_error_fails_session_and_releases_channel() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("item-start", Some("Rock"))).await.unwrap();
        tx.send(text("error", Some("disk full"))).await.unwrap();

        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert_eq!(view.terminal_message.as_deref(), Some("error: disk full"));
        assert!(connector.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_kind_fails_closed() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("bogus", None)).await.unwrap();

        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert!(view.terminal_message.unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn malformed_frame_fails_closed() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(ChannelEvent::Text("{not json".into())).await.unwrap();

        let view = wait(&handle).await;
        assert_eq!(
            view.terminal_message.as_deref(),
            Some("invalid message received from server: {not json")
        );
    }

    #[tokio::test]
    async fn embedded_selection_is_sent_with_start_command() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let config = SessionConfig {
            embed_selection: true,
            announce_url: Some("http://unused/transfer".into()),
            ..SessionConfig::default()
        };
        let (ctrl, _sink) = controller(config, connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("done", None)).await.unwrap();
        wait(&handle).await;

        let sent = connector.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let command: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(command["command"], "START");
        assert_eq!(command["playlists"][0]["name"], "Rock");
        assert_eq!(command["playlists"][1]["totalUnits"], 2);
        // Embedding wins over announcing.
        assert!(connector.announced.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selection_announced_before_channel_opens() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let config = SessionConfig {
            announce_url: Some("http://localhost:8080/transfer".into()),
            ..SessionConfig::default()
        };
        let (ctrl, _sink) = controller(config, connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("done", None)).await.unwrap();
        wait(&handle).await;

        let announced = connector.announced.lock().unwrap().clone();
        assert_eq!(announced.len(), 1);
        assert_eq!(announced[0].0, "http://localhost:8080/transfer");
        assert_eq!(announced[0].1, rock_pop());
        assert_eq!(
            connector.sent.lock().unwrap().as_slice(),
            [r#"{"command":"START"}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn announce_failure_fails_session_without_opening() {
        let connector = Arc::new(MockConnector {
            announce_error: Some("refused".into()),
            ..MockConnector::default()
        });
        let config = SessionConfig {
            announce_url: Some("http://localhost:1/transfer".into()),
            ..SessionConfig::default()
        };
        let (ctrl, _sink) = controller(config, connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert_eq!(
            view.terminal_message.as_deref(),
            Some("failed to announce selection: request failed: refused")
        );
        assert!(connector.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_failure_fails_session() {
        let connector = Arc::new(MockConnector {
            open_error: Some("connection refused".into()),
            ..MockConnector::default()
        });
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert_eq!(
            view.terminal_message.as_deref(),
            Some("failed to connect: connection refused")
        );
    }

    #[tokio::test]
    async fn unexpected_close_fails_session() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("item-start", Some("Rock"))).await.unwrap();
        tx.send(ChannelEvent::Closed).await.unwrap();

        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert_eq!(view.terminal_message.as_deref(), Some(CLOSED_MESSAGE));
        assert_eq!(view.current_item.as_deref(), Some("Rock"));
    }

    #[tokio::test]
    async fn dropped_event_queue_counts_as_close() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        drop(tx);

        let view = wait(&handle).await;
        assert_eq!(view.terminal_message.as_deref(), Some(CLOSED_MESSAGE));
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("item-start", Some("Rock"))).await.unwrap();
        tx.send(text("unit-done", None)).await.unwrap();
        wait_for_state(&handle, SessionState::Running).await;
        let mut rx = handle.subscribe();
        rx.wait_for(|v| v.units_transferred == 1).await.unwrap();
        let before = handle.projection();

        let err = ctrl.start(rock_pop()).unwrap_err();
        assert!(matches!(err, TransferError::AlreadyRunning));
        assert_eq!(handle.projection(), before);
        assert_eq!(ctrl.current(), Some(before));
    }

    #[tokio::test]
    async fn start_after_finish_creates_fresh_session() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let first = ctrl.start(rock_pop()).unwrap();
        tx.send(text("done", None)).await.unwrap();
        wait(&first).await;

        // The mock only has one inbound queue, so the second session fails
        // to open, which is fine: it must still be a distinct session.
        let second = ctrl.start(rock_pop()).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(first.state(), SessionState::Finished);
        wait(&second).await;
        assert_eq!(first.state(), SessionState::Finished);
    }

    #[tokio::test]
    async fn empty_selection_rejected() {
        let connector = Arc::new(MockConnector::default());
        let (ctrl, sink) = controller(SessionConfig::default(), connector);
        assert!(matches!(
            ctrl.start(Vec::new()),
            Err(TransferError::EmptySelection)
        ));
        assert!(sink.views().is_empty());
        assert!(ctrl.current().is_none());
    }

    #[test]
    fn start_outside_runtime_rejected() {
        let connector = Arc::new(MockConnector::default());
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);
        assert!(matches!(
            ctrl.start(rock_pop()),
            Err(TransferError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn cancel_while_connecting() {
        let connector = Arc::new(MockConnector {
            hang_open: true,
            ..MockConnector::default()
        });
        let (ctrl, sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        assert!(ctrl.cancel(&handle));
        assert!(!ctrl.cancel(&handle));

        let view = wait(&handle).await;
        assert_eq!(view.state, SessionState::Failed);
        assert_eq!(view.terminal_message.as_deref(), Some(CANCELLED_MESSAGE));

        let terminal_renders = sink
            .views()
            .iter()
            .filter(|v| v.state.is_terminal())
            .count();
        assert_eq!(terminal_renders, 1);
    }

    #[tokio::test]
    async fn cancel_while_running_closes_channel() {
        let (tx, rx) = mpsc::channel(8);
        let connector = Arc::new(MockConnector::with_inbound(rx));
        let (ctrl, _sink) = controller(SessionConfig::default(), connector.clone());

        let handle = ctrl.start(rock_pop()).unwrap();
        tx.send(text("item-start", Some("Rock"))).await.unwrap();
        wait_for_state(&handle, SessionState::Running).await;

        assert!(handle.cancel());
        assert!(connector.closed.load(Ordering::SeqCst));
        assert_eq!(
            handle.projection().terminal_message.as_deref(),
            Some(CANCELLED_MESSAGE)
        );

        // Late events are never applied.
        let _ = tx.send(text("unit-done", None)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.projection().units_transferred, 0);
    }

    #[tokio::test]
    async fn cancel_races_done_exactly_one_wins() {
        for _ in 0..20 {
            let (tx, rx) = mpsc::channel(8);
            let connector = Arc::new(MockConnector::with_inbound(rx));
            let (ctrl, sink) = controller(SessionConfig::default(), connector);

            let handle = ctrl.start(rock_pop()).unwrap();
            tx.send(text("item-start", Some("Rock"))).await.unwrap();
            wait_for_state(&handle, SessionState::Running).await;

            let canceller = {
                let handle = handle.clone();
                tokio::spawn(async move { handle.cancel() })
            };
            tx.send(text("done", None)).await.unwrap();
            let cancelled = canceller.await.unwrap();

            let view = wait(&handle).await;
            let terminal_renders = sink
                .views()
                .iter()
                .filter(|v| v.state.is_terminal())
                .count();
            assert_eq!(terminal_renders, 1);
            if cancelled {
                assert_eq!(view.terminal_message.as_deref(), Some(CANCELLED_MESSAGE));
            } else {
                assert_eq!(view.terminal_message.as_deref(), Some("Finished"));
            }
        }
    }

    #[tokio::test]
    async fn shutdown_cancels_active_session() {
        let connector = Arc::new(MockConnector {
            hang_open: true,
            ..MockConnector::default()
        });
        let (ctrl, _sink) = controller(SessionConfig::default(), connector);

        let handle = ctrl.start(rock_pop()).unwrap();
        ctrl.shutdown();
        assert_eq!(handle.state(), SessionState::Failed);
        ctrl.shutdown();
    }
}
