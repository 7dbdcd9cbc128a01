//! Outbound frame writer.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Writes queued frames to the socket in order.
///
/// On cancellation a Close frame is sent before the pump exits.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => match msg {
                Some(m) => {
                    if let Err(e) = write.send(m).await {
                        warn!(error = %e, "WebSocket write failed");
                        return;
                    }
                }
                None => break,
            },
        }
    }

    debug!("sending close frame");
    let _ = write.send(tungstenite::Message::Close(None)).await;
}
