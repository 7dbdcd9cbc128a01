//! Inbound frame reader.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use waltz_protocol::constants::{WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};
use waltz_transfer::ChannelEvent;

/// Reads frames from the socket and forwards text frames as events.
///
/// Any incoming frame resets a [`WS_PONG_WAIT`] deadline; if it expires the
/// peer is considered dead. A close frame, read error, end of stream or
/// deadline expiry emits a single [`ChannelEvent::Closed`], unless the
/// channel was cancelled locally.
pub(crate) async fn read_pump<S>(
    mut read: S,
    events: mpsc::Sender<ChannelEvent>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let pong_deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("read pump cancelled");
                return;
            }

            () = &mut pong_deadline => {
                warn!("pong timeout, connection dead");
                break;
            }

            msg = read.next() => match msg {
                Some(Ok(msg)) => {
                    pong_deadline
                        .as_mut()
                        .reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                    match msg {
                        tungstenite::Message::Text(text) => {
                            if text.len() > WS_MAX_MESSAGE_SIZE {
                                warn!(len = text.len(), "frame too large, dropping");
                                continue;
                            }
                            trace!(frame = %text.as_str(), "received");
                            let event = ChannelEvent::Text(text.as_str().to_owned());
                            if events.send(event).await.is_err() {
                                debug!("event queue dropped, stopping read pump");
                                return;
                            }
                        }
                        tungstenite::Message::Ping(data) => {
                            trace!("received ping, sending pong");
                            let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                        }
                        tungstenite::Message::Pong(_) => trace!("received pong"),
                        tungstenite::Message::Binary(data) => {
                            warn!(len = data.len(), "ignoring binary frame");
                        }
                        tungstenite::Message::Close(frame) => {
                            debug!(?frame, "received close frame");
                            break;
                        }
                        tungstenite::Message::Frame(_) => {}
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket read failed");
                    break;
                }
                None => {
                    debug!("WebSocket stream ended");
                    break;
                }
            },
        }
    }

    if !cancel.is_cancelled() {
        let _ = events.send(ChannelEvent::Closed).await;
    }
    // Stops the write and ping pumps.
    cancel.cancel();
}
