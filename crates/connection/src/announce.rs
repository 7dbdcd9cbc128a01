//! HTTP announcement of a selection ahead of the channel.

use tracing::debug;

use waltz_protocol::constants::{TRANSFER_PATH, WS_REQUEST_TIMEOUT};
use waltz_protocol::{SelectionItem, TransferRequest};

use crate::ws_channel::ConnectionError;

/// Posts selections to the transfer server.
#[derive(Debug, Clone)]
pub struct SelectionAnnouncer {
    http: reqwest::Client,
}

impl SelectionAnnouncer {
    /// Creates an announcer whose requests time out after
    /// [`WS_REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, ConnectionError> {
        let http = reqwest::Client::builder()
            .timeout(WS_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }

    /// Sends `POST url` with `{"playlists": items}`.
    pub async fn announce(&self, url: &str, items: &[SelectionItem]) -> Result<(), ConnectionError> {
        let body = TransferRequest {
            playlists: items.to_vec(),
        };
        debug!(%url, items = items.len(), "announcing selection");
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Derives the announcement URL served next to a channel endpoint.
///
/// `ws://host:port/transferSocket` becomes `http://host:port/transfer`
/// (and `wss` becomes `https`). Returns `None` for other schemes.
pub fn announce_url_for(endpoint: &str) -> Option<String> {
    let (scheme, rest) = endpoint.split_once("://")?;
    let http_scheme = match scheme {
        "ws" => "http",
        "wss" => "https",
        _ => return None,
    };
    let authority = rest.split(['/', '?', '#']).next().filter(|a| !a.is_empty())?;
    Some(format!("{http_scheme}://{authority}{TRANSFER_PATH}"))
}
