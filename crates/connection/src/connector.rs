//! [`ChannelConnector`] backed by WebSocket and HTTP.

use waltz_protocol::SelectionItem;
use waltz_transfer::{BoxFuture, ChannelConnector, ChannelError, OpenChannel};

use crate::announce::SelectionAnnouncer;
use crate::ws_channel::{ConnectionError, WsChannel};

/// Opens [`WsChannel`]s and announces selections over HTTP.
#[derive(Debug, Clone)]
pub struct WsConnector {
    announcer: SelectionAnnouncer,
}

impl WsConnector {
    pub fn new() -> Result<Self, ConnectionError> {
        Ok(Self {
            announcer: SelectionAnnouncer::new()?,
        })
    }
}

impl ChannelConnector for WsConnector {
    fn open<'a>(&'a self, endpoint: &'a str) -> BoxFuture<'a, Result<OpenChannel, ChannelError>> {
        Box::pin(async move {
            let (channel, events) = WsChannel::connect(endpoint).await?;
            Ok(OpenChannel {
                link: Box::new(channel),
                events,
            })
        })
    }

    fn announce<'a>(
        &'a self,
        url: &'a str,
        items: &'a [SelectionItem],
    ) -> BoxFuture<'a, Result<(), ChannelError>> {
        Box::pin(async move { Ok(self.announcer.announce(url, items).await?) })
    }
}
