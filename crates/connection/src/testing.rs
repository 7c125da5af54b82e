#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Mutex;

use {tokio::sync::mpsc, tokio_util::sync::CancellationToken, url::Url};

use crate::transport::{Transport, TransportEvent, TransportLink};

struct MockLink {
    url: Url,
    events: mpsc::UnboundedSender<TransportEvent>,
    outgoing: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    cancel: CancellationToken,
}

/// Transport double: records every open and lets tests inject events on
/// any link by index.
#[derive(Default)]
pub(crate) struct MockTransport {
    links: Mutex<Vec<MockLink>>,
}

impl MockTransport {
    pub fn opens(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn url(&self, index: usize) -> Url {
        self.links.lock().unwrap()[index].url.clone()
    }

    pub fn emit(&self, index: usize, event: TransportEvent) {
        let _ = self.links.lock().unwrap()[index].events.send(event);
    }

    pub fn take_outgoing(&self, index: usize) -> mpsc::UnboundedReceiver<Vec<u8>> {
        self.links.lock().unwrap()[index]
            .outgoing
            .take()
            .expect("outgoing already taken")
    }

    pub fn cancelled(&self, index: usize) -> bool {
        self.links.lock().unwrap()[index].cancel.is_cancelled()
    }
}

impl Transport for MockTransport {
    fn open(&self, url: &Url) -> TransportLink {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        self.links.lock().unwrap().push(MockLink {
            url: url.clone(),
            events: events_tx,
            outgoing: Some(outgoing_rx),
            cancel: cancel.clone(),
        });
        TransportLink {
            outgoing,
            events,
            cancel,
        }
    }
}
