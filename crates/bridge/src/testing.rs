#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use {
    async_trait::async_trait,
    corelink_connection::{ConnectionState, Upstream},
    corelink_platform::{Error, MessageRecord, PlatformActions, Result, Segment},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Private(String, Vec<Segment>),
    Group(String, Vec<Segment>),
}

/// `PlatformActions` double that records sends and lookups.
#[derive(Default)]
pub struct RecordingActions {
    calls: Mutex<Vec<Call>>,
    lookups: Mutex<Vec<String>>,
    quoted: Mutex<Option<MessageRecord>>,
    fail_sends: Mutex<bool>,
}

impl RecordingActions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_quoted(&self, record: MessageRecord) {
        *self.quoted.lock().unwrap() = Some(record);
    }

    pub fn fail_sends(&self) {
        *self.fail_sends.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if *self.fail_sends.lock().unwrap() {
            return Err(Error::unavailable("platform offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformActions for RecordingActions {
    async fn get_message(&self, message_id: &str) -> Result<MessageRecord> {
        self.lookups.lock().unwrap().push(message_id.to_string());
        self.quoted
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::rejected("get_msg", "message not found"))
    }

    async fn send_private_message(&self, user_id: &str, message: Vec<Segment>) -> Result<()> {
        self.record(Call::Private(user_id.to_string(), message))
    }

    async fn send_group_message(&self, group_id: &str, message: Vec<Segment>) -> Result<()> {
        self.record(Call::Group(group_id.to_string(), message))
    }
}

/// `Upstream` double with a settable state that records written frames.
pub struct RecordingUpstream {
    state: Mutex<ConnectionState>,
    frames: Mutex<Vec<Vec<u8>>>,
}

impl RecordingUpstream {
    fn with_state(state: ConnectionState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            frames: Mutex::new(Vec::new()),
        })
    }

    pub fn connected() -> Arc<Self> {
        Self::with_state(ConnectionState::Connected)
    }

    pub fn disconnected() -> Arc<Self> {
        Self::with_state(ConnectionState::Disconnected)
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }
}

impl Upstream for RecordingUpstream {
    fn send(&self, frame: Vec<u8>) {
        self.frames.lock().unwrap().push(frame);
    }

    fn status(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }
}
