use async_trait::async_trait;

use crate::{MessageRecord, Result, Segment};

/// Calls the bridge makes into the chat platform.
///
/// Identifiers are passed as strings; implementations convert them to
/// whatever the platform expects.
#[async_trait]
pub trait PlatformActions: Send + Sync {
    /// Fetch a stored message, used to resolve quoted replies.
    async fn get_message(&self, message_id: &str) -> Result<MessageRecord>;

    /// Send a private (direct) message.
    async fn send_private_message(&self, user_id: &str, message: Vec<Segment>) -> Result<()>;

    /// Send a message to a group.
    async fn send_group_message(&self, group_id: &str, message: Vec<Segment>) -> Result<()>;
}
