use crate::types::{MessageId, Submission, UserId};
use async_trait::async_trait;

/// Community-membership and capability checks, answered by the chat
/// platform.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Whether the user is currently a recognized member of the community.
    async fn is_member(&self, user: &UserId) -> bool;

    /// Whether the user holds the administrative capability. Incomplete
    /// submissions from administrators are ignored rather than rejected.
    async fn is_admin(&self, user: &UserId) -> bool;
}

/// Side-effect surface of the chat platform.
///
/// All methods are best effort; the engine never fails an event because a
/// gateway side effect did not land.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Full ordered submission history of the profile channel, oldest
    /// first. Used by the full reload.
    async fn submission_history(&self) -> Vec<Submission>;

    /// Delete a submission from the channel.
    async fn delete_submission(&self, message: &MessageId);

    /// Send a direct message to a submitter.
    async fn notify_author(&self, user: &UserId, text: &str);

    /// Surface a message to the operator channel.
    async fn alert_operator(&self, text: &str);
}
