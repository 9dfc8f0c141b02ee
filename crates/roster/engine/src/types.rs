use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat-platform identity of a submitter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat-platform identity of a submission message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One chat message interpreted as a profile candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub message: MessageId,
    pub author: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Events the reconciliation engine consumes.
#[derive(Clone, Debug)]
pub enum SubmissionEvent {
    /// A submission was posted.
    New(Submission),
    /// An existing submission was edited; carries the new content.
    Edited(Submission),
    /// A submission was deleted.
    Deleted(MessageId),
    /// A submitter left the community.
    AuthorLeft(UserId),
}
