//! Shared in-memory collaborator doubles for engine tests.

use crate::config::EngineConfig;
use crate::reconcile::ReconciliationEngine;
use crate::stores::ProfileStores;
use crate::traits::{ChatGateway, MemberDirectory};
use crate::types::{MessageId, Submission, UserId};
use crate::whitelist::{PublishError, WhitelistEntry, WhitelistPublisher};
use async_trait::async_trait;
use chrono::DateTime;
use roster_profile::{IdentityResolver, Resolution, ResolverError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub fn steve_uuid() -> String {
    Uuid::from_u128(0x1111).simple().to_string()
}

pub fn alex_uuid() -> String {
    Uuid::from_u128(0x2222).simple().to_string()
}

pub fn submission(message: &str, author: &str, content: &str, ts: i64) -> Submission {
    Submission {
        message: MessageId::new(message),
        author: UserId::new(author),
        author_name: format!("{author}-name"),
        content: content.to_string(),
        created_at: DateTime::from_timestamp(ts, 0).expect("test timestamp"),
    }
}

/// Resolver with a fixed handle table: Steve and Alex resolve, everything
/// else is invalid.
pub struct FixedResolver {
    handles: HashMap<String, Resolution>,
}

impl Default for FixedResolver {
    fn default() -> Self {
        let mut handles = HashMap::new();
        handles.insert(
            "steve".to_string(),
            Resolution::valid(Uuid::from_u128(0x1111), "Steve"),
        );
        handles.insert(
            "alex".to_string(),
            Resolution::valid(Uuid::from_u128(0x2222), "Alex"),
        );
        Self { handles }
    }
}

#[async_trait]
impl IdentityResolver for FixedResolver {
    async fn resolve(&self, handle: &str) -> Result<Resolution, ResolverError> {
        Ok(self
            .handles
            .get(&handle.to_lowercase())
            .cloned()
            .unwrap_or_else(Resolution::invalid))
    }
}

#[derive(Default)]
struct DirectoryInner {
    members: RwLock<HashSet<String>>,
    admins: RwLock<HashSet<String>>,
    member_lookups: AtomicUsize,
}

/// Mutable membership directory double; clones share state.
#[derive(Clone, Default)]
pub struct TestDirectory(Arc<DirectoryInner>);

impl TestDirectory {
    pub fn with_members(members: &[&str]) -> Self {
        let directory = Self::default();
        {
            let mut set = directory.0.members.write().unwrap();
            set.extend(members.iter().map(|m| m.to_string()));
        }
        directory
    }

    pub fn with_admins(self, admins: &[&str]) -> Self {
        {
            let mut set = self.0.admins.write().unwrap();
            set.extend(admins.iter().map(|a| a.to_string()));
        }
        self
    }

    pub fn remove_member(&self, user: &str) {
        self.0.members.write().unwrap().remove(user);
    }

    pub fn member_lookups(&self) -> usize {
        self.0.member_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemberDirectory for TestDirectory {
    async fn is_member(&self, user: &UserId) -> bool {
        self.0.member_lookups.fetch_add(1, Ordering::SeqCst);
        self.0.members.read().unwrap().contains(user.as_str())
    }

    async fn is_admin(&self, user: &UserId) -> bool {
        self.0.admins.read().unwrap().contains(user.as_str())
    }
}

#[derive(Default)]
struct GatewayInner {
    history: RwLock<Vec<Submission>>,
    deleted: RwLock<Vec<String>>,
    notices: RwLock<Vec<(String, String)>>,
    alerts: RwLock<Vec<String>>,
}

/// Recording chat gateway double; clones share state.
#[derive(Clone, Default)]
pub struct TestGateway(Arc<GatewayInner>);

impl TestGateway {
    pub fn push_history(&self, submission: Submission) {
        self.0.history.write().unwrap().push(submission);
    }

    pub fn deleted(&self) -> Vec<String> {
        self.0.deleted.read().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(String, String)> {
        self.0.notices.read().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.0.alerts.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for TestGateway {
    async fn submission_history(&self) -> Vec<Submission> {
        self.0.history.read().unwrap().clone()
    }

    async fn delete_submission(&self, message: &MessageId) {
        self.0.deleted.write().unwrap().push(message.0.clone());
    }

    async fn notify_author(&self, user: &UserId, text: &str) {
        self.0
            .notices
            .write()
            .unwrap()
            .push((user.0.clone(), text.to_string()));
    }

    async fn alert_operator(&self, text: &str) {
        self.0.alerts.write().unwrap().push(text.to_string());
    }
}

pub struct DropPublisher;

#[async_trait]
impl WhitelistPublisher for DropPublisher {
    async fn publish(&self, _entries: &[WhitelistEntry]) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Engine over path-less stores with the fixed resolver and the given
/// collaborator doubles.
pub fn engine_with(
    config: EngineConfig,
    directory: &TestDirectory,
    gateway: &TestGateway,
) -> ReconciliationEngine {
    let stores = ProfileStores::new(None, None, &config.rank_tables);
    ReconciliationEngine::new(
        stores,
        config,
        Arc::new(FixedResolver::default()),
        Arc::new(directory.clone()),
        Arc::new(gateway.clone()),
        Arc::new(DropPublisher),
    )
}
