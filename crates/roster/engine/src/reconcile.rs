use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::stores::{fields, tables, ProfileStores};
use crate::traits::{ChatGateway, MemberDirectory};
use crate::types::{MessageId, Submission, SubmissionEvent, UserId};
use crate::whitelist::{self, WhitelistPublisher};
use chrono::Utc;
use roster_profile::{Candidate, IdentityResolver, ProfileSchema};
use roster_store::{Fields, RecordKey};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Terminal state of one submission's reconciliation pass.
///
/// These are normal return values, not errors; rejection and duplicate
/// conflicts are expected outcomes of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Stored as a valid profile.
    Accepted,
    /// Stored as a deprecated profile (submitter is not a member).
    Deprecated,
    /// Replaced a prior profile from the same submitter.
    Updated,
    /// Stored as invalid, with the human-readable reason.
    Rejected(String),
    /// Conflicting duplicate of another submitter's profile.
    Duplicate,
    /// Incomplete submission from an administrator, ignored entirely.
    Ignored,
    /// A record removal event was handled.
    Removed,
    /// A consistency fault forced a full history reload.
    Reloaded,
}

struct FoundProfile {
    table: &'static str,
    key: RecordKey,
    author: String,
}

/// The profile reconciliation engine.
///
/// Exclusively owns the [`ProfileStores`]; every mutating event ends with a
/// whitelist sync (projection, durable save, opaque publish). Processing is
/// single-threaded per event; the full reload additionally holds a scoped
/// guard so concurrently arriving events cannot interleave with the replay.
pub struct ReconciliationEngine {
    stores: ProfileStores,
    config: EngineConfig,
    schema: ProfileSchema,
    resolver: Arc<dyn IdentityResolver>,
    directory: Arc<dyn MemberDirectory>,
    gateway: Arc<dyn ChatGateway>,
    publisher: Arc<dyn WhitelistPublisher>,
    reload_guard: Arc<Mutex<()>>,
}

impl ReconciliationEngine {
    pub fn new(
        stores: ProfileStores,
        config: EngineConfig,
        resolver: Arc<dyn IdentityResolver>,
        directory: Arc<dyn MemberDirectory>,
        gateway: Arc<dyn ChatGateway>,
        publisher: Arc<dyn WhitelistPublisher>,
    ) -> Self {
        let schema = ProfileSchema {
            required: config.required_fields.clone(),
            filter: config.filter_fields.clone(),
        };
        Self {
            stores,
            config,
            schema,
            resolver,
            directory,
            gateway,
            publisher,
            reload_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn stores(&self) -> &ProfileStores {
        &self.stores
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load persistent stores and derive all dynamic state from the
    /// complete submission history.
    pub async fn init(&mut self) -> EngineResult<()> {
        self.stores.load()?;
        self.reload().await
    }

    /// Event-processing boundary: classify, log, and surface failures to
    /// the operator channel. Errors never propagate past here and never
    /// terminate the engine.
    pub async fn process(&mut self, event: SubmissionEvent) {
        let result = match event {
            SubmissionEvent::New(submission) => self.on_new(submission).await,
            SubmissionEvent::Edited(submission) => self.on_edited(submission).await,
            SubmissionEvent::Deleted(message) => self.on_deleted(message).await,
            SubmissionEvent::AuthorLeft(user) => self.on_author_left(user).await,
        };
        match result {
            Ok(disposition) => {
                tracing::debug!(?disposition, "submission event processed");
            }
            Err(err) => {
                tracing::error!(error = %err, "reconciliation event failed");
                self.gateway
                    .alert_operator(&format!("reconciliation failure: {err}"))
                    .await;
            }
        }
    }

    /// A submission was posted.
    pub async fn on_new(&mut self, submission: Submission) -> EngineResult<Disposition> {
        let admin = self.directory.is_admin(&submission.author).await;
        let member = self.directory.is_member(&submission.author).await;
        let disposition = self.ingest(submission, admin, member).await?;
        self.sync().await?;
        Ok(disposition)
    }

    /// An existing submission was edited: remove the prior record for that
    /// submission identity, then reclassify the new content. An edit with
    /// no prior record is a consistency fault and forces a full reload.
    pub async fn on_edited(&mut self, submission: Submission) -> EngineResult<Disposition> {
        if self.remove_by_message(&submission.message)?.is_none() {
            tracing::warn!(
                message = %submission.message,
                "edited submission has no prior record, re-deriving all state"
            );
            self.reload().await?;
            return Ok(Disposition::Reloaded);
        }
        self.on_new(submission).await
    }

    /// A submission was deleted: drop its record, no reclassification.
    pub async fn on_deleted(&mut self, message: MessageId) -> EngineResult<Disposition> {
        if self.remove_by_message(&message)?.is_none() {
            tracing::debug!(%message, "deleted submission had no record");
        }
        self.sync().await?;
        Ok(Disposition::Removed)
    }

    /// A submitter left the community: remove every record they own, then
    /// re-run the complete ones through the deprecated path when retention
    /// is configured.
    pub async fn on_author_left(&mut self, user: UserId) -> EngineResult<Disposition> {
        self.remove_all_by(tables::INVALID, fields::AUTHOR, user.as_str())?;
        let mut owned = self.remove_all_by(tables::VALID, fields::AUTHOR, user.as_str())?;
        owned.extend(self.remove_all_by(tables::DEPRECATED, fields::AUTHOR, user.as_str())?);
        if self.config.retain_departed {
            for profile in owned {
                self.readmit_departed(&user, profile).await?;
            }
        }
        self.sync().await?;
        Ok(Disposition::Removed)
    }

    /// Clear the dynamic tables and replay the entire ordered submission
    /// history, oldest first, with membership resolved once per distinct
    /// submitter. Holds the reload guard for the whole replay.
    pub async fn reload(&mut self) -> EngineResult<()> {
        let guard = Arc::clone(&self.reload_guard);
        let _guard = guard.lock().await;

        let mut history = self.gateway.submission_history().await;
        history.sort_by_key(|submission| submission.created_at);
        self.stores.dynamic.clear();

        let mut members: HashMap<UserId, bool> = HashMap::new();
        let mut admins: HashMap<UserId, bool> = HashMap::new();
        let total = history.len();
        for submission in history {
            let author = submission.author.clone();
            let member = match members.get(&author) {
                Some(member) => *member,
                None => {
                    let member = self.directory.is_member(&author).await;
                    members.insert(author.clone(), member);
                    member
                }
            };
            let admin = match admins.get(&author) {
                Some(admin) => *admin,
                None => {
                    let admin = self.directory.is_admin(&author).await;
                    admins.insert(author, admin);
                    admin
                }
            };
            if let Err(err) = self.ingest(submission, admin, member).await {
                match err {
                    EngineError::Fault(reason) => {
                        // Abort this one submission only; committed state
                        // from earlier submissions stays intact.
                        tracing::error!(%reason, "reconciliation fault during reload");
                        self.gateway
                            .alert_operator(&format!("reconciliation fault during reload: {reason}"))
                            .await;
                    }
                    other => return Err(other),
                }
            }
        }
        self.sync().await?;
        tracing::info!(
            submissions = total,
            valid = self.stores.dynamic.table(tables::VALID)?.len(),
            invalid = self.stores.dynamic.table(tables::INVALID)?.len(),
            deprecated = self.stores.dynamic.table(tables::DEPRECATED)?.len(),
            "profile reload complete"
        );
        Ok(())
    }

    /// Project the whitelist, write it to durable storage, save the
    /// persistent stores, and hand the document to the publisher.
    pub async fn sync(&mut self) -> EngineResult<()> {
        let entries = whitelist::project(&self.stores, &self.config)?;
        if let Some(path) = &self.config.whitelist_path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let payload = serde_json::to_vec_pretty(&entries)?;
            let tmp = path.with_extension("tmp");
            std::fs::write(&tmp, payload)?;
            std::fs::rename(&tmp, path)?;
        }
        self.stores.save()?;
        if let Err(err) = self.publisher.publish(&entries).await {
            // Delivery is best effort; the authoritative copy is ours.
            tracing::warn!(error = %err, "whitelist publish failed");
        }
        Ok(())
    }

    /// Steps 1-3 of the state machine, without the trailing sync.
    async fn ingest(
        &mut self,
        submission: Submission,
        admin: bool,
        member: bool,
    ) -> EngineResult<Disposition> {
        let candidate = self.parse_and_resolve(&submission.content).await;
        if !candidate.is_complete() {
            if admin {
                tracing::debug!(
                    message = %submission.message,
                    "ignoring incomplete submission from administrator"
                );
                return Ok(Disposition::Ignored);
            }
            let reason = if !candidate.missing.is_empty() {
                format!("missing fields: {}", candidate.missing.join(", "))
            } else {
                "invalid ign".to_string()
            };
            self.store_invalid(&submission, candidate.fields, &reason)?;
            self.gateway
                .notify_author(
                    &submission.author,
                    &format!("your profile was not accepted: {reason}"),
                )
                .await;
            return Ok(Disposition::Rejected(reason));
        }

        let resolution = candidate
            .resolution
            .clone()
            .ok_or_else(|| EngineError::Fault("complete candidate without identity resolution".to_string()))?;
        let (uuid, name) = match (resolution.uuid, resolution.name) {
            (Some(uuid), Some(name)) if resolution.valid => (uuid.simple().to_string(), name),
            _ => {
                return Err(EngineError::Fault(
                    "complete candidate with invalid identity".to_string(),
                ))
            }
        };
        self.classify_complete(submission, candidate.fields, uuid, name, member)
            .await
    }

    /// Step 2/3: duplicate and update resolution for a complete candidate.
    async fn classify_complete(
        &mut self,
        submission: Submission,
        profile_fields: Fields,
        uuid: String,
        name: String,
        member: bool,
    ) -> EngineResult<Disposition> {
        let target = if member {
            tables::VALID
        } else {
            tables::DEPRECATED
        };
        let searched: &[&'static str] = if member {
            if self.config.update_deprecated {
                &[tables::VALID, tables::DEPRECATED]
            } else {
                &[tables::VALID]
            }
        } else {
            &[tables::DEPRECATED, tables::VALID]
        };

        if let Some(found) = self.find_profile(searched, &uuid)? {
            if found.author == submission.author.as_str() {
                return self
                    .apply_update(found, submission, profile_fields, uuid, name, target)
                    .await;
            }
            return self
                .handle_duplicate(submission, profile_fields, &name)
                .await;
        }

        self.insert_profile(target, &submission, profile_fields, &uuid, &name)?;
        Ok(if member {
            Disposition::Accepted
        } else {
            Disposition::Deprecated
        })
    }

    /// Same submitter already owns this identity: replace the old profile.
    async fn apply_update(
        &mut self,
        found: FoundProfile,
        submission: Submission,
        profile_fields: Fields,
        uuid: String,
        name: String,
        target: &'static str,
    ) -> EngineResult<Disposition> {
        let old = self.stores.dynamic.table_mut(found.table)?.remove(found.key)?;
        let old_message = old.get_or_empty(fields::MESSAGE).to_string();
        // An edit of the same submission replaces in place; a fresh post
        // supersedes the old one.
        if old_message != submission.message.as_str() {
            if self.config.delete_superseded {
                self.gateway
                    .delete_submission(&MessageId::new(old_message))
                    .await;
            } else {
                let mut retained = old.into_fields();
                retained.insert(fields::ERROR.to_string(), "old profile".to_string());
                self.stores.dynamic.table_mut(tables::INVALID)?.add(retained);
            }
        }
        self.insert_profile(target, &submission, profile_fields, &uuid, &name)?;
        tracing::info!(%uuid, author = %submission.author, "profile updated");
        Ok(Disposition::Updated)
    }

    /// A different submitter already owns this identity.
    async fn handle_duplicate(
        &mut self,
        submission: Submission,
        profile_fields: Fields,
        name: &str,
    ) -> EngineResult<Disposition> {
        tracing::info!(author = %submission.author, ign = %name, "duplicate profile submission");
        if self.config.delete_duplicates {
            self.gateway.delete_submission(&submission.message).await;
        } else {
            self.store_invalid(&submission, profile_fields, "duplicate ign")?;
        }
        if self.config.notify_duplicates {
            self.gateway
                .notify_author(
                    &submission.author,
                    &format!("the ign \"{name}\" is already registered by another member"),
                )
                .await;
        }
        Ok(Disposition::Duplicate)
    }

    /// Re-run a departed submitter's profile through the deprecated path,
    /// reusing the stored resolution instead of re-querying the resolver.
    async fn readmit_departed(&mut self, user: &UserId, mut profile: Fields) -> EngineResult<()> {
        let uuid = profile.remove(fields::UUID).unwrap_or_default();
        let name = profile.remove(fields::NAME).unwrap_or_default();
        if uuid.is_empty() || name.is_empty() {
            return Err(EngineError::Fault(
                "departed profile record without identity".to_string(),
            ));
        }
        let submission = Submission {
            message: MessageId::new(profile.remove(fields::MESSAGE).unwrap_or_default()),
            author: user.clone(),
            author_name: profile.remove(fields::AUTHOR_NAME).unwrap_or_default(),
            content: String::new(),
            created_at: Utc::now(),
        };
        profile.remove(fields::AUTHOR);
        self.classify_complete(submission, profile, uuid, name, false)
            .await?;
        Ok(())
    }

    async fn parse_and_resolve(&self, content: &str) -> Candidate {
        let mut candidate = self.schema.parse(content);
        if let Some(ign) = candidate.ign() {
            let resolution = match self.resolver.resolve(ign).await {
                Ok(resolution) => resolution,
                Err(err) => {
                    // Treated as identity-invalid, never retried here.
                    tracing::warn!(ign, error = %err, "identity resolution failed");
                    roster_profile::Resolution::invalid()
                }
            };
            candidate.resolution = Some(resolution);
        }
        candidate
    }

    fn find_profile(
        &self,
        searched: &[&'static str],
        uuid: &str,
    ) -> EngineResult<Option<FoundProfile>> {
        for &table in searched {
            let hits = self
                .stores
                .dynamic
                .table(table)?
                .index_lookup(fields::UUID, uuid)?;
            if let Some(record) = hits.first() {
                return Ok(Some(FoundProfile {
                    table,
                    key: record.key(),
                    author: record.get_or_empty(fields::AUTHOR).to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn insert_profile(
        &mut self,
        table: &str,
        submission: &Submission,
        mut profile_fields: Fields,
        uuid: &str,
        name: &str,
    ) -> EngineResult<()> {
        profile_fields.insert(fields::UUID.to_string(), uuid.to_string());
        profile_fields.insert(fields::NAME.to_string(), name.to_string());
        self.attach_origin(&mut profile_fields, submission);
        self.stores.dynamic.table_mut(table)?.add(profile_fields);
        Ok(())
    }

    fn store_invalid(
        &mut self,
        submission: &Submission,
        mut profile_fields: Fields,
        reason: &str,
    ) -> EngineResult<()> {
        profile_fields.insert(fields::ERROR.to_string(), reason.to_string());
        self.attach_origin(&mut profile_fields, submission);
        self.stores
            .dynamic
            .table_mut(tables::INVALID)?
            .add(profile_fields);
        Ok(())
    }

    fn attach_origin(&self, profile_fields: &mut Fields, submission: &Submission) {
        profile_fields.insert(fields::MESSAGE.to_string(), submission.message.0.clone());
        profile_fields.insert(fields::AUTHOR.to_string(), submission.author.0.clone());
        profile_fields.insert(
            fields::AUTHOR_NAME.to_string(),
            submission.author_name.clone(),
        );
    }

    /// Remove the record associated with a submission identity, whichever
    /// category it currently sits in.
    fn remove_by_message(&mut self, message: &MessageId) -> EngineResult<Option<Fields>> {
        for table in [tables::VALID, tables::INVALID, tables::DEPRECATED] {
            let keys = self
                .stores
                .dynamic
                .table(table)?
                .index_lookup_keys(fields::MESSAGE, message.as_str())?;
            if let Some(key) = keys.first().copied() {
                let record = self.stores.dynamic.table_mut(table)?.remove(key)?;
                return Ok(Some(record.into_fields()));
            }
        }
        Ok(None)
    }

    /// Remove every record matching an indexed value, re-querying between
    /// removals because each removal renumbers trailing records.
    pub(crate) fn remove_all_by(
        &mut self,
        table: &'static str,
        column: &'static str,
        value: &str,
    ) -> EngineResult<Vec<Fields>> {
        let mut removed = Vec::new();
        loop {
            let keys = self
                .stores
                .dynamic
                .table(table)?
                .index_lookup_keys(column, value)?;
            let Some(key) = keys.first().copied() else {
                break;
            };
            removed.push(
                self.stores
                    .dynamic
                    .table_mut(table)?
                    .remove(key)?
                    .into_fields(),
            );
        }
        Ok(removed)
    }

    pub(crate) fn stores_mut(&mut self) -> &mut ProfileStores {
        &mut self.stores
    }

    pub(crate) fn resolver(&self) -> Arc<dyn IdentityResolver> {
        Arc::clone(&self.resolver)
    }
}
