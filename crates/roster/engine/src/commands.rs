//! Control commands consumed by the external command dispatcher.
//!
//! Every command returns a human-readable text result and never lets an
//! error escape the engine boundary; failures are rendered into the reply.

use crate::reconcile::ReconciliationEngine;
use crate::stores::{fields, tables};
use roster_profile::is_valid_uuid;
use roster_store::TableStore;

impl ReconciliationEngine {
    /// Render a table's contents: `show <store> <table>`.
    pub fn cmd_show_table(&self, store: &str, table: &str) -> String {
        let store = match self.store_by_name(store) {
            Some(store) => store,
            None => return format!("no such store \"{store}\""),
        };
        let table = match store.table(table) {
            Ok(table) => table,
            Err(err) => return err.to_string(),
        };
        if table.is_empty() {
            return format!("table \"{}\" is empty", table.name());
        }
        let mut lines = vec![format!("table \"{}\" ({} records):", table.name(), table.len())];
        for record in table.iter() {
            let columns: Vec<String> = record
                .fields()
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            lines.push(format!("{}. {}", record.id, columns.join(", ")));
        }
        lines.join("\n")
    }

    /// Pin an allow-list entry independent of any submission:
    /// `pin <ign>`.
    pub async fn cmd_pin_add(&mut self, handle: &str) -> String {
        self.add_by_handle("persist", tables::ROOT, handle).await
    }

    /// Unpin an allow-list entry: `unpin <ign-or-uuid>`.
    pub async fn cmd_pin_remove(&mut self, target: &str) -> String {
        self.remove_by_handle("persist", tables::ROOT, target).await
    }

    /// Render a rank table: `rank <table>`.
    pub fn cmd_rank_show(&self, rank: &str) -> String {
        self.cmd_show_table("ranks", rank)
    }

    /// Add a player to a rank table: `rank add <table> <ign>`.
    pub async fn cmd_rank_add(&mut self, rank: &str, handle: &str) -> String {
        self.add_by_handle("ranks", rank, handle).await
    }

    /// Remove a player from a rank table: `rank remove <table> <ign-or-uuid>`.
    pub async fn cmd_rank_remove(&mut self, rank: &str, target: &str) -> String {
        self.remove_by_handle("ranks", rank, target).await
    }

    /// Re-derive all dynamic state from the submission history.
    pub async fn cmd_reload(&mut self) -> String {
        match self.reload().await {
            Ok(()) => "reload complete".to_string(),
            Err(err) => format!("reload failed: {err}"),
        }
    }

    /// Force a whitelist projection, save and publish.
    pub async fn cmd_sync(&mut self) -> String {
        match self.sync().await {
            Ok(()) => "whitelist synced".to_string(),
            Err(err) => format!("sync failed: {err}"),
        }
    }

    fn store_by_name(&self, name: &str) -> Option<&TableStore> {
        match name {
            "dynamic" => Some(&self.stores().dynamic),
            "persist" => Some(&self.stores().persist),
            "ranks" => Some(&self.stores().ranks),
            _ => None,
        }
    }

    async fn add_by_handle(&mut self, store: &'static str, table: &str, handle: &str) -> String {
        let resolution = match self.resolver().resolve(handle).await {
            Ok(resolution) => resolution,
            Err(err) => return format!("identity lookup failed: {err}"),
        };
        let (uuid, name) = match (resolution.uuid, resolution.name) {
            (Some(uuid), Some(name)) if resolution.valid => (uuid.simple().to_string(), name),
            _ => return format!("unknown ign \"{handle}\""),
        };

        let stores = self.stores_mut();
        let target = if store == "persist" {
            &mut stores.persist
        } else {
            &mut stores.ranks
        };
        let result = target.table_mut(table).and_then(|table| {
            if !table.index_lookup(fields::UUID, &uuid)?.is_empty() {
                return Ok(None);
            }
            let row = [
                (fields::UUID.to_string(), uuid.clone()),
                (fields::NAME.to_string(), name.clone()),
            ]
            .into_iter()
            .collect();
            Ok(Some(table.add(row)))
        });
        match result {
            Ok(Some(_)) => match self.sync().await {
                Ok(()) => format!("added {name} ({uuid}) to \"{table}\""),
                Err(err) => format!("added {name} but sync failed: {err}"),
            },
            Ok(None) => format!("{name} is already in \"{table}\""),
            Err(err) => err.to_string(),
        }
    }

    async fn remove_by_handle(&mut self, store: &'static str, table: &str, target: &str) -> String {
        // Accept either a raw canonical identifier or a handle to resolve.
        let uuid = if is_valid_uuid(target) {
            target.to_lowercase()
        } else {
            match self.resolver().resolve(target).await {
                Ok(resolution) if resolution.valid => match resolution.uuid {
                    Some(uuid) => uuid.simple().to_string(),
                    None => return format!("unknown ign \"{target}\""),
                },
                Ok(_) => return format!("unknown ign \"{target}\""),
                Err(err) => return format!("identity lookup failed: {err}"),
            }
        };

        let stores = self.stores_mut();
        let source = if store == "persist" {
            &mut stores.persist
        } else {
            &mut stores.ranks
        };
        let result = source.table_mut(table).and_then(|table| {
            let keys = table.index_lookup_keys(fields::UUID, &uuid)?;
            match keys.first().copied() {
                Some(key) => table.remove(key).map(Some),
                None => Ok(None),
            }
        });
        match result {
            Ok(Some(record)) => {
                let name = record.get_or_empty(fields::NAME).to_string();
                match self.sync().await {
                    Ok(()) => format!("removed {name} ({uuid}) from \"{table}\""),
                    Err(err) => format!("removed {name} but sync failed: {err}"),
                }
            }
            Ok(None) => format!("no entry for {uuid} in \"{table}\""),
            Err(err) => err.to_string(),
        }
    }
}
