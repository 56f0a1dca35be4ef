//! In-memory tenant store with alias indexing.

use async_trait::async_trait;
use dashmap::DashMap;
use satellite_core::{DomainRecord, StoreError};
use tracing::warn;

use crate::traits::TenantStore;

/// [`TenantStore`] keyed by canonical host name, with an alias index.
///
/// Host names are compared case-insensitively. An alias that collides with
/// another tenant's canonical name is ignored on lookup: canonical names win.
/// Claiming an alias already owned by another tenant moves it, and the
/// previous owner's stored record no longer lists it.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    records: DashMap<String, DomainRecord>,
    aliases: DashMap<String, String>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn get(&self, host: &str) -> Result<Option<DomainRecord>, StoreError> {
        let host = host.to_ascii_lowercase();
        if let Some(record) = self.records.get(&host) {
            return Ok(Some(record.value().clone()));
        }
        let canonical = self.aliases.get(&host).map(|entry| entry.value().clone());
        Ok(canonical.and_then(|name| self.records.get(&name).map(|r| r.value().clone())))
    }

    async fn put(&self, mut record: DomainRecord) -> Result<(), StoreError> {
        record.name = record.name.to_ascii_lowercase();
        for alias in &mut record.aliases {
            *alias = alias.to_ascii_lowercase();
        }

        if let Some(previous) = self.records.get(&record.name).map(|r| r.value().clone()) {
            for alias in &previous.aliases {
                self.aliases.remove_if(alias, |_, owner| owner == &record.name);
            }
        }

        for alias in &record.aliases {
            if let Some(owner) = self.aliases.get(alias).map(|e| e.value().clone()) {
                if owner != record.name {
                    warn!(alias = %alias, previous = %owner, next = %record.name, "alias reassigned");
                    if let Some(mut previous) = self.records.get_mut(&owner) {
                        previous.aliases.retain(|a| a != alias);
                    }
                }
            }
            self.aliases.insert(alias.clone(), record.name.clone());
        }

        self.records.insert(record.name.clone(), record);
        Ok(())
    }
}
