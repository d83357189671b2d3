//! Request-scoped forwarded-port context.
//!
//! # Responsibilities
//! - Store validated header-key → port entries for one logical request
//! - Provide snapshots for iteration and header re-emission
//! - Guarantee the entries are cleared when the request scope ends
//!
//! # Design Decisions
//! - Passed explicitly (request extensions, function arguments); no
//!   thread-bound or global storage
//! - A fresh context is created per request by [`ContextScope`]; handles are
//!   never shared with another request
//! - Keys are HTTP header names and are normalized to lowercase
//! - Snapshots are copies, safe to iterate while the context is mutated

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

/// Key → port store for one logical request.
///
/// Cloning yields another handle to the same request's entries; it does not
/// copy them.
#[derive(Debug, Clone, Default)]
pub struct RequestScopeContext {
    entries: Arc<DashMap<String, u16>>,
}

impl RequestScopeContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `port` under `key`.
    ///
    /// An empty or whitespace-only key is ignored and `false` is returned.
    pub fn set_attribute(&self, key: &str, port: u16) -> bool {
        let key = key.trim();
        if key.is_empty() {
            tracing::debug!(port, "Ignoring forwarded port with empty key");
            return false;
        }
        self.entries.insert(key.to_ascii_lowercase(), port);
        true
    }

    pub fn get_attribute(&self, key: &str) -> Option<u16> {
        self.entries
            .get(&key.trim().to_ascii_lowercase())
            .map(|entry| *entry.value())
    }

    /// Copy of all entries, ordered by key.
    pub fn get_attributes(&self) -> BTreeMap<String, u16> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Copy of all entries except `exclude_key`.
    pub fn get_attributes_excluding(&self, exclude_key: &str) -> BTreeMap<String, u16> {
        let exclude_key = exclude_key.trim().to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|entry| *entry.key() != exclude_key)
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn remove_attribute(&self, key: &str) -> Option<u16> {
        self.entries
            .remove(&key.trim().to_ascii_lowercase())
            .map(|(_, port)| port)
    }

    /// Remove every entry. Idempotent.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Owner of one request's context; clears it when dropped.
///
/// Dropping happens on normal completion, on error and when the request
/// future is cancelled, so no entry outlives its request.
#[derive(Debug, Default)]
pub struct ContextScope {
    context: RequestScopeContext,
}

impl ContextScope {
    /// Open a scope with a fresh, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to this scope's context.
    pub fn context(&self) -> RequestScopeContext {
        self.context.clone()
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.clear();
    }
}
