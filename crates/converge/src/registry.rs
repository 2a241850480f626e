//! The dialect registry.
//!
//! An explicit, caller-owned mapping from dialect names to dialect objects.
//! Nothing here is global: applications build a registry (usually
//! [`DialectRegistry::builtin`]), share it, and look dialects up by name when
//! binding tables.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::dialect::{Dialect, DialectId, MariaDbDialect, PostgresDialect};

/// A named collection of dialects.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    dialects: IndexMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        DialectRegistry::default()
    }

    /// A registry with the built-in dialects: `postgres` and `mariadb`, plus
    /// a `mysql` alias for the latter.
    pub fn builtin() -> Self {
        let mut registry = DialectRegistry::new();
        registry.register(DialectId::Postgres.as_str(), Arc::new(PostgresDialect::new()));
        let mariadb: Arc<dyn Dialect> = Arc::new(MariaDbDialect::new());
        registry.register(DialectId::MariaDb.as_str(), Arc::clone(&mariadb));
        registry.register("mysql", mariadb);
        registry
    }

    /// Register a dialect under a name, replacing and returning any previous
    /// entry under that name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        dialect: Arc<dyn Dialect>,
    ) -> Option<Arc<dyn Dialect>> {
        self.dialects.insert(name.into(), dialect)
    }

    /// Look up a dialect by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(name).cloned()
    }

    /// Remove a dialect by name.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.shift_remove(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_known_names() {
        let registry = DialectRegistry::builtin();
        assert_eq!(registry.get("postgres").unwrap().id(), DialectId::Postgres);
        assert_eq!(registry.get("mariadb").unwrap().id(), DialectId::MariaDb);
        assert_eq!(registry.get("mysql").unwrap().id(), DialectId::MariaDb);
        assert!(registry.get("oracle").is_none());
    }

    #[test]
    fn register_replaces_and_returns_previous() {
        let mut registry = DialectRegistry::builtin();
        let previous = registry.register("postgres", Arc::new(PostgresDialect::with_schema("app")));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 3);
        assert!(registry.remove("mysql").is_some());
        assert!(registry.get("mysql").is_none());
    }
}
