//! In-memory server filter store.

use parking_lot::RwLock;

use logcast_protocols::FilterStore;

/// Filter applied when none has been set.
pub const DEFAULT_FILTER: &str = "*:DEBUG";

/// Holds the server-side log filter as a plain string.
#[derive(Debug)]
pub struct MemoryFilterStore {
    filter: RwLock<String>,
}

impl MemoryFilterStore {
    /// An empty `initial` selects [`DEFAULT_FILTER`].
    pub fn new(initial: impl Into<String>) -> Self {
        let store = Self {
            filter: RwLock::new(String::new()),
        };
        store.set_config(&initial.into());
        store
    }
}

impl Default for MemoryFilterStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER)
    }
}

impl FilterStore for MemoryFilterStore {
    fn get_config(&self) -> String {
        self.filter.read().clone()
    }

    fn set_config(&self, filter: &str) {
        let filter = filter.trim();
        *self.filter.write() = if filter.is_empty() {
            DEFAULT_FILTER.to_string()
        } else {
            filter.to_string()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(MemoryFilterStore::default().get_config(), "*:DEBUG");
        assert_eq!(MemoryFilterStore::new("").get_config(), "*:DEBUG");
    }

    #[test]
    fn test_set_and_reset() {
        let store = MemoryFilterStore::new("app:INFO");
        assert_eq!(store.get_config(), "app:INFO");

        store.set_config("db:WARN, *:ERROR");
        assert_eq!(store.get_config(), "db:WARN, *:ERROR");

        store.set_config("   ");
        assert_eq!(store.get_config(), DEFAULT_FILTER);
    }
}
