use std::collections::HashSet;

/// Insertion-ordered set of strings.
///
/// Used to collect system packages and advisory messages while a pack compiles.
/// Adding a string that is already present is a no-op, so the first occurrence
/// decides its position.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single fact. Returns `true` if it was not already present.
    pub fn add(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.seen.insert(item.clone()) {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    pub fn extend<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self.add(item);
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn into_items(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut store = FactStore::new();
        store.add("redis");
        store.add("mysql");
        store.add("mongodb");
        assert_eq!(store.items(), &["redis", "mysql", "mongodb"]);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut store = FactStore::new();
        assert!(store.add("imagemagick"));
        assert!(store.add("libmagickwand-dev"));
        assert!(!store.add("imagemagick"));
        assert_eq!(store.items(), &["imagemagick", "libmagickwand-dev"]);
    }

    #[test]
    fn test_extend_dedups() {
        let mut store = FactStore::new();
        store.extend(["a", "b"]);
        store.extend(["b", "c", "a"]);
        assert_eq!(store.into_items(), vec!["a", "b", "c"]);
    }
}
