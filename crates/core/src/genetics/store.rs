use std::collections::HashMap;

use crate::types::DogRecord;

/// Read-only lookup of a dog's recorded parents.
///
/// Anything that can resolve a dog id to its parent ids can back the
/// engine. Implementations must tolerate concurrent reads; the engine never
/// writes through this trait.
pub trait AncestryStore: Sync {
    /// Return the dog's record, or `None` if the id is not known.
    fn lookup(&self, id: &str) -> Option<DogRecord>;

    /// Whether the store knows the id at all.
    fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }
}

impl<T: AncestryStore + ?Sized> AncestryStore for &T {
    fn lookup(&self, id: &str) -> Option<DogRecord> {
        (**self).lookup(id)
    }
}

impl AncestryStore for HashMap<String, DogRecord> {
    fn lookup(&self, id: &str) -> Option<DogRecord> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_store() {
        let mut store: HashMap<String, DogRecord> = HashMap::new();
        store.insert("A".into(), DogRecord::new("A", None, None));
        store.insert("B".into(), DogRecord::new("B", Some("A"), None));

        assert!(store.contains("A"));
        assert!(!store.contains("Z"));
        assert_eq!(store.lookup("B").unwrap().sire.as_deref(), Some("A"));

        let by_ref: &HashMap<String, DogRecord> = &store;
        assert!(by_ref.lookup("B").is_some());
    }
}
