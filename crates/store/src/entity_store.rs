use crate::id::resolve_id;
use std::collections::{BTreeMap, HashMap};

/// An entity held in an [`EntityStore`]
pub trait Entity {
    /// Stable identifier of this entity
    fn id(&self) -> &str;
}

/// In-memory repository of one entity kind keyed by id
///
/// Insertion order is preserved and observable through [`iter`](Self::iter)
/// and [`recent`](Self::recent). Entities are never removed.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    /// Entities in insertion order
    entries: Vec<T>,
    /// Position of each entity in `entries`
    index: HashMap<String, usize>,
    /// Prefix used for generated ids
    prefix: &'static str,
}

impl<T: Entity> EntityStore<T> {
    /// Create an empty store whose generated ids start with `prefix`
    pub fn new(prefix: &'static str) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            prefix,
        }
    }

    /// Id prefix for generated ids
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Resolve the id for a new entity: caller-supplied or generated
    pub fn next_id(&self, requested: Option<String>) -> String {
        resolve_id(requested, self.prefix)
    }

    /// Insert an entity
    ///
    /// An entity whose id already exists replaces the stored one and keeps
    /// its original position.
    pub fn insert(&mut self, entity: T) -> &T {
        let position = match self.index.get(entity.id()) {
            Some(&position) => {
                self.entries[position] = entity;
                position
            }
            None => {
                let position = self.entries.len();
                self.index.insert(entity.id().to_string(), position);
                self.entries.push(entity);
                position
            }
        };
        &self.entries[position]
    }

    /// Get an entity by id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).and_then(|&position| self.entries.get(position))
    }

    /// Get a mutable entity by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let position = *self.index.get(id)?;
        self.entries.get_mut(position)
    }

    /// Check if an entity exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// First entity (in insertion order) matching a predicate
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.entries.iter().find(|entity| predicate(entity))
    }

    /// First mutable entity (in insertion order) matching a predicate
    pub fn find_mut(&mut self, predicate: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.entries.iter_mut().find(|entity| predicate(entity))
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Iterate mutably in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    /// The last `n` inserted entities, oldest first
    pub fn recent(&self, n: usize) -> &[T] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Count entities grouped by a key. Keys are sorted.
    pub fn count_by<K: Ord>(&self, key: impl Fn(&T) -> K) -> BTreeMap<K, usize> {
        let mut counts = BTreeMap::new();
        for entity in &self.entries {
            *counts.entry(key(entity)).or_insert(0) += 1;
        }
        counts
    }

    /// Mean of a numeric projection, `None` when the store is empty
    pub fn average(&self, value: impl Fn(&T) -> f64) -> Option<f64> {
        (!self.entries.is_empty())
            .then(|| self.entries.iter().map(value).sum::<f64>() / self.entries.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Task {
        id: String,
        status: &'static str,
        score: f64,
    }

    impl Entity for Task {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn task(id: &str, status: &'static str, score: f64) -> Task {
        Task {
            id: id.to_string(),
            status,
            score,
        }
    }

    #[test]
    fn test_insert_get_and_order() {
        let mut store = EntityStore::new("task");
        store.insert(task("a", "scheduled", 0.1));
        store.insert(task("b", "completed", 0.5));
        store.insert(task("c", "scheduled", 0.9));

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("b").unwrap().status, "completed");
        assert!(store.get("missing").is_none());

        let ids: Vec<_> = store.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut store = EntityStore::new("task");
        store.insert(task("a", "scheduled", 0.1));
        store.insert(task("b", "scheduled", 0.2));
        store.insert(task("a", "failed", 0.3));

        assert_eq!(store.len(), 2);
        assert_eq!(store.iter().next().unwrap(), &task("a", "failed", 0.3));
    }

    #[test]
    fn test_mutation_in_place() {
        let mut store = EntityStore::new("task");
        store.insert(task("a", "scheduled", 0.1));

        store.get_mut("a").unwrap().status = "in-progress";
        assert_eq!(store.get("a").unwrap().status, "in-progress");

        store.find_mut(|t| t.id == "a").unwrap().score = 0.8;
        assert_eq!(store.get("a").unwrap().score, 0.8);
    }

    #[test]
    fn test_recent_slices() {
        let mut store = EntityStore::new("task");
        for i in 0..7 {
            store.insert(task(&format!("t{i}"), "scheduled", 0.0));
        }

        let recent: Vec<_> = store.recent(3).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(recent, vec!["t4", "t5", "t6"]);
        assert_eq!(store.recent(100).len(), 7);
        assert!(EntityStore::<Task>::new("task").recent(5).is_empty());
    }

    #[test]
    fn test_aggregates() {
        let mut store = EntityStore::new("task");
        assert_eq!(store.average(|t: &Task| t.score), None);

        store.insert(task("a", "scheduled", 0.2));
        store.insert(task("b", "completed", 0.4));
        store.insert(task("c", "scheduled", 0.6));

        let counts = store.count_by(|t| t.status);
        assert_eq!(counts.get("scheduled"), Some(&2));
        assert_eq!(counts.get("completed"), Some(&1));

        let avg = store.average(|t| t.score).unwrap();
        assert!((avg - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_next_id() {
        let store = EntityStore::<Task>::new("task");
        assert_eq!(store.next_id(Some("fixed".into())), "fixed");
        assert!(store.next_id(None).starts_with("task-"));
        assert_ne!(store.next_id(None), store.next_id(None));
    }
}
