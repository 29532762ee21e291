//! In-memory aggregate of the processes seen while parsing.

use std::collections::HashMap;

use perfplot_core::models::{Process, ProcessKey};

/// Keyed, insertion-ordered collection of [`Process`] entities.
#[derive(Debug, Default)]
pub struct ProcessStore {
    processes: Vec<Process>,
    index: HashMap<ProcessKey, usize>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the process with `key`, creating an empty one on first sight.
    pub fn upsert(&mut self, key: ProcessKey) -> &mut Process {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.processes.len();
                self.index.insert(key.clone(), slot);
                self.processes.push(Process::new(key));
                slot
            }
        };
        &mut self.processes[slot]
    }

    pub fn get(&self, key: &ProcessKey) -> Option<&Process> {
        self.index.get(key).map(|&slot| &self.processes[slot])
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Processes in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub fn into_processes(self) -> Vec<Process> {
        self.processes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str, file: &str) -> ProcessKey {
        ProcessKey::parse(raw, file)
    }

    #[test]
    fn test_upsert_creates_once() {
        let mut store = ProcessStore::new();
        store
            .upsert(key("svc(1)", "a.log"))
            .record("t1", &[("WS", "", 1.0)])
            .unwrap();
        store
            .upsert(key("svc(1)", "a.log"))
            .record("t2", &[("WS", "", 2.0)])
            .unwrap();

        assert_eq!(store.len(), 1);
        let process = store.get(&key("svc(1)", "a.log")).unwrap();
        assert_eq!(process.time_axis(), &["t1".to_string(), "t2".to_string()]);
    }

    #[test]
    fn test_distinct_source_files_are_distinct_processes() {
        let mut store = ProcessStore::new();
        store.upsert(key("svc(1)", "a.log"));
        store.upsert(key("svc(1)", "b.log"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_first_seen_order_is_kept() {
        let mut store = ProcessStore::new();
        store.upsert(key("zeta(3)", "a.log"));
        store.upsert(key("alpha(1)", "a.log"));
        store.upsert(key("zeta(3)", "a.log"));

        let names: Vec<&str> = store.iter().map(Process::name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(store.into_processes().len(), 2);
    }

    #[test]
    fn test_empty_store() {
        let store = ProcessStore::new();
        assert!(store.is_empty());
        assert!(store.get(&key("svc(1)", "a.log")).is_none());
    }
}
