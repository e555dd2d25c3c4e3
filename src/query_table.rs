use std::collections::HashMap;
use rand::random;
use thiserror::Error;

/// Number of distinct transaction ids.
pub const ID_SPACE: usize = 1 << 16;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("transaction id {0} is already in flight")]
pub struct DuplicateId(pub u16);

/// In-flight queries keyed by transaction id.
pub struct QueryTable<T> {
    map: HashMap<u16, T>,
}

impl<T> Default for QueryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryTable<T> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, id: u16) -> bool {
        self.map.contains_key(&id)
    }

    pub fn get(&self, id: u16) -> Option<&T> {
        self.map.get(&id)
    }

    pub fn insert(&mut self, id: u16, pending: T) -> Result<(), DuplicateId> {
        if self.map.contains_key(&id) {
            return Err(DuplicateId(id));
        }

        self.map.insert(id, pending);

        Ok(())
    }

    pub fn take(&mut self, id: u16) -> Option<T> {
        self.map.remove(&id)
    }

    pub fn drain_all(&mut self) -> Vec<T> {
        self.map.drain().map(|(_, pending)| pending).collect()
    }

    /// Draws a random id that no in-flight query is using.
    ///
    /// Returns `None` only when every id is taken.
    pub fn free_id(&self) -> Option<u16> {
        if self.map.len() >= ID_SPACE {
            return None;
        }

        loop {
            let id: u16 = random();
            if !self.map.contains_key(&id) {
                return Some(id);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_take() {
        let mut table = QueryTable::new();

        assert!(table.insert(7, "first").is_ok());
        assert_eq!(table.insert(7, "second"), Err(DuplicateId(7)));
        assert_eq!(table.get(7), Some(&"first"));
        assert!(table.contains(7));
        assert!(!table.contains(8));

        assert_eq!(table.take(7), Some("first"));
        assert_eq!(table.take(7), None);
        assert!(!table.contains(7));
        assert!(table.is_empty());

        // ids are reusable once the previous owner is gone
        assert!(table.insert(7, "third").is_ok());
    }

    #[test]
    fn drain_empties_table() {
        let mut table = QueryTable::new();
        for id in 0..10u16 {
            table.insert(id, id).unwrap();
        }

        let mut drained = table.drain_all();
        drained.sort();

        assert_eq!(drained, (0..10).collect::<Vec<u16>>());
        assert!(table.is_empty());
        assert!(table.drain_all().is_empty());
    }

    #[test]
    fn free_id_avoids_in_flight() {
        let mut table = QueryTable::new();
        for id in 0..=u16::MAX {
            if id != 4242 {
                table.insert(id, ()).unwrap();
            }
        }

        assert_eq!(table.free_id(), Some(4242));

        table.insert(4242, ()).unwrap();
        assert_eq!(table.free_id(), None);
    }
}
