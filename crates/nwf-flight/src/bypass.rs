use std::collections::HashSet;

/// UUIDs of online players exempt from enforcement.
#[derive(Debug, Default)]
pub struct BypassSet {
    players: HashSet<String>,
}

impl BypassSet {
    pub fn insert(&mut self, uuid: &str) -> bool {
        self.players.insert(uuid.to_string())
    }

    pub fn remove(&mut self, uuid: &str) -> bool {
        self.players.remove(uuid)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.players.contains(uuid)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
