//! Bookkeeping for the plugin's scheduler tasks.
//!
//! The sweep owns a fixed repeating task id. Every other task is a one-shot
//! scheduled one tick ahead, remembered here until it fires.

use std::collections::HashMap;

pub const SWEEP_TASK_ID: u32 = 1;

/// Work to do when a one-shot task fires. Players are referenced by UUID
/// and re-resolved at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Cancel flight if the player now holds a banned item.
    RecheckHeldItem { uuid: String },
    /// Turn flying back on after a restore.
    ResumeFlight { uuid: String },
}

#[derive(Debug)]
pub struct DeferredTasks {
    next_id: u32,
    pending: HashMap<u32, Deferred>,
}

impl Default for DeferredTasks {
    fn default() -> Self {
        Self {
            next_id: SWEEP_TASK_ID + 1,
            pending: HashMap::new(),
        }
    }
}

impl DeferredTasks {
    /// Remember `work` and return the task id to schedule it under.
    pub fn insert(&mut self, work: Deferred) -> u32 {
        let id = self.allocate_id();
        self.pending.insert(id, work);
        id
    }

    pub fn take(&mut self, task_id: u32) -> Option<Deferred> {
        self.pending.remove(&task_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn allocate_id(&mut self) -> u32 {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            if id != SWEEP_TASK_ID && !self.pending.contains_key(&id) {
                return id;
            }
        }
    }
}
