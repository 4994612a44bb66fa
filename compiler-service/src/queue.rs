// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! FIFO-with-gating pending-task list.
//!
//! `TaskQueue` is plain, single-threaded state: [`crate::scheduler`] is the
//! only caller, and it holds the one mutex that also covers the gate set
//! and the currently-running task, so every method here takes `&mut self`
//! rather than locking internally.

use std::collections::VecDeque;

use crate::gate::GateSet;
use crate::task::{SceneRef, Task};

#[derive(Debug, Default)]
pub struct TaskQueue {
    pending: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `task`, deduplicating against whatever is already pending.
    /// A task matching the one currently running is *not* rejected here —
    /// it still goes to the back of pending and will run once more after
    /// the current run finishes, since the running task is no longer
    /// reachable from this queue to compare against. Returns `false` if
    /// `task` was dropped as a duplicate of a pending task.
    pub fn enqueue(&mut self, task: Task) -> bool {
        if self.pending.iter().any(|t| t.is_same_as(&task)) {
            return false;
        }
        self.pending.push_back(task);
        true
    }

    /// Remove and return the first pending task whose scene is not
    /// gated off, preserving the relative order of the tasks left behind.
    pub fn pop_first_eligible(&mut self, gates: &GateSet) -> Option<Task> {
        let index = self.pending.iter().position(|t| !gates.is_disabled(t.scene))?;
        self.pending.remove(index)
    }

    /// Append `task` to the tail unconditionally, bypassing deduplication.
    /// Used to put a task back after a pre-hook requests a requeue or a
    /// post-hook requests a rerun — in both cases the task just came out
    /// of this queue and re-deduplicating it against itself would be
    /// pointless.
    pub fn requeue(&mut self, task: Task) {
        self.pending.push_back(task);
    }

    /// Drop every pending task belonging to `scene`. Does not touch
    /// whatever is currently running.
    pub fn remove_for(&mut self, scene: SceneRef) {
        self.pending.retain(|t| t.scene != scene);
    }

    pub fn contains_for(&self, scene: SceneRef) -> bool {
        self.pending.iter().any(|t| t.scene == scene)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter()
    }
}
