// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Observer registry (spec: `NotifyControls`).
//!
//! Dispatch always happens with no scheduler lock held: [`Notifier::notify`]
//! clones the current subscriber list out from under its own mutex, then
//! calls each observer after releasing it, so an observer that calls back
//! into the service cannot deadlock against the scheduler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::task::SceneRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Lifecycle events the scheduler reports as a compilation runs.
#[derive(Debug, Clone)]
pub enum Event {
    /// A task started running.
    Started { scene: SceneRef },
    /// A task ended, successfully or not, with its captured compiler/linker
    /// output.
    Finished {
        scene: SceneRef,
        succeeded: bool,
        messages: String,
    },
    /// The pending queue became empty and nothing is running.
    QueueDrained,
    /// A scene was disabled or enabled, so its gating state changed.
    SceneGatingChanged { scene: SceneRef, disabled: bool },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: &Event);
}

#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    observers: Mutex<HashMap<SubscriptionId, Arc<dyn Observer>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().insert(id, observer);
        id
    }

    /// Returns `true` if `id` was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.lock().remove(&id).is_some()
    }

    pub fn notify(&self, event: &Event) {
        let subscribers: Vec<_> = self.observers.lock().values().cloned().collect();
        for observer in subscribers {
            observer.notify(event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.observers.lock().len())
            .finish()
    }
}
