// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Public facade and optional process-wide singleton accessor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::Error;
use crate::notifier::{Observer, SubscriptionId};
use crate::scheduler::{Scheduler, TaskSummary};
use crate::settings::{BuildProfile, GlobalSettings};
use crate::task::{SceneRef, Task};

/// Serializes every compile/link [`Task`] it is given onto one external
/// compiler/linker subprocess at a time.
///
/// Cloning is cheap and shares the same underlying scheduler: every clone
/// observes the same queue, gates, and running task.
#[derive(Clone)]
pub struct CompilerService {
    scheduler: Arc<Scheduler>,
}

impl CompilerService {
    pub fn new(settings: GlobalSettings, profile: BuildProfile) -> Self {
        Self {
            scheduler: Arc::new(Scheduler::new(settings, profile)),
        }
    }

    /// Enqueue `task`. Returns `false` if it was dropped as a duplicate of
    /// the task currently running or one already pending for the same
    /// scene with identical inputs.
    pub fn add_task(&self, task: Task) -> bool {
        self.scheduler.submit(task)
    }

    pub fn enable_scene(&self, scene: SceneRef) {
        self.scheduler.enable_scene(scene);
    }

    pub fn disable_scene(&self, scene: SceneRef) {
        self.scheduler.disable_scene(scene);
    }

    /// Drop every pending task for `scene`. A task from `scene` already
    /// running is left to finish.
    pub fn remove_tasks_for(&self, scene: SceneRef) {
        self.scheduler.remove_tasks_for(scene);
    }

    pub fn has_tasks_for(&self, scene: SceneRef) -> bool {
        self.scheduler.has_tasks_for(scene)
    }

    pub fn current_tasks(&self) -> Vec<TaskSummary> {
        self.scheduler.current_tasks()
    }

    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub fn set_base_dir(&self, dir: impl Into<PathBuf>) {
        self.scheduler.with_settings(|s| s.set_base_dir(dir));
    }

    /// # Errors
    /// Returns [`Error::OutputDirCreation`] if the directory cannot be
    /// created.
    pub fn set_output_dir(&self, dir: impl Into<PathBuf>) -> Result<(), Error> {
        self.scheduler.with_settings(|s| s.set_output_dir(dir))
    }

    pub fn add_header_dir(&self, dir: impl AsRef<Path>) {
        self.scheduler.with_settings(|s| s.add_header_dir(dir));
    }

    pub fn set_fixed_header_path(&self, path: impl Into<PathBuf>) {
        self.scheduler.with_settings(|s| s.set_fixed_header_path(path));
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> SubscriptionId {
        self.scheduler.notifier().subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.scheduler.notifier().unsubscribe(id)
    }

    /// Kept for API parity with the original `AllowMultithread`, whose
    /// body was already commented out there; this scheduler only ever
    /// runs one subprocess at a time regardless of the hint.
    pub fn set_concurrency_hint(&self, _hint: usize) {}
}

static GLOBAL: OnceCell<Mutex<Option<CompilerService>>> = OnceCell::new();

fn slot() -> &'static Mutex<Option<CompilerService>> {
    GLOBAL.get_or_init(|| Mutex::new(None))
}

/// Install the process-wide service instance, replacing any previous one.
pub fn init_global(settings: GlobalSettings, profile: BuildProfile) {
    *slot().lock() = Some(CompilerService::new(settings, profile));
}

/// Tear down the process-wide service instance, if any.
pub fn shutdown_global() {
    slot().lock().take();
}

/// Run `f` against the process-wide service instance.
///
/// # Errors
/// Returns [`Error::ServiceNotInitialized`] if [`init_global`] has not
/// been called, or has been undone by [`shutdown_global`].
pub fn with_global<T>(f: impl FnOnce(&CompilerService) -> T) -> Result<T, Error> {
    let guard = slot().lock();
    let service = guard.as_ref().ok_or(Error::ServiceNotInitialized)?;
    Ok(f(service))
}
