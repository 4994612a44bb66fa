// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The serialized Idle → Selecting → PreHook → Running → PostHook loop.
//!
//! The original (`CodeCompiler::StartTheNextTask` /
//! `CodeCompiler::ProcessEndedWork`) drove this as tail recursion from a UI
//! timer callback. Here it is one dedicated worker thread with an explicit
//! loop: a [`parking_lot::Condvar`] parks it while there is nothing
//! eligible to run, and every state transition locks [`SharedState`] only
//! for as long as it takes to read or mutate it — the subprocess itself
//! always runs with the lock released.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::argbuilder::build_args;
use crate::gate::GateSet;
use crate::notifier::{Event, Notifier};
use crate::queue::TaskQueue;
use crate::settings::{BuildProfile, GlobalSettings};
use crate::subprocess::{OutputLine, SubprocessRunner};
use crate::task::{Mode, PreHookContext, PreHookOutcome, PostHookContext, SceneRef, Task};

/// Display-only description of a task, safe to hand out while the real
/// [`Task`] (with its hook closures) is owned by the worker thread.
#[derive(Debug, Clone)]
pub struct TaskSummary {
    pub scene: SceneRef,
    pub mode: Mode,
    pub user_name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            scene: task.scene,
            mode: task.mode,
            user_name: task.user_name.clone(),
            input_path: task.input_path.clone(),
            output_path: task.output_path.clone(),
        }
    }
}

struct SharedState {
    queue: TaskQueue,
    gates: GateSet,
    running: Option<TaskSummary>,
}

struct Inner {
    state: Mutex<SharedState>,
    work_available: Condvar,
    settings: Mutex<GlobalSettings>,
    profile: BuildProfile,
    runner: SubprocessRunner,
    notifier: Notifier,
    shutdown: AtomicBool,
}

/// Owns the pending queue, the gate set, and the worker thread that drains
/// them one subprocess at a time.
pub struct Scheduler {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// # Panics
    /// Panics if the OS refuses to spawn the dedicated worker thread.
    pub fn new(settings: GlobalSettings, profile: BuildProfile) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(SharedState {
                queue: TaskQueue::new(),
                gates: GateSet::new(),
                running: None,
            }),
            work_available: Condvar::new(),
            settings: Mutex::new(settings),
            profile,
            runner: SubprocessRunner::new(),
            notifier: Notifier::new(),
            shutdown: AtomicBool::new(false),
        });

        let worker_inner = inner.clone();
        let worker = thread::Builder::new()
            .name("compiler-service-worker".into())
            .spawn(move || run_worker(&worker_inner))
            .expect("failed to spawn compiler-service worker thread");

        Self {
            inner,
            worker: Some(worker),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Enqueue `task`. Returns `false` if it was dropped as a duplicate of
    /// something already pending. A duplicate of the task currently
    /// running is not rejected (spec scenario: "dedup while running") —
    /// it is queued and will run again once the current run finishes.
    pub fn submit(&self, task: Task) -> bool {
        let mut state = self.inner.state.lock();
        let inserted = state.queue.enqueue(task);
        if inserted {
            self.inner.work_available.notify_one();
        }
        inserted
    }

    pub fn disable_scene(&self, scene: SceneRef) {
        self.inner.state.lock().gates.disable(scene);
        self.inner.notifier.notify(&Event::SceneGatingChanged { scene, disabled: true });
    }

    pub fn enable_scene(&self, scene: SceneRef) {
        {
            let mut state = self.inner.state.lock();
            if state.gates.enable(scene) {
                self.inner.work_available.notify_one();
            }
        }
        self.inner.notifier.notify(&Event::SceneGatingChanged { scene, disabled: false });
    }

    pub fn remove_tasks_for(&self, scene: SceneRef) {
        self.inner.state.lock().queue.remove_for(scene);
    }

    pub fn has_tasks_for(&self, scene: SceneRef) -> bool {
        let state = self.inner.state.lock();
        state.queue.contains_for(scene) || state.running.as_ref().is_some_and(|r| r.scene == scene)
    }

    pub fn current_tasks(&self) -> Vec<TaskSummary> {
        let state = self.inner.state.lock();
        state.running.iter().cloned().chain(state.queue.iter().map(TaskSummary::from)).collect()
    }

    /// `true` as soon as there is a task executing or eligible to run next —
    /// set synchronously by [`submit`](Self::submit)/[`enable_scene`](Self::enable_scene)
    /// the moment they hand off work, not only once the worker thread wakes
    /// up and starts it.
    pub fn is_busy(&self) -> bool {
        let state = self.inner.state.lock();
        state.running.is_some() || state.queue.iter().any(|t| !state.gates.is_disabled(t.scene))
    }

    pub fn with_settings<T>(&self, f: impl FnOnce(&mut GlobalSettings) -> T) -> T {
        f(&mut self.inner.settings.lock())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.work_available.notify_all();
        if let Some(worker) = self.worker.take() {
            worker.join().ok();
        }
    }
}

enum PreHookDecision {
    Run(Task),
    Skip,
    Requeue(Task),
}

fn run_pre_hook(mut task: Task) -> PreHookDecision {
    let Some(mut hook) = task.pre_hook.take() else {
        return PreHookDecision::Run(task);
    };
    let outcome = hook(&PreHookContext { task: &task });
    task.pre_hook = Some(hook);
    match outcome {
        PreHookOutcome::Proceed => PreHookDecision::Run(task),
        PreHookOutcome::Skip => PreHookDecision::Skip,
        PreHookOutcome::Requeue => PreHookDecision::Requeue(task),
    }
}

/// Block until a task clears its pre-hook and is ready to run, or `None`
/// once the scheduler has been told to shut down.
///
/// A picked task becomes visible as `current`/`running` the moment it is
/// selected, before its pre-hook runs — not only once the pre-hook has
/// already approved it — so `IsBusy`/`CurrentTasks`/`HasTasksFor` never go
/// blind to a task mid-pre-hook.
fn select_runnable(inner: &Inner) -> Option<Task> {
    loop {
        if inner.shutdown.load(Ordering::Acquire) {
            return None;
        }

        let popped = {
            let mut state = inner.state.lock();
            match state.queue.pop_first_eligible(&state.gates) {
                Some(task) => Some(task),
                None => {
                    let _ = inner.work_available.wait_for(&mut state, Duration::from_secs(1));
                    None
                }
            }
        };

        let Some(task) = popped else { continue };

        let summary = TaskSummary::from(&task);
        inner.state.lock().running = Some(summary.clone());
        inner.notifier.notify(&Event::Started { scene: summary.scene });

        match run_pre_hook(task) {
            PreHookDecision::Run(task) => return Some(task),
            PreHookDecision::Skip => {
                inner.state.lock().running = None;
            }
            PreHookDecision::Requeue(task) => {
                {
                    let mut state = inner.state.lock();
                    state.running = None;
                    state.queue.requeue(task);
                }
                thread::sleep(Duration::from_millis(20));
            }
        }
    }
}

fn run_worker(inner: &Arc<Inner>) {
    while let Some(mut task) = select_runnable(inner) {
        // `state.running` was already set by `select_runnable` once the
        // task cleared its pre-hook, so this only needs the summary back
        // for the events/logging below.
        let summary = TaskSummary::from(&task);

        let settings = inner.settings.lock().clone();
        let args = build_args(&task, &settings, inner.profile);
        let binary = settings.compiler_binary();
        let base_dir = settings.base_dir().to_path_buf();

        let (succeeded, exit_code, messages) = match inner.runner.spawn(&binary, &args, &base_dir) {
            Ok(process) => {
                let (code, lines) = process.wait().unwrap_or((None, Vec::new()));
                let messages = render_messages(&lines);
                (code == Some(0), code, messages)
            }
            Err(err) => (false, None, err.to_string()),
        };

        tracing::info!(scene = summary.scene.0, succeeded, ?exit_code, "compiler invocation finished");

        let requeue = if let Some(mut hook) = task.post_hook.take() {
            let requeue = hook(&PostHookContext {
                task: &task,
                compilation_succeeded: succeeded,
                exit_code,
                messages: &messages,
            });
            task.post_hook = Some(hook);
            requeue
        } else {
            false
        };

        let (became_idle, disabled_waiting) = {
            let mut state = inner.state.lock();
            state.running = None;
            if requeue {
                state.queue.requeue(task);
            }
            let disabled_waiting = state.queue.iter().filter(|t| state.gates.is_disabled(t.scene)).count();
            let runnable_remaining = state.queue.iter().count() - disabled_waiting;
            (runnable_remaining == 0, disabled_waiting)
        };

        inner.notifier.notify(&Event::Finished {
            scene: summary.scene,
            succeeded,
            messages,
        });
        if became_idle {
            if disabled_waiting > 0 {
                tracing::info!(disabled_waiting, "No more task(s) to be processed. But {disabled_waiting} disabled task(s) waiting for being enabled).");
            } else {
                tracing::info!("No more task(s) to be processed.");
            }
            inner.notifier.notify(&Event::QueueDrained);
        } else {
            inner.work_available.notify_one();
        }
    }
}

fn render_messages(lines: &[OutputLine]) -> String {
    lines
        .iter()
        .map(|line| match line {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
