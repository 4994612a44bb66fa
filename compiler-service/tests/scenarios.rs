// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use compiler_service::{BuildProfile, CompilerService, Event, Mode, PreHookContext, PreHookOutcome, SceneRef, Task};

use common::{fake_toolchain, recv_until, ChannelObserver};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn simple_compile_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fake_toolchain(dir.path(), "echo ok; exit 0");
    let service = CompilerService::new(settings, BuildProfile::Debug);

    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver::new(tx)));

    let scene = SceneRef::new(1);
    assert!(service.add_task(Task::new(scene, Mode::Compile, "a.cpp", "a.o")));
    // IsBusy() must be true immediately, before the worker thread has even
    // woken up to pick the task off the queue (spec scenario 1).
    assert!(service.is_busy());

    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Started { .. }));
    let seen = recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { .. }));

    assert!(!service.is_busy());
    let Event::Finished { succeeded, messages, .. } = seen.last().unwrap() else {
        panic!("expected Finished event");
    };
    assert!(*succeeded);
    assert!(messages.contains("ok"));
}

#[test]
fn dedup_while_running_runs_twice() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fake_toolchain(dir.path(), "sleep 0.3; exit 0");
    let service = CompilerService::new(settings, BuildProfile::Debug);

    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver::new(tx)));

    let scene = SceneRef::new(1);
    let make_task = || Task::new(scene, Mode::Compile, "a.cpp", "a.o");

    assert!(service.add_task(make_task()));
    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Started { .. }));

    // a duplicate of the task currently running is still queued, not
    // rejected (spec scenario 2).
    assert!(service.add_task(make_task()));

    // both runs must complete within the timeout, or this panics — proving
    // the subprocess ran exactly twice rather than being deduplicated away.
    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { .. }));
    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { .. }));
}

#[test]
fn gating_preserves_pending_work() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fake_toolchain(dir.path(), "exit 0");
    let service = CompilerService::new(settings, BuildProfile::Debug);

    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver::new(tx)));

    let s1 = SceneRef::new(1);
    let s2 = SceneRef::new(2);

    service.disable_scene(s1);
    service.add_task(Task::new(s1, Mode::Compile, "a.cpp", "a.o"));
    service.add_task(Task::new(s2, Mode::Compile, "b.cpp", "b.o"));

    let seen = recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { scene, .. } if *scene == s2));
    assert!(seen.iter().all(|e| !matches!(e, Event::Finished { scene, .. } if *scene == s1)));
    assert!(service.has_tasks_for(s1));

    service.enable_scene(s1);
    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { scene, .. } if *scene == s1));
    assert!(!service.has_tasks_for(s1));
}

#[test]
fn pre_hook_requeue_runs_the_subprocess_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let settings = fake_toolchain(dir.path(), &format!("echo x >> {}; exit 0", marker.display()));
    let service = CompilerService::new(settings, BuildProfile::Debug);

    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver::new(tx)));

    let attempts = Arc::new(AtomicUsize::new(0));
    let hook_attempts = attempts.clone();
    let task = Task::new(SceneRef::new(1), Mode::Compile, "a.cpp", "a.o").with_pre_hook(Box::new(
        move |_ctx: &PreHookContext| {
            if hook_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                PreHookOutcome::Requeue
            } else {
                PreHookOutcome::Proceed
            }
        },
    ));

    service.add_task(task);
    recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { .. }));

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    let runs = std::fs::read_to_string(&marker).unwrap_or_default();
    assert_eq!(runs.lines().count(), 1);
}

#[test]
fn compiler_failure_is_reported_without_stopping_the_scheduler() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fake_toolchain(dir.path(), "echo 'err.cpp:1: error' >&2; exit 1");
    let service = CompilerService::new(settings, BuildProfile::Debug);

    let (tx, rx) = mpsc::channel();
    service.subscribe(Arc::new(ChannelObserver::new(tx)));

    service.add_task(Task::new(SceneRef::new(1), Mode::Compile, "err.cpp", "err.o"));
    let seen = recv_until(&rx, TIMEOUT, |e| matches!(e, Event::Finished { .. }));

    let Event::Finished { succeeded, messages, .. } = seen.last().unwrap() else {
        panic!("expected Finished event");
    };
    assert!(!*succeeded);
    assert!(messages.contains("error"));

    // the scheduler is still usable after a failed task.
    assert!(service.add_task(Task::new(SceneRef::new(2), Mode::Compile, "ok.cpp", "ok.o")));
}
