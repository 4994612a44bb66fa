// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Shared fixtures for the end-to-end tests: a real (but trivial) `g++`
//! stand-in script dropped at the path `GlobalSettings::compiler_binary`
//! resolves to, and a channel-backed `Observer`.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use compiler_service::{Event, GlobalSettings, HostPlatform, Observer};

/// Build a `GlobalSettings` rooted at `base` with a fake `g++` installed
/// at the exact location `compiler_binary()` expects, running `script`
/// as its body.
pub fn fake_toolchain(base: &Path, script: &str) -> GlobalSettings {
    let bin_dir = base.join("CppPlatform").join("MinGW32").join("bin");
    fs::create_dir_all(&bin_dir).expect("create fake toolchain bin dir");

    let g_plus_plus = bin_dir.join("g++");
    fs::write(&g_plus_plus, format!("#!/bin/sh\n{script}\n")).expect("write fake g++");
    let mut perms = fs::metadata(&g_plus_plus).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&g_plus_plus, perms).expect("chmod fake g++");

    let mut settings = GlobalSettings::new(HostPlatform::Linux, base, base.join("out"));
    settings.set_output_dir(base.join("out")).expect("create output dir");
    settings
}

// `mpsc::Sender` is `Send` but not `Sync`; `Observer` requires both, so the
// sender is kept behind a mutex purely to make the wrapper `Sync`.
pub struct ChannelObserver(pub parking_lot::Mutex<mpsc::Sender<Event>>);

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self(parking_lot::Mutex::new(tx))
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, event: &Event) {
        self.0.lock().send(event.clone()).ok();
    }
}

/// Receive events until `matches` returns `true` for one, or panic after
/// `timeout`. Every event seen along the way is returned.
pub fn recv_until(rx: &mpsc::Receiver<Event>, timeout: Duration, matches: impl Fn(&Event) -> bool) -> Vec<Event> {
    let deadline = std::time::Instant::now() + timeout;
    let mut seen = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        let event = rx
            .recv_timeout(remaining)
            .unwrap_or_else(|_| panic!("timed out waiting for a matching event, saw: {seen:?}"));
        let done = matches(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}
